//! PDF helpers: text layer via `pdf-extract`, poppler CLI tools for the rest.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use super::command::{run_with_timeout, tool_error, TOOL_TIMEOUT};
use super::ExtractionError;

const POPPLER_HINT: &str = "poppler-utils is not installed (pdftotext, pdfinfo, pdftoppm)";

/// Reads the embedded text layer. `None` when the parser fails or panics.
pub fn extract_text_layer(data: &[u8]) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data))) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            debug!("pdf-extract could not read text layer: {e}");
            None
        }
        Err(_) => {
            warn!("pdf-extract panicked on malformed PDF");
            None
        }
    }
}

/// Runs `pdftotext -layout -nopgbrk <pdf> -`.
pub fn run_pdftotext(pdf_path: &Path) -> Result<String, ExtractionError> {
    let output = run_with_timeout(
        "pdftotext",
        Command::new("pdftotext")
            .args(["-layout", "-nopgbrk"])
            .arg(pdf_path)
            .arg("-"),
        TOOL_TIMEOUT,
    )
    .map_err(|e| tool_error(e, POPPLER_HINT))?;

    if !output.status.success() {
        return Err(ExtractionError::Pdf(format!(
            "pdftotext failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Page count from `pdfinfo`. `None` if the tool is missing or the output is unexpected.
pub fn page_count(pdf_path: &Path) -> Option<u32> {
    let output =
        run_with_timeout("pdfinfo", Command::new("pdfinfo").arg(pdf_path), TOOL_TIMEOUT).ok()?;
    if !output.status.success() {
        return None;
    }
    parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout))
}

fn parse_pdfinfo_pages(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Renders every page to `<out_dir>/page-N.png` at 300 DPI and returns them in page order.
pub fn render_pages(pdf_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let output = run_with_timeout(
        "pdftoppm",
        Command::new("pdftoppm")
            .args(["-png", "-r", "300"])
            .arg(pdf_path)
            .arg(out_dir.join("page")),
        TOOL_TIMEOUT,
    )
    .map_err(|e| tool_error(e, POPPLER_HINT))?;

    if !output.status.success() {
        return Err(ExtractionError::Pdf(format!(
            "pdftoppm failed to render PDF pages: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let pages = collect_page_images(out_dir)?;
    if pages.is_empty() {
        return Err(ExtractionError::Pdf("pdftoppm produced no pages".to_string()));
    }
    Ok(pages)
}

/// pdftoppm pads page numbers to the width of the page count (page-1, page-01, page-001),
/// so order by the parsed number rather than by name.
fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let number = name.strip_prefix("page-")?.strip_suffix(".png")?.parse().ok()?;
            Some((number, path))
        })
        .collect();
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_pdfinfo_pages() {
        let stdout = "Producer:       LibreOffice\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(stdout), Some(12));
    }

    #[test]
    fn test_parse_pdfinfo_missing_pages() {
        assert_eq!(parse_pdfinfo_pages("Title: x\n"), None);
        assert_eq!(parse_pdfinfo_pages("Pages: many\n"), None);
    }

    #[test]
    fn test_collect_page_images_orders_numerically() {
        let temp = TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "other.txt"] {
            std::fs::write(temp.path().join(name), b"fake png").unwrap();
        }
        let pages = collect_page_images(temp.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn test_collect_page_images_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(collect_page_images(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_text_layer_of_garbage_is_none() {
        assert!(extract_text_layer(b"definitely not a pdf").is_none());
    }
}
