//! Multipart upload parsing shared by the documents and intelligence endpoints.

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;

use crate::errors::AppError;

/// Slack on top of the file size limit for multipart boundaries and text fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug)]
pub struct UploadForm {
    pub file: UploadedFile,
    /// Every non-file part, by field name.
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

/// Reads a multipart body with exactly one `file` part.
/// An empty file is a 400, a file over `max_bytes` a 413.
pub async fn read_multipart(mut multipart: Multipart, max_bytes: usize) -> Result<UploadForm, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let filename = field
                .file_name()
                .map(sanitize_filename)
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| "upload".to_string());
            let declared = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;

            if data.is_empty() {
                return Err(AppError::Validation("Uploaded file is empty".to_string()));
            }
            if data.len() > max_bytes {
                return Err(too_large(max_bytes));
            }

            let content_type = resolve_content_type(declared.as_deref(), &data, &filename);
            file = Some(UploadedFile {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    Ok(UploadForm { file, fields })
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File exceeds the maximum upload size of {} bytes",
        max_bytes
    ))
}

/// Keeps only the final path component of a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or_default().trim().to_string()
}

/// Trusts a specific declared type; otherwise sniffs magic bytes, then the extension.
fn resolve_content_type(declared: Option<&str>, data: &[u8], filename: &str) -> String {
    match declared {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => return ct.to_string(),
        _ => {}
    }
    sniff_content_type(data)
        .or_else(|| content_type_from_extension(filename))
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"%PDF") {
        Some("application/pdf")
    } else if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else {
        None
    }
}

fn content_type_from_extension(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_wins() {
        assert_eq!(
            resolve_content_type(Some("image/png"), b"%PDF-1.7", "x.pdf"),
            "image/png"
        );
    }

    #[test]
    fn test_octet_stream_is_sniffed() {
        assert_eq!(
            resolve_content_type(Some("application/octet-stream"), b"%PDF-1.7 ...", "scan"),
            "application/pdf"
        );
        assert_eq!(
            resolve_content_type(None, &[0xFF, 0xD8, 0xFF, 0xE0], "photo"),
            "image/jpeg"
        );
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(resolve_content_type(None, b"????", "licence.JPG"), "image/jpeg");
        assert_eq!(
            resolve_content_type(None, b"????", "notes.txt"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\payslip.pdf"), "payslip.pdf");
        assert_eq!(sanitize_filename("statement.pdf"), "statement.pdf");
    }

    #[test]
    fn test_form_field_trims_and_ignores_blank() {
        let form = UploadForm {
            file: UploadedFile {
                filename: "a.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                data: Bytes::from_static(b"%PDF"),
            },
            fields: HashMap::from([
                ("document_type".to_string(), " income ".to_string()),
                ("user_id".to_string(), "  ".to_string()),
            ]),
        };
        assert_eq!(form.field("document_type"), Some("income"));
        assert_eq!(form.field("user_id"), None);
        assert_eq!(form.field("missing"), None);
    }
}
