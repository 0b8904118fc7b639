//! External tool invocation with a time limit.

use std::io;
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;

use super::ExtractionError;

/// Upper bound for one poppler or tesseract run.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs `command` to completion, killing it once `limit` has passed.
///
/// Blocks the calling thread on the ambient runtime, so call it from the blocking pool.
/// A timeout surfaces as `ErrorKind::TimedOut`.
pub fn run_with_timeout(tool: &str, command: &mut Command, limit: Duration) -> io::Result<Output> {
    let handle = tokio::runtime::Handle::try_current().map_err(io::Error::other)?;
    command.kill_on_drop(true);
    match handle.block_on(tokio::time::timeout(limit, command.output())) {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{tool} timed out after {}s", limit.as_secs_f32()),
        )),
    }
}

/// Maps a spawn or wait failure, with an install hint for missing binaries.
pub fn tool_error(e: io::Error, install_hint: &str) -> ExtractionError {
    match e.kind() {
        io::ErrorKind::NotFound => ExtractionError::ToolNotAvailable(install_hint.to_string()),
        io::ErrorKind::TimedOut => ExtractionError::TimedOut(e.to_string()),
        _ => ExtractionError::Io(e),
    }
}
