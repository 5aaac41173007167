//! PDF text extraction via `pdf-extract`.
//!
//! The upload is written to a named temporary file first; the file is removed
//! when the guard drops, whether extraction succeeded, failed or panicked.

use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, warn};

use super::ExtractionError;

/// Extracts the text of every page, in page order.
///
/// pdf-extract is CPU-bound and can panic on malformed input, so it runs on
/// the blocking pool; a panic surfaces as `ExtractionError::Pdf`.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || with_temp_pdf(&bytes, read_pdf_pages))
        .await
        .map_err(|e| {
            warn!("PDF extraction task failed: {e}");
            ExtractionError::Pdf("the document could not be parsed".to_string())
        })?
}

/// Writes `bytes` to a `.pdf` temp file, runs `read` on its path and removes the file.
pub fn with_temp_pdf<T, F>(bytes: &[u8], read: F) -> Result<T, ExtractionError>
where
    F: FnOnce(&Path) -> Result<T, ExtractionError>,
{
    let mut tmp = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".pdf")
        .tempfile()?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    debug!("Wrote {} byte upload to {}", bytes.len(), tmp.path().display());

    // `tmp` is dropped (and unlinked) on every path out of this function.
    read(tmp.path())
}

fn read_pdf_pages(path: &Path) -> Result<String, ExtractionError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractionError::Pdf(e.to_string()))
}
