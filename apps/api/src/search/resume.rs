//! Resume upload checks and the temporary on-disk copy handed to the backend.

use std::path::Path;

use bytes::Bytes;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A resume file as received from the form.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ResumeUpload {
    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / BYTES_PER_MB
    }
}

/// Why an upload was refused before dispatch.
#[derive(Debug, Error, PartialEq)]
pub enum ResumeRejection {
    #[error("Resume exceeds the {limit_mb:.0}MB upload limit")]
    TooLarge { limit_mb: f64 },

    #[error("Resume must be a PDF file")]
    NotPdf,

    #[error("Resume PDF could not be read")]
    Unreadable,

    #[error("Resume PDF contains no extractable text; upload a text-based PDF")]
    NoText,
}

/// Checks size, extension and PDF header, and optionally that the document
/// has extractable text.
pub async fn validate_resume(
    upload: &ResumeUpload,
    max_bytes: usize,
    require_text: bool,
) -> Result<(), ResumeRejection> {
    if upload.bytes.len() > max_bytes {
        return Err(ResumeRejection::TooLarge {
            limit_mb: max_bytes as f64 / BYTES_PER_MB,
        });
    }

    let is_pdf_name = Path::new(&upload.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name || !upload.bytes.starts_with(PDF_MAGIC) {
        return Err(ResumeRejection::NotPdf);
    }

    if require_text {
        let bytes = upload.bytes.clone();
        // pdf-extract is CPU-bound and may panic on malformed input.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|_| ResumeRejection::Unreadable)?
            .map_err(|_| ResumeRejection::Unreadable)?;

        debug!("Resume text check: {} characters extracted", text.len());
        if text.trim().is_empty() {
            return Err(ResumeRejection::NoText);
        }
    }

    Ok(())
}

/// The resume written to a temporary `.pdf` file.
///
/// The file is deleted when this guard is dropped, including when the owning
/// search task is aborted.
#[derive(Debug)]
pub struct TempResume {
    file: NamedTempFile,
}

impl TempResume {
    pub async fn create(upload: &ResumeUpload) -> std::io::Result<Self> {
        let bytes = upload.bytes.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("gethire-resume-")
                .suffix(".pdf")
                .tempfile()?;
            std::io::Write::write_all(&mut file, &bytes)?;
            file.as_file().sync_all()?;
            Ok(file)
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!("Resume staged at {}", file.path().display());
        Ok(TempResume { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
