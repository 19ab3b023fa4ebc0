use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("resume contains no text")]
    Empty,
}

/// Raw upload as received from the client.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("application/pdf"));
        let by_name = self
            .file_name
            .as_deref()
            .is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"));
        by_type || by_name
    }
}

/// Extracts the plain text of an upload. PDFs are parsed; anything else is
/// read as UTF-8 with invalid sequences replaced.
pub fn resume_text(file: &UploadedFile) -> Result<String, IntakeError> {
    let text = if file.is_pdf() {
        pdf_extract::extract_text_from_mem(&file.bytes)
            .map_err(|e| IntakeError::Pdf(e.to_string()))?
    } else {
        String::from_utf8_lossy(&file.bytes).into_owned()
    };

    if text.trim().is_empty() {
        return Err(IntakeError::Empty);
    }
    Ok(text)
}
