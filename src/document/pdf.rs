use log::{debug, warn};
use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{0} is not a PDF document")]
    NotPdf(String),
    #[error("Uploaded file is empty")]
    Empty,
    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub text: String,
}

pub fn validate_upload(file_name: &str, bytes: &[u8]) -> Result<(), DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }
    if !file_name.to_ascii_lowercase().ends_with(".pdf") || !bytes.starts_with(PDF_MAGIC) {
        return Err(DocumentError::NotPdf(file_name.to_string()));
    }
    Ok(())
}

/// Runs pdf-extract off the async runtime; a panic inside the parser is
/// reported as an extraction error.
pub async fn extract_pdf_pages(bytes: Vec<u8>) -> Result<Vec<Page>, DocumentError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            warn!("PDF extraction task failed: {}", e);
            DocumentError::Extraction("parser aborted".to_string())
        })?
        .map_err(|e| DocumentError::Extraction(e.to_string()))?;

    let pages = split_pages(&text);
    debug!("Extracted {} characters across {} pages", text.len(), pages.len());
    Ok(pages)
}

/// Pages are separated by form feeds when the extractor emits them.
pub fn split_pages(text: &str) -> Vec<Page> {
    text.split('\u{c}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Page {
            number: i + 1,
            text: page.to_string(),
        })
        .collect()
}
