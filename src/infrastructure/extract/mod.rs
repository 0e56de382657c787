pub mod docx;
pub mod pdf;

use async_trait::async_trait;

use crate::domain::{ports::TextExtractor, DomainError, FileKind, Result};

/// Extractor over the supported upload formats. PDF and DOCX parsing are
/// CPU-bound blocking work and run on the blocking thread pool.
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocumentTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for DocumentTextExtractor {
    async fn extract_pages(&self, data: &[u8], kind: FileKind) -> Result<Vec<String>> {
        match kind {
            FileKind::Pdf => {
                let data = data.to_vec();
                tokio::task::spawn_blocking(move || pdf::extract_pages(&data))
                    .await
                    .map_err(|e| DomainError::internal(format!("extraction task failed: {e}")))?
            }
            FileKind::Text => Ok(vec![String::from_utf8_lossy(data).into_owned()]),
            FileKind::Docx => {
                let data = data.to_vec();
                tokio::task::spawn_blocking(move || docx::extract_text(&data).map(|text| vec![text]))
                    .await
                    .map_err(|e| DomainError::internal(format!("extraction task failed: {e}")))?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_txt_yields_single_unit() {
        let extractor = DocumentTextExtractor::new();
        let pages = extractor
            .extract_pages(b"line one\nline two", FileKind::Text)
            .await
            .unwrap();

        assert_eq!(pages, vec!["line one\nline two".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_surfaces_extraction_failed() {
        let extractor = DocumentTextExtractor::new();
        let err = extractor
            .extract_pages(b"not a pdf", FileKind::Pdf)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ExtractionFailed(_)));
    }
}
