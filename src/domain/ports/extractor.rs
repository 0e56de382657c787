use crate::domain::{errors::DomainError, FileKind};
use async_trait::async_trait;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Converts a raw document buffer into one plain-text string per logical
    /// page/unit, in order (PDF: one per page; TXT and DOCX: a single
    /// element). An all-empty sequence is legitimate output here; the
    /// ingestion pipeline is what turns it into `NoTextContent`.
    async fn extract_pages(&self, data: &[u8], kind: FileKind) -> Result<Vec<String>, DomainError>;
}
