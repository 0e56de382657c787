//! PDF text extraction via lopdf, one string per page.

use lopdf::Document;

use crate::domain::{DomainError, Result};

/// Extracts page texts from a PDF buffer, in page order, 1-based by
/// position. Each page's text tokens are joined with single spaces.
pub fn extract_pages(data: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(data)
        .map_err(|e| DomainError::extraction_failed(format!("failed to load PDF: {e}")))?;

    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());

    // BTreeMap keys iterate in ascending page order.
    for (&page_number, _) in &pages {
        match doc.extract_text(&[page_number]) {
            Ok(text) => texts.push(normalize_tokens(&text)),
            Err(e) => {
                // A page without a readable content stream is an empty page,
                // not a corrupt document.
                tracing::warn!(page = page_number, error = %e, "failed to extract page text");
                texts.push(String::new());
            }
        }
    }

    Ok(texts)
}

fn normalize_tokens(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
