//! DOCX text extraction: the file is a ZIP archive whose main body lives in
//! `word/document.xml` as WordprocessingML; visible text sits in `<w:t>` runs.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::domain::{DomainError, Result};

pub fn extract_text(data: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| DomainError::extraction_failed(format!("failed to read DOCX as ZIP: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| DomainError::extraction_failed("DOCX is missing word/document.xml"))?
        .read_to_string(&mut xml)
        .map_err(|e| DomainError::extraction_failed(format!("failed to read document.xml: {e}")))?;

    Ok(collect_text_runs(&xml))
}

/// Collects the text of every `<w:t>` element, joined with single spaces.
fn collect_text_runs(xml: &str) -> String {
    let mut out = String::new();
    let mut rest = xml;

    while let Some(open) = rest.find("<w:t") {
        rest = &rest[open + 4..];
        let Some(tag_end) = rest.find('>') else { break };
        let attrs = &rest[..tag_end];
        rest = &rest[tag_end + 1..];

        // Only text runs qualify: `<w:t>` or `<w:t attr=...>`. This skips
        // `<w:tbl>`, `<w:tab/>` and other elements sharing the prefix, and
        // self-closing empty runs.
        if !(attrs.is_empty() || attrs.starts_with(' ')) || attrs.trim_end().ends_with('/') {
            continue;
        }

        let Some(close) = rest.find("</w:t>") else { break };
        let run = &rest[..close];
        rest = &rest[close + "</w:t>".len()..];

        if !run.trim().is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&decode_entities(run));
        }
    }

    out
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
