use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, Result};
use crate::domain::Embedding;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Maximum number of characters of a chunk persisted as retrievable context.
/// The full chunk is embedded; only this prefix is stored in the index.
pub const DEFAULT_STORED_TEXT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Text,
    Docx,
}

impl FileKind {
    /// Maps a declared file extension to a supported kind.
    ///
    /// Anything outside the supported set is rejected here, before any
    /// extraction or network I/O is attempted.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Text),
            "docx" => Ok(Self::Docx),
            other => Err(DomainError::unsupported_file_type(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "txt",
            Self::Docx => "docx",
        }
    }
}

/// Metadata attached to every indexed chunk.
///
/// `user_id` is always present; the empty string is the explicit "no owner"
/// sentinel because the index rejects null metadata values. `folder_id` is
/// omitted from the payload entirely when absent so an unfiled document
/// stays distinguishable from a folder-scoped one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_id: String,
    pub page: usize,
    pub chunk_index: usize,
    pub text: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

/// The unit written to the vector index: a deterministic id, the embedding
/// of the full chunk text, and the stored metadata.
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: String,
    pub embedding: Embedding,
    pub metadata: ChunkMetadata,
}

/// One similarity match returned from the index, highest score first.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// Derives the stable chunk id for `(file_id, page, chunk_index)`.
///
/// Stable across re-ingestions of the same document id, so a re-upload
/// overwrites its prior chunks via idempotent upsert instead of piling up
/// duplicates. `page` and `chunk_index` are both 1-based.
pub fn chunk_id(file_id: &str, page: usize, chunk_index: usize) -> String {
    format!("{file_id}-{page}-{chunk_index}")
}

/// Truncates text to at most `limit` characters on a character boundary.
pub fn stored_text_prefix(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Splits page text into overlapping chunks on word boundaries.
///
/// Words are packed greedily up to `chunk_size` characters; the next chunk
/// re-seeds with the trailing words of the previous one, up to `overlap`
/// characters, so context is not severed at a boundary. A single word longer
/// than `chunk_size` forms its own oversized chunk.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        // Overlap must leave room for forward progress.
        let overlap = overlap.min(chunk_size.saturating_sub(1));
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let mut end = start;
            let mut len = 0;

            while end < words.len() {
                let word_len = words[end].chars().count();
                let sep = usize::from(end > start);
                if end > start && len + sep + word_len > self.chunk_size {
                    break;
                }
                len += sep + word_len;
                end += 1;
            }

            chunks.push(words[start..end].join(" "));

            if end >= words.len() {
                break;
            }

            // Walk back over trailing words until roughly `overlap` characters
            // are re-included, always keeping at least one new word of progress.
            let mut next = end;
            let mut overlap_len = 0;
            while next > start + 1 {
                let word_len = words[next - 1].chars().count() + 1;
                if overlap_len + word_len > self.overlap {
                    break;
                }
                overlap_len += word_len;
                next -= 1;
            }
            start = next;
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}
