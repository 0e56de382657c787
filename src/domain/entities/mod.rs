mod chunk;
mod conversation;
mod embedding;
mod scope;

pub use chunk::{
    chunk_id, stored_text_prefix, ChunkMetadata, ChunkPoint, FileKind, ScoredChunk, TextSplitter,
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_STORED_TEXT_LIMIT,
};
pub use conversation::{last_user_message, Message, MessageRole};
pub use embedding::Embedding;
pub use scope::{ChunkFilter, RetrievalScope};
