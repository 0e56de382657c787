mod chat_model;
mod embedding;
mod extractor;
mod vector_index;

pub use chat_model::ChatModel;
pub use embedding::EmbeddingService;
pub use extractor::TextExtractor;
pub use vector_index::VectorIndex;
