use serde::Deserialize;

use crate::domain::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_STORED_TEXT_LIMIT};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub redis_url: String,
    pub qdrant: QdrantConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u64,
    pub temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub stored_text_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub result_ttl_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cors: CorsConfig::default(),
            redis_url: "redis://localhost:6379".to_string(),
            qdrant: QdrantConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "document_chunks".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimension: 1536,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            stored_text_limit: DEFAULT_STORED_TEXT_LIMIT,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            result_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub chat: ChatPrompts,
}

/// System-prompt templates for the grounding orchestrator. The grounded
/// variants carry a `{context}` placeholder that is replaced with the
/// labeled context block at call time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub grounded_file: String,
    pub grounded_folder: String,
    pub grounded_user: String,
    pub ungrounded_file: String,
    pub ungrounded_folder: String,
    pub ungrounded_user: String,
    pub empty_reply: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            chat: ChatPrompts::default(),
        }
    }
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            grounded_file: "You are an assistant helping with a document. Use the following \
                            information from the document to answer questions:\n\n{context}\n\n\
                            Answer based on this document content. Be specific and reference \
                            the information when possible."
                .to_string(),
            grounded_folder: "You are an assistant helping with multiple documents in a folder. \
                              Use the following information from the documents to answer \
                              questions:\n\n{context}\n\nAnswer based on this document content. \
                              Be specific and reference the information when possible."
                .to_string(),
            grounded_user: "You are an assistant helping with the user's documents. Use the \
                            following information from the documents to answer questions:\n\n\
                            {context}\n\nAnswer based on this document content. Be specific and \
                            reference the information when possible."
                .to_string(),
            ungrounded_file: "You are an assistant helping with a document. I wasn't able to \
                              find specific information from the document for this question. \
                              This could be because the information isn't present or there are \
                              processing issues."
                .to_string(),
            ungrounded_folder: "You are an assistant helping with documents in a folder. I \
                                wasn't able to find specific information from the documents for \
                                this question. This could be because the information isn't \
                                present or there are processing issues."
                .to_string(),
            ungrounded_user: "You are an assistant helping with the user's documents. I wasn't \
                              able to find specific information from the documents for this \
                              question. This could be because the information isn't present or \
                              there are processing issues."
                .to_string(),
            empty_reply: "I apologize, but I couldn't generate a response. Please try again."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Loads configuration from optional YAML files (`CONFIG_PATH`,
    /// `PROMPTS_PATH`), falling back to defaults, then applies service-URL
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config: Config = match std::env::var("CONFIG_PATH") {
            Ok(path) => serde_yaml::from_str(&std::fs::read_to_string(&path)?)?,
            Err(_) => Config::default(),
        };
        let prompts: PromptsConfig = match std::env::var("PROMPTS_PATH") {
            Ok(path) => serde_yaml::from_str(&std::fs::read_to_string(&path)?)?,
            Err(_) => PromptsConfig::default(),
        };

        if let Ok(url) = std::env::var("REDIS_URL") {
            config.redis_url = url;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.qdrant.url = url;
        }
        if let Ok(collection) = std::env::var("QDRANT_COLLECTION") {
            config.qdrant.collection = collection;
        }

        Ok(Self { config, prompts })
    }
}
