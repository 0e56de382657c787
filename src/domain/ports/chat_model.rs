use crate::domain::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Requests one completion for `prompt` under `system`. Provider
    /// failures surface as `ChatProvider` errors; they are never swallowed.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError>;
}
