use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::application::services::retrieval::{RetrievalService, ScopeRetrieval};
use crate::domain::{
    last_user_message, ports::ChatModel, DomainError, Message, RetrievalScope, ScoredChunk,
};
use crate::infrastructure::config::ChatPrompts;

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub reply: String,
    pub grounded: bool,
    pub context_chunks: usize,
    pub files_searched: usize,
    pub files_with_hits: usize,
}

/// Grounds one chat turn in retrieved document content and delegates to the
/// chat model. Retrieval problems degrade the turn to an explicitly
/// ungrounded prompt; completion failures surface to the caller.
pub struct ChatService {
    retrieval: Arc<RetrievalService>,
    chat: Arc<dyn ChatModel>,
    prompts: ChatPrompts,
}

impl ChatService {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        chat: Arc<dyn ChatModel>,
        prompts: ChatPrompts,
    ) -> Self {
        Self {
            retrieval,
            chat,
            prompts,
        }
    }

    #[instrument(skip(self, messages), fields(user_id = %user_id, messages = messages.len()))]
    pub async fn respond(
        &self,
        messages: &[Message],
        scope: &RetrievalScope,
        user_id: &str,
    ) -> Result<ChatOutcome, DomainError> {
        let retrieval = match last_user_message(messages) {
            Some(message) => {
                self.retrieval
                    .retrieve_for_scope(&message.content, scope, user_id)
                    .await
            }
            None => ScopeRetrieval::default(),
        };

        let grounded = !retrieval.chunks.is_empty();
        let system = self.system_prompt(scope, &retrieval.chunks);
        let prompt = build_prompt(messages);

        let reply = self.chat.complete(&system, &prompt).await?;
        let reply = if reply.trim().is_empty() {
            self.prompts.empty_reply.clone()
        } else {
            reply
        };

        info!(
            grounded,
            context_chunks = retrieval.chunks.len(),
            files_searched = retrieval.files_searched,
            files_with_hits = retrieval.files_with_hits,
            "chat turn completed"
        );

        Ok(ChatOutcome {
            reply,
            grounded,
            context_chunks: retrieval.chunks.len(),
            files_searched: retrieval.files_searched,
            files_with_hits: retrieval.files_with_hits,
        })
    }

    /// The assistant is always told whether it is grounded: a turn with no
    /// retrieved content gets the explicit "nothing found" prompt rather
    /// than no system message at all.
    fn system_prompt(&self, scope: &RetrievalScope, chunks: &[ScoredChunk]) -> String {
        if chunks.is_empty() {
            return match scope {
                RetrievalScope::File { .. } => self.prompts.ungrounded_file.clone(),
                RetrievalScope::Folder { .. } => self.prompts.ungrounded_folder.clone(),
                RetrievalScope::AllDocuments => self.prompts.ungrounded_user.clone(),
            };
        }

        let template = match scope {
            RetrievalScope::File { .. } => &self.prompts.grounded_file,
            RetrievalScope::Folder { .. } => &self.prompts.grounded_folder,
            RetrievalScope::AllDocuments => &self.prompts.grounded_user,
        };
        template.replace("{context}", &context_block(chunks))
    }
}

fn context_block(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Context {}]: {}", i + 1, chunk.metadata.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Flattens the history into a single completion prompt, keeping the most
/// recent user turn as the current message.
fn build_prompt(messages: &[Message]) -> String {
    let Some(current_idx) = messages
        .iter()
        .rposition(|m| matches!(m.role, crate::domain::MessageRole::User))
    else {
        return flatten(messages);
    };

    let history = &messages[..current_idx];
    let current = &messages[current_idx];

    if history.is_empty() {
        return current.content.clone();
    }

    format!(
        "Previous conversation:\n{}\n\nCurrent message from user: {}",
        flatten(history),
        current.content
    )
}

fn flatten(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::domain::{
        ports::{EmbeddingService, VectorIndex},
        ChunkFilter, ChunkMetadata, ChunkPoint, Embedding,
    };
    use crate::infrastructure::vector_store::InMemoryVectorIndex;

    const DIM: usize = 4;

    /// Embeds every text to the same unit vector, so index scores depend
    /// only on the stored chunk embeddings.
    struct ConstEmbedder {
        calls: AtomicUsize,
    }

    impl ConstEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingService for ConstEmbedder {
        async fn embed(&self, _text: &str) -> Result<Embedding, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Embedding::new(vec![1.0, 0.0, 0.0, 0.0]))
        }

        fn dimension(&self) -> usize {
            DIM
        }
    }

    struct CapturingChat {
        reply: String,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl CapturingChat {
        fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn last_system(&self) -> String {
            self.calls.lock().unwrap().last().unwrap().0.clone()
        }

        fn last_prompt(&self) -> String {
            self.calls.lock().unwrap().last().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl ChatModel for CapturingChat {
        async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), prompt.to_string()));
            Ok(self.reply.clone())
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatModel for FailingChat {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, DomainError> {
            Err(DomainError::chat_provider("completion backend down"))
        }
    }

    /// Index wrapper whose first `remaining_failures` queries error out.
    struct FlakyIndex {
        inner: InMemoryVectorIndex,
        remaining_failures: AtomicUsize,
    }

    #[async_trait]
    impl VectorIndex for FlakyIndex {
        async fn upsert(&self, points: &[ChunkPoint]) -> Result<(), DomainError> {
            self.inner.upsert(points).await
        }

        async fn query(
            &self,
            embedding: &Embedding,
            filter: &ChunkFilter,
            top_k: usize,
        ) -> Result<Vec<ScoredChunk>, DomainError> {
            if self
                .remaining_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(DomainError::vector_store("transient query failure"));
            }
            self.inner.query(embedding, filter, top_k).await
        }

        async fn delete_by_file(&self, file_id: &str, user_id: &str) -> Result<(), DomainError> {
            self.inner.delete_by_file(file_id, user_id).await
        }
    }

    fn chunk(
        file_id: &str,
        user_id: &str,
        folder_id: Option<&str>,
        index: usize,
        text: &str,
        embedding: Vec<f32>,
    ) -> ChunkPoint {
        ChunkPoint {
            id: crate::domain::chunk_id(file_id, 1, index),
            embedding: Embedding::new(embedding),
            metadata: ChunkMetadata {
                file_id: file_id.to_string(),
                page: 1,
                chunk_index: index,
                text: text.to_string(),
                user_id: user_id.to_string(),
                folder_id: folder_id.map(str::to_string),
            },
        }
    }

    fn chat_service(index: Arc<dyn VectorIndex>, chat: Arc<dyn ChatModel>) -> ChatService {
        let retrieval = Arc::new(RetrievalService::new(Arc::new(ConstEmbedder::new()), index, 3));
        ChatService::new(retrieval, chat, ChatPrompts::default())
    }

    #[tokio::test]
    async fn test_grounded_turn_labels_context_in_score_order() {
        let index = Arc::new(InMemoryVectorIndex::new());
        index
            .upsert(&[
                chunk("f1", "u1", None, 3, "worst match", vec![0.2, 1.0, 0.0, 0.0]),
                chunk("f1", "u1", None, 1, "best match", vec![1.0, 0.0, 0.0, 0.0]),
                chunk("f1", "u1", None, 2, "middle match", vec![1.0, 0.5, 0.0, 0.0]),
            ])
            .await
            .unwrap();

        let chat = Arc::new(CapturingChat::new("the policy allows refunds"));
        let service = chat_service(index, chat.clone());

        let outcome = service
            .respond(
                &[Message::user("What is the refund policy?")],
                &RetrievalScope::file("f1"),
                "u1",
            )
            .await
            .unwrap();

        assert!(outcome.grounded);
        assert_eq!(outcome.context_chunks, 3);
        assert_eq!(outcome.reply, "the policy allows refunds");

        let system = chat.last_system();
        let best = system.find("[Context 1]: best match").unwrap();
        let middle = system.find("[Context 2]: middle match").unwrap();
        let worst = system.find("[Context 3]: worst match").unwrap();
        assert!(best < middle && middle < worst);
        assert!(system.contains("Answer based on this document content"));

        assert_eq!(chat.last_prompt(), "What is the refund policy?");
    }

    #[tokio::test]
    async fn test_folder_turn_grounds_when_one_member_has_chunks() {
        let index = Arc::new(InMemoryVectorIndex::new());
        index
            .upsert(&[chunk(
                "a",
                "u1",
                Some("d1"),
                1,
                "alpha content",
                vec![1.0, 0.0, 0.0, 0.0],
            )])
            .await
            .unwrap();

        let chat = Arc::new(CapturingChat::new("grounded answer"));
        let service = chat_service(index, chat.clone());

        let outcome = service
            .respond(
                &[Message::user("what do these documents say?")],
                &RetrievalScope::folder("d1", vec!["a".into(), "b".into()]),
                "u1",
            )
            .await
            .unwrap();

        assert!(outcome.grounded);
        assert_eq!(outcome.files_searched, 2);
        assert!(outcome.files_with_hits >= 1);
        assert!(chat.last_system().contains("alpha content"));
        assert!(chat
            .last_system()
            .contains("multiple documents in a folder"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_uses_explicit_ungrounded_prompt() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let chat = Arc::new(CapturingChat::new("hedged answer"));
        let service = chat_service(index, chat.clone());

        let outcome = service
            .respond(
                &[Message::user("anything in here?")],
                &RetrievalScope::file("missing-file"),
                "u1",
            )
            .await
            .unwrap();

        assert!(!outcome.grounded);
        assert_eq!(outcome.context_chunks, 0);
        assert!(chat
            .last_system()
            .contains("wasn't able to find specific information"));
    }

    #[tokio::test]
    async fn test_other_users_chunks_never_ground_a_turn() {
        let index = Arc::new(InMemoryVectorIndex::new());
        index
            .upsert(&[chunk(
                "shared-file",
                "owner",
                None,
                1,
                "private content",
                vec![1.0, 0.0, 0.0, 0.0],
            )])
            .await
            .unwrap();

        let chat = Arc::new(CapturingChat::new("reply"));
        let service = chat_service(index, chat.clone());

        let outcome = service
            .respond(
                &[Message::user("show me the private content")],
                &RetrievalScope::file("shared-file"),
                "intruder",
            )
            .await
            .unwrap();

        assert!(!outcome.grounded);
        assert!(!chat.last_system().contains("private content"));
    }

    #[tokio::test]
    async fn test_per_target_failure_degrades_instead_of_aborting() {
        let inner = InMemoryVectorIndex::new();
        inner
            .upsert(&[chunk(
                "a",
                "u1",
                Some("d1"),
                1,
                "surviving context",
                vec![1.0, 0.0, 0.0, 0.0],
            )])
            .await
            .unwrap();
        let index = Arc::new(FlakyIndex {
            inner,
            remaining_failures: AtomicUsize::new(1),
        });

        let chat = Arc::new(CapturingChat::new("reply"));
        let service = chat_service(index, chat.clone());

        let outcome = service
            .respond(
                &[Message::user("question")],
                &RetrievalScope::folder("d1", vec!["a".into(), "b".into()]),
                "u1",
            )
            .await
            .unwrap();

        // First member's query failed, second still produced context.
        assert!(outcome.grounded);
        assert_eq!(outcome.files_searched, 2);
        assert_eq!(outcome.files_with_hits, 1);
        assert!(chat.last_system().contains("surviving context"));
    }

    #[tokio::test]
    async fn test_blank_completion_falls_back_to_fixed_reply() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let chat = Arc::new(CapturingChat::new("   "));
        let service = chat_service(index, chat);

        let outcome = service
            .respond(
                &[Message::user("hello?")],
                &RetrievalScope::AllDocuments,
                "u1",
            )
            .await
            .unwrap();

        assert_eq!(outcome.reply, ChatPrompts::default().empty_reply);
    }

    #[tokio::test]
    async fn test_completion_failure_is_fatal_to_the_turn() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let service = chat_service(index, Arc::new(FailingChat));

        let err = service
            .respond(
                &[Message::user("hello?")],
                &RetrievalScope::file("f1"),
                "u1",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ChatProvider(_)));
    }

    #[tokio::test]
    async fn test_turn_without_user_message_skips_retrieval() {
        let embedder = Arc::new(ConstEmbedder::new());
        let retrieval = Arc::new(RetrievalService::new(
            embedder.clone(),
            Arc::new(InMemoryVectorIndex::new()),
            3,
        ));
        let chat = Arc::new(CapturingChat::new("reply"));
        let service = ChatService::new(retrieval, chat.clone(), ChatPrompts::default());

        let messages = vec![Message::assistant("welcome!")];
        let outcome = service
            .respond(&messages, &RetrievalScope::file("f1"), "u1")
            .await
            .unwrap();

        assert!(!outcome.grounded);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.last_prompt(), "Assistant: welcome!");
    }

    #[test]
    fn test_build_prompt_flattens_history() {
        let messages = vec![
            Message::user("first"),
            Message::assistant("answer"),
            Message::user("second"),
        ];
        let prompt = build_prompt(&messages);
        assert!(prompt.starts_with("Previous conversation:\nUser: first\nAssistant: answer"));
        assert!(prompt.ends_with("Current message from user: second"));

        assert_eq!(build_prompt(&[Message::user("only")]), "only");
    }
}
