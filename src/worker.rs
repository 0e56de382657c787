use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use deadpool_redis::{redis::AsyncCommands, Config, Connection, Pool, Runtime};
use rig::client::ProviderClient;
use rig::providers::openai;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docchat::application::{ChatService, IngestionService, RetrievalService};
use docchat::domain::ports::VectorIndex;
use docchat::infrastructure::{
    keys, queues, AppConfig, ChatTurnJob, DocumentTextExtractor, IngestDocumentJob, JobResult,
    OpenAiChatModel, OpenAiEmbedding, QdrantVectorIndex, RESULT_TTL_SECONDS,
};

pub type RedisPool = Pool;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Redis pool error: {0}")]
    Pool(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

pub fn create_pool(redis_url: &str) -> Result<RedisPool> {
    let cfg = Config::from_url(redis_url);
    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| WorkerError::Pool(e.to_string()))
}

pub struct WorkerState {
    pub redis_pool: RedisPool,
    pub ingestion: Arc<IngestionService>,
    pub chat: Arc<ChatService>,
}

impl WorkerState {
    pub async fn new(redis_pool: RedisPool, app_config: &AppConfig) -> anyhow::Result<Self> {
        let config = &app_config.config;

        let openai_client = openai::Client::from_env();
        let embedding = Arc::new(OpenAiEmbedding::from_config(
            openai_client.clone(),
            &config.embedding,
        ));
        let vector_index: Arc<dyn VectorIndex> = Arc::new(
            QdrantVectorIndex::new(
                &config.qdrant.url,
                &config.qdrant.collection,
                config.embedding.dimension,
            )
            .await?,
        );

        let ingestion = Arc::new(IngestionService::new(
            Arc::new(DocumentTextExtractor::new()),
            embedding.clone(),
            vector_index.clone(),
            &config.chunking,
        ));

        let retrieval = Arc::new(RetrievalService::new(
            embedding,
            vector_index,
            config.retrieval.top_k,
        ));
        let chat_model = Arc::new(OpenAiChatModel::from_config(openai_client, &config.llm));
        let chat = Arc::new(ChatService::new(
            retrieval,
            chat_model,
            app_config.prompts.chat.clone(),
        ));

        Ok(Self {
            redis_pool,
            ingestion,
            chat,
        })
    }
}

pub struct JobConsumer {
    state: Arc<WorkerState>,
    concurrency: usize,
}

impl JobConsumer {
    pub fn new(state: WorkerState, concurrency: usize) -> Self {
        Self {
            state: Arc::new(state),
            concurrency,
        }
    }

    pub async fn start(&self) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        tracing::info!(concurrency = self.concurrency, "consumer started");

        loop {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let state = self.state.clone();

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = process_next_job(&state).await {
                    tracing::error!(error = %e, "job failed");
                }
            });

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }
}

async fn conn(state: &WorkerState) -> Result<Connection> {
    state
        .redis_pool
        .get()
        .await
        .map_err(|e| WorkerError::Pool(e.to_string()))
}

async fn set_status(conn: &mut Connection, job_id: uuid::Uuid, status: &JobResult) -> Result<()> {
    let json = serde_json::to_string(status)?;
    conn.set_ex::<_, _, ()>(keys::job_status(&job_id), &json, RESULT_TTL_SECONDS)
        .await
        .map_err(|e| WorkerError::Redis(e.to_string()))
}

async fn process_next_job(state: &WorkerState) -> Result<()> {
    let mut c = conn(state).await?;

    let result: Option<(String, String)> = c
        .brpop(&[queues::CHAT_QUEUE, queues::INGEST_QUEUE], 1.0)
        .await
        .map_err(|e| WorkerError::Redis(e.to_string()))?;

    if let Some((queue, job_json)) = result {
        match queue.as_str() {
            q if q == queues::CHAT_QUEUE => {
                process_chat_job(state, serde_json::from_str(&job_json)?).await?;
            }
            q if q == queues::INGEST_QUEUE => {
                process_ingest_job(state, serde_json::from_str(&job_json)?).await?;
            }
            _ => tracing::warn!(queue, "unknown queue"),
        }
    }
    Ok(())
}

async fn process_chat_job(state: &WorkerState, job: ChatTurnJob) -> Result<()> {
    tracing::info!(job_id = %job.job_id, "processing chat turn");
    let mut c = conn(state).await?;

    set_status(&mut c, job.job_id, &JobResult::processing(job.job_id)).await?;

    let outcome = state
        .chat
        .respond(&job.messages, &job.scope, &job.user_id)
        .await;

    match outcome {
        Ok(outcome) => {
            set_status(
                &mut c,
                job.job_id,
                &JobResult::completed(
                    job.job_id,
                    serde_json::json!({
                        "reply": outcome.reply,
                        "grounded": outcome.grounded,
                        "context_chunks": outcome.context_chunks,
                        "files_searched": outcome.files_searched,
                        "files_with_hits": outcome.files_with_hits,
                    }),
                ),
            )
            .await?;
        }
        Err(e) => {
            set_status(
                &mut c,
                job.job_id,
                &JobResult::failed(job.job_id, e.to_string()),
            )
            .await?;
        }
    }

    tracing::info!(job_id = %job.job_id, "chat turn completed");
    Ok(())
}

async fn process_ingest_job(state: &WorkerState, job: IngestDocumentJob) -> Result<()> {
    tracing::info!(job_id = %job.job_id, file_id = %job.file_id, "processing ingest");
    let mut c = conn(state).await?;

    set_status(&mut c, job.job_id, &JobResult::processing(job.job_id)).await?;

    let data = match BASE64.decode(&job.data) {
        Ok(data) => data,
        Err(e) => {
            set_status(
                &mut c,
                job.job_id,
                &JobResult::failed(job.job_id, format!("invalid document payload: {e}")),
            )
            .await?;
            return Ok(());
        }
    };

    let report = state
        .ingestion
        .ingest(
            &job.file_id,
            &job.extension,
            &data,
            &job.user_id,
            job.folder_id.as_deref(),
        )
        .await;

    match report {
        Ok(report) => {
            set_status(
                &mut c,
                job.job_id,
                &JobResult::completed(
                    job.job_id,
                    serde_json::json!({
                        "file_id": report.file_id,
                        "pages": report.pages,
                        "chunks_indexed": report.chunks_indexed,
                    }),
                ),
            )
            .await?;
        }
        Err(e) => {
            set_status(
                &mut c,
                job.job_id,
                &JobResult::failed(job.job_id, e.to_string()),
            )
            .await?;
        }
    }

    tracing::info!(job_id = %job.job_id, "ingest completed");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worker=debug,docchat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let app_config = AppConfig::load()?;

    let redis_pool = create_pool(&app_config.config.redis_url)?;
    info!("Redis connected");

    let concurrency = std::env::var("WORKER_CONCURRENCY")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(app_config.config.worker.concurrency);

    let state = WorkerState::new(redis_pool, &app_config).await?;
    info!("Qdrant connected");

    let consumer = JobConsumer::new(state, concurrency);

    info!(concurrency, "worker started");
    consumer.start().await?;

    Ok(())
}
