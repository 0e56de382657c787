use std::net::SocketAddr;
use std::sync::Arc;

use rig::client::ProviderClient;
use rig::providers::openai;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docchat::api::{create_router, queue, AppState};
use docchat::application::RetrievalService;
use docchat::domain::ports::VectorIndex;
use docchat::infrastructure::{AppConfig, OpenAiEmbedding, QdrantVectorIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=debug,docchat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let app_config = AppConfig::load()?;

    let redis_pool = queue::create_pool(&app_config.config.redis_url)?;
    info!("Redis pool initialized");

    let openai_client = openai::Client::from_env();
    let embedding = Arc::new(OpenAiEmbedding::from_config(
        openai_client,
        &app_config.config.embedding,
    ));
    let vector_index: Arc<dyn VectorIndex> = Arc::new(
        QdrantVectorIndex::new(
            &app_config.config.qdrant.url,
            &app_config.config.qdrant.collection,
            app_config.config.embedding.dimension,
        )
        .await?,
    );
    info!("Qdrant connected");

    let retrieval = Arc::new(RetrievalService::new(
        embedding,
        vector_index.clone(),
        app_config.config.retrieval.top_k,
    ));

    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| app_config.config.server.host.clone());
    let port: u16 = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(app_config.config.server.port);
    let addr = SocketAddr::new(host.parse()?, port);

    let state = AppState::new(redis_pool, retrieval, vector_index, app_config);
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
