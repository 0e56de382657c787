use std::sync::Arc;

use crate::api::queue::{JobProducer, RedisPool};
use crate::application::RetrievalService;
use crate::domain::ports::VectorIndex;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub redis_pool: RedisPool,
    pub job_producer: JobProducer,
    pub retrieval: Arc<RetrievalService>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        redis_pool: RedisPool,
        retrieval: Arc<RetrievalService>,
        vector_index: Arc<dyn VectorIndex>,
        config: AppConfig,
    ) -> Self {
        let config = Arc::new(config);
        let job_producer =
            JobProducer::new(redis_pool.clone(), config.config.worker.result_ttl_seconds);
        Self {
            redis_pool,
            job_producer,
            retrieval,
            vector_index,
            config,
        }
    }
}
