//! Wiring shared by the server and the maintenance CLI.

use crate::config::Config;
use crate::naming::HttpNameGenerator;
use crate::quiz::HttpQuizGenerator;
use crate::records::RecordService;
use crate::store::RedisStore;
use crate::vector::HttpVectorIndex;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Connect to Redis and build the HTTP adapters described by `config`.
pub async fn build_service(config: &Config) -> Result<RecordService> {
    tracing::info!(redis = %config.redis.address(), "Connecting to record store");
    let store = RedisStore::connect(&config.redis)
        .await
        .with_context(|| format!("failed to connect to Redis at {}", config.redis.address()))?;

    let namer = HttpNameGenerator::new(config.name_generator_url.clone(), config.name_timeout)
        .context("failed to build name generator client")?;
    let vectors = HttpVectorIndex::new(config.vector.clone(), config.vector_timeout)
        .context("failed to build vector service client")?;
    let quizzes = HttpQuizGenerator::new(config.quiz_generator_url.clone(), config.quiz_timeout)
        .context("failed to build quiz generator client")?;

    Ok(RecordService::new(
        Arc::new(store),
        Arc::new(namer),
        Arc::new(vectors),
        Arc::new(quizzes),
    )
    .with_locate_policy(config.locate))
}
