use crate::records::LocatePolicy;
use crate::store::RedisSettings;
use crate::vector::VectorEndpoints;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configuration was initialized twice.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for the edu API server and maintenance tools.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection settings for the shared Redis instance.
    pub redis: RedisSettings,
    /// Port the HTTP server binds to.
    pub server_port: u16,
    /// Upsert and search endpoints of the vector service.
    pub vector: VectorEndpoints,
    /// Prediction endpoint producing document titles.
    pub name_generator_url: String,
    /// Prediction endpoint producing quiz XML.
    pub quiz_generator_url: String,
    /// Timeout applied to vector service calls.
    pub vector_timeout: Duration,
    /// Timeout applied to name generation calls.
    pub name_timeout: Duration,
    /// Timeout applied to quiz generation calls.
    pub quiz_timeout: Duration,
    /// Lookup policy used after ingesting through the vector service.
    pub locate: LocatePolicy,
    /// Largest accepted multipart upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            redis: RedisSettings {
                host: load_env_optional("REDIS_HOST").unwrap_or_else(|| "127.0.0.1".into()),
                port: parse_env_or("REDIS_PORT", 6379)?,
                db: parse_env_or("REDIS_DB", 0)?,
                password: load_env_optional("REDIS_PASSWORD"),
            },
            server_port: parse_env_or("SERVER_PORT", 5020)?,
            vector: VectorEndpoints {
                upsert_url: load_env("VECTOR_UPSERT_API_URL")?,
                search_url: load_env("VECTOR_SEARCH_API_URL")?,
            },
            name_generator_url: load_env("NAME_GENERATOR_API_URL")?,
            quiz_generator_url: load_env("QUIZ_GENERATOR_API_URL")?,
            vector_timeout: Duration::from_secs(parse_env_or("VECTOR_TIMEOUT_SECS", 15)?),
            name_timeout: Duration::from_secs(parse_env_or("NAME_TIMEOUT_SECS", 10)?),
            quiz_timeout: Duration::from_secs(parse_env_or("QUIZ_TIMEOUT_SECS", 30)?),
            locate: LocatePolicy {
                attempts: parse_env_or("LOCATE_ATTEMPTS", 5)?,
                delay: Duration::from_millis(parse_env_or("LOCATE_DELAY_MS", 1000)?),
            },
            max_upload_bytes: parse_env_or::<usize>("MAX_UPLOAD_MB", 50)?
                .saturating_mul(1024 * 1024),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(default))
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment (and `.env`) and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        redis = %config.redis.address(),
        db = config.redis.db,
        server_port = config.server_port,
        vector_upsert = %config.vector.upsert_url,
        "Loaded configuration"
    );
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}
