//! Adapter for the hosted vector-search service.
//!
//! Two calls are exposed: upsert a document's text (optionally tagged with its record key) and
//! search for the top matches of a query. Both are bounded by a timeout and never propagate
//! transport errors; a failed call logs its cause and yields `None`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

/// One search hit as reported by the vector service.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    /// Record key stored in the match metadata, if any.
    pub key: Option<String>,
    /// Similarity score.
    pub score: f64,
}

/// Interface implemented by vector-search backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Store `text` for semantic search, tagging it with `key` when given.
    async fn store_text(&self, text: &str, key: Option<&str>) -> Option<Value>;

    /// Return up to `limit` matches for `query`.
    async fn search(&self, query: &str, limit: usize) -> Option<Vec<VectorMatch>>;
}

/// Endpoints of the vector service.
#[derive(Debug, Clone)]
pub struct VectorEndpoints {
    /// URL receiving upsert requests.
    pub upsert_url: String,
    /// URL receiving search requests.
    pub search_url: String,
}

/// HTTP client for the vector service's `overrideConfig` API.
pub struct HttpVectorIndex {
    http: Client,
    endpoints: VectorEndpoints,
    timeout: Duration,
}

impl HttpVectorIndex {
    /// Build a client for `endpoints`, bounding each call by `timeout`.
    pub fn new(endpoints: VectorEndpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().user_agent("edu-api/vector").build()?;
        tracing::debug!(
            upsert = %endpoints.upsert_url,
            search = %endpoints.search_url,
            "Initialized vector service client"
        );
        Ok(Self {
            http,
            endpoints,
            timeout,
        })
    }

    async fn post(&self, url: &str, body: &Value, operation: &'static str) -> Option<Value> {
        let response = match self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) if error.is_timeout() => {
                tracing::error!(operation, url, "Vector service call timed out");
                return None;
            }
            Err(error) => {
                tracing::error!(operation, url, %error, "Vector service call failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(operation, %status, body, "Vector service returned an error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(operation, %error, "Vector service reply was not JSON");
                None
            }
        }
    }
}

/// Request body for an upsert.
pub fn upsert_body(text: &str, key: Option<&str>) -> Value {
    let mut config = Map::new();
    config.insert("text".into(), Value::String(text.to_string()));
    if let Some(key) = key {
        config.insert("metadata".into(), json!({ "key": key }));
    }
    json!({ "overrideConfig": config })
}

/// Request body for a search.
pub fn search_body(query: &str, limit: usize) -> Value {
    json!({
        "overrideConfig": {
            "query": query,
            "limit": limit,
        }
    })
}

#[derive(Deserialize)]
struct SearchReply {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Deserialize)]
struct RawMatch {
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(default)]
    score: Option<f64>,
}

/// Decode a search reply; a reply without `matches` means no hits.
pub fn decode_matches(reply: Value) -> Option<Vec<VectorMatch>> {
    let parsed = match SearchReply::deserialize(reply) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::error!(%error, "Vector search reply had an unexpected shape");
            return None;
        }
    };
    Some(
        parsed
            .matches
            .into_iter()
            .map(|raw| VectorMatch {
                key: raw
                    .metadata
                    .and_then(|mut metadata| match metadata.remove("key") {
                        Some(Value::String(key)) if !key.is_empty() => Some(key),
                        _ => None,
                    }),
                score: raw.score.unwrap_or(0.0),
            })
            .collect(),
    )
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn store_text(&self, text: &str, key: Option<&str>) -> Option<Value> {
        let preview: String = text.chars().take(100).collect();
        tracing::info!(key = key.unwrap_or("n/a"), preview, "Storing document in vector service");
        let reply = self
            .post(&self.endpoints.upsert_url, &upsert_body(text, key), "upsert")
            .await?;
        tracing::info!(reply = %reply, "Vector upsert completed");
        Some(reply)
    }

    async fn search(&self, query: &str, limit: usize) -> Option<Vec<VectorMatch>> {
        tracing::info!(query, limit, "Searching vector service");
        let reply = self
            .post(&self.endpoints.search_url, &search_body(query, limit), "search")
            .await?;
        tracing::debug!(reply = %reply, "Vector search reply");
        decode_matches(reply)
    }
}
