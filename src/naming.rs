//! Short document titles produced by the hosted name-generation flow.
//!
//! The generator receives the first words of a document and is asked for an exactly-three-word
//! summary. Every failure (transport, timeout, status, unknown reply shape) is logged and
//! reported as `None`, which callers treat as "try again later".

use crate::prediction::PredictionReply;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

/// Number of leading whitespace-separated words sent to the generator.
pub const EXCERPT_WORDS: usize = 40;

/// Interface implemented by title generators.
#[async_trait]
pub trait NameGenerator: Send + Sync {
    /// Produce a short title for `content`, or `None` when no title could be obtained.
    async fn generate_name(&self, content: &str) -> Option<String>;
}

/// First [`EXCERPT_WORDS`] words of `content`, joined by single spaces.
pub fn excerpt(content: &str) -> String {
    content
        .split_whitespace()
        .take(EXCERPT_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Instruction sent to the generator for `content`.
pub fn build_prompt(content: &str) -> String {
    format!("Summarize this text in exactly 3 words: {}", excerpt(content))
}

/// Name generator calling a prediction endpoint with `{"question": prompt}`.
pub struct HttpNameGenerator {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpNameGenerator {
    /// Build a generator for `endpoint`, bounding every call by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().user_agent("edu-api/naming").build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl NameGenerator for HttpNameGenerator {
    async fn generate_name(&self, content: &str) -> Option<String> {
        let prompt = build_prompt(content);
        let response = match self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&json!({ "question": prompt }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) if error.is_timeout() => {
                tracing::error!(endpoint = %self.endpoint, "Name generation timed out");
                return None;
            }
            Err(error) => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    %error,
                    "Name generation request failed"
                );
                return None;
            }
        };

        let status = response.status();
        tracing::debug!(%status, "Name generation responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "Name generation returned an error status");
            return None;
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(error) => {
                tracing::error!(%error, "Name generation reply was not JSON");
                return None;
            }
        };

        match PredictionReply::decode(&body) {
            Some(reply) => {
                let name = reply.into_trimmed();
                if name.is_empty() {
                    tracing::warn!("Name generation returned an empty title");
                    None
                } else {
                    Some(name)
                }
            }
            None => {
                tracing::error!(
                    reply = %body,
                    "Name generation reply missing both 'text' and 'output'"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn generator(server: &MockServer, timeout: Duration) -> HttpNameGenerator {
        HttpNameGenerator::new(server.url("/prediction/names"), timeout).expect("client")
    }

    #[test]
    fn excerpt_keeps_first_forty_words() {
        let content = (1..=60).map(|n| n.to_string()).collect::<Vec<_>>().join("  \n");
        let words: Vec<String> = excerpt(&content).split(' ').map(str::to_string).collect();
        assert_eq!(words.len(), EXCERPT_WORDS);
        assert_eq!(words.first().map(String::as_str), Some("1"));
        assert_eq!(words.last().map(String::as_str), Some("40"));
    }

    #[test]
    fn prompt_asks_for_three_words() {
        assert_eq!(
            build_prompt("Ownership  and\tborrowing"),
            "Summarize this text in exactly 3 words: Ownership and borrowing"
        );
    }

    #[tokio::test]
    async fn returns_trimmed_text_field() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/prediction/names")
                    .json_body(serde_json::json!({
                        "question": "Summarize this text in exactly 3 words: Rust ownership rules"
                    }));
                then.status(200)
                    .json_body(serde_json::json!({ "text": "  Rust Ownership Rules \n" }));
            })
            .await;

        let name = generator(&server, Duration::from_secs(5))
            .generate_name("Rust ownership rules")
            .await;

        mock.assert_async().await;
        assert_eq!(name.as_deref(), Some("Rust Ownership Rules"));
    }

    #[tokio::test]
    async fn accepts_output_field() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/prediction/names");
                then.status(200)
                    .json_body(serde_json::json!({ "output": "Linear Algebra Basics" }));
            })
            .await;

        let name = generator(&server, Duration::from_secs(5))
            .generate_name("vectors and matrices")
            .await;
        assert_eq!(name.as_deref(), Some("Linear Algebra Basics"));
    }

    #[tokio::test]
    async fn error_status_yields_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/prediction/names");
                then.status(500).body("boom");
            })
            .await;

        assert_eq!(
            generator(&server, Duration::from_secs(5))
                .generate_name("anything")
                .await,
            None
        );
    }

    #[tokio::test]
    async fn unknown_reply_shape_yields_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/prediction/names");
                then.status(200).json_body(serde_json::json!({ "answer": "x" }));
            })
            .await;

        assert_eq!(
            generator(&server, Duration::from_secs(5))
                .generate_name("anything")
                .await,
            None
        );
    }

    #[tokio::test]
    async fn timeout_yields_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/prediction/names");
                then.status(200)
                    .delay(Duration::from_millis(800))
                    .json_body(serde_json::json!({ "text": "Too Late Now" }));
            })
            .await;

        assert_eq!(
            generator(&server, Duration::from_millis(100))
                .generate_name("anything")
                .await,
            None
        );
    }
}
