//! Quiz generation through the hosted quiz flow, plus parsing of the returned XML.

use crate::prediction::decode_quiz_text;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while generating or parsing a quiz.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The generator did not answer within the timeout.
    #[error("Quiz generation timed out")]
    Timeout,
    /// The generator could not be reached or answered with an error.
    #[error("Quiz service request failed: {0}")]
    Upstream(String),
    /// The reply carried no quiz XML.
    #[error("No XML content found in response")]
    MissingXml,
    /// The quiz XML could not be parsed.
    #[error("Generated quiz content was not valid XML: {0}")]
    InvalidXml(String),
}

/// One answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOption {
    /// Option text.
    pub text: String,
    /// Whether this option is correct.
    pub correct: bool,
}

/// One question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    /// Question identifier (`q<n>` when the XML has none).
    pub id: String,
    /// Question kind as declared by the generator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Question text.
    pub text: String,
    /// Answer options in document order.
    pub options: Vec<QuizOption>,
}

/// Structured view of a quiz document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuiz {
    /// Quiz topic.
    pub topic: String,
    /// Questions in document order.
    pub questions: Vec<QuizQuestion>,
}

/// Interface implemented by quiz generators; returns raw quiz XML.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Generate quiz XML for `topic`.
    async fn generate(&self, topic: &str) -> Result<String, QuizError>;
}

/// Quiz generator calling a prediction endpoint with `{"question": topic}`.
pub struct HttpQuizGenerator {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpQuizGenerator {
    /// Build a generator for `endpoint`, bounding every call by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().user_agent("edu-api/quiz").build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl QuizGenerator for HttpQuizGenerator {
    async fn generate(&self, topic: &str) -> Result<String, QuizError> {
        tracing::info!(topic, "Generating quiz");
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&json!({ "question": topic }))
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    QuizError::Timeout
                } else {
                    QuizError::Upstream(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuizError::Upstream(format!("quiz service returned {status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| QuizError::Upstream(format!("reply was not JSON: {error}")))?;

        decode_quiz_text(&body).ok_or_else(|| {
            tracing::error!(topic, reply = %body, "Quiz reply carried no XML");
            QuizError::MissingXml
        })
    }
}

fn quiz_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<(?:test|quiz)>.*?</(?:test|quiz)>").expect("quiz pattern compiles")
    })
}

/// Locate the quiz block inside free-form generator output and parse it.
pub fn parse_quiz_xml(raw: &str) -> Result<ParsedQuiz, QuizError> {
    let xml = match quiz_block().find(raw) {
        Some(found) => found.as_str(),
        None => {
            let preview: String = raw.chars().take(200).collect();
            tracing::warn!(preview, "No <test> or <quiz> block found; parsing whole reply");
            raw
        }
    };

    let document =
        roxmltree::Document::parse(xml).map_err(|error| QuizError::InvalidXml(error.to_string()))?;
    let root = document.root_element();

    let topic = trimmed_text(
        root.children().find(|node| node.has_tag_name("topic")),
        "Untitled Quiz",
    );

    let questions: Vec<QuizQuestion> = root
        .descendants()
        .filter(|node| node.has_tag_name("question"))
        .enumerate()
        .map(|(index, question)| QuizQuestion {
            id: question
                .attribute("id")
                .map_or_else(|| format!("q{}", index + 1), str::to_string),
            kind: question.attribute("type").unwrap_or("unknown").to_string(),
            text: trimmed_text(
                question.children().find(|node| node.has_tag_name("text")),
                "No question text",
            ),
            options: question
                .descendants()
                .filter(|node| node.has_tag_name("option"))
                .enumerate()
                .map(|(position, option)| QuizOption {
                    text: option.text().map_or_else(
                        || format!("Option {}", position + 1),
                        |text| text.trim().to_string(),
                    ),
                    correct: option
                        .attribute("correct")
                        .is_some_and(|value| value.eq_ignore_ascii_case("true")),
                })
                .collect(),
        })
        .collect();

    tracing::info!(topic, questions = questions.len(), "Parsed quiz XML");
    Ok(ParsedQuiz { topic, questions })
}

fn trimmed_text(node: Option<roxmltree::Node<'_, '_>>, fallback: &str) -> String {
    node.and_then(|node| node.text())
        .map_or_else(|| fallback.to_string(), |text| text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    const SAMPLE: &str = r#"Here is your quiz:
<test>
  <topic> Arithmetic </topic>
  <question id="a1" type="multiple_choice">
    <text>What is 2+2?</text>
    <option>3</option>
    <option correct="TRUE">4</option>
  </question>
  <question>
    <option correct="false"></option>
  </question>
</test>
Good luck!"#;

    #[test]
    fn parses_embedded_quiz_block() {
        let quiz = parse_quiz_xml(SAMPLE).expect("quiz");
        assert_eq!(quiz.topic, "Arithmetic");
        assert_eq!(quiz.questions.len(), 2);

        let first = &quiz.questions[0];
        assert_eq!(first.id, "a1");
        assert_eq!(first.kind, "multiple_choice");
        assert_eq!(first.text, "What is 2+2?");
        assert_eq!(
            first.options,
            vec![
                QuizOption { text: "3".into(), correct: false },
                QuizOption { text: "4".into(), correct: true },
            ]
        );
    }

    #[test]
    fn applies_defaults_for_missing_parts() {
        let quiz = parse_quiz_xml(SAMPLE).expect("quiz");
        let second = &quiz.questions[1];
        assert_eq!(second.id, "q2");
        assert_eq!(second.kind, "unknown");
        assert_eq!(second.text, "No question text");
        assert_eq!(second.options[0].text, "Option 1");

        let untitled = parse_quiz_xml("<quiz></quiz>").expect("quiz");
        assert_eq!(untitled.topic, "Untitled Quiz");
        assert!(untitled.questions.is_empty());
    }

    #[test]
    fn rejects_invalid_xml() {
        assert!(matches!(
            parse_quiz_xml("<test><topic>broken</test>"),
            Err(QuizError::InvalidXml(_))
        ));
    }

    #[tokio::test]
    async fn generator_extracts_text_reply() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/prediction/quiz")
                    .json_body(json!({"question": "Fractions"}));
                then.status(200)
                    .json_body(json!({"text": "<test><topic>Fractions</topic></test>"}));
            })
            .await;

        let generator =
            HttpQuizGenerator::new(server.url("/prediction/quiz"), Duration::from_secs(5))
                .expect("client");
        let xml = generator.generate("Fractions").await.expect("xml");

        mock.assert_async().await;
        assert_eq!(xml, "<test><topic>Fractions</topic></test>");
    }

    #[tokio::test]
    async fn generator_maps_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/prediction/quiz");
                then.status(200).json_body(json!({"unexpected": true}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/prediction/broken");
                then.status(503).body("down");
            })
            .await;

        let missing =
            HttpQuizGenerator::new(server.url("/prediction/quiz"), Duration::from_secs(5))
                .expect("client");
        assert!(matches!(missing.generate("x").await, Err(QuizError::MissingXml)));

        let broken =
            HttpQuizGenerator::new(server.url("/prediction/broken"), Duration::from_secs(5))
                .expect("client");
        assert!(matches!(broken.generate("x").await, Err(QuizError::Upstream(_))));
    }
}
