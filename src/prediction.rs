//! Decoders for replies from the hosted prediction endpoints.
//!
//! Prediction flows answer in more than one shape. Each decoder tries the known shapes in
//! priority order and returns `None` when none of them match.

use serde::Deserialize;
use serde_json::Value;

/// Agent whose messages carry generated quiz XML in list envelopes.
const QUIZ_AGENT: &str = "QuizGenerator";

/// Recognized single-answer reply shapes, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionReply {
    /// `{"text": "..."}`
    Text(String),
    /// `{"output": "..."}`
    Output(String),
}

impl PredictionReply {
    /// Decode a reply, preferring `text` over `output`.
    pub fn decode(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if let Some(Value::String(text)) = object.get("text") {
            return Some(Self::Text(text.clone()));
        }
        if let Some(Value::String(output)) = object.get("output") {
            return Some(Self::Output(output.clone()));
        }
        None
    }

    /// Answer text with surrounding whitespace removed.
    pub fn into_trimmed(self) -> String {
        match self {
            Self::Text(text) | Self::Output(text) => text.trim().to_string(),
        }
    }
}

#[derive(Deserialize)]
struct AgentEnvelope {
    #[serde(rename = "agentName", default)]
    agent_name: Option<String>,
    #[serde(default)]
    messages: Vec<Value>,
}

/// Pull generated quiz text out of a quiz-generator reply.
///
/// Accepts `{"text": ...}` objects and list envelopes whose `QuizGenerator` entry has a
/// message that is either an object with `text` or a bare string containing a quiz tag.
pub fn decode_quiz_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(object) => match object.get("text") {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        },
        Value::Array(items) => items.iter().find_map(agent_message_text),
        _ => None,
    }
}

fn agent_message_text(item: &Value) -> Option<String> {
    let envelope = AgentEnvelope::deserialize(item).ok()?;
    if envelope.agent_name.as_deref() != Some(QUIZ_AGENT) {
        return None;
    }
    envelope.messages.iter().find_map(|message| match message {
        Value::Object(object) => match object.get("text") {
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        },
        Value::String(text) if text.contains("<test>") || text.contains("<quiz>") => {
            Some(text.clone())
        }
        _ => None,
    })
}
