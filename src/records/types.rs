//! Record shapes, field names, and errors shared by the record managers.

use crate::keys::KeyError;
use crate::store::{HashFields, StoreError, decode_lossy};
use serde::Serialize;
use thiserror::Error;

/// Primary payload of a material.
pub const FIELD_CONTENT: &str = "content";
/// Primary payload of quizzes and assignments.
pub const FIELD_XML: &str = "xml";
/// Human-supplied label of quizzes and assignments.
pub const FIELD_TOPIC: &str = "topic";
/// Generated short title.
pub const FIELD_NAME: &str = "name";
/// Optional explicit title preferred over `name` in search results.
pub const FIELD_TITLE: &str = "title";
/// Binary PDF attachment.
pub const FIELD_PDF: &str = "pdf_data";
/// Creation time in seconds since the epoch.
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Errors produced by record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Caller input failed validation.
    #[error("{0}")]
    Validation(String),
    /// The addressed record or field does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The record store failed.
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
    /// An external service produced no usable result.
    #[error("{0}")]
    Upstream(String),
}

impl From<KeyError> for RecordError {
    fn from(error: KeyError) -> Self {
        Self::Validation(error.to_string())
    }
}

/// Key and sequence of a newly created record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRecord {
    /// Full record key.
    pub key: String,
    /// Sequence number assigned to the record.
    pub index: u64,
}

/// Material as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialItem {
    /// Full record key.
    pub id: String,
    /// Text content.
    pub content: String,
    /// Generated title, empty until naming has run.
    pub name: String,
    /// Whether a PDF attachment is stored.
    pub has_pdf: bool,
    /// Creation time.
    pub timestamp: i64,
}

/// Quiz or assignment as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlRecordItem {
    /// Full record key.
    pub key: String,
    /// Human-supplied topic.
    pub topic: String,
    /// Creation time.
    pub timestamp: i64,
    /// XML document.
    pub xml: String,
}

/// Binary attachment ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name offered to the client.
    pub file_name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

/// Material matched by a semantic search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Stored content.
    pub text: String,
    /// Stored title, falling back to the generated name.
    pub title: String,
    /// Creation time.
    pub timestamp: i64,
    /// Full record key.
    pub key: String,
    /// Generated title.
    pub name: String,
    /// Whether a PDF attachment is stored.
    pub has_pdf: bool,
    /// Similarity score from the vector service.
    pub score: f64,
}

/// One entry of a range listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceEntry {
    /// Full record key.
    pub key: String,
    /// Content field, or a placeholder when it is missing.
    pub content: String,
}

/// Result of a material upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Full record key.
    pub key: String,
    /// Sequence number assigned to the record.
    pub index: u64,
    /// Title produced by the naming workflow, if any.
    pub name: Option<String>,
    /// Whether the vector service accepted the text.
    pub indexed: bool,
}

/// What the bulk naming pass did to a named record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingAction {
    /// The record had no name before.
    Named,
    /// An existing name was replaced.
    Renamed,
}

/// Log line for a record named during a bulk pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedEntry {
    /// Full record key.
    pub key: String,
    /// Title written to the record.
    pub name: String,
    /// Whether this was a first naming or a rename.
    pub action: NamingAction,
    /// First words of the content.
    pub preview: String,
}

/// Log line for a record removed during a bulk pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedEntry {
    /// Full record key.
    pub key: String,
    /// First characters of the rejected content.
    pub preview: String,
}

/// Counters and logs accumulated by a bulk naming pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Keys found in the namespace.
    pub total_keys_scanned: usize,
    /// Records sent to the name generator.
    pub processed_for_naming_or_rename: usize,
    /// Records named for the first time.
    pub named: usize,
    /// Records whose existing name was replaced.
    pub renamed: usize,
    /// Records left alone because they already had a name.
    pub already_named_skipped: usize,
    /// Records deleted for empty-looking content.
    pub deleted_short: usize,
    /// Records that could not be processed.
    pub errors: usize,
    /// Records named or renamed.
    pub named_documents_log: Vec<NamedEntry>,
    /// Records deleted.
    pub deleted_documents_log: Vec<DeletedEntry>,
    /// One-line human summary.
    pub summary: String,
}

/// Text value of `field`, decoded permissively.
pub(crate) fn text_field(fields: &HashFields, field: &str) -> Option<String> {
    fields.get(field).map(|bytes| decode_lossy(bytes))
}

/// Creation timestamp, `0` when absent or unparsable.
pub(crate) fn timestamp_field(fields: &HashFields) -> i64 {
    text_field(fields, FIELD_TIMESTAMP)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Reject empty or whitespace-only input for `field`.
pub(crate) fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, RecordError> {
    if value.trim().is_empty() {
        Err(RecordError::Validation(format!("'{field}' must not be empty")))
    } else {
        Ok(value)
    }
}

/// Current time in seconds since the epoch.
pub(crate) fn now_timestamp() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
