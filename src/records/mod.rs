//! Record managers for materials, quizzes and assignments.

mod documents;
mod materials;
mod service;
mod sync;
pub mod types;

pub use documents::{DEFAULT_ASSIGNMENT_TOPIC, DEFAULT_QUIZ_TOPIC, GeneratedQuiz};
pub use materials::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, MISSING_CONTENT, parse_range};
pub use service::{LocatePolicy, RecordService};
pub use sync::{MIN_CONTENT_CHARS, is_junk_content};
pub use types::{
    Attachment, CreatedRecord, MaterialItem, RecordError, SearchResult, SliceEntry, SyncReport,
    UploadOutcome, XmlRecordItem,
};
