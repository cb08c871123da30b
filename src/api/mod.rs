//! HTTP surface for the edu API.
//!
//! Every route lives under `/api/v1`:
//!
//! - `materials` – list, upload (JSON or multipart with a PDF), ingest through the vector
//!   service, single and bulk naming, delete, and semantic search.
//! - `pdfs` – inline PDF download by full key or by short id.
//! - `quizzes` / `assignments` – list, save and delete XML documents; quizzes can also be
//!   generated from a topic.
//! - `legacy/courses/:start/:stop` – half-open range listing of material content.
//! - `metrics` / `commands` – counters and a machine-readable route catalog.
//!
//! Handlers only translate between HTTP and [`RecordService`]; errors render through
//! [`ApiError`].

mod documents;
mod error;
mod legacy;
mod materials;
mod pdfs;

pub use error::ApiError;

use crate::metrics::MetricsSnapshot;
use crate::records::RecordService;
use axum::{
    Json, Router,
    extract::State,
    http::{Method, header},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Upload limit used when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the HTTP router over a shared record service.
///
/// `max_upload_bytes` caps the multipart PDF upload; other routes keep axum's default limit.
pub fn create_router(service: Arc<RecordService>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api = Router::new()
        .nest("/materials", materials::routes(max_upload_bytes))
        .nest("/pdfs", pdfs::routes())
        .nest("/quizzes", documents::quiz_routes())
        .nest("/assignments", documents::assignment_routes())
        .nest("/legacy", legacy::routes())
        .route("/metrics", get(get_metrics))
        .route("/commands", get(get_commands));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Return the record counters.
async fn get_metrics(State(service): State<Arc<RecordService>>) -> Json<MetricsSnapshot> {
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

const fn command(
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        method,
        path,
        description,
        request_example: None,
    }
}

/// Enumerate supported HTTP commands for discovery by clients and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            command(
                "list_materials",
                "GET",
                "/api/v1/materials",
                "List every material, newest first.",
            ),
            CommandDescriptor {
                request_example: Some(json!({
                    "text": "Photosynthesis converts light into chemical energy."
                })),
                ..command(
                    "upload_material",
                    "POST",
                    "/api/v1/materials/upload",
                    "Store a material, index it for search and generate a short title.",
                )
            },
            command(
                "upload_material_pdf",
                "POST",
                "/api/v1/materials/upload-pdf",
                "Multipart upload with a `text` field and an optional `pdf_file` part.",
            ),
            CommandDescriptor {
                request_example: Some(json!({ "text": "Document body" })),
                ..command(
                    "ingest_material",
                    "POST",
                    "/api/v1/materials/ingest",
                    "Send text to the vector service, then locate and name the stored record.",
                )
            },
            CommandDescriptor {
                request_example: Some(json!({ "key": "courses:12" })),
                ..command(
                    "sync_name",
                    "POST",
                    "/api/v1/materials/sync-name",
                    "Regenerate the title of one material.",
                )
            },
            CommandDescriptor {
                request_example: Some(json!({ "force_rename": false })),
                ..command(
                    "sync_all",
                    "POST",
                    "/api/v1/materials/sync-all",
                    "Name unnamed materials and delete materials with junk content.",
                )
            },
            CommandDescriptor {
                request_example: Some(json!({ "key": "courses:12" })),
                ..command(
                    "delete_material",
                    "POST",
                    "/api/v1/materials/delete",
                    "Delete a material by key or sequence.",
                )
            },
            CommandDescriptor {
                request_example: Some(json!({ "query": "cell division", "limit": 10 })),
                ..command(
                    "search_materials",
                    "POST",
                    "/api/v1/materials/search",
                    "Semantic search over materials; limit defaults to 10 (max 100).",
                )
            },
            command(
                "pdf_by_key",
                "GET",
                "/api/v1/pdfs/by-key/{key}",
                "Download the PDF attached to a material.",
            ),
            command(
                "pdf_by_short_id",
                "GET",
                "/api/v1/pdfs/by-short-id/{id}",
                "Download a material PDF by its sequence number.",
            ),
            command("list_quizzes", "GET", "/api/v1/quizzes", "List saved quizzes."),
            CommandDescriptor {
                request_example: Some(json!({ "xml": "<test>…</test>", "topic": "Fractions" })),
                ..command("save_quiz", "POST", "/api/v1/quizzes/save", "Save quiz XML.")
            },
            command(
                "delete_quiz",
                "POST",
                "/api/v1/quizzes/delete",
                "Delete a quiz, falling back to its legacy key.",
            ),
            CommandDescriptor {
                request_example: Some(json!({ "topic": "Fractions" })),
                ..command(
                    "generate_quiz",
                    "POST",
                    "/api/v1/quizzes/generate",
                    "Generate a quiz for a topic and return raw and parsed XML.",
                )
            },
            command(
                "list_assignments",
                "GET",
                "/api/v1/assignments",
                "List saved assignments.",
            ),
            command(
                "save_assignment",
                "POST",
                "/api/v1/assignments/save",
                "Save assignment XML.",
            ),
            command(
                "delete_assignment",
                "POST",
                "/api/v1/assignments/delete",
                "Delete an assignment by key or sequence.",
            ),
            command(
                "legacy_courses",
                "GET",
                "/api/v1/legacy/courses/{start}/{stop}",
                "Material content for sequence positions [start, stop).",
            ),
            command(
                "metrics",
                "GET",
                "/api/v1/metrics",
                "Record counters since startup.",
            ),
        ],
    })
}
