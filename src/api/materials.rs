//! Material routes under `/api/v1/materials`.

use super::error::{ApiError, JsonBody};
use crate::keys::Namespace;
use crate::records::{RecordService, SearchResult, SyncReport, UploadOutcome};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

pub(super) fn routes(max_upload_bytes: usize) -> Router<Arc<RecordService>> {
    Router::new()
        .route("/", get(list_materials))
        .route("/upload", post(upload))
        .route(
            "/upload-pdf",
            post(upload_pdf).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/ingest", post(ingest))
        .route("/sync-name", post(sync_name))
        .route("/sync-all", post(sync_all))
        .route("/delete", post(delete_material))
        .route("/search", post(search))
}

#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Deserialize)]
struct KeyRequest {
    key: String,
}

#[derive(Deserialize, Default)]
struct SyncAllRequest {
    #[serde(default)]
    force_rename: bool,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    #[serde(flatten)]
    outcome: UploadOutcome,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        Self {
            success: true,
            outcome,
        }
    }
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    count: usize,
    materials: Vec<SearchResult>,
}

#[derive(Serialize)]
struct SyncAllResponse {
    success: bool,
    results: SyncReport,
}

async fn list_materials(
    State(service): State<Arc<RecordService>>,
) -> Result<Json<Value>, ApiError> {
    let documents = service.list_materials().await?;
    Ok(Json(json!({ "success": true, "documents": documents })))
}

async fn upload(
    State(service): State<Arc<RecordService>>,
    JsonBody(request): JsonBody<TextRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let outcome = service.upload_material(&request.text, None).await?;
    Ok(Json(outcome.into()))
}

/// Multipart upload: a `text` field plus an optional `pdf_file` part.
async fn upload_pdf(
    State(service): State<Arc<RecordService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let mut text = None;
    let mut pdf = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => text = Some(field.text().await?),
            Some("pdf_file") => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let bytes = field.bytes().await?;
                tracing::info!(file_name, size = bytes.len(), "Received PDF part");
                pdf = Some(bytes.to_vec());
            }
            other => tracing::debug!(field = ?other, "Ignoring multipart field"),
        }
    }

    let text = text.ok_or_else(|| ApiError::Validation("'text' field is required".into()))?;
    let outcome = service.upload_material(&text, pdf).await?;
    Ok(Json(outcome.into()))
}

async fn ingest(
    State(service): State<Arc<RecordService>>,
    JsonBody(request): JsonBody<TextRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let outcome = service.ingest_material(&request.text).await?;
    Ok(Json(outcome.into()))
}

async fn sync_name(
    State(service): State<Arc<RecordService>>,
    JsonBody(request): JsonBody<KeyRequest>,
) -> Result<Json<Value>, ApiError> {
    let name = service.sync_name(&request.key).await?;
    Ok(Json(json!({ "success": true, "name": name })))
}

/// Body is optional; an empty body means `force_rename = false`.
async fn sync_all(
    State(service): State<Arc<RecordService>>,
    body: Bytes,
) -> Result<Json<SyncAllResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        SyncAllRequest::default()
    } else {
        serde_json::from_slice::<SyncAllRequest>(&body)
            .map_err(|error| ApiError::Validation(format!("Invalid request body: {error}")))?
    };
    let results = service.sync_all(request.force_rename).await?;
    Ok(Json(SyncAllResponse {
        success: true,
        results,
    }))
}

async fn delete_material(
    State(service): State<Arc<RecordService>>,
    JsonBody(request): JsonBody<KeyRequest>,
) -> Result<Json<Value>, ApiError> {
    let key = service.delete_record(Namespace::Materials, &request.key).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Document deleted successfully",
        "key": key,
    })))
}

async fn search(
    State(service): State<Arc<RecordService>>,
    JsonBody(request): JsonBody<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let materials = service
        .search_materials(&request.query, request.limit)
        .await?;
    Ok(Json(SearchResponse {
        success: true,
        count: materials.len(),
        materials,
    }))
}
