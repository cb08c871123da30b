//! Quiz and assignment routes under `/api/v1/quizzes` and `/api/v1/assignments`.

use super::error::{ApiError, JsonBody};
use crate::keys::Namespace;
use crate::quiz::ParsedQuiz;
use crate::records::RecordService;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

type Shared = State<Arc<RecordService>>;

pub(super) fn quiz_routes() -> Router<Arc<RecordService>> {
    document_routes(Namespace::Quizzes, "quizzes", "Quiz").route("/generate", post(generate))
}

pub(super) fn assignment_routes() -> Router<Arc<RecordService>> {
    document_routes(Namespace::Assignments, "assignments", "Assignment")
}

/// List, save and delete routes shared by the XML namespaces.
///
/// `collection` names the list in the listing response; `label` prefixes messages.
fn document_routes(
    namespace: Namespace,
    collection: &'static str,
    label: &'static str,
) -> Router<Arc<RecordService>> {
    Router::new()
        .route(
            "/",
            get(move |State(service): Shared| async move {
                let items = service.list_documents(namespace).await?;
                Ok::<_, ApiError>(Json(json!({ "success": true, collection: items })))
            }),
        )
        .route(
            "/save",
            post(
                move |State(service): Shared, JsonBody(request): JsonBody<SaveRequest>| async move {
                    let created = service
                        .save_document(namespace, &request.xml, request.topic.as_deref())
                        .await?;
                    Ok::<_, ApiError>(Json(json!({
                        "success": true,
                        "key": created.key,
                        "index": created.index,
                    })))
                },
            ),
        )
        .route(
            "/delete",
            post(move |State(service): Shared, JsonBody(request): JsonBody<DeleteRequest>| {
                delete(service, namespace, label, request)
            }),
        )
}

#[derive(Deserialize)]
struct SaveRequest {
    xml: String,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Deserialize)]
struct DeleteRequest {
    key: String,
}

async fn delete(
    service: Arc<RecordService>,
    namespace: Namespace,
    label: &'static str,
    request: DeleteRequest,
) -> Result<Json<Value>, ApiError> {
    let key = service
        .delete_record(namespace, &request.key)
        .await
        .map_err(|error| match ApiError::from(error) {
            ApiError::NotFound(_) => {
                ApiError::NotFound(format!("{label} not found: {}", request.key.trim()))
            }
            other => other,
        })?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{label} deleted successfully"),
        "key": key,
    })))
}

#[derive(Deserialize)]
struct GenerateRequest {
    topic: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    success: bool,
    quiz_xml: String,
    parsed_quiz: ParsedQuiz,
}

async fn generate(
    State(service): Shared,
    JsonBody(request): JsonBody<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::Validation("'topic' must not be empty".into()));
    }
    let generated = service.generate_quiz(topic).await?;
    Ok(Json(GenerateResponse {
        success: true,
        quiz_xml: generated.raw_xml,
        parsed_quiz: generated.quiz,
    }))
}
