//! Binary PDF routes under `/api/v1/pdfs`.

use super::error::ApiError;
use crate::records::{Attachment, RecordService};
use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

pub(super) fn routes() -> Router<Arc<RecordService>> {
    Router::new()
        .route("/by-key/*key", get(by_key))
        .route("/by-short-id/:id", get(by_short_id))
}

async fn by_key(
    State(service): State<Arc<RecordService>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    tracing::info!(key, "PDF requested by key");
    Ok(inline_pdf(service.fetch_attachment(&key).await?))
}

async fn by_short_id(
    State(service): State<Arc<RecordService>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    tracing::info!(id, "PDF requested by short id");
    Ok(inline_pdf(service.fetch_attachment_by_id(&id).await?))
}

/// Make a stored name safe inside a quoted `Content-Disposition` filename.
fn header_safe_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            ch if ch.is_control() => ' ',
            ch => ch,
        })
        .collect()
}

fn inline_pdf(attachment: Attachment) -> Response {
    let disposition = format!(
        "inline; filename=\"{}\"",
        header_safe_file_name(&attachment.file_name)
    );
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        attachment.bytes,
    )
        .into_response()
}
