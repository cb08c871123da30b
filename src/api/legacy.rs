//! Range listing kept for older clients.

use super::error::ApiError;
use crate::records::{RecordService, SliceEntry, parse_range};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

pub(super) fn routes() -> Router<Arc<RecordService>> {
    Router::new().route("/courses/:start/:stop", get(slice_courses))
}

#[derive(Serialize)]
struct SliceResponse {
    documents: Vec<SliceEntry>,
}

/// Materials `[start, stop)` in sequence order; bounds are validated before any store access.
async fn slice_courses(
    State(service): State<Arc<RecordService>>,
    Path((start, stop)): Path<(String, String)>,
) -> Result<Json<SliceResponse>, ApiError> {
    let (start, stop) = parse_range(&start, &stop)?;
    let documents = service.slice_materials(start, stop).await?;
    Ok(Json(SliceResponse { documents }))
}
