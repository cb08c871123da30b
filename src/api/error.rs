//! Request-level errors and the JSON body extractor.

use crate::quiz::QuizError;
use crate::records::RecordError;
use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRequest, Request, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

/// Error returned by every handler, rendered as `{"success": false, "error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input was rejected (400).
    #[error("{0}")]
    Validation(String),
    /// Request body exceeds the configured limit (413).
    #[error("{0}")]
    PayloadTooLarge(String),
    /// Addressed record is absent (404).
    #[error("{0}")]
    NotFound(String),
    /// Record store unavailable (503).
    #[error("{0}")]
    Store(String),
    /// External service failed (502).
    #[error("{0}")]
    Upstream(String),
    /// External service timed out (504).
    #[error("{0}")]
    UpstreamTimeout(String),
    /// Anything else (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status associated with the variant.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "Request failed");
        } else {
            tracing::warn!(%status, error = %self, "Request rejected");
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

impl From<RecordError> for ApiError {
    fn from(inner: RecordError) -> Self {
        match inner {
            RecordError::Validation(message) => Self::Validation(message),
            RecordError::NotFound(message) => Self::NotFound(message),
            RecordError::Store(error) => {
                tracing::error!(%error, "Record store failure");
                Self::Store("Could not connect to data store".into())
            }
            RecordError::Upstream(message) => Self::Upstream(message),
        }
    }
}

impl From<QuizError> for ApiError {
    fn from(inner: QuizError) -> Self {
        match inner {
            QuizError::Timeout => Self::UpstreamTimeout(inner.to_string()),
            QuizError::Upstream(_) => Self::Upstream(inner.to_string()),
            QuizError::MissingXml | QuizError::InvalidXml(_) => Self::Internal(inner.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(inner: MultipartError) -> Self {
        let message = format!("Invalid multipart body: {}", inner.body_text());
        if inner.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::Validation(message)
        }
    }
}

/// JSON body whose rejections render as [`ApiError::Validation`].
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn record_errors_map_to_statuses() {
        let cases = [
            (RecordError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (RecordError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                RecordError::Store(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (RecordError::Upstream("vector".into()), StatusCode::BAD_GATEWAY),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn quiz_errors_map_to_statuses() {
        assert_eq!(ApiError::from(QuizError::Timeout).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::from(QuizError::Upstream("refused".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(QuizError::MissingXml).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
