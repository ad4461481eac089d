//! HTTP error mapping
//!
//! Every failure on the request path ends up here and leaves as
//! `{"error": {"kind": ..., "message": ...}}`. Client errors carry a useful
//! message; server errors are opaque and only logged.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::utils::error::LeafLensError;

/// Structured error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

/// Errors raised while handling a request
#[derive(Debug)]
pub enum ApiError {
    /// No multipart field named `image`
    MissingImage,
    /// The request is not a readable multipart body
    Rejected(MultipartRejection),
    /// The multipart stream broke or exceeded the size limit
    Multipart(MultipartError),
    /// Decoding or inference failed
    Predict(LeafLensError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::MissingImage => (
                StatusCode::BAD_REQUEST,
                "missing_image",
                format!("multipart field '{}' is required", super::routes::predict::IMAGE_FIELD),
            ),
            ApiError::Rejected(rejection) => {
                (rejection.status(), "invalid_upload", rejection.body_text())
            }
            ApiError::Multipart(err) => {
                let status = err.status();
                let kind = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "invalid_upload"
                };
                (status, kind, err.body_text())
            }
            ApiError::Predict(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, "decode_error", err.to_string())
            }
            ApiError::Predict(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "inference_failure",
                "inference failed".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();

        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        } else {
            warn!("Rejected request ({}): {}", kind, message);
        }

        let body = ErrorBody {
            error: ErrorDetail {
                kind: kind.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LeafLensError> for ApiError {
    fn from(err: LeafLensError) -> Self {
        ApiError::Predict(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Rejected(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_inference_failure_is_opaque() {
        let err = ApiError::from(LeafLensError::Inference(
            "tensor shape [1, 3, 7] at /src/secret.rs".to_string(),
        ));
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.kind, "inference_failure");
        assert!(!body.error.message.contains("secret"));
    }

    #[tokio::test]
    async fn test_decode_error_is_client_error() {
        let (status, body) = body_of(LeafLensError::Decode("bad magic".into()).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.kind, "decode_error");
    }

    #[tokio::test]
    async fn test_missing_image() {
        let (status, body) = body_of(ApiError::MissingImage).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.kind, "missing_image");
        assert!(body.error.message.contains("image"));
    }
}
