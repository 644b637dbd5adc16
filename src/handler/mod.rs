use axum::{
    Json,
    response::{IntoResponse, Response},
};
use reqwest::StatusCode;
use serde::Serialize;

use crate::error::RecordingError;

pub mod recording;
pub mod system;

pub type ApiResult<T> = Result<T, ApiError>;
pub type ApiJsonResult<T> = ApiResult<Json<ApiResponse<T>>>;

/// Standard response envelope: `{success, data}` for payloads, `{success,
/// message}` for bare acknowledgments.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    Recording(RecordingError),
    Validation(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, "Validation Error", message.clone())
            }
            ApiError::Recording(e) => match e {
                RecordingError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "Recording not found", e.to_string())
                }
                RecordingError::CapacityExceeded { .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Capacity exceeded",
                    e.to_string(),
                ),
                RecordingError::ShuttingDown => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service shutting down",
                    e.to_string(),
                ),
                RecordingError::Storage { .. } => {
                    log::error!("ApiError: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Storage error",
                        e.to_string(),
                    )
                }
            },
            ApiError::Internal(e) => {
                // Internals are logged, never leaked to the caller.
                log::error!("ApiError: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "service inner error".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "error": error, "message": message })),
        )
            .into_response()
    }
}

impl From<RecordingError> for ApiError {
    fn from(err: RecordingError) -> Self {
        Self::Recording(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}
