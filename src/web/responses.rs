//! HTTP response types
//!
//! JSON endpoints answer with the [`ApiResponse`] envelope; errors from any
//! endpoint, the binary logo endpoint included, use the same envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

use crate::errors::{AppError, AppResult};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_with_details(message: String, details: HashMap<String, String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: Some(details),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    pub fn unhealthy(message: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            message: Some(message),
        }
    }
}

/// Map an [`AppError`] onto a status code and error envelope
pub fn handle_error(error: AppError) -> Response {
    let (status, message, details) = match &error {
        AppError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone(), None),
        AppError::NotFound { resource, id } => (
            StatusCode::NOT_FOUND,
            format!("{resource} '{id}' not found"),
            None,
        ),
        AppError::Conversion(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Logo conversion failed".to_string(),
            Some(HashMap::from([("cause".to_string(), e.to_string())])),
        ),
        AppError::StoreUnavailable { store, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{store} is unavailable"),
            None,
        ),
        AppError::Timeout(after) => (
            StatusCode::GATEWAY_TIMEOUT,
            format!("Logo resolution timed out after {after:?}"),
            None,
        ),
    };

    if status.is_server_error() {
        error!("Request failed: {}", error);
    }

    let response = match details {
        Some(details) => ApiResponse::<()>::error_with_details(message, details),
        None => ApiResponse::<()>::error(message),
    };
    (status, Json(response)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        handle_error(self)
    }
}

/// Wrap a result in the envelope, `200` on success
pub fn handle_result<T: Serialize>(result: AppResult<T>) -> Response {
    match result {
        Ok(data) => ok(data),
        Err(error) => handle_error(error),
    }
}

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}
