//! Request handlers

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::ConnectionTrait;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, warn};

use super::AppState;
use super::responses::{HealthResponse, handle_error, handle_result};
use crate::errors::AppError;
use crate::models::{LogoFormat, LogoRequest};

/// Response header naming the path that produced the bytes
pub const LOGO_CACHE_HEADER: &str = "x-logo-cache";

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Response {
    let backend = state.database.connection.get_database_backend();
    match state.database.connection.ping().await {
        Ok(()) => (StatusCode::OK, axum::Json(HealthResponse::healthy())).into_response(),
        Err(e) => {
            warn!("Health check: {:?} database unreachable: {}", backend, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(HealthResponse::unhealthy("Database connection failed".to_string())),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoQuery {
    #[serde(rename = "type")]
    pub format: Option<String>,
    pub size: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bg: Option<String>,
}

impl LogoQuery {
    fn into_request(self, name: String) -> Result<LogoRequest, AppError> {
        let format = match self.format.as_deref().map(str::trim) {
            None | Some("") => LogoFormat::Png,
            Some(raw) => LogoFormat::from_str(raw)
                .map_err(|_| AppError::validation(format!("unsupported logo type '{raw}'")))?,
        };
        Ok(LogoRequest {
            name,
            format,
            size: self.size,
            width: self.width,
            height: self.height,
            background: self.bg,
        })
    }
}

/// `GET /api/v1/logos/{name}`
pub async fn get_logo(
    State(state): State<AppState>,
    Path(name): Path<String>,
    query: Result<Query<LogoQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return handle_error(AppError::validation(rejection.body_text())),
    };
    let request = match query.into_request(name) {
        Ok(request) => request,
        Err(e) => return handle_error(e),
    };

    let logo = match state.resolver.resolve(&request).await {
        Ok(logo) => logo,
        Err(e) => return handle_error(e),
    };
    debug!(
        "Serving {} ({} bytes, {})",
        logo.artifact_name,
        logo.bytes.len(),
        logo.source
    );

    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", logo.artifact_name))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));
    let cache_state = HeaderValue::from_static(logo.source.as_str());

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(logo.format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
            (header::HeaderName::from_static(LOGO_CACHE_HEADER), cache_state),
        ],
        logo.bytes,
    )
        .into_response()
}

/// `POST /api/v1/logos/cleanup`
pub async fn clean_expired(State(state): State<AppState>) -> Response {
    handle_result(state.sweeper.clean_expired(Utc::now()).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_to_png() {
        let request = LogoQuery {
            size: Some(64),
            ..LogoQuery::default()
        }
        .into_request("sdut".to_string())
        .unwrap();
        assert_eq!(request.format, LogoFormat::Png);
        assert_eq!(request.size, Some(64));
    }

    #[test]
    fn test_query_rejects_unknown_type() {
        let err = LogoQuery {
            format: Some("gif".to_string()),
            ..LogoQuery::default()
        }
        .into_request("sdut".to_string())
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_query_accepts_jpeg_alias() {
        let request = LogoQuery {
            format: Some("JPEG".to_string()),
            ..LogoQuery::default()
        }
        .into_request("sdut".to_string())
        .unwrap();
        assert_eq!(request.format, LogoFormat::Jpeg);
    }
}
