//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`; failures become a status code
//! and a JSON body of the form `{ "error": "message" }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mailcanvas_core::{CanvasError, StoreError};
use serde_json::json;
use thiserror::Error;

use crate::design::DesignError;
use crate::metrics;
use crate::validation::ValidationError;

/// Errors surfaced by the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Template store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Canvas model failure.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    /// AI gateway failure.
    #[error(transparent)]
    Design(#[from] DesignError),
    /// A required query parameter is missing.
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),
    /// A query parameter has an unusable value.
    #[error("{0}")]
    BadRequest(String),
    /// Nothing matched the request.
    #[error("{0}")]
    NotFound(String),
    /// No API key is configured.
    #[error("AI design is not configured")]
    DesignUnavailable,
    /// Another generation is in flight.
    #[error("A design is already being generated")]
    DesignBusy,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingParameter(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(err) => match err {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::DuplicateShortcode(_) => StatusCode::CONFLICT,
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::Io(_) | StoreError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Canvas(err) | Self::Design(DesignError::Design(err)) => canvas_status(err),
            Self::Design(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DesignUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::DesignBusy => StatusCode::CONFLICT,
        }
    }
}

fn canvas_status(err: &CanvasError) -> StatusCode {
    match err {
        CanvasError::Validation(_) | CanvasError::Serialization(_) => StatusCode::BAD_REQUEST,
        CanvasError::ElementNotFound(_) => StatusCode::NOT_FOUND,
        CanvasError::InvalidOperation(_) => StatusCode::CONFLICT,
        CanvasError::NothingFound => StatusCode::UNPROCESSABLE_ENTITY,
        CanvasError::InvalidDesign(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Validation(err) = &self {
            metrics::record_validation_failure(err.kind());
        }
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{self}");
        } else {
            tracing::debug!(status = status.as_u16(), "{self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ValidationError::NameRequired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StoreError::DuplicateShortcode("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CanvasError::NothingFound).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(DesignError::EmptyResponse).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(DesignError::Design(CanvasError::Validation("blank".into()))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DesignUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::DesignBusy.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::MissingParameter("shortcode").to_string(),
            "Missing shortcode parameter"
        );
        assert_eq!(
            ApiError::NotFound("Template not found".into()).to_string(),
            "Template not found"
        );
    }
}
