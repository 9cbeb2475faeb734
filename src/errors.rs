use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found: {message}")]
    NotFound { code: &'static str, message: String },
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { kind, .. } => {
                let code = match kind {
                    crate::registry::OperationKind::Tool => "tool_not_found",
                    crate::registry::OperationKind::Prompt => "prompt_not_found",
                    crate::registry::OperationKind::Resource
                    | crate::registry::OperationKind::ResourceTemplate => "resource_not_found",
                };
                Self::not_found(code, err.to_string())
            }
            RegistryError::Validation { .. } => Self::bad_request("invalid_arguments", err.to_string()),
            RegistryError::Domain(message) => Self::bad_request("domain_error", message),
            RegistryError::Duplicate { .. }
            | RegistryError::Handler(_)
            | RegistryError::InvalidTemplate { .. } => Self::internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message.to_string())
            }
            Self::Internal { code, message } => {
                tracing::error!(error = %message, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
                details: json!({}),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::AppError;
    use crate::registry::{OperationKind, RegistryError};

    #[test]
    fn maps_registry_not_found_to_kind_specific_code() {
        let err = AppError::from(RegistryError::NotFound {
            kind: OperationKind::ResourceTemplate,
            name: "greeting".to_string(),
        });

        assert!(matches!(err, AppError::NotFound { code: "resource_not_found", .. }));
    }

    #[test]
    fn maps_validation_to_bad_request() {
        let err = AppError::from(RegistryError::validation("num", "expected number"));

        assert!(err.to_string().contains("bad request"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_error_hides_message() {
        let err = AppError::internal("secret detail");
        assert_eq!(err.to_string(), "internal error");
    }
}
