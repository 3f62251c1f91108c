use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::models::ApiError;

/// Field name → message, in field order for stable output.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{message}")]
    Validation {
        message: String,
        fields: FieldErrors,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("not signed in")]
    Unauthorized,
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl ConsoleError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Single-message validation failure with no field breakdown.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    /// Turns a field error map into a result: empty means valid.
    pub fn check_fields(message: &str, fields: FieldErrors) -> ConsoleResult<()> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Self::Validation {
                message: message.to_string(),
                fields,
            })
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_FAILED",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized => "UNAUTHORIZED",
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError {
            success: false,
            error: self.to_string(),
            code: Some(self.code().to_string()),
            details: self
                .field_errors()
                .and_then(|fields| serde_json::to_value(fields).ok()),
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_api_error())).into_response()
    }
}

// Malformed bodies and query strings are client mistakes like any other.
impl From<JsonRejection> for ConsoleError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for ConsoleError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_and_status() {
        let err = ConsoleError::not_found("bot", "abc");
        assert_eq!(err.to_string(), "bot 'abc' not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_check_fields_empty_is_ok() {
        assert!(ConsoleError::check_fields("bad", FieldErrors::new()).is_ok());
    }

    #[test]
    fn test_validation_details_in_envelope() {
        let mut fields = FieldErrors::new();
        fields.insert("name", "Bot name is required".to_string());
        let err = ConsoleError::check_fields("Invalid bot", fields).unwrap_err();
        let api = err.to_api_error();
        assert!(!api.success);
        assert_eq!(api.code.as_deref(), Some("VALIDATION_FAILED"));
        assert_eq!(
            api.details.unwrap()["name"],
            serde_json::json!("Bot name is required")
        );
    }
}
