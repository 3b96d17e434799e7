use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    db::DbError,
    identity::IdentityError,
    services::{CredentialError, MappingError, SyncError, TargetError},
};

/// Error body: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorInfo {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[derive(Debug)]
pub enum AdminError {
    NotFound(String),
    Conflict(String),
    Validation(String),
    BadRequest(String),
    Unauthorized,
    /// The identity provider call failed
    Integration(String),
    Database(DbError),
    Internal(String),
}

impl From<DbError> for AdminError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => AdminError::NotFound("Resource not found".to_string()),
            DbError::Conflict(msg) => AdminError::Conflict(msg),
            DbError::Validation(msg) => AdminError::Validation(msg),
            _ => AdminError::Database(err),
        }
    }
}

impl From<MappingError> for AdminError {
    fn from(err: MappingError) -> Self {
        match err {
            MappingError::Validation(msg) => AdminError::Validation(msg),
            MappingError::NotFound => AdminError::NotFound("Mapping not found".to_string()),
            MappingError::Conflict(msg) => AdminError::Conflict(msg),
            MappingError::Database(db_err) => AdminError::Database(db_err),
        }
    }
}

impl From<CredentialError> for AdminError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Database(DbError::NotFound) => {
                AdminError::NotFound("Identity sync config not found".to_string())
            }
            CredentialError::Database(db_err) => AdminError::Database(db_err),
            CredentialError::SecretStorage(msg) | CredentialError::SecretRetrieval(msg) => {
                tracing::error!(error = %msg, "Secret manager error");
                AdminError::Internal("An internal error occurred".to_string())
            }
        }
    }
}

impl From<IdentityError> for AdminError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Credentials(cred_err) => cred_err.into(),
            other => AdminError::Integration(other.to_string()),
        }
    }
}

impl From<SyncError> for AdminError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::MappingNotFound => AdminError::NotFound("Mapping not found".to_string()),
            SyncError::Identity(e) => e.into(),
            SyncError::ClientUnavailable(msg) => AdminError::Integration(msg),
            SyncError::Target(TargetError::Database(db_err)) | SyncError::Database(db_err) => {
                db_err.into()
            }
            SyncError::Target(e @ TargetError::NotFound { .. }) => {
                AdminError::NotFound(e.to_string())
            }
            SyncError::Target(e) => AdminError::Validation(e.to_string()),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AdminError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AdminError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AdminError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            AdminError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AdminError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            AdminError::Integration(msg) => {
                tracing::warn!(error = %msg, "Identity provider error");
                (StatusCode::BAD_GATEWAY, "integration_error", msg)
            }
            AdminError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "An internal database error occurred".to_string(),
                )
            }
            AdminError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
