use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::report::ReportError;
use super::repository::RepositoryError;

pub const OVERLAP_MESSAGE: &str = "Duplicate or overlapping class record already exists.";

/// Failure taxonomy shared by every payroll operation.
#[derive(Debug, thiserror::Error)]
pub enum PayrollError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("admin credential missing or incorrect")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl PayrollError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            PayrollError::Validation(_) => "validation_error",
            PayrollError::NotFound(_) => "not_found",
            PayrollError::Conflict(_) => "conflict",
            PayrollError::InvalidState(_) => "invalid_state",
            PayrollError::Unauthorized => "unauthorized",
            PayrollError::Internal(_) => "internal_error",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            PayrollError::Validation(_) => StatusCode::BAD_REQUEST,
            PayrollError::NotFound(_) => StatusCode::NOT_FOUND,
            PayrollError::Conflict(_) | PayrollError::InvalidState(_) => StatusCode::CONFLICT,
            PayrollError::Unauthorized => StatusCode::UNAUTHORIZED,
            PayrollError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for PayrollError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => Self::Conflict(OVERLAP_MESSAGE.to_string()),
            RepositoryError::NotFound => Self::NotFound("Record not found".to_string()),
            RepositoryError::StatusChanged { found } => Self::InvalidState(format!(
                "Record status changed to {} while the request was processed",
                found.label()
            )),
            RepositoryError::Unavailable(detail) => Self::Internal(detail),
        }
    }
}

impl From<ReportError> for PayrollError {
    fn from(value: ReportError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl IntoResponse for PayrollError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            PayrollError::Internal(detail) => {
                tracing::error!(%detail, "payroll operation failed");
                "An error occurred while processing your request.".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message, "kind": self.kind() }));
        (status, body).into_response()
    }
}
