//! Structured error types for API responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    OrderMismatch,

    // Not found errors
    UserNotFound,
    ProjectNotFound,
    BoardNotFound,
    MemberNotFound,
    ListNotFound,
    TaskNotFound,
    TagNotFound,
    CommentNotFound,
    AssignmentNotFound,

    // Conflict errors
    AlreadyExists,
    OwnerProtected,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Coarse error category, used to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Persistence,
    Internal,
}

impl ErrorCode {
    pub fn kind(self) -> ErrorKind {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::OrderMismatch => ErrorKind::Validation,
            ErrorCode::UserNotFound
            | ErrorCode::ProjectNotFound
            | ErrorCode::BoardNotFound
            | ErrorCode::MemberNotFound
            | ErrorCode::ListNotFound
            | ErrorCode::TaskNotFound
            | ErrorCode::TagNotFound
            | ErrorCode::CommentNotFound
            | ErrorCode::AssignmentNotFound => ErrorKind::NotFound,
            ErrorCode::AlreadyExists | ErrorCode::OwnerProtected => ErrorKind::Conflict,
            ErrorCode::DatabaseError => ErrorKind::Persistence,
            ErrorCode::InternalError => ErrorKind::Internal,
        }
    }
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Persistence | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured error returned by database operations and HTTP handlers.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn order_mismatch(parent: &str, details: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::OrderMismatch,
            format!(
                "Ordered ids must match the current items of {} exactly",
                parent
            ),
        )
        .with_details(details)
    }

    pub fn user_not_found(id: &str) -> Self {
        Self::new(ErrorCode::UserNotFound, format!("User not found: {}", id))
    }

    pub fn project_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {}", id),
        )
    }

    pub fn board_not_found(id: &str) -> Self {
        Self::new(ErrorCode::BoardNotFound, format!("Board not found: {}", id))
    }

    pub fn member_not_found(board_id: &str, user_id: &str) -> Self {
        Self::new(
            ErrorCode::MemberNotFound,
            format!("User {} is not a member of board {}", user_id, board_id),
        )
    }

    pub fn list_not_found(id: &str) -> Self {
        Self::new(ErrorCode::ListNotFound, format!("List not found: {}", id))
    }

    pub fn task_not_found(id: &str) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", id))
    }

    pub fn tag_not_found(id: &str) -> Self {
        Self::new(ErrorCode::TagNotFound, format!("Tag not found: {}", id))
    }

    pub fn comment_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::CommentNotFound,
            format!("Comment not found: {}", id),
        )
    }

    pub fn assignment_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::AssignmentNotFound,
            format!("Assignment not found: {}", id),
        )
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, what)
    }

    pub fn owner_protected(board_id: &str) -> Self {
        Self::new(
            ErrorCode::OwnerProtected,
            format!("The owner membership of board {} cannot be changed", board_id),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// Database methods return anyhow errors; recover the typed error when there is one.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ApiError>() {
            Ok(api_err) => return api_err,
            Err(err) => err,
        };
        match err.downcast::<rusqlite::Error>() {
            Ok(db_err) => ApiError::database(db_err),
            Err(err) => ApiError::internal(err),
        }
    }
}

// Bodies that fail to parse answer with the same payload as other validation errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_value("body", "Request body is not valid for this operation")
            .with_details(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind().status_code();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, "{}", self.message);
        }
        (status, Json(self)).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes_map_to_404() {
        let err = ApiError::board_not_found("b1");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.kind().status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn order_mismatch_is_validation() {
        let err = ApiError::order_mismatch("board b1", "missing: l2");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.details.as_deref(), Some("missing: l2"));
    }

    #[test]
    fn anyhow_roundtrip_keeps_typed_error() {
        let err: anyhow::Error = ApiError::task_not_found("t1").into();
        let api_err = ApiError::from(err);
        assert_eq!(api_err.code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn rusqlite_errors_become_database_errors() {
        let err: anyhow::Error = rusqlite::Error::InvalidQuery.into();
        let api_err = ApiError::from(err);
        assert_eq!(api_err.code, ErrorCode::DatabaseError);
        assert_eq!(api_err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn other_errors_become_internal() {
        let api_err = ApiError::from(anyhow::anyhow!("boom"));
        assert_eq!(api_err.code, ErrorCode::InternalError);
        assert_eq!(api_err.message, "boom");
    }

    #[test]
    fn serializes_code_in_screaming_snake_case() {
        let json = serde_json::to_value(ApiError::missing_field("title")).unwrap();
        assert_eq!(json["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(json["field"], "title");
        assert!(json.get("details").is_none());
    }
}
