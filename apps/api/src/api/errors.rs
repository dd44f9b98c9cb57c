use std::fmt::Display;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::response::Envelope;
use crate::domain::repositories::RepositoryError;
use crate::domain::todo::TodoError;
use crate::domain::user::UserError;

/// Message returned for every unexpected server-side failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// API error type with HTTP status code and message
///
/// Renders as `{"status": "error", "message": ..., "data": null}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Logs `err` and returns the generic 500 error, hiding the details from the client
    pub fn internal(err: impl Display) -> Self {
        tracing::error!("Internal error: {}", err);
        Self::internal_server_error(INTERNAL_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(Envelope::<()>::new(self.status, self.message, None));

        (self.status, body).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self::internal(err)
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn error_uses_envelope() {
        let (status, json) = render(ApiError::not_found("User not found")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "User not found");
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn repository_errors_do_not_leak_details() {
        let err = RepositoryError::Database("connection refused on 10.0.0.3".to_string());
        let (status, json) = render(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn otp_errors_are_bad_requests() {
        let (status, json) = render(UserError::OtpExpired.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "OTP has expired");
    }

    #[test]
    fn todo_errors_are_bad_requests() {
        let err: ApiError = TodoError::EmptyTitle.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Title cannot be empty");
    }
}
