use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Wire shape shared by every JSON response: `{status, message, data}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(code: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: if code.is_success() { "success" } else { "error" },
            message: message.into(),
            data,
        }
    }
}

/// Successful API response
///
/// Usage:
/// ```rust
/// use todo_api::api::response::ApiResponse;
///
/// async fn handler() -> ApiResponse<Vec<u32>> {
///     ApiResponse::ok("Numbers retrieved", vec![1, 2, 3])
/// }
/// ```
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 201 with a payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 200 without a payload; `data` serializes as null
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope::new(self.status, self.message, self.data);
        (self.status, Json(body)).into_response()
    }
}
