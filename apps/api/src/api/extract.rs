// Extractors whose rejections render through `ApiError`

use axum::extract::{FromRequest, FromRequestParts};

use super::errors::ApiError;

/// `axum::Json` with malformed bodies reported in the JSON envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with bad parameters reported in the JSON envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
