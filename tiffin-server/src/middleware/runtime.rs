//! Middleware for runtime, [tower_http] extensions.

use crate::error::AppError;
use axum::{
    body::{boxed, BoxBody},
    response::IntoResponse,
};
use http::{Response, StatusCode};
use std::any::Any;

/// Middleware function for catching runtime panics, logging
/// them, and converting them into a `500 Internal Server` response.
pub fn catch_panic(err: Box<dyn Any + Send + 'static>) -> Response<BoxBody> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    tracing::error!(panic = details, "Caught panic in request handler");

    let err = AppError::new(StatusCode::INTERNAL_SERVER_ERROR, Some(details));
    let response = err.into_response();
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, boxed(body))
}
