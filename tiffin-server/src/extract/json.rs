//! JSON extractor that rejects with [`AppError`]

use crate::error::AppError;
use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Like [`axum::Json`], but malformed or incomplete bodies are reported as a
/// JSON:API 400 instead of axum's plain text rejection.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
