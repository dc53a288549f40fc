//! Custom [axum::extract] Extractors.

pub mod bearer;
pub mod json;
