//! Routes for [axum::Router].

pub mod fallback;
pub mod health;
pub mod ping;
pub mod user;
