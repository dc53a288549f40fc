#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unreachable_pub)]

//! tiffin-server
//!
//! HTTP service for tiffin user accounts: email-verified registration,
//! sign-in and password resets.

pub mod app_state;
pub mod credentials;
pub mod db;
pub mod docs;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod password;
pub mod router;
pub mod routes;
pub mod settings;
pub mod setups;

#[cfg(test)]
#[allow(unreachable_pub, missing_docs)]
mod test_utils;
