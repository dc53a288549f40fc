//! This abstracts tiffin server side-effects into "setups".
//!
//! This module defines the trait, submodules define test & production
//! collections of implementations.
use crate::models::user::{NewUser, User};
use anyhow::Result;
use async_trait::async_trait;

pub mod local;
pub mod prod;

/// This trait groups type parameters to the server's `AppState` struct.
///
/// It captures the setup of the server, distinguishing between e.g.
/// unit testing & production setups.
pub trait ServerSetup: Clone + Send + Sync + 'static {
    /// Where user records are kept
    type AccountStore: AccountStore;
    /// Which implementation to use to send verification codes
    type VerificationCodeSender: VerificationCodeSender;
}

/// Durable storage for user records.
#[async_trait]
pub trait AccountStore: Clone + Send + Sync + 'static {
    /// Look a user up by email address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create a user. Fails with [`AccountExists`](crate::models::user::AccountExists)
    /// if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User>;

    /// Replace a user's password hash. Returns whether a user was updated.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool>;

    /// Every user, oldest first
    async fn list(&self) -> Result<Vec<User>>;

    /// Whether the store can currently serve requests
    async fn is_healthy(&self) -> bool;
}

/// The service that sends account verification codes
#[async_trait]
pub trait VerificationCodeSender: Clone + Send + Sync + 'static {
    /// Send the code associated with the email
    async fn send_code(&self, email: &str, code: &str) -> Result<()>;
}
