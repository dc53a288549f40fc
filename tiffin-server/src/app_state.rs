//! The Axum Application State

use crate::{credentials::CredentialIssuer, setups::ServerSetup};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tiffin_core::VerificationFlow;

#[derive(Clone)]
/// Global application route state.
pub struct AppState<S: ServerSetup> {
    /// Pending passcodes and password reset grants
    pub verification: VerificationFlow,
    /// Where user records are kept
    pub accounts: S::AccountStore,
    /// The service that sends account verification codes
    pub verification_code_sender: S::VerificationCodeSender,
    /// Issues and checks session tokens
    pub credentials: Arc<CredentialIssuer>,
}

/// Builder for [`AppState`]
#[derive(Debug)]
pub struct AppStateBuilder<S: ServerSetup> {
    verification: Option<VerificationFlow>,
    accounts: Option<S::AccountStore>,
    verification_code_sender: Option<S::VerificationCodeSender>,
    credentials: Option<CredentialIssuer>,
}

impl<S: ServerSetup> Default for AppStateBuilder<S> {
    fn default() -> Self {
        Self {
            verification: None,
            accounts: None,
            verification_code_sender: None,
            credentials: None,
        }
    }
}

impl<S: ServerSetup> AppStateBuilder<S> {
    /// Finalize the builder and return the [`AppState`]
    pub fn finalize(self) -> Result<AppState<S>> {
        let verification = self.verification.unwrap_or_default();

        let accounts = self
            .accounts
            .ok_or_else(|| anyhow!("accounts is required"))?;

        let verification_code_sender = self
            .verification_code_sender
            .ok_or_else(|| anyhow!("verification_code_sender is required"))?;

        let credentials = self
            .credentials
            .ok_or_else(|| anyhow!("credentials are required"))?;

        Ok(AppState {
            verification,
            accounts,
            verification_code_sender,
            credentials: Arc::new(credentials),
        })
    }

    /// Set the verification flow (defaults to a five minute passcode lifetime)
    pub fn with_verification(mut self, verification: VerificationFlow) -> Self {
        self.verification = Some(verification);
        self
    }

    /// Set the account store
    pub fn with_accounts(mut self, accounts: S::AccountStore) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Set the service that sends account verification codes
    pub fn with_verification_code_sender(
        mut self,
        verification_code_sender: S::VerificationCodeSender,
    ) -> Self {
        self.verification_code_sender = Some(verification_code_sender);
        self
    }

    /// Set the session token issuer
    pub fn with_credentials(mut self, credentials: CredentialIssuer) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl<S> std::fmt::Debug for AppState<S>
where
    S: ServerSetup,
    S::AccountStore: std::fmt::Debug,
    S::VerificationCodeSender: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verification", &self.verification)
            .field("accounts", &self.accounts)
            .field("verification_code_sender", &self.verification_code_sender)
            .field("credentials", &self.credentials)
            .finish()
    }
}
