//! Registration and password-reset state machines.
//!
//! Both flows share one challenge per email: starting a reset while a
//! registration is pending replaces the registration passcode.
//!
//! Registration: `begin` → deliver → `confirm_registration`. A confirmed
//! passcode is gone even if creating the account afterwards fails; the user
//! starts over with a new passcode.
//!
//! Password reset: `begin` → deliver → `confirm_password_reset` (records a
//! grant) → `redeem_password_reset` (spends it) → change the password.

use crate::{
    common::{NewPasswordRequest, PasswordResetConfirmation, RegistrationConfirmation},
    error::VerificationError,
    grant::GrantStore,
    otp::OtpStore,
    passcode::Passcode,
};
use std::time::Duration;
use validator::Validate;

/// Composes the challenge and grant stores into the two email flows.
#[derive(Debug, Clone)]
pub struct VerificationFlow {
    challenges: OtpStore,
    grants: GrantStore,
    ttl: Duration,
}

impl Default for VerificationFlow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

impl VerificationFlow {
    /// How long an issued passcode stays valid unless configured otherwise
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

    /// Create a flow with empty stores and the given passcode lifetime
    pub fn new(ttl: Duration) -> Self {
        Self {
            challenges: OtpStore::new(),
            grants: GrantStore::new(),
            ttl,
        }
    }

    /// Lifetime of each issued passcode
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The underlying challenge store
    pub fn challenges(&self) -> &OtpStore {
        &self.challenges
    }

    /// The underlying grant store
    pub fn grants(&self) -> &GrantStore {
        &self.grants
    }

    /// Issue a passcode for `email`, replacing any pending one.
    pub fn begin(&self, email: &str) -> Passcode {
        self.challenges.issue(email, self.ttl)
    }

    /// Check the passcode submitted with a registration.
    /// On success the passcode is spent and the account may be created.
    pub fn confirm_registration(
        &self,
        request: &RegistrationConfirmation,
    ) -> Result<(), VerificationError> {
        request.validate()?;
        self.check(&request.email, &request.otp)
    }

    /// Check the passcode submitted for a password reset and, on success,
    /// record a grant for the follow-up reset request.
    pub fn confirm_password_reset(
        &self,
        request: &PasswordResetConfirmation,
    ) -> Result<(), VerificationError> {
        request.validate()?;
        self.check(&request.email, &request.otp)?;
        self.grants.grant(&request.email);
        Ok(())
    }

    /// Spend the grant recorded by [`Self::confirm_password_reset`].
    ///
    /// Must run before the password is changed. The grant is gone after this
    /// returns `Ok`, even if changing the password then fails.
    pub fn redeem_password_reset(
        &self,
        request: &NewPasswordRequest,
    ) -> Result<(), VerificationError> {
        request.validate()?;

        if self.grants.consume(&request.email) {
            Ok(())
        } else {
            Err(VerificationError::GrantAbsent)
        }
    }

    fn check(&self, email: &str, otp: &str) -> Result<(), VerificationError> {
        if self.challenges.verify(email, otp) {
            Ok(())
        } else {
            Err(VerificationError::ChallengeFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn registration(email: &str, otp: &str) -> RegistrationConfirmation {
        RegistrationConfirmation {
            full_name: "Oedipa Maas".to_string(),
            email: email.to_string(),
            phone_number: "555-0100".to_string(),
            password: "hunter2".to_string(),
            otp: otp.to_string(),
        }
    }

    fn reset_confirmation(email: &str, otp: &str) -> PasswordResetConfirmation {
        PasswordResetConfirmation {
            email: email.to_string(),
            otp: otp.to_string(),
        }
    }

    fn new_password(email: &str) -> NewPasswordRequest {
        NewPasswordRequest {
            email: email.to_string(),
            new_password: "correct horse".to_string(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_registration_confirms_once() {
        let flow = VerificationFlow::default();
        let passcode = flow.begin("a@x.com");

        let request = registration("a@x.com", passcode.expose());
        assert_matches!(flow.confirm_registration(&request), Ok(()));
        assert_matches!(
            flow.confirm_registration(&request),
            Err(VerificationError::ChallengeFailed)
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_registration_does_not_grant_reset() {
        let flow = VerificationFlow::default();
        let passcode = flow.begin("a@x.com");

        flow.confirm_registration(&registration("a@x.com", passcode.expose()))
            .unwrap();

        assert!(!flow.grants().is_granted("a@x.com"));
        assert_matches!(
            flow.redeem_password_reset(&new_password("a@x.com")),
            Err(VerificationError::GrantAbsent)
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_invalid_request_leaves_challenge_alone() {
        let flow = VerificationFlow::default();
        let passcode = flow.begin("a@x.com");

        let mut request = registration("a@x.com", passcode.expose());
        request.phone_number = String::new();

        assert_matches!(
            flow.confirm_registration(&request),
            Err(VerificationError::Validation(_))
        );
        assert!(flow.challenges().is_pending("a@x.com"));
    }

    #[test_log::test(tokio::test)]
    async fn test_password_reset_grant_is_single_use() {
        let flow = VerificationFlow::default();
        let passcode = flow.begin("b@x.com");

        assert_matches!(
            flow.confirm_password_reset(&reset_confirmation("b@x.com", passcode.expose())),
            Ok(())
        );
        assert!(flow.grants().is_granted("b@x.com"));

        assert_matches!(flow.redeem_password_reset(&new_password("b@x.com")), Ok(()));
        assert_matches!(
            flow.redeem_password_reset(&new_password("b@x.com")),
            Err(VerificationError::GrantAbsent)
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_reset_confirmation_grants_nothing() {
        let flow = VerificationFlow::default();
        let passcode = flow.begin("b@x.com");
        let wrong = if passcode.expose() == "000000" { "000001" } else { "000000" };

        assert_matches!(
            flow.confirm_password_reset(&reset_confirmation("b@x.com", wrong)),
            Err(VerificationError::ChallengeFailed)
        );
        assert!(!flow.grants().is_granted("b@x.com"));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_expired_reset_confirmation_fails() {
        let flow = VerificationFlow::new(Duration::from_secs(60));
        let passcode = flow.begin("b@x.com");

        tokio::time::advance(Duration::from_secs(60)).await;

        assert_matches!(
            flow.confirm_password_reset(&reset_confirmation("b@x.com", passcode.expose())),
            Err(VerificationError::ChallengeFailed)
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_reset_invalidates_pending_registration() {
        let flow = VerificationFlow::default();
        let registration_code = flow.begin("a@x.com");
        let reset_code = flow.begin("a@x.com");

        if registration_code != reset_code {
            assert_matches!(
                flow.confirm_registration(&registration("a@x.com", registration_code.expose())),
                Err(VerificationError::ChallengeFailed)
            );
        }
        assert_matches!(
            flow.confirm_password_reset(&reset_confirmation("a@x.com", reset_code.expose())),
            Ok(())
        );
    }
}
