//! Verification errors

use validator::ValidationErrors;

/// Ways a verification step can refuse a request.
#[derive(thiserror::Error, Debug)]
pub enum VerificationError {
    /// The request was missing a field or had a malformed one.
    /// Raised before any challenge or grant is looked at.
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    /// The passcode was wrong, expired or never issued. Clients can't tell
    /// which.
    #[error("Invalid or expired OTP")]
    ChallengeFailed,

    /// A privileged action was attempted without a prior passed challenge.
    #[error("OTP not verified. Please verify OTP first.")]
    GrantAbsent,
}
