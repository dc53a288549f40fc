//! Request and response data types shared between the tiffin server and its clients

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Registration request: starts the email challenge for a new account
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// Full name of the user signing up
    #[validate(length(min = 1))]
    pub full_name: String,
    /// The email address of the user signing up
    #[validate(email)]
    pub email: String,
    /// Contact phone number
    #[validate(length(min = 1))]
    pub phone_number: String,
    /// Plaintext password, hashed once the email is verified
    #[validate(length(min = 1))]
    pub password: String,
}

/// Registration confirmation: the account details together with the emailed passcode
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationConfirmation {
    /// Full name of the user signing up
    #[validate(length(min = 1))]
    pub full_name: String,
    /// The email address the passcode was sent to
    #[validate(email)]
    pub email: String,
    /// Contact phone number
    #[validate(length(min = 1))]
    pub phone_number: String,
    /// Plaintext password
    #[validate(length(min = 1))]
    pub password: String,
    /// The emailed passcode
    #[validate(length(min = 1))]
    pub otp: String,
}

/// Sign-in request
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
pub struct SignInRequest {
    /// Account email address
    #[validate(email)]
    pub email: String,
    /// Plaintext password
    #[validate(length(min = 1))]
    pub password: String,
}

/// Password reset request: starts the email challenge for an existing account
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
pub struct PasswordResetRequest {
    /// Account email address
    #[validate(email)]
    pub email: String,
}

/// Password reset confirmation: proves control of the email address
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
pub struct PasswordResetConfirmation {
    /// Account email address
    #[validate(email)]
    pub email: String,
    /// The emailed passcode
    #[validate(length(min = 1))]
    pub otp: String,
}

/// The new password, accepted once per confirmed reset
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordRequest {
    /// Account email address
    #[validate(email)]
    pub email: String,
    /// Plaintext replacement password
    #[validate(length(min = 1))]
    pub new_password: String,
}

/// Response carrying a human readable message
#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
pub struct MessageResponse {
    /// What happened
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response to a successful sign-in
#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
pub struct TokenResponse {
    /// What happened
    pub message: String,
    /// Bearer token for authenticated routes
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use testresult::TestResult;

    #[test]
    fn test_registration_uses_camel_case() -> TestResult {
        let request: RegistrationRequest = serde_json::from_value(json!({
            "fullName": "Oedipa Maas",
            "email": "oedipa@trystero.com",
            "phoneNumber": "555-0100",
            "password": "hunter2",
        }))?;

        assert!(request.validate().is_ok());
        assert_eq!(request.full_name, "Oedipa Maas");
        assert_eq!(request.phone_number, "555-0100");

        Ok(())
    }

    #[test]
    fn test_empty_fields_fail_validation() {
        let request = RegistrationConfirmation {
            full_name: "".to_string(),
            email: "oedipa@trystero.com".to_string(),
            phone_number: "555-0100".to_string(),
            password: "hunter2".to_string(),
            otp: "".to_string(),
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("otp"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_malformed_email_fails_validation() {
        let request = PasswordResetRequest {
            email: "not an email".to_string(),
        };

        assert!(request.validate().is_err());
    }
}
