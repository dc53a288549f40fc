//! Session tokens handed out on sign-in.

use crate::{models::user::User, settings};
use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// What a session token asserts about its bearer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user's id
    pub sub: String,
    /// The user's email address
    pub email: String,
    /// Issued at, seconds since the unix epoch
    pub iat: u64,
    /// Expiry, seconds since the unix epoch
    pub exp: u64,
}

/// Issues and checks HS256 session tokens.
pub struct CredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl CredentialIssuer {
    /// Build an issuer from a shared secret
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Build an issuer from the `[auth]` settings
    pub fn from_settings(settings: &settings::Auth) -> Self {
        Self::new(&settings.jwt_secret, settings.token_ttl())
    }

    /// Sign a token for `user`, valid for the configured lifetime
    pub fn issue(&self, user: &User) -> Result<String> {
        let iat = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat,
            exp: iat + self.ttl.as_secs(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Check signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use testresult::TestResult;

    fn user() -> User {
        let now = Utc::now().naive_utc();
        User {
            id: 7,
            email: "oedipa@trystero.com".to_string(),
            full_name: "Oedipa Maas".to_string(),
            phone_number: "555-0100".to_string(),
            password_hash: String::new(),
            is_verified: true,
            inserted_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issued_token_validates() -> TestResult {
        let issuer = CredentialIssuer::new("secret", Duration::from_secs(3600));

        let token = issuer.issue(&user())?;
        let claims = issuer.validate(&token)?;

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "oedipa@trystero.com");
        assert_eq!(claims.exp - claims.iat, 3600);

        Ok(())
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() -> TestResult {
        let issuer = CredentialIssuer::new("secret", Duration::from_secs(3600));
        let other = CredentialIssuer::new("other", Duration::from_secs(3600));

        let token = other.issue(&user())?;

        assert!(issuer.validate(&token).is_err());

        Ok(())
    }

    #[test]
    fn test_expired_token_is_rejected() -> TestResult {
        let issuer = CredentialIssuer::new("secret", Duration::from_secs(0));
        let iat = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() - 3600;
        let claims = Claims {
            sub: "7".to_string(),
            email: "oedipa@trystero.com".to_string(),
            iat,
            exp: iat + 60,
        };
        let token = encode(&Header::default(), &claims, &issuer.encoding)?;

        assert!(issuer.validate(&token).is_err());

        Ok(())
    }

    #[test]
    fn test_debug_hides_keys() {
        let issuer = CredentialIssuer::new("supersecret", Duration::from_secs(60));

        assert!(!format!("{issuer:?}").contains("supersecret"));
    }
}
