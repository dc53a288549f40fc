//! Session token extractor

use crate::{app_state::AppState, credentials::Claims, error::AppError, setups::ServerSetup};
use axum::{
    async_trait,
    extract::{FromRequestParts, TypedHeader},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, StatusCode},
    RequestPartsExt,
};

/// The claims of a valid `Authorization: Bearer` session token.
///
/// Rejects with 401 when the header is missing or the token doesn't verify.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

#[async_trait]
impl<S: ServerSetup> FromRequestParts<AppState<S>> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::new(StatusCode::UNAUTHORIZED, Some("Missing credentials")))?;

        let claims = state.credentials.validate(bearer.token())?;

        Ok(Self(claims))
    }
}
