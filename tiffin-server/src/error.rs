//! Generic result/error resprentation(s).

use crate::models::user::AccountExists;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tiffin_core::VerificationError;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Standard return type out of routes / handlers
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Encodes [JSONAPI error object responses](https://jsonapi.org/examples/#error-objects).
///
/// JSONAPI error object -  ALL Fields are technically optional.
///
/// This struct uses the following guidelines:
///
/// 1. Always encode the StatusCode of the response
/// 2. Set the title to the `canonical_reason` of the status code.
///    According to spec, this should NOT change over time.
/// 3. For unrecoverable errors, encode the detail as the to_string of the error
#[derive(ToSchema, thiserror::Error, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct AppError {
    #[schema(value_type = u16, example = 401)]
    #[serde(with = "crate::error::serde_status_code")]
    pub(crate) status: StatusCode,
    #[schema(example = "Invalid or expired OTP")]
    pub(crate) detail: Option<String>,
    #[schema(example = "Unauthorized")]
    pub(crate) title: Option<String>,
}

impl AppError {
    /// New instance of [AppError].
    pub fn new<M: ToString>(status_code: StatusCode, message: Option<M>) -> AppError {
        Self {
            status: status_code,
            title: Self::canonical_reason_to_string(&status_code),
            detail: message.map(|m| m.to_string()),
        }
    }

    /// [AppError] for a user that doesn't exist.
    pub fn user_not_found() -> AppError {
        Self::new(
            StatusCode::NOT_FOUND,
            Some("User with this email does not exist"),
        )
    }

    /// The HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn canonical_reason_to_string(status_code: &StatusCode) -> Option<String> {
        status_code.canonical_reason().map(|r| r.to_string())
    }
}

#[derive(Debug, Deserialize, Serialize)]
/// Error in JSON API response format.
pub struct ErrorResponse {
    pub(crate) errors: Vec<AppError>,
}

impl From<AppError> for ErrorResponse {
    fn from(e: AppError) -> Self {
        Self { errors: vec![e] }
    }
}

impl From<AppError> for (StatusCode, Json<ErrorResponse>) {
    fn from(app_error: AppError) -> Self {
        (app_error.status, Json(app_error.into()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_response: (StatusCode, Json<ErrorResponse>) = self.into();
        error_response.into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<AccountExists>() {
            Ok(err) => return Self::from(err),
            Err(e) => e,
        };

        let err = match err.downcast::<diesel::result::Error>() {
            Ok(err) => return Self::from(err),
            Err(e) => e,
        };

        let err = match err.downcast::<ValidationErrors>() {
            Ok(err) => return Self::from(err),
            Err(e) => e,
        };

        let err = match err.downcast::<VerificationError>() {
            Ok(err) => return Self::from(err),
            Err(e) => e,
        };

        Self::new(StatusCode::INTERNAL_SERVER_ERROR, Some(err))
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Validation(errors) => Self::from(errors),
            VerificationError::ChallengeFailed => Self::new(StatusCode::UNAUTHORIZED, Some(err)),
            VerificationError::GrantAbsent => Self::new(StatusCode::FORBIDDEN, Some(err)),
        }
    }
}

impl From<AccountExists> for AppError {
    fn from(err: AccountExists) -> Self {
        Self::new(StatusCode::CONFLICT, Some(err))
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                Self::new(StatusCode::NOT_FOUND, Some("Resource Not Found"))
            }
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => Self::new(
                StatusCode::CONFLICT,
                Some(match info.details() {
                    Some(details) => format!("{} ({details})", info.message()),
                    None => info.message().to_string(),
                }),
            ),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, Some(err)),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!(%err, "Rejected session token");
        Self::new(StatusCode::UNAUTHORIZED, Some("Invalid token"))
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, Some(err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(value.body_text()))
    }
}

impl From<Infallible> for AppError {
    fn from(the_impossible: Infallible) -> Self {
        match the_impossible {}
    }
}

/// Serialize/Deserializer for status codes.
///
/// This is needed because status code according to JSON API spec must
/// be the status code as a STRING.
///
/// We could have used http_serde, but it encodes the status code as a NUMBER.
pub mod serde_status_code {
    use http::StatusCode;
    use serde::{de::Unexpected, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize [StatusCode]s.
    pub fn serialize<S: Serializer>(status: &StatusCode, ser: S) -> Result<S::Ok, S::Error> {
        String::serialize(&status.as_u16().to_string(), ser)
    }

    /// Deserialize [StatusCode]s.
    pub fn deserialize<'de, D>(de: D) -> Result<StatusCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let str = String::deserialize(de)?;
        StatusCode::from_bytes(str.as_bytes()).map_err(|_| {
            serde::de::Error::invalid_value(
                Unexpected::Str(str.as_str()),
                &"A valid http status code",
            )
        })
    }
}

// Needed to support thiserror::Error, outputs debug for AppError
impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
/// Parse the app error out of the json body
pub(crate) async fn parse_error(response: Response) -> AppError {
    let body_bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let mut err_response: ErrorResponse = serde_json::from_slice(&body_bytes).unwrap();
    err_response.errors.remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn test_from_anyhow_error() {
        let err: AppError = anyhow::anyhow!("FAIL").into();
        assert_eq!(err.detail.unwrap(), "FAIL".to_string());
        assert_eq!(
            err.title,
            StatusCode::INTERNAL_SERVER_ERROR
                .canonical_reason()
                .map(|r| r.to_string())
        );

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_account_exists_through_anyhow_is_conflict() {
        let err: AppError = anyhow::Error::from(AccountExists).into();

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(
            err.detail.unwrap(),
            "User with this email already exists".to_string()
        );
    }

    #[test]
    fn test_challenge_failures_are_indistinguishable() {
        let err = AppError::from(VerificationError::ChallengeFailed);

        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.detail.unwrap(), "Invalid or expired OTP".to_string());
    }

    #[test]
    fn test_absent_grant_is_forbidden() {
        let err = AppError::from(VerificationError::GrantAbsent);

        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test_log::test(tokio::test)]
    async fn test_json_api_error_response() -> TestResult {
        // verify that our json api response complies with the standard
        let err = AppError::user_not_found();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let err = parse_error(response).await;

        // Check that the result is all good
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(
            err.title,
            StatusCode::NOT_FOUND
                .canonical_reason()
                .map(|r| r.to_string())
        );
        assert_eq!(
            err.detail.unwrap(),
            "User with this email does not exist".to_string()
        );

        Ok(())
    }
}
