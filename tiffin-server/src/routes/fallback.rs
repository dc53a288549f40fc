//! Fallback route.

use crate::error::AppError;
use axum::http::StatusCode;

/// 404 fallback for unmatched routes
pub async fn notfound_404() -> AppError {
    AppError::new(StatusCode::NOT_FOUND, Some("Route does not exist"))
}

#[cfg(test)]
mod tests {
    use crate::{
        error::ErrorResponse,
        test_utils::{route_builder::RouteBuilder, test_context::TestContext},
    };
    use http::{Method, StatusCode};
    use testresult::TestResult;

    #[test_log::test(tokio::test)]
    async fn test_unknown_route_is_json_404() -> TestResult {
        let ctx = TestContext::new()?;

        let (status, body) = RouteBuilder::new(ctx.app(), Method::GET, "/api/user/nope")
            .into_json_response::<ErrorResponse>()
            .await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.errors.len(), 1);

        Ok(())
    }
}
