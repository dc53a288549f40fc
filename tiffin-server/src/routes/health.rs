//! Healthcheck route.

use crate::{
    app_state::AppState,
    error::AppResult,
    setups::{AccountStore, ServerSetup},
};
use axum::{self, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A healthcheck response containing diagnostic information for the service
#[derive(ToSchema, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcheckResponse {
    account_store_connected: bool,
    pending_challenges: usize,
}

impl HealthcheckResponse {
    /// Whether the service is healthy
    pub fn is_healthy(&self) -> bool {
        self.account_store_connected
    }

    /// The status code for the healthcheck response
    pub fn status_code(&self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET handler for checking service health.
#[utoipa::path(
    get,
    path = "/healthcheck",
    responses(
        (status = 200, description = "tiffin-server healthy", body=HealthcheckResponse),
        (status = 503, description = "tiffin-server not healthy", body=HealthcheckResponse)
    )
)]
pub async fn healthcheck<S: ServerSetup>(
    State(state): State<AppState<S>>,
) -> AppResult<(StatusCode, axum::Json<HealthcheckResponse>)> {
    let response = HealthcheckResponse {
        account_store_connected: state.accounts.is_healthy().await,
        pending_challenges: state.verification.challenges().len(),
    };

    Ok((response.status_code(), axum::Json(response)))
}
