//! Main [axum::Router] interface for webserver.

use crate::{
    app_state::AppState,
    routes::{fallback::notfound_404, health, ping, user},
    setups::ServerSetup,
};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Setup main router for application.
pub fn setup_app_router<S: ServerSetup>(app_state: AppState<S>) -> Router {
    let router = Router::new()
        .route("/ping", get(ping::get))
        .fallback(notfound_404)
        .with_state(app_state.clone());

    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
            http::header::ACCEPT,
        ])
        .allow_origin(Any);

    let api_router = Router::new()
        .route("/user/register", post(user::register::<S>))
        .route("/user/verifyOtp", post(user::verify_otp::<S>))
        .route("/user/signIn", post(user::sign_in::<S>))
        .route(
            "/user/initiatePasswordReset",
            post(user::initiate_password_reset::<S>),
        )
        .route(
            "/user/verifyPasswordResetOTP",
            post(user::verify_password_reset_otp::<S>),
        )
        .route("/user/resetPassword", post(user::reset_password::<S>))
        .route("/user/getAllUsers", get(user::get_all_users::<S>))
        .layer(cors)
        .with_state(app_state.clone())
        .fallback(notfound_404);

    let router = router
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http());

    // Healthchecks are polled constantly, keep them out of the request trace
    let healthcheck_router = Router::new()
        .route("/healthcheck", get(health::healthcheck::<S>))
        .with_state(app_state);

    Router::merge(router, healthcheck_router)
}
