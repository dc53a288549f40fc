//! OpenAPI doc generation.

use crate::{
    error::AppError,
    models::user::{UserCreatedResponse, UserResponse, UsersResponse},
    routes::{health, ping, user},
};
use tiffin_core::common::{
    MessageResponse, NewPasswordRequest, PasswordResetConfirmation, PasswordResetRequest,
    RegistrationConfirmation, RegistrationRequest, SignInRequest, TokenResponse,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// API documentation generator.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck,
        ping::get,
        user::register,
        user::verify_otp,
        user::sign_in,
        user::initiate_password_reset,
        user::verify_password_reset_otp,
        user::reset_password,
        user::get_all_users,
    ),
    components(
        schemas(
            AppError,
            RegistrationRequest,
            RegistrationConfirmation,
            SignInRequest,
            PasswordResetRequest,
            PasswordResetConfirmation,
            NewPasswordRequest,
            MessageResponse,
            TokenResponse,
            UserResponse,
            UserCreatedResponse,
            UsersResponse,
            health::HealthcheckResponse
        )
    ),
    modifiers(&BearerAddon),
)]

/// Tied to OpenAPI documentation.
#[derive(Debug)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme used by authenticated routes
#[derive(Debug)]
pub struct BearerAddon;

impl Modify for BearerAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
