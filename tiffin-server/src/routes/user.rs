//! User account routes: registration, sign-in and password reset

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    extract::{bearer::Authenticated, json::Json},
    models::user::{AccountExists, NewUser, UserCreatedResponse, UsersResponse},
    password,
    setups::{AccountStore, ServerSetup, VerificationCodeSender},
};
use axum::{self, extract::State, http::StatusCode};
use tiffin_core::{
    common::{
        MessageResponse, NewPasswordRequest, PasswordResetConfirmation, PasswordResetRequest,
        RegistrationConfirmation, RegistrationRequest, SignInRequest, TokenResponse,
    },
    Passcode,
};
use validator::Validate;

/// POST handler for starting a registration
#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegistrationRequest,
    responses(
        (status = 200, description = "Passcode sent", body = MessageResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 500, description = "Passcode could not be sent", body = AppError),
    )
)]
pub async fn register<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<RegistrationRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    request.validate()?;

    if state.accounts.find_by_email(&request.email).await?.is_some() {
        return Err(AccountExists.into());
    }

    let code = state.verification.begin(&request.email);
    deliver(&state, &request.email, &code).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(
            "Registration initiated. An OTP has been sent to your email. Please complete the verification process.",
        )),
    ))
}

/// POST handler for completing a registration with the emailed passcode
#[utoipa::path(
    post,
    path = "/api/user/verifyOtp",
    request_body = RegistrationConfirmation,
    responses(
        (status = 201, description = "User created", body = UserCreatedResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 401, description = "Invalid or expired passcode", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
    )
)]
pub async fn verify_otp<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<RegistrationConfirmation>,
) -> AppResult<(StatusCode, Json<UserCreatedResponse>)> {
    state.verification.confirm_registration(&request)?;

    let RegistrationConfirmation {
        full_name,
        email,
        phone_number,
        password,
        ..
    } = request;

    let user = state
        .accounts
        .create(NewUser {
            email,
            full_name,
            phone_number,
            password_hash: password::hash(password).await?,
            is_verified: true,
        })
        .await?;

    tracing::info!(user_id = user.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User verified and registration complete".to_string(),
            user: user.into(),
        }),
    ))
}

/// POST handler for signing in with email and password
#[utoipa::path(
    post,
    path = "/api/user/signIn",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 401, description = "Invalid email or password", body = AppError),
    )
)]
pub async fn sign_in<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<SignInRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    request.validate()?;

    let rejected = || AppError::new(StatusCode::UNAUTHORIZED, Some("Invalid email or password"));

    let Some(user) = state.accounts.find_by_email(&request.email).await? else {
        return Err(rejected());
    };

    if !user.is_verified {
        tracing::debug!(user_id = user.id, "Sign-in attempt by unverified user");
        return Err(rejected());
    }

    if !password::verify(request.password, user.password_hash.clone()).await? {
        return Err(rejected());
    }

    let token = state.credentials.issue(&user)?;

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            message: "User signed in successfully".to_string(),
            token,
        }),
    ))
}

/// POST handler for starting a password reset
#[utoipa::path(
    post,
    path = "/api/user/initiatePasswordReset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Passcode sent", body = MessageResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 404, description = "Unknown user", body = AppError),
        (status = 500, description = "Passcode could not be sent", body = AppError),
    )
)]
pub async fn initiate_password_reset<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<PasswordResetRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    request.validate()?;

    if state.accounts.find_by_email(&request.email).await?.is_none() {
        return Err(AppError::user_not_found());
    }

    let code = state.verification.begin(&request.email);
    deliver(&state, &request.email, &code).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(
            "OTP sent to your email. Please verify to reset your password.",
        )),
    ))
}

/// POST handler for proving control of the email address during a password reset
#[utoipa::path(
    post,
    path = "/api/user/verifyPasswordResetOTP",
    request_body = PasswordResetConfirmation,
    responses(
        (status = 200, description = "Passcode accepted", body = MessageResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 401, description = "Invalid or expired passcode", body = AppError),
    )
)]
pub async fn verify_password_reset_otp<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<PasswordResetConfirmation>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.verification.confirm_password_reset(&request)?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(
            "OTP verified successfully. You can now reset your password.",
        )),
    ))
}

/// POST handler for setting a new password after a confirmed reset
#[utoipa::path(
    post,
    path = "/api/user/resetPassword",
    request_body = NewPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 403, description = "Passcode not verified", body = AppError),
        (status = 404, description = "Unknown user", body = AppError),
    )
)]
pub async fn reset_password<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<NewPasswordRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.verification.redeem_password_reset(&request)?;

    let password_hash = password::hash(request.new_password).await?;

    if !state
        .accounts
        .update_password(&request.email, &password_hash)
        .await?
    {
        return Err(AppError::user_not_found());
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Password reset successfully")),
    ))
}

/// GET handler listing every user
#[utoipa::path(
    get,
    path = "/api/user/getAllUsers",
    security(
        ("bearer" = []),
    ),
    responses(
        (status = 200, description = "Users", body = UsersResponse),
        (status = 401, description = "Missing or invalid session token", body = AppError),
        (status = 404, description = "No users", body = AppError),
    )
)]
pub async fn get_all_users<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Authenticated(claims): Authenticated,
) -> AppResult<(StatusCode, Json<UsersResponse>)> {
    tracing::debug!(sub = claims.sub, "Listing users");

    let users = state.accounts.list().await?;

    if users.is_empty() {
        return Err(AppError::new(StatusCode::NOT_FOUND, Some("No users found")));
    }

    Ok((
        StatusCode::OK,
        Json(UsersResponse {
            message: "Users retrieved successfully".to_string(),
            users: users.into_iter().map(Into::into).collect(),
        }),
    ))
}

/// Send a freshly issued passcode. The challenge stays pending if delivery fails.
async fn deliver<S: ServerSetup>(
    state: &AppState<S>,
    email: &str,
    code: &Passcode,
) -> AppResult<()> {
    state
        .verification_code_sender
        .send_code(email, code.expose())
        .await
        .map_err(|err| {
            tracing::error!(?err, email, "Failed to send verification code");
            AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("Failed to send verification code"),
            )
        })
}
