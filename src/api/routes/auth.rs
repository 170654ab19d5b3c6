//! Auth Routes
//!
//! - POST /api/v1/auth/register - Create an account and its profile
//! - POST /api/v1/auth/login - Password sign-in
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/auth/me - Current user

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{LoginResponse, MessageResponse, RegisterResponse};
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::auth::{AuthUser, LoginForm, RegistrationForm, LOGGED_IN_MESSAGE, REGISTERED_MESSAGE};

pub const LOGGED_OUT_MESSAGE: &str = "Đã đăng xuất.";

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegistrationForm>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.auth.register(&form).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: REGISTERED_MESSAGE.to_string(),
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state.auth.login(&form).await?;
    tracing::info!(user_id = %session.user.id, remember = form.remember, "User signed in");

    Ok(Json(LoginResponse {
        session,
        message: LOGGED_IN_MESSAGE.to_string(),
    }))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.sign_out(&user.access_token).await?;
    tracing::info!(user_id = %user.id(), "User signed out");

    Ok(Json(MessageResponse::new(LOGGED_OUT_MESSAGE)))
}

/// GET /api/v1/auth/me
pub async fn me(user: CurrentUser) -> Json<AuthUser> {
    Json(user.user)
}
