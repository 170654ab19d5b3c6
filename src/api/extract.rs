//! Request extractors

use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::dashboard::DashboardContext;

pub const NOT_SIGNED_IN: &str = "Vui lòng đăng nhập để tiếp tục.";

/// The signed-in user, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub access_token: String,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// Dashboard pages acting under this user's session
    pub fn dashboard(&self, state: &AppState) -> DashboardContext {
        state.dashboard(&self.access_token)
    }
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl CurrentUser {
    async fn resolve(state: &AppState, token: Option<String>) -> Result<Self, ApiError> {
        let token = token.ok_or_else(|| ApiError::Unauthorized(NOT_SIGNED_IN.to_string()))?;
        let user = state.auth.current_user(&token).await?;

        Ok(CurrentUser {
            user,
            access_token: token,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).map(str::to_string);
        Self::resolve(state, token).await
    }
}

#[derive(Debug, Deserialize)]
struct SocketAuth {
    access_token: Option<String>,
}

/// The signed-in user behind a websocket upgrade
///
/// Browsers cannot set headers on a websocket handshake, so the token may
/// also come as `?access_token=<token>`.
#[derive(Debug, Clone)]
pub struct SocketUser(pub CurrentUser);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for SocketUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Some(token) => Some(token.to_string()),
            None => Query::<SocketAuth>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(auth)| auth.access_token)
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
        };
        CurrentUser::resolve(state, token).await.map(SocketUser)
    }
}
