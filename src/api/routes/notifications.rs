//! Notification Routes
//!
//! - GET /api/v1/notifications - Newest first, with unread count
//! - POST /api/v1/notifications/:id/read - Mark one read
//! - POST /api/v1/notifications/clear - Remove everything the caller sees
//!
//! Each caller sees their own shops' notifications plus the shared ones.
//! - GET /api/v1/push/status - Push channel connection state

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{NotificationListResponse, PushStatusResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Json<NotificationListResponse> {
    Json(NotificationListResponse {
        notifications: state.notifications.list_for(user.id()).await,
        unread: state.notifications.unread_count_for(user.id()).await,
    })
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.notifications.mark_read_for(&id, user.id()).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Không tìm thấy thông báo".to_string()))
    }
}

pub async fn clear_notifications(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> StatusCode {
    state.notifications.clear_for(user.id()).await;
    StatusCode::NO_CONTENT
}

pub async fn push_status(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Json<PushStatusResponse> {
    Json(PushStatusResponse {
        configured: state.push.is_some(),
        status: state.push.as_ref().map(|push| push.status()),
    })
}
