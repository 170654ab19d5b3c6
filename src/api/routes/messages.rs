//! Device Message Routes
//!
//! - GET /api/v1/devices/:id/messages - Messages of a device, newest first
//! - POST /api/v1/devices/:id/messages - Add a message
//! - PUT /api/v1/messages/:id - Edit a message
//! - POST /api/v1/messages/:id/toggle - Flip the active flag
//! - DELETE /api/v1/messages/:id - Delete a message

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::access::{owned_device, owned_message};
use crate::api::dto::{CreateMessageRequest, ListResponse};
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::models::{DeviceMessage, MessagePatch};

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(device_id): Path<String>,
) -> ApiResult<Json<ListResponse<DeviceMessage>>> {
    let ctx = user.dashboard(&state);
    owned_device(&ctx, &user, &device_id).await?;

    let mut page = ctx.messages(device_id);
    page.refresh().await?;

    Ok(Json(page.messages().to_vec().into()))
}

pub async fn create_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(device_id): Path<String>,
    Json(req): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<DeviceMessage>)> {
    let ctx = user.dashboard(&state);
    owned_device(&ctx, &user, &device_id).await?;

    let message = ctx.messages(device_id).add(&req.content, req.kind).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn update_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<MessagePatch>,
) -> ApiResult<Json<DeviceMessage>> {
    let ctx = user.dashboard(&state);
    let message = owned_message(&ctx, &user, &id).await?;

    let updated = ctx.messages(message.device_id).update(&id, patch).await?;
    Ok(Json(updated))
}

pub async fn toggle_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeviceMessage>> {
    let ctx = user.dashboard(&state);
    let message = owned_message(&ctx, &user, &id).await?;

    let mut page = ctx.messages(message.device_id);
    page.refresh().await?;
    Ok(Json(page.toggle(&id).await?))
}

pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let ctx = user.dashboard(&state);
    let message = owned_message(&ctx, &user, &id).await?;

    ctx.messages(message.device_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
