//! Reminder Routes
//!
//! - GET /api/v1/shops/:id/reminders - Reminders of a shop (`?status=` filter)
//! - GET /api/v1/reminders - Reminders across all of the caller's shops
//! - POST /api/v1/reminders - Schedule a reminder for a table
//! - GET /api/v1/reminders/:id - Get a reminder
//! - DELETE /api/v1/reminders/:id - Delete a reminder
//! - POST /api/v1/reminders/:id/send - Mark sent now
//! - POST /api/v1/reminders/:id/cancel - Cancel a scheduled reminder
//! - POST /api/v1/reminders/:id/retry - Reschedule a failed reminder for now

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::access::{owned_reminder, owned_shop, owned_table};
use crate::api::dto::{
    CreateReminderRequest, ReminderFilter, ReminderListResponse, ReminderSentResponse,
};
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::dashboard::{ReminderCounts, RemindersPage};
use crate::models::Reminder;

fn list_response(page: &RemindersPage) -> ReminderListResponse {
    ReminderListResponse {
        reminders: page.visible().into_iter().cloned().collect(),
        counts: page.counts(),
    }
}

pub async fn list_shop_reminders(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
    Query(filter): Query<ReminderFilter>,
) -> ApiResult<Json<ReminderListResponse>> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let mut page = ctx.reminders(shop_id);
    page.refresh().await?;
    page.set_filter(filter.status);

    Ok(Json(list_response(&page)))
}

pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(filter): Query<ReminderFilter>,
) -> ApiResult<Json<ReminderListResponse>> {
    let ctx = user.dashboard(&state);
    let shops = ctx.repos.shops.list_for_owner(user.id()).await?;

    let mut reminders = Vec::new();
    let mut counts = ReminderCounts::default();
    for shop in shops {
        let mut page = ctx.reminders(shop.id);
        page.refresh().await?;
        page.set_filter(filter.status);

        let shop_counts = page.counts();
        counts.total += shop_counts.total;
        counts.sent += shop_counts.sent;
        counts.scheduled += shop_counts.scheduled;
        counts.failed += shop_counts.failed;
        reminders.extend(page.visible().into_iter().cloned());
    }
    reminders.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));

    Ok(Json(ReminderListResponse { reminders, counts }))
}

pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateReminderRequest>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    let ctx = user.dashboard(&state);
    let table = owned_table(&ctx, &user, &req.table_id).await?;

    let mut page = ctx.reminders(table.shop_id);
    page.refresh().await?;
    let reminder = page
        .create(&req.table_id, &req.device_id, &req.message, req.scheduled_time)
        .await?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn get_reminder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Reminder>> {
    let ctx = user.dashboard(&state);
    let (reminder, _) = owned_reminder(&ctx, &user, &id).await?;
    Ok(Json(reminder))
}

pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let ctx = user.dashboard(&state);
    let (_, table) = owned_reminder(&ctx, &user, &id).await?;

    ctx.reminders(table.shop_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn loaded_page(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<RemindersPage> {
    let ctx = user.dashboard(state);
    let (_, table) = owned_reminder(&ctx, user, id).await?;

    let mut page = ctx.reminders(table.shop_id);
    page.refresh().await?;
    Ok(page)
}

pub async fn send_reminder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ReminderSentResponse>> {
    let mut page = loaded_page(&state, &user, &id).await?;
    let (reminder, notification) = page.send(&id).await?;

    tracing::info!(reminder_id = %id, table_id = %reminder.table_id, "Reminder sent");
    Ok(Json(ReminderSentResponse {
        reminder,
        notification,
    }))
}

pub async fn cancel_reminder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Reminder>> {
    let mut page = loaded_page(&state, &user, &id).await?;
    Ok(Json(page.cancel(&id).await?))
}

pub async fn retry_reminder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Reminder>> {
    let mut page = loaded_page(&state, &user, &id).await?;
    Ok(Json(page.retry(&id).await?))
}
