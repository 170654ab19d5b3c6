//! Table Routes
//!
//! - GET /api/v1/shops/:id/tables - Tables of a shop, by number
//! - POST /api/v1/shops/:id/tables - Add a table
//! - GET /api/v1/tables/:id - Get a table
//! - PUT /api/v1/tables/:id - Update a table
//! - DELETE /api/v1/tables/:id - Delete a table
//! - POST /api/v1/tables/:id/remind - Send a reminder to a table

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::access::{owned_shop, owned_table};
use crate::api::dto::{RemindResponse, TableListResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::models::{DiningTable, NewDiningTable, TablePatch};

pub async fn list_tables(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Json<TableListResponse>> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let mut page = ctx.tables(shop_id);
    page.refresh().await?;

    Ok(Json(TableListResponse {
        tables: page.tables().to_vec(),
        counts: page.counts(),
    }))
}

pub async fn create_table(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
    Json(form): Json<NewDiningTable>,
) -> ApiResult<(StatusCode, Json<DiningTable>)> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let table = ctx.tables(shop_id).create(form).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

pub async fn get_table(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DiningTable>> {
    let ctx = user.dashboard(&state);
    Ok(Json(owned_table(&ctx, &user, &id).await?))
}

pub async fn update_table(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<TablePatch>,
) -> ApiResult<Json<DiningTable>> {
    let ctx = user.dashboard(&state);
    let table = owned_table(&ctx, &user, &id).await?;

    let updated = ctx.tables(table.shop_id).update(&id, patch).await?;
    Ok(Json(updated))
}

pub async fn delete_table(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let ctx = user.dashboard(&state);
    let table = owned_table(&ctx, &user, &id).await?;

    ctx.tables(table.shop_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tables/:id/remind
///
/// Stamps the table's last reminder and logs a reminder notification.
pub async fn remind_table(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RemindResponse>> {
    let ctx = user.dashboard(&state);
    let table = owned_table(&ctx, &user, &id).await?;

    let mut page = ctx.tables(table.shop_id);
    page.refresh().await?;
    let notification = page.send_reminder(&id).await?;

    let table = page
        .collection()
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::Internal(format!("table {} missing after reminder", id)))?;

    Ok(Json(RemindResponse {
        table,
        notification,
    }))
}
