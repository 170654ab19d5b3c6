//! Device Routes
//!
//! - GET /api/v1/shops/:id/devices - Devices with gateway name and table number
//! - POST /api/v1/shops/:id/devices - Register a device
//! - GET /api/v1/shops/:id/available-tables - Tables a device may be linked to
//! - GET /api/v1/devices/:id - Get a device
//! - PUT /api/v1/devices/:id - Update, link (`table_id`) or unlink (`table_id: null`)
//! - DELETE /api/v1/devices/:id - Delete a device

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::access::{owned_device, owned_shop};
use crate::api::dto::{AvailableTablesQuery, DeviceListResponse, ListResponse};
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::dashboard::DeviceRow;
use crate::models::{DevicePatch, DiningTable, NewDevice};

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Json<DeviceListResponse>> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let mut page = ctx.devices(shop_id);
    page.refresh().await?;

    Ok(Json(DeviceListResponse {
        devices: page.rows(),
        stats: page.stats(),
    }))
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
    Json(form): Json<NewDevice>,
) -> ApiResult<(StatusCode, Json<DeviceRow>)> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let mut page = ctx.devices(shop_id);
    page.refresh().await?;
    let row = page.create(form).await?;

    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn available_tables(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
    Query(query): Query<AvailableTablesQuery>,
) -> ApiResult<Json<ListResponse<DiningTable>>> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let mut page = ctx.devices(shop_id);
    page.refresh().await?;

    Ok(Json(page.available_tables(query.device_id.as_deref()).into()))
}

pub async fn get_device(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeviceRow>> {
    let ctx = user.dashboard(&state);
    let device = owned_device(&ctx, &user, &id).await?;

    let mut page = ctx.devices(device.shop_id.clone());
    page.refresh().await?;

    Ok(Json(page.row(&device)))
}

pub async fn update_device(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<DevicePatch>,
) -> ApiResult<Json<DeviceRow>> {
    let ctx = user.dashboard(&state);
    let device = owned_device(&ctx, &user, &id).await?;

    let mut page = ctx.devices(device.shop_id);
    page.refresh().await?;
    let row = page.update(&id, patch).await?;

    Ok(Json(row))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let ctx = user.dashboard(&state);
    let device = owned_device(&ctx, &user, &id).await?;

    ctx.devices(device.shop_id).delete(&id).await?;
    tracing::info!(device_id = %id, "Deleted device");
    Ok(StatusCode::NO_CONTENT)
}
