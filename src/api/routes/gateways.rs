//! Gateway Routes
//!
//! - GET /api/v1/shops/:id/gateways - Gateways of a shop
//! - POST /api/v1/shops/:id/gateways - Register a gateway
//! - GET /api/v1/gateways/:id - Get a gateway
//! - PUT /api/v1/gateways/:id - Update a gateway
//! - DELETE /api/v1/gateways/:id - Delete a gateway

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::access::{owned_gateway, owned_shop};
use crate::api::dto::GatewayListResponse;
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::models::{Gateway, GatewayPatch, NewGateway};

pub async fn list_gateways(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
) -> ApiResult<Json<GatewayListResponse>> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let mut page = ctx.gateways(shop_id);
    page.refresh().await?;

    Ok(Json(GatewayListResponse {
        gateways: page.gateways().to_vec(),
        total: page.gateways().len(),
        online: page.online_count(),
    }))
}

pub async fn create_gateway(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(shop_id): Path<String>,
    Json(form): Json<NewGateway>,
) -> ApiResult<(StatusCode, Json<Gateway>)> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &shop_id).await?;

    let gateway = ctx.gateways(shop_id).create(form).await?;
    tracing::info!(gateway_id = %gateway.id, server_ip = %gateway.server_ip, "Registered gateway");

    Ok((StatusCode::CREATED, Json(gateway)))
}

pub async fn get_gateway(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Gateway>> {
    let ctx = user.dashboard(&state);
    Ok(Json(owned_gateway(&ctx, &user, &id).await?))
}

pub async fn update_gateway(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<GatewayPatch>,
) -> ApiResult<Json<Gateway>> {
    let ctx = user.dashboard(&state);
    let gateway = owned_gateway(&ctx, &user, &id).await?;

    let updated = ctx.gateways(gateway.shop_id).update(&id, patch).await?;
    Ok(Json(updated))
}

pub async fn delete_gateway(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let ctx = user.dashboard(&state);
    let gateway = owned_gateway(&ctx, &user, &id).await?;

    ctx.gateways(gateway.shop_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
