//! Shop Routes
//!
//! - GET /api/v1/shops - The caller's shops, newest first
//! - POST /api/v1/shops - Create a shop
//! - GET /api/v1/shops/:id - Get a shop
//! - PUT /api/v1/shops/:id - Update a shop
//! - DELETE /api/v1/shops/:id - Delete a shop

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::access::owned_shop;
use crate::api::dto::ListResponse;
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::models::{NewShop, Shop, ShopPatch};

pub async fn list_shops(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<ListResponse<Shop>>> {
    let mut page = user.dashboard(&state).shops(user.id());
    page.refresh().await?;

    Ok(Json(page.shops().to_vec().into()))
}

pub async fn create_shop(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(form): Json<NewShop>,
) -> ApiResult<(StatusCode, Json<Shop>)> {
    let mut page = user.dashboard(&state).shops(user.id());
    let shop = page.create(form).await?;

    tracing::info!(shop_id = %shop.id, user_id = %user.id(), "Created shop");
    Ok((StatusCode::CREATED, Json(shop)))
}

pub async fn get_shop(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Shop>> {
    let ctx = user.dashboard(&state);
    Ok(Json(owned_shop(&ctx, &user, &id).await?))
}

pub async fn update_shop(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<ShopPatch>,
) -> ApiResult<Json<Shop>> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &id).await?;

    let shop = ctx.shops(user.id()).update(&id, patch).await?;
    Ok(Json(shop))
}

pub async fn delete_shop(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let ctx = user.dashboard(&state);
    owned_shop(&ctx, &user, &id).await?;

    ctx.shops(user.id()).delete(&id).await?;
    tracing::info!(shop_id = %id, "Deleted shop");
    Ok(StatusCode::NO_CONTENT)
}
