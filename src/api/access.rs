//! Ownership checks
//!
//! Every record reached through the API must hang off a shop the caller
//! owns. Records that exist but belong to someone else answer exactly like
//! missing ones.

use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::dashboard::{DashboardContext, PageError};
use crate::models::{Device, DeviceMessage, DiningTable, Gateway, Record, Reminder, Shop};
use crate::repo::Repository;

async fn fetch<T: Record>(repo: &Repository<T>, what: &'static str, id: &str) -> ApiResult<T> {
    repo.get(id)
        .await?
        .ok_or_else(|| PageError::not_found(what, id).into())
}

pub async fn owned_shop(
    ctx: &DashboardContext,
    user: &CurrentUser,
    shop_id: &str,
) -> ApiResult<Shop> {
    let shop = fetch(&ctx.repos.shops, "cửa hàng", shop_id).await?;
    if shop.user_id != user.id() {
        tracing::warn!(shop_id, user_id = %user.id(), "Access to foreign shop refused");
        return Err(PageError::not_found("cửa hàng", shop_id).into());
    }
    Ok(shop)
}

pub async fn owned_gateway(
    ctx: &DashboardContext,
    user: &CurrentUser,
    id: &str,
) -> ApiResult<Gateway> {
    let gateway = fetch(&ctx.repos.gateways, "gateway", id).await?;
    owned_shop(ctx, user, &gateway.shop_id).await?;
    Ok(gateway)
}

pub async fn owned_table(
    ctx: &DashboardContext,
    user: &CurrentUser,
    id: &str,
) -> ApiResult<DiningTable> {
    let table = fetch(&ctx.repos.tables, "bàn", id).await?;
    owned_shop(ctx, user, &table.shop_id).await?;
    Ok(table)
}

pub async fn owned_device(
    ctx: &DashboardContext,
    user: &CurrentUser,
    id: &str,
) -> ApiResult<Device> {
    let device = fetch(&ctx.repos.devices, "thiết bị", id).await?;
    owned_shop(ctx, user, &device.shop_id).await?;
    Ok(device)
}

pub async fn owned_message(
    ctx: &DashboardContext,
    user: &CurrentUser,
    id: &str,
) -> ApiResult<DeviceMessage> {
    let message = fetch(&ctx.repos.messages, "tin nhắn", id).await?;
    owned_device(ctx, user, &message.device_id).await?;
    Ok(message)
}

/// A reminder and the table that places it in a shop
pub async fn owned_reminder(
    ctx: &DashboardContext,
    user: &CurrentUser,
    id: &str,
) -> ApiResult<(Reminder, DiningTable)> {
    let reminder = fetch(&ctx.repos.reminders, "nhắc nhở", id).await?;
    let table = owned_table(ctx, user, &reminder.table_id).await?;
    Ok((reminder, table))
}
