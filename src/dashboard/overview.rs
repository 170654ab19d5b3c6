//! Dashboard home numbers

use serde::Serialize;

use super::error::PageResult;
use super::DashboardContext;
use crate::models::GatewayStatus;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct OverviewStats {
    pub shops: usize,
    pub tables: usize,
    pub devices: usize,
    pub active_devices: usize,
    pub gateways: usize,
    pub gateways_online: usize,
    pub unread_notifications: usize,
}

impl OverviewStats {
    /// Walk the owner's shops and tally what hangs off each one
    pub async fn load(ctx: &DashboardContext, owner_id: &str) -> PageResult<Self> {
        let repos = &ctx.repos;
        let shops = repos.shops.list_for_owner(owner_id).await?;

        let mut stats = OverviewStats {
            shops: shops.len(),
            ..Default::default()
        };

        for shop in &shops {
            stats.tables += repos.tables.list_for_shop(&shop.id).await?.len();

            let devices = repos.devices.list_for_shop(&shop.id).await?;
            stats.devices += devices.len();
            stats.active_devices += devices.iter().filter(|d| d.is_online()).count();

            let gateways = repos.gateways.list_for_shop(&shop.id).await?;
            stats.gateways += gateways.len();
            stats.gateways_online += gateways
                .iter()
                .filter(|g| g.status == GatewayStatus::Online)
                .count();
        }

        stats.unread_notifications = ctx.notifications.unread_count_for(owner_id).await;
        tracing::debug!(owner_id, shops = stats.shops, "Overview loaded");

        Ok(stats)
    }
}
