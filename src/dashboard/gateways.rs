//! Gateways screen

use super::collection::{Collection, Placement};
use super::error::{PageError, PageResult};
use super::DashboardContext;
use crate::models::{Gateway, GatewayPatch, GatewayStatus, NewGateway};

pub struct GatewaysPage {
    ctx: DashboardContext,
    shop_id: String,
    gateways: Collection<Gateway>,
}

impl GatewaysPage {
    pub(super) fn new(ctx: DashboardContext, shop_id: String) -> Self {
        Self {
            ctx,
            shop_id,
            gateways: Collection::new(),
        }
    }

    pub fn gateways(&self) -> &[Gateway] {
        self.gateways.items()
    }

    pub fn collection(&self) -> &Collection<Gateway> {
        &self.gateways
    }

    pub fn online_count(&self) -> usize {
        self.gateways()
            .iter()
            .filter(|g| g.status == GatewayStatus::Online)
            .count()
    }

    pub async fn refresh(&mut self) -> PageResult<()> {
        let repo = &self.ctx.repos.gateways;
        self.gateways.load(repo.list_for_shop(&self.shop_id)).await
    }

    pub async fn create(&mut self, mut form: NewGateway) -> PageResult<Gateway> {
        if form.name.trim().is_empty() || form.server_ip.trim().is_empty() {
            return Err(self.gateways.fail(PageError::MissingFields));
        }
        form.shop_id = self.shop_id.clone();

        let result = self.ctx.repos.gateways.create(&form).await;
        self.gateways.created(result, Placement::Front)
    }

    pub async fn update(&mut self, id: &str, patch: GatewayPatch) -> PageResult<Gateway> {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&patch.name) || blank(&patch.server_ip) {
            return Err(self.gateways.fail(PageError::MissingFields));
        }

        let result = self.ctx.repos.gateways.update(id, &patch).await;
        self.gateways.updated(result)
    }

    pub async fn delete(&mut self, id: &str) -> PageResult<()> {
        let result = self.ctx.repos.gateways.delete(id).await;
        self.gateways.deleted(id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::context;

    #[tokio::test]
    async fn test_create_gateway_defaults() {
        let (_, ctx) = context();
        let mut page = ctx.gateways("shop-1");

        let gw = page
            .create(NewGateway::new("", "Gateway tầng 1", "192.168.1.10"))
            .await
            .unwrap();

        assert_eq!(gw.shop_id, "shop-1");
        assert_eq!(gw.web_server_port, 8080);
        assert_eq!(gw.websocket_port, 8081);
        assert_eq!(gw.status, GatewayStatus::Offline);
        assert_eq!(gw.connected_devices, 0);
        assert_eq!(gw.websocket_url(), "ws://192.168.1.10:8081");
    }

    #[tokio::test]
    async fn test_online_count_and_refresh_scope() {
        let (_, ctx) = context();
        let mut page = ctx.gateways("shop-1");
        let gw = page.create(NewGateway::new("", "A", "10.0.0.1")).await.unwrap();
        ctx.gateways("shop-2")
            .create(NewGateway::new("", "B", "10.0.0.2"))
            .await
            .unwrap();

        page.update(
            &gw.id,
            GatewayPatch {
                status: Some(GatewayStatus::Online),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        page.refresh().await.unwrap();

        assert_eq!(page.gateways().len(), 1);
        assert_eq!(page.online_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_ip_rejected() {
        let (_, ctx) = context();
        let mut page = ctx.gateways("shop-1");
        let err = page.create(NewGateway::new("", "A", "")).await.unwrap_err();
        assert!(matches!(err, PageError::MissingFields));
    }
}
