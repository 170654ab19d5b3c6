//! Devices screen
//!
//! Devices are shown joined with their gateway's name and their table's
//! number. Before any write the page checks that the gateway and table
//! belong to the shop and that the table is not already taken.

use serde::Serialize;

use super::collection::{Collection, Placement};
use super::error::{PageError, PageResult};
use super::DashboardContext;
use crate::models::{Device, DevicePatch, DeviceStatus, DiningTable, Gateway, NewDevice};

/// A device with the names the list view needs
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeviceRow {
    #[serde(flatten)]
    pub device: Device,
    pub gateway_name: Option<String>,
    pub table_number: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DeviceStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub low_battery: usize,
    pub linked: usize,
}

pub struct DevicesPage {
    ctx: DashboardContext,
    shop_id: String,
    devices: Collection<Device>,
    gateways: Vec<Gateway>,
    tables: Vec<DiningTable>,
}

impl DevicesPage {
    pub(super) fn new(ctx: DashboardContext, shop_id: String) -> Self {
        Self {
            ctx,
            shop_id,
            devices: Collection::new(),
            gateways: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn devices(&self) -> &[Device] {
        self.devices.items()
    }

    pub fn collection(&self) -> &Collection<Device> {
        &self.devices
    }

    pub fn gateways(&self) -> &[Gateway] {
        &self.gateways
    }

    /// Load gateways and tables for the pickers, then the devices
    pub async fn refresh(&mut self) -> PageResult<()> {
        let repos = &self.ctx.repos;

        match repos.gateways.list_for_shop(&self.shop_id).await {
            Ok(gateways) => self.gateways = gateways,
            Err(e) => return Err(self.devices.fail(e.into())),
        }
        match repos.tables.list_for_shop(&self.shop_id).await {
            Ok(tables) => self.tables = tables,
            Err(e) => return Err(self.devices.fail(e.into())),
        }

        self.devices.load(repos.devices.list_for_shop(&self.shop_id)).await
    }

    pub fn rows(&self) -> Vec<DeviceRow> {
        self.devices().iter().map(|d| self.row(d)).collect()
    }

    pub fn row(&self, device: &Device) -> DeviceRow {
        let gateway_name = self
            .gateways
            .iter()
            .find(|g| g.id == device.gateway_id)
            .map(|g| g.name.clone());
        let table_number = device
            .table_id
            .as_deref()
            .and_then(|id| self.tables.iter().find(|t| t.id == id))
            .map(|t| t.number.clone());

        DeviceRow {
            device: device.clone(),
            gateway_name,
            table_number,
        }
    }

    /// Tables a device may be linked to
    ///
    /// Excludes tables linked to any device other than `device_id`.
    pub fn available_tables(&self, device_id: Option<&str>) -> Vec<DiningTable> {
        self.tables
            .iter()
            .filter(|t| self.holder_of(&t.id).map_or(true, |d| Some(d.id.as_str()) == device_id))
            .cloned()
            .collect()
    }

    fn holder_of(&self, table_id: &str) -> Option<&Device> {
        self.devices()
            .iter()
            .find(|d| d.table_id.as_deref() == Some(table_id))
    }

    /// Check a prospective gateway/table assignment against the loaded shop
    pub fn validate(
        &self,
        device_id: Option<&str>,
        gateway_id: Option<&str>,
        table_id: Option<&str>,
    ) -> PageResult<()> {
        if let Some(gateway_id) = gateway_id {
            if !self.gateways.iter().any(|g| g.id == gateway_id) {
                return Err(PageError::GatewayNotInShop);
            }
        }

        if let Some(table_id) = table_id {
            let table = self
                .tables
                .iter()
                .find(|t| t.id == table_id)
                .ok_or(PageError::TableNotInShop)?;

            if let Some(holder) = self.holder_of(table_id) {
                if Some(holder.id.as_str()) != device_id {
                    return Err(PageError::TableTaken {
                        number: table.number.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub async fn create(&mut self, mut form: NewDevice) -> PageResult<DeviceRow> {
        if form.code.trim().is_empty()
            || form.name.trim().is_empty()
            || form.gateway_id.trim().is_empty()
        {
            return Err(self.devices.fail(PageError::MissingFields));
        }
        if let Err(e) = self.validate(None, Some(&form.gateway_id), form.table_id.as_deref()) {
            return Err(self.devices.fail(e));
        }
        form.shop_id = self.shop_id.clone();

        let result = self.ctx.repos.devices.create(&form).await;
        let device = self.devices.created(result, Placement::Front)?;
        tracing::info!(device_id = %device.id, code = %device.code, "Device registered");

        Ok(self.row(&device))
    }

    pub async fn update(&mut self, id: &str, patch: DevicePatch) -> PageResult<DeviceRow> {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&patch.code) || blank(&patch.name) || blank(&patch.gateway_id) {
            return Err(self.devices.fail(PageError::MissingFields));
        }
        let table_id = patch.table_id.as_ref().and_then(|t| t.as_deref());
        if let Err(e) = self.validate(Some(id), patch.gateway_id.as_deref(), table_id) {
            return Err(self.devices.fail(e));
        }

        let result = self.ctx.repos.devices.update(id, &patch).await;
        let device = self.devices.updated(result)?;
        Ok(self.row(&device))
    }

    /// Link the device to a table, or unlink it with `None`
    pub async fn link(&mut self, id: &str, table_id: Option<&str>) -> PageResult<DeviceRow> {
        self.update(id, DevicePatch::link(table_id.map(str::to_string)))
            .await
    }

    pub async fn delete(&mut self, id: &str) -> PageResult<()> {
        let result = self.ctx.repos.devices.delete(id).await;
        self.devices.deleted(id, result)
    }

    pub fn stats(&self) -> DeviceStats {
        let mut stats = DeviceStats {
            total: self.devices.len(),
            ..Default::default()
        };
        for device in self.devices() {
            match device.status {
                DeviceStatus::Online => stats.online += 1,
                DeviceStatus::Offline => stats.offline += 1,
                DeviceStatus::LowBattery => stats.low_battery += 1,
            }
            if device.is_linked() {
                stats.linked += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::context;
    use crate::models::{NewDiningTable, NewGateway};
    use crate::store::OperationKind;

    struct Fixture {
        page: DevicesPage,
        store: std::sync::Arc<crate::store::MemoryStore>,
        gateway: Gateway,
        tables: Vec<DiningTable>,
    }

    async fn fixture() -> Fixture {
        let (store, ctx) = context();
        let gateway = ctx
            .gateways("shop-1")
            .create(NewGateway::new("", "GW-1", "10.0.0.1"))
            .await
            .unwrap();
        let mut tables_page = ctx.tables("shop-1");
        let mut tables = Vec::new();
        for n in ["1", "2"] {
            tables.push(tables_page.create(NewDiningTable::new("", n)).await.unwrap());
        }
        ctx.tables("shop-2")
            .create(NewDiningTable::new("", "99"))
            .await
            .unwrap();

        let mut page = ctx.devices("shop-1");
        page.refresh().await.unwrap();

        Fixture {
            page,
            store,
            gateway,
            tables,
        }
    }

    #[tokio::test]
    async fn test_create_joins_names() {
        let mut f = fixture().await;
        let form = NewDevice::new("", &f.gateway.id, "KV-001", "Bàn 1").table(&f.tables[0].id);

        let row = f.page.create(form).await.unwrap();

        assert_eq!(row.device.shop_id, "shop-1");
        assert_eq!(row.device.battery_level, 100);
        assert_eq!(row.device.status, DeviceStatus::Offline);
        assert_eq!(row.gateway_name.as_deref(), Some("GW-1"));
        assert_eq!(row.table_number.as_deref(), Some("1"));
        assert_eq!(f.page.stats().linked, 1);
    }

    #[tokio::test]
    async fn test_available_tables_exclude_linked() {
        let mut f = fixture().await;
        let form = NewDevice::new("", &f.gateway.id, "KV-001", "D1").table(&f.tables[0].id);
        let row = f.page.create(form).await.unwrap();

        let for_new: Vec<_> = f
            .page
            .available_tables(None)
            .into_iter()
            .map(|t| t.number)
            .collect();
        assert_eq!(for_new, vec!["2"]);

        let for_owner = f.page.available_tables(Some(&row.device.id));
        assert_eq!(for_owner.len(), 2);
    }

    #[tokio::test]
    async fn test_taken_table_rejected_before_store() {
        let mut f = fixture().await;
        f.page
            .create(NewDevice::new("", &f.gateway.id, "A", "A").table(&f.tables[0].id))
            .await
            .unwrap();
        let inserts = f.store.count(OperationKind::Insert).await;

        let err = f
            .page
            .create(NewDevice::new("", &f.gateway.id, "B", "B").table(&f.tables[0].id))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Bàn 1 đã được liên kết với thiết bị khác");
        assert_eq!(f.store.count(OperationKind::Insert).await, inserts);
    }

    #[tokio::test]
    async fn test_foreign_gateway_and_table_rejected() {
        let f = fixture().await;
        assert!(matches!(
            f.page.validate(None, Some("other-gw"), None),
            Err(PageError::GatewayNotInShop)
        ));
        assert!(matches!(
            f.page.validate(None, Some(&f.gateway.id), Some("other-table")),
            Err(PageError::TableNotInShop)
        ));
    }

    #[tokio::test]
    async fn test_link_and_unlink() {
        let mut f = fixture().await;
        let row = f
            .page
            .create(NewDevice::new("", &f.gateway.id, "A", "A"))
            .await
            .unwrap();
        assert!(!row.device.is_linked());

        let linked = f.page.link(&row.device.id, Some(&f.tables[1].id)).await.unwrap();
        assert_eq!(linked.table_number.as_deref(), Some("2"));

        let unlinked = f.page.link(&row.device.id, None).await.unwrap();
        assert!(unlinked.device.table_id.is_none());
        assert!(unlinked.table_number.is_none());
        assert_eq!(f.page.available_tables(None).len(), 2);
    }

    #[tokio::test]
    async fn test_stats_and_delete() {
        let mut f = fixture().await;
        let a = f
            .page
            .create(NewDevice::new("", &f.gateway.id, "A", "A"))
            .await
            .unwrap();
        f.page
            .create(NewDevice::new("", &f.gateway.id, "B", "B"))
            .await
            .unwrap();
        f.page
            .update(
                &a.device.id,
                DevicePatch {
                    status: Some(DeviceStatus::Online),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stats = f.page.stats();
        assert_eq!((stats.total, stats.online, stats.offline), (2, 1, 1));

        f.page.delete(&a.device.id).await.unwrap();
        assert_eq!(f.page.stats().total, 1);
    }
}
