//! Typed Record Access
//!
//! One [`Repository`] per record type, layered over an untyped
//! [`RecordStore`]. Each repository lists by parent with the ordering the
//! dashboard shows, creates, patches and hard-deletes. Nothing here checks
//! cross-record references; the dashboard pages do that before submitting.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::models::{
    ContactSubmission, Device, DeviceMessage, DiningTable, Gateway, Record, Reminder, Shop,
    UserProfile,
};
use crate::store::{Query, RecordStore, StoreError, StoreResult};

/// Typed access to one remote table
pub struct Repository<T: Record> {
    store: Arc<dyn RecordStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Rows matching `query`
    pub async fn list(&self, query: &Query) -> StoreResult<Vec<T>> {
        let rows = self.store.select(T::TABLE, query).await?;
        rows.into_iter().map(decode).collect()
    }

    /// The row with `id`, if any
    pub async fn get(&self, id: &str) -> StoreResult<Option<T>> {
        let mut rows = self.list(&Query::new().eq("id", id)).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Insert a record and return it with its generated id and timestamps
    pub async fn create(&self, new: &T::New) -> StoreResult<T> {
        let row = serde_json::to_value(new)?;
        let created = self.store.insert(T::TABLE, row).await?;

        tracing::info!(table = T::TABLE, id = ?created.get("id"), "Created record");
        decode(created)
    }

    /// Apply a partial update, stamping `updated_at`
    pub async fn update(&self, id: &str, patch: &T::Patch) -> StoreResult<T> {
        let mut row = serde_json::to_value(patch)?;
        if let Value::Object(fields) = &mut row {
            fields.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }

        let updated = self.store.update(T::TABLE, id, row).await?;
        tracing::info!(table = T::TABLE, id = %id, "Updated record");
        decode(updated)
    }

    /// Hard delete; dependent rows are left alone
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(T::TABLE, id).await?;
        tracing::info!(table = T::TABLE, id = %id, "Deleted record");
        Ok(())
    }
}

fn decode<T: Record>(row: Value) -> StoreResult<T> {
    serde_json::from_value(row).map_err(StoreError::from)
}

impl Repository<Shop> {
    /// Shops owned by `user_id`, newest first
    pub async fn list_for_owner(&self, user_id: &str) -> StoreResult<Vec<Shop>> {
        self.list(&Query::new().eq("user_id", user_id).order_by("created_at", false))
            .await
    }
}

impl Repository<Gateway> {
    /// Gateways of a shop, newest first
    pub async fn list_for_shop(&self, shop_id: &str) -> StoreResult<Vec<Gateway>> {
        self.list(&Query::new().eq("shop_id", shop_id).order_by("created_at", false))
            .await
    }
}

impl Repository<DiningTable> {
    /// Tables of a shop, by number
    pub async fn list_for_shop(&self, shop_id: &str) -> StoreResult<Vec<DiningTable>> {
        self.list(&Query::new().eq("shop_id", shop_id).order_by("number", true))
            .await
    }
}

impl Repository<Device> {
    /// Devices of a shop, newest first
    pub async fn list_for_shop(&self, shop_id: &str) -> StoreResult<Vec<Device>> {
        self.list(&Query::new().eq("shop_id", shop_id).order_by("created_at", false))
            .await
    }
}

impl Repository<DeviceMessage> {
    /// Messages of a device, newest first
    pub async fn list_for_device(&self, device_id: &str) -> StoreResult<Vec<DeviceMessage>> {
        self.list(
            &Query::new()
                .eq("device_id", device_id)
                .order_by("created_at", false),
        )
        .await
    }
}

impl Repository<Reminder> {
    /// Reminders for any of `table_ids`, latest scheduled first
    pub async fn list_for_tables(&self, table_ids: &[String]) -> StoreResult<Vec<Reminder>> {
        if table_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.list(
            &Query::new()
                .any_of("table_id", table_ids.iter().cloned())
                .order_by("scheduled_time", false),
        )
        .await
    }
}

/// All repositories over one store
#[derive(Clone)]
pub struct Repositories {
    pub shops: Repository<Shop>,
    pub gateways: Repository<Gateway>,
    pub tables: Repository<DiningTable>,
    pub devices: Repository<Device>,
    pub messages: Repository<DeviceMessage>,
    pub reminders: Repository<Reminder>,
    pub profiles: Repository<UserProfile>,
    pub contacts: Repository<ContactSubmission>,
}

impl Repositories {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            shops: Repository::new(store.clone()),
            gateways: Repository::new(store.clone()),
            tables: Repository::new(store.clone()),
            devices: Repository::new(store.clone()),
            messages: Repository::new(store.clone()),
            reminders: Repository::new(store.clone()),
            profiles: Repository::new(store.clone()),
            contacts: Repository::new(store),
        }
    }

    /// Reminders of a shop, resolved through the shop's tables
    pub async fn reminders_for_shop(&self, shop_id: &str) -> StoreResult<Vec<Reminder>> {
        let table_ids: Vec<String> = self
            .tables
            .list_for_shop(shop_id)
            .await?
            .into_iter()
            .map(|table| table.id)
            .collect();

        self.reminders.list_for_tables(&table_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        NewDevice, NewDiningTable, NewReminder, NewShop, ReminderUnit, ShopPatch,
    };
    use crate::store::{MemoryStore, OperationKind};

    fn setup() -> (Arc<MemoryStore>, Repositories) {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::new(store.clone());
        (store, repos)
    }

    #[tokio::test]
    async fn test_create_shop_defaults() {
        let (_, repos) = setup();
        let shop = repos
            .shops
            .create(
                &NewShop::new("user-1", "Café A")
                    .address("1 Main St")
                    .phone("0900000000"),
            )
            .await
            .unwrap();

        assert!(!shop.id.is_empty());
        assert_eq!(shop.name, "Café A");
        assert_eq!(shop.address.as_deref(), Some("1 Main St"));
        assert_eq!(shop.reminder_time, 30);
        assert_eq!(shop.reminder_unit, ReminderUnit::Minutes);
    }

    #[tokio::test]
    async fn test_shops_listed_newest_first_per_owner() {
        let (_, repos) = setup();
        repos.shops.create(&NewShop::new("u1", "First")).await.unwrap();
        repos.shops.create(&NewShop::new("u2", "Other")).await.unwrap();
        repos.shops.create(&NewShop::new("u1", "Second")).await.unwrap();

        let names: Vec<_> = repos
            .shops
            .list_for_owner("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_update_stamps_updated_at() {
        let (_, repos) = setup();
        let shop = repos.shops.create(&NewShop::new("u1", "Old")).await.unwrap();

        let patch = ShopPatch {
            name: Some("New".to_string()),
            ..Default::default()
        };
        let updated = repos.shops.update(&shop.id, &patch).await.unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.created_at, shop.created_at);
        assert!(updated.updated_at >= shop.updated_at);
    }

    #[tokio::test]
    async fn test_delete_issues_one_call() {
        let (store, repos) = setup();
        let shop = repos.shops.create(&NewShop::new("u1", "Gone")).await.unwrap();

        repos.shops.delete(&shop.id).await.unwrap();

        assert_eq!(store.count(OperationKind::Delete).await, 1);
        assert!(repos.shops.get(&shop.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_error_surfaces_verbatim() {
        let (store, repos) = setup();
        store.fail_next("new row violates row-level security policy").await;

        let err = repos.shops.list_for_owner("u1").await.unwrap_err();
        assert_eq!(err.to_string(), "new row violates row-level security policy");
    }

    #[tokio::test]
    async fn test_reminders_for_shop_via_tables() {
        let (_, repos) = setup();
        let t1 = repos
            .tables
            .create(&NewDiningTable::new("shop-1", "1"))
            .await
            .unwrap();
        let other = repos
            .tables
            .create(&NewDiningTable::new("shop-2", "1"))
            .await
            .unwrap();
        let device = repos
            .devices
            .create(&NewDevice::new("shop-1", "gw-1", "DEV001", "Thiết bị 1"))
            .await
            .unwrap();

        for table_id in [&t1.id, &other.id] {
            repos
                .reminders
                .create(&NewReminder {
                    table_id: table_id.clone(),
                    device_id: device.id.clone(),
                    scheduled_time: Utc::now(),
                    status: Default::default(),
                    message: "Nhắc nhở".to_string(),
                    origin: Default::default(),
                })
                .await
                .unwrap();
        }

        let reminders = repos.reminders_for_shop("shop-1").await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].table_id, t1.id);
    }

    #[tokio::test]
    async fn test_reminders_for_shop_without_tables_skips_query() {
        let (store, repos) = setup();
        let reminders = repos.reminders_for_shop("empty").await.unwrap();

        assert!(reminders.is_empty());
        assert_eq!(store.count(OperationKind::Select).await, 1);
    }
}
