//! Tables screen

use chrono::Utc;
use serde::Serialize;

use super::collection::{Collection, Placement};
use super::error::{PageError, PageResult};
use super::DashboardContext;
use crate::models::{
    DiningTable, NewDiningTable, Notification, NotificationDraft, NotificationKind, TablePatch,
    TableStatus,
};

pub const REMINDER_SENT_TITLE: &str = "Nhắc nhở đã gửi";

/// Tables per occupancy state
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TableCounts {
    pub total: usize,
    pub empty: usize,
    pub occupied: usize,
    pub reserved: usize,
}

pub struct TablesPage {
    ctx: DashboardContext,
    shop_id: String,
    tables: Collection<DiningTable>,
}

impl TablesPage {
    pub(super) fn new(ctx: DashboardContext, shop_id: String) -> Self {
        Self {
            ctx,
            shop_id,
            tables: Collection::new(),
        }
    }

    pub fn tables(&self) -> &[DiningTable] {
        self.tables.items()
    }

    pub fn collection(&self) -> &Collection<DiningTable> {
        &self.tables
    }

    pub fn counts(&self) -> TableCounts {
        self.tables().iter().fold(
            TableCounts {
                total: self.tables.len(),
                ..Default::default()
            },
            |mut acc, t| {
                match t.status {
                    TableStatus::Empty => acc.empty += 1,
                    TableStatus::Occupied => acc.occupied += 1,
                    TableStatus::Reserved => acc.reserved += 1,
                }
                acc
            },
        )
    }

    pub async fn refresh(&mut self) -> PageResult<()> {
        let repo = &self.ctx.repos.tables;
        self.tables.load(repo.list_for_shop(&self.shop_id)).await
    }

    /// New tables go to the end, keeping the list in number order
    pub async fn create(&mut self, mut form: NewDiningTable) -> PageResult<DiningTable> {
        if form.number.trim().is_empty() {
            return Err(self.tables.fail(PageError::MissingFields));
        }
        form.shop_id = self.shop_id.clone();

        let result = self.ctx.repos.tables.create(&form).await;
        self.tables.created(result, Placement::Back)
    }

    pub async fn update(&mut self, id: &str, patch: TablePatch) -> PageResult<DiningTable> {
        if patch.number.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(self.tables.fail(PageError::MissingFields));
        }

        let result = self.ctx.repos.tables.update(id, &patch).await;
        self.tables.updated(result)
    }

    pub async fn set_status(&mut self, id: &str, status: TableStatus) -> PageResult<DiningTable> {
        let patch = TablePatch {
            status: Some(status),
            ..Default::default()
        };
        self.update(id, patch).await
    }

    pub async fn delete(&mut self, id: &str) -> PageResult<()> {
        let result = self.ctx.repos.tables.delete(id).await;
        self.tables.deleted(id, result)
    }

    /// Stamp `last_reminder` and log a reminder notification
    ///
    /// The notification quotes the shop's configured reminder delay.
    pub async fn send_reminder(&mut self, id: &str) -> PageResult<Notification> {
        let shop = self.ctx.repos.shops.get(&self.shop_id).await;
        let shop = match shop {
            Ok(Some(shop)) => shop,
            Ok(None) => return Err(self.tables.fail(PageError::not_found("cửa hàng", &self.shop_id))),
            Err(e) => return Err(self.tables.fail(e.into())),
        };

        let patch = TablePatch {
            last_reminder: Some(Utc::now()),
            ..Default::default()
        };
        let result = self.ctx.repos.tables.update(id, &patch).await;
        let table = self.tables.updated(result)?;

        tracing::info!(table_id = %table.id, number = %table.number, "Reminder sent to table");

        let draft = NotificationDraft::new(
            NotificationKind::Reminder,
            REMINDER_SENT_TITLE,
            format!(
                "Đã gửi nhắc nhở đến bàn {} sau {}",
                table.number,
                shop.reminder_label()
            ),
        )
        .table(table.id.clone())
        .shop(&shop);

        Ok(self.ctx.notifications.add(draft).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::context;
    use crate::models::{NewShop, ReminderUnit};

    #[tokio::test]
    async fn test_tables_append_in_creation_order() {
        let (_, ctx) = context();
        let mut page = ctx.tables("shop-1");

        for number in ["1", "2", "3"] {
            page.create(NewDiningTable::new("", number)).await.unwrap();
        }

        let numbers: Vec<_> = page.tables().iter().map(|t| t.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
        assert_eq!(page.tables()[0].status, TableStatus::Empty);
        assert_eq!(page.counts().empty, 3);
    }

    #[tokio::test]
    async fn test_counts_by_status() {
        let (_, ctx) = context();
        let mut page = ctx.tables("shop-1");
        let t1 = page.create(NewDiningTable::new("", "1")).await.unwrap();
        let t2 = page.create(NewDiningTable::new("", "2")).await.unwrap();
        page.create(NewDiningTable::new("", "3")).await.unwrap();

        page.set_status(&t1.id, TableStatus::Occupied).await.unwrap();
        page.set_status(&t2.id, TableStatus::Reserved).await.unwrap();

        assert_eq!(
            page.counts(),
            TableCounts {
                total: 3,
                empty: 1,
                occupied: 1,
                reserved: 1
            }
        );
    }

    #[tokio::test]
    async fn test_send_reminder_stamps_and_notifies() {
        let (_, ctx) = context();
        let shop = ctx
            .shops("owner-1")
            .create(NewShop::new("", "Café").reminder(15, ReminderUnit::Minutes))
            .await
            .unwrap();
        let mut page = ctx.tables(shop.id.clone());
        let table = page.create(NewDiningTable::new("", "7")).await.unwrap();
        assert!(table.last_reminder.is_none());

        let notification = page.send_reminder(&table.id).await.unwrap();

        assert!(page.tables()[0].last_reminder.is_some());
        assert_eq!(notification.kind, NotificationKind::Reminder);
        assert_eq!(notification.title, REMINDER_SENT_TITLE);
        assert_eq!(notification.message, "Đã gửi nhắc nhở đến bàn 7 sau 15 phút");
        assert_eq!(notification.table_id.as_deref(), Some(table.id.as_str()));
        assert_eq!(notification.shop_id.as_deref(), Some(shop.id.as_str()));
        assert_eq!(ctx.notifications.unread_count_for("owner-1").await, 1);
        assert_eq!(ctx.notifications.unread_count_for("owner-2").await, 0);
    }

    #[tokio::test]
    async fn test_send_reminder_unknown_shop() {
        let (_, ctx) = context();
        let mut page = ctx.tables("missing");
        let err = page.send_reminder("t1").await.unwrap_err();
        assert!(matches!(err, PageError::NotFound { .. }));
        assert!(ctx.notifications.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_list() {
        let (store, ctx) = context();
        let mut page = ctx.tables("shop-1");
        page.create(NewDiningTable::new("", "1")).await.unwrap();

        store.fail_next("duplicate key value").await;
        let err = page.create(NewDiningTable::new("", "1")).await.unwrap_err();

        assert_eq!(err.to_string(), "duplicate key value");
        assert_eq!(page.tables().len(), 1);
        assert_eq!(page.collection().error(), Some("duplicate key value"));
    }
}
