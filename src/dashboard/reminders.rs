//! Reminders screen
//!
//! Reminders are stored per table, so a shop's reminders are found through
//! its tables. A reminder's device must also belong to the shop. Allowed
//! transitions: scheduled → sent, scheduled → cancelled,
//! failed → scheduled (retry).

use chrono::Utc;
use serde::Serialize;

use super::collection::{Collection, Placement};
use super::error::{PageError, PageResult};
use super::tables::REMINDER_SENT_TITLE;
use super::DashboardContext;
use crate::models::{
    Device, DiningTable, NewReminder, Notification, NotificationDraft, NotificationKind, Reminder,
    ReminderOrigin, ReminderPatch, ReminderStatus, Shop, Timestamp, UNKNOWN_TABLE,
};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReminderCounts {
    pub total: usize,
    pub sent: usize,
    pub scheduled: usize,
    pub failed: usize,
}

pub struct RemindersPage {
    ctx: DashboardContext,
    shop_id: String,
    shop: Option<Shop>,
    tables: Vec<DiningTable>,
    devices: Vec<Device>,
    reminders: Collection<Reminder>,
    filter: Option<ReminderStatus>,
}

impl RemindersPage {
    pub(super) fn new(ctx: DashboardContext, shop_id: String) -> Self {
        Self {
            ctx,
            shop_id,
            shop: None,
            tables: Vec::new(),
            devices: Vec::new(),
            reminders: Collection::new(),
            filter: None,
        }
    }

    pub fn reminders(&self) -> &[Reminder] {
        self.reminders.items()
    }

    pub fn collection(&self) -> &Collection<Reminder> {
        &self.reminders
    }

    /// Show only reminders in `status`; `None` shows all
    pub fn set_filter(&mut self, status: Option<ReminderStatus>) {
        self.filter = status;
    }

    pub fn visible(&self) -> Vec<&Reminder> {
        self.reminders()
            .iter()
            .filter(|r| self.filter.map_or(true, |s| r.status == s))
            .collect()
    }

    pub fn counts(&self) -> ReminderCounts {
        let count = |status| self.reminders().iter().filter(|r| r.status == status).count();
        ReminderCounts {
            total: self.reminders.len(),
            sent: count(ReminderStatus::Sent),
            scheduled: count(ReminderStatus::Scheduled),
            failed: count(ReminderStatus::Failed),
        }
    }

    pub fn table_number(&self, table_id: &str) -> &str {
        self.tables
            .iter()
            .find(|t| t.id == table_id)
            .map_or(UNKNOWN_TABLE, |t| t.number.as_str())
    }

    /// Reload the shop, its tables and devices, then their reminders
    pub async fn refresh(&mut self) -> PageResult<()> {
        let repos = &self.ctx.repos;
        let lookups = async {
            let shop = repos.shops.get(&self.shop_id).await?;
            let tables = repos.tables.list_for_shop(&self.shop_id).await?;
            let devices = repos.devices.list_for_shop(&self.shop_id).await?;
            Ok::<_, crate::store::StoreError>((shop, tables, devices))
        };
        match lookups.await {
            Ok((shop, tables, devices)) => {
                self.shop = shop;
                self.tables = tables;
                self.devices = devices;
            }
            Err(e) => return Err(self.reminders.fail(e.into())),
        }

        let ids: Vec<String> = self.tables.iter().map(|t| t.id.clone()).collect();
        self.reminders.load(repos.reminders.list_for_tables(&ids)).await
    }

    /// Schedule a manual reminder for one of the shop's tables
    pub async fn create(
        &mut self,
        table_id: &str,
        device_id: &str,
        message: &str,
        scheduled_time: Option<Timestamp>,
    ) -> PageResult<Reminder> {
        if table_id.is_empty() || device_id.is_empty() || message.trim().is_empty() {
            return Err(self.reminders.fail(PageError::MissingFields));
        }
        if !self.tables.iter().any(|t| t.id == table_id) {
            return Err(self.reminders.fail(PageError::TableNotInShop));
        }
        if !self.devices.iter().any(|d| d.id == device_id) {
            return Err(self.reminders.fail(PageError::DeviceNotInShop));
        }

        let form = NewReminder {
            table_id: table_id.to_string(),
            device_id: device_id.to_string(),
            scheduled_time: scheduled_time.unwrap_or_else(Utc::now),
            status: ReminderStatus::Scheduled,
            message: message.trim().to_string(),
            origin: ReminderOrigin::Manual,
        };
        let result = self.ctx.repos.reminders.create(&form).await;
        self.reminders.created(result, Placement::Front)
    }

    /// Mark a scheduled reminder sent and log a notification
    pub async fn send(&mut self, id: &str) -> PageResult<(Reminder, Notification)> {
        self.expect_status(id, ReminderStatus::Scheduled)?;

        let patch = ReminderPatch {
            status: Some(ReminderStatus::Sent),
            sent_time: Some(Utc::now()),
            ..Default::default()
        };
        let result = self.ctx.repos.reminders.update(id, &patch).await;
        let reminder = self.reminders.updated(result)?;

        let mut draft = NotificationDraft::new(
            NotificationKind::Reminder,
            REMINDER_SENT_TITLE,
            format!(
                "Đã gửi nhắc nhở đến bàn {}",
                self.table_number(&reminder.table_id)
            ),
        )
        .table(reminder.table_id.clone())
        .device(reminder.device_id.clone());
        if let Some(shop) = &self.shop {
            draft = draft.shop(shop);
        }
        let notification = self.ctx.notifications.add(draft).await;

        Ok((reminder, notification))
    }

    pub async fn cancel(&mut self, id: &str) -> PageResult<Reminder> {
        self.expect_status(id, ReminderStatus::Scheduled)?;

        let patch = ReminderPatch {
            status: Some(ReminderStatus::Cancelled),
            ..Default::default()
        };
        let result = self.ctx.repos.reminders.update(id, &patch).await;
        self.reminders.updated(result)
    }

    /// Reschedule a failed reminder for now
    pub async fn retry(&mut self, id: &str) -> PageResult<Reminder> {
        self.expect_status(id, ReminderStatus::Failed)?;

        let patch = ReminderPatch {
            status: Some(ReminderStatus::Scheduled),
            scheduled_time: Some(Utc::now()),
            ..Default::default()
        };
        let result = self.ctx.repos.reminders.update(id, &patch).await;
        self.reminders.updated(result)
    }

    pub async fn delete(&mut self, id: &str) -> PageResult<()> {
        let result = self.ctx.repos.reminders.delete(id).await;
        self.reminders.deleted(id, result)
    }

    fn expect_status(&mut self, id: &str, wanted: ReminderStatus) -> PageResult<()> {
        let Some(status) = self.reminders.get(id).map(|r| r.status) else {
            return Err(self.reminders.fail(PageError::not_found("nhắc nhở", id)));
        };
        if status != wanted {
            return Err(self.reminders.fail(PageError::InvalidReminderState(status)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::context;
    use crate::models::{NewDevice, NewDiningTable, NewShop};

    /// A shop owned by `owner-1` with table 5 and one device
    async fn page_with_table() -> (DashboardContext, RemindersPage, DiningTable) {
        let (_, ctx) = context();
        let shop = ctx
            .shops("owner-1")
            .create(NewShop::new("", "Café"))
            .await
            .unwrap();
        let table = ctx
            .tables(shop.id.clone())
            .create(NewDiningTable::new("", "5"))
            .await
            .unwrap();
        ctx.repos
            .devices
            .create(&NewDevice::new(&shop.id, "gw-1", "KV-1", "D1"))
            .await
            .unwrap();
        let mut page = ctx.reminders(shop.id);
        page.refresh().await.unwrap();
        (ctx, page, table)
    }

    fn device_id(page: &RemindersPage) -> String {
        page.devices[0].id.clone()
    }

    #[tokio::test]
    async fn test_send_marks_sent_and_notifies() {
        let (ctx, mut page, table) = page_with_table().await;
        let dev = device_id(&page);
        let reminder = page
            .create(&table.id, &dev, "Quý khách cần thêm gì không?", None)
            .await
            .unwrap();
        assert_eq!(reminder.status, ReminderStatus::Scheduled);
        assert_eq!(reminder.origin, ReminderOrigin::Manual);

        let (sent, notification) = page.send(&reminder.id).await.unwrap();

        assert_eq!(sent.status, ReminderStatus::Sent);
        assert!(sent.sent_time.is_some());
        assert_eq!(notification.message, "Đã gửi nhắc nhở đến bàn 5");
        assert_eq!(notification.kind, NotificationKind::Reminder);
        assert_eq!(ctx.notifications.len().await, 1);
        assert_eq!(ctx.notifications.unread_count_for("owner-1").await, 1);
        assert_eq!(ctx.notifications.unread_count_for("owner-2").await, 0);
    }

    #[tokio::test]
    async fn test_cancel_only_from_scheduled() {
        let (_, mut page, table) = page_with_table().await;
        let dev = device_id(&page);
        let reminder = page.create(&table.id, &dev, "Hi", None).await.unwrap();

        let cancelled = page.cancel(&reminder.id).await.unwrap();
        assert_eq!(cancelled.status, ReminderStatus::Cancelled);

        let err = page.send(&reminder.id).await.unwrap_err();
        assert!(matches!(
            err,
            PageError::InvalidReminderState(ReminderStatus::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_retry_failed_reschedules() {
        let (ctx, mut page, table) = page_with_table().await;
        let dev = device_id(&page);
        let reminder = page.create(&table.id, &dev, "Hi", None).await.unwrap();
        ctx.repos
            .reminders
            .update(
                &reminder.id,
                &ReminderPatch {
                    status: Some(ReminderStatus::Failed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        page.refresh().await.unwrap();
        assert_eq!(page.counts().failed, 1);

        let retried = page.retry(&reminder.id).await.unwrap();

        assert_eq!(retried.status, ReminderStatus::Scheduled);
        assert!(retried.scheduled_time >= reminder.scheduled_time);
        assert_eq!(page.counts().failed, 0);
    }

    #[tokio::test]
    async fn test_filter_by_status() {
        let (_, mut page, table) = page_with_table().await;
        let dev = device_id(&page);
        let a = page.create(&table.id, &dev, "A", None).await.unwrap();
        page.create(&table.id, &dev, "B", None).await.unwrap();
        page.send(&a.id).await.unwrap();

        page.set_filter(Some(ReminderStatus::Sent));
        let visible = page.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, a.id);

        page.set_filter(None);
        assert_eq!(page.visible().len(), 2);
        assert_eq!(
            page.counts(),
            ReminderCounts {
                total: 2,
                sent: 1,
                scheduled: 1,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_foreign_table_rejected() {
        let (_, mut page, _) = page_with_table().await;
        let dev = device_id(&page);
        let err = page.create("elsewhere", &dev, "Hi", None).await.unwrap_err();
        assert!(matches!(err, PageError::TableNotInShop));
    }

    #[tokio::test]
    async fn test_foreign_device_rejected() {
        let (ctx, mut page, table) = page_with_table().await;
        let other = ctx
            .repos
            .devices
            .create(&NewDevice::new("shop-2", "gw-2", "KV-9", "Other"))
            .await
            .unwrap();

        let err = page.create(&table.id, &other.id, "Hi", None).await.unwrap_err();
        assert!(matches!(err, PageError::DeviceNotInShop));

        let err = page.create(&table.id, "missing", "Hi", None).await.unwrap_err();
        assert!(matches!(err, PageError::DeviceNotInShop));
        assert!(page.reminders().is_empty());
    }
}
