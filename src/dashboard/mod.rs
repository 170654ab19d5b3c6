//! Dashboard Pages
//!
//! View-models for the dashboard screens. Each page owns the local list for
//! one screen and runs fetch → mutate → refresh-local-view against the
//! remote store. Cross-record rules (a device's gateway and table belong to
//! its shop, one device per table) are checked here before submitting.

mod collection;
mod devices;
mod error;
mod gateways;
mod messages;
mod overview;
mod reminders;
mod shops;
mod tables;

pub use collection::{Collection, Placement};
pub use devices::{DeviceRow, DeviceStats, DevicesPage};
pub use error::{PageError, PageResult};
pub use gateways::GatewaysPage;
pub use messages::MessagesPage;
pub use overview::OverviewStats;
pub use reminders::{ReminderCounts, RemindersPage};
pub use shops::ShopsPage;
pub use tables::{TableCounts, TablesPage};

use std::sync::Arc;

use crate::notifications::NotificationStore;
use crate::repo::Repositories;
use crate::store::RecordStore;

/// Everything a page needs: typed store access and the notification list
#[derive(Clone)]
pub struct DashboardContext {
    pub repos: Repositories,
    pub notifications: Arc<NotificationStore>,
}

impl DashboardContext {
    pub fn new(store: Arc<dyn RecordStore>, notifications: Arc<NotificationStore>) -> Self {
        Self {
            repos: Repositories::new(store),
            notifications,
        }
    }

    pub fn shops(&self, owner_id: impl Into<String>) -> ShopsPage {
        ShopsPage::new(self.clone(), owner_id.into())
    }

    pub fn gateways(&self, shop_id: impl Into<String>) -> GatewaysPage {
        GatewaysPage::new(self.clone(), shop_id.into())
    }

    pub fn tables(&self, shop_id: impl Into<String>) -> TablesPage {
        TablesPage::new(self.clone(), shop_id.into())
    }

    pub fn devices(&self, shop_id: impl Into<String>) -> DevicesPage {
        DevicesPage::new(self.clone(), shop_id.into())
    }

    pub fn messages(&self, device_id: impl Into<String>) -> MessagesPage {
        MessagesPage::new(self.clone(), device_id.into())
    }

    pub fn reminders(&self, shop_id: impl Into<String>) -> RemindersPage {
        RemindersPage::new(self.clone(), shop_id.into())
    }

    /// Headline numbers for the owner's dashboard home
    pub async fn overview(&self, owner_id: &str) -> PageResult<OverviewStats> {
        OverviewStats::load(self, owner_id).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::MemoryStore;

    pub(crate) fn context() -> (Arc<MemoryStore>, DashboardContext) {
        let store = Arc::new(MemoryStore::new());
        let ctx = DashboardContext::new(store.clone(), Arc::new(NotificationStore::default()));
        (store, ctx)
    }
}
