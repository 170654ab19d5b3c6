//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthFlow;
use crate::config::ApiConfig;
use crate::dashboard::DashboardContext;
use crate::notifications::NotificationStore;
use crate::push::PushHandle;
use crate::repo::Repositories;
use crate::store::{RecordStore, RestStore};
use crate::websocket::{ConnectionHub, HubConfig};

/// Where record requests go
///
/// The remote store runs each request under the caller's session so its
/// row-level rules apply; a shared store serves everyone the same rows.
#[derive(Clone)]
pub enum StoreBackend {
    Rest(RestStore),
    Shared(Arc<dyn RecordStore>),
}

impl StoreBackend {
    pub fn for_session(&self, access_token: &str) -> Arc<dyn RecordStore> {
        match self {
            StoreBackend::Rest(store) => Arc::new(store.with_access_token(access_token)),
            StoreBackend::Shared(store) => Arc::clone(store),
        }
    }

    /// Store used without a session (contact form, profile rows)
    pub fn anonymous(&self) -> Arc<dyn RecordStore> {
        match self {
            StoreBackend::Rest(store) => Arc::new(store.clone()),
            StoreBackend::Shared(store) => Arc::clone(store),
        }
    }
}

/// Shared application state for all handlers
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub backend: StoreBackend,
    pub auth: AuthFlow,
    /// Repositories for requests made without a session
    pub public: Repositories,
    pub notifications: Arc<NotificationStore>,
    /// WebSocket connection hub for real-time notifications
    pub hub: ConnectionHub,
    /// Push channel from the gateways, when one is configured
    pub push: Option<PushHandle>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        backend: StoreBackend,
        auth: AuthFlow,
        notifications: Arc<NotificationStore>,
        hub: ConnectionHub,
    ) -> Self {
        let public = Repositories::new(backend.anonymous());
        Self {
            config: Arc::new(config),
            backend,
            auth,
            public,
            notifications,
            hub,
            push: None,
            start_time: Instant::now(),
        }
    }

    /// Builder method: attach the push channel
    pub fn with_push(mut self, push: PushHandle) -> Self {
        self.push = Some(push);
        self
    }

    /// Builder method: serve session-less writes from `store`
    pub fn with_public_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.public = Repositories::new(store);
        self
    }

    /// State over a single shared store, with a default hub
    pub fn shared(
        config: ApiConfig,
        store: Arc<dyn RecordStore>,
        auth: AuthFlow,
        notifications: Arc<NotificationStore>,
    ) -> Self {
        Self::new(
            config,
            StoreBackend::Shared(store),
            auth,
            notifications,
            ConnectionHub::new(HubConfig::default()),
        )
    }

    /// Page context acting as the session's user
    pub fn dashboard(&self, access_token: &str) -> DashboardContext {
        DashboardContext::new(
            self.backend.for_session(access_token),
            Arc::clone(&self.notifications),
        )
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn push_connected(&self) -> Option<bool> {
        self.push.as_ref().map(PushHandle::is_connected)
    }
}
