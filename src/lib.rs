//! # Khách Vui
//!
//! Admin dashboard backend for table-call and reminder devices in
//! restaurants and cafés. Shop owners register, then manage their shops,
//! the gateways in each shop, the dining tables, the table devices and the
//! messages those devices show. Calls and reminders from the gateways
//! arrive over a push channel and land in an in-memory notification list.
//!
//! ## Modules
//!
//! - [`models`]: Records kept in the remote store, plus notifications
//! - [`store`]: Remote record store (PostgREST) and an in-memory double
//! - [`repo`]: Typed accessors per table
//! - [`auth`]: Registration, login and sessions against the identity service
//! - [`dashboard`]: Page view-models (fetch, mutate, refresh the local list)
//! - [`push`]: Reconnecting push-channel client
//! - [`notifications`]: Notification list fed by the push channel
//! - [`websocket`]: Live relay of notifications to open dashboards
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use khachvui::dashboard::DashboardContext;
//! use khachvui::models::NewShop;
//! use khachvui::notifications::{NotificationStore, SilentChime};
//! use khachvui::store::{RestStore, RestStoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RestStore::new(RestStoreConfig {
//!         url: "https://xyz.supabase.co".to_string(),
//!         api_key: "public-anon-key".to_string(),
//!         ..Default::default()
//!     })?
//!     .with_access_token("session-access-token");
//!
//!     let notifications = Arc::new(NotificationStore::new(Arc::new(SilentChime)));
//!     let ctx = DashboardContext::new(Arc::new(store), notifications);
//!
//!     let mut shops = ctx.shops("owner-id");
//!     shops.refresh().await?;
//!     shops.create(NewShop::new("owner-id", "Café A").address("1 Main St")).await?;
//!
//!     println!("{} shops", shops.shops().len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod models;
pub mod notifications;
pub mod push;
pub mod repo;
pub mod store;
pub mod websocket;

pub use api::{build_router, serve, shutdown_signal, ApiError, AppState, StoreBackend};

pub use auth::{AuthFlow, AuthFlowError, AuthUser, GoTrueClient, LoginForm, RegistrationForm, Session};

pub use config::{Config, ConfigError, LoggingConfig};

pub use dashboard::{DashboardContext, PageError, PageResult};

pub use notifications::{NotificationStore, SilentChime, TerminalBell};

pub use push::{PushConfig, PushHandle, PushStatus, WsConnector};

pub use repo::{Repositories, Repository};

pub use store::{MemoryStore, RecordStore, RestStore, RestStoreConfig, StoreError};

pub use websocket::{spawn_relay, ConnectionHub, HubChime, HubConfig, WsEvent};
