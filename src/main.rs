//! Khách Vui API server
//!
//! Run with: cargo run --bin khachvui
//!
//! Settings come from `config.toml` (see `khachvui-cli config`) with
//! environment overrides:
//! - `KHACHVUI_STORE_URL` / `NEXT_PUBLIC_SUPABASE_URL`: Project URL
//! - `KHACHVUI_STORE_KEY` / `NEXT_PUBLIC_SUPABASE_ANON_KEY`: Public API key
//! - `KHACHVUI_SERVICE_KEY`: Service key for session-less writes (optional)
//! - `KHACHVUI_API_HOST`, `KHACHVUI_API_PORT`: Bind address
//! - `KHACHVUI_PUSH_URL`: Gateway push channel (optional)
//! - `RUST_LOG`: Log filter (default: khachvui=info,tower_http=debug)

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use khachvui::api::{serve, shutdown_signal, AppState, StoreBackend};
use khachvui::auth::{AuthFlow, GoTrueClient};
use khachvui::config::{Config, LoggingConfig};
use khachvui::notifications::NotificationStore;
use khachvui::push::{PushHandle, WsConnector};
use khachvui::repo::Repository;
use khachvui::store::{RecordStore, RestStore};
use khachvui::websocket::{spawn_relay, ConnectionHub, HubChime, HubConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting Khách Vui API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(store = %config.store.url, "Remote store");

    if config.store.api_key.is_empty() {
        tracing::warn!("No store API key set (KHACHVUI_STORE_KEY); remote requests will be refused");
    }

    let rest = RestStore::new(config.store.rest_config()).context("building store client")?;
    let identity = GoTrueClient::new(&config.store.rest_config()).context("building identity client")?;

    // Profile rows and contact submissions are written without a session
    let public_store: Arc<dyn RecordStore> = match config.store.service_rest_config() {
        Some(service) => {
            tracing::info!("Using service key for session-less writes");
            Arc::new(RestStore::new(service).context("building service store client")?)
        }
        None => Arc::new(rest.clone()),
    };

    let auth = AuthFlow::new(Arc::new(identity), Repository::new(Arc::clone(&public_store)));

    let hub = ConnectionHub::new(HubConfig::default());
    let notifications = Arc::new(NotificationStore::new(Arc::new(HubChime::new(
        hub.clone(),
        config.notifications.sound.clone(),
    ))));

    let cancel = CancellationToken::new();
    let push = config.push.push_config().map(|push_config| {
        tracing::info!(url = %push_config.url, "Push channel enabled");
        PushHandle::connect(push_config, Arc::new(WsConnector))
    });
    if push.is_none() {
        tracing::info!("Push channel disabled (set KHACHVUI_PUSH_URL to enable)");
    }

    let feed = push
        .as_ref()
        .map(|push| notifications.spawn_feed(push.subscribe()));
    let relay = spawn_relay(
        hub.clone(),
        &notifications,
        push.as_ref().map(|push| push.watch_connected()),
        cancel.clone(),
    );

    let mut state = AppState::new(
        config.api.clone(),
        StoreBackend::Rest(rest),
        auth,
        Arc::clone(&notifications),
        hub,
    )
    .with_public_store(public_store);
    if let Some(push) = push {
        state = state.with_push(push);
    }

    // Dropping the state on return disconnects the push channel
    serve(state, shutdown_signal()).await?;

    cancel.cancel();
    if let Err(e) = relay.await {
        tracing::warn!(error = %e, "Dashboard relay ended abnormally");
    }
    if let Some(feed) = feed {
        feed.abort();
    }

    tracing::info!("Khách Vui API server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("khachvui={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
