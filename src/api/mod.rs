//! Khách Vui REST API
//!
//! HTTP API over the dashboard pages, built with Axum. Every route except
//! auth, contact and health needs `Authorization: Bearer <access token>`.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/register`, `POST /api/v1/auth/login`
//! - `POST /api/v1/auth/logout`, `GET /api/v1/auth/me`
//!
//! ## Shops and what hangs off them
//! - `GET|POST /api/v1/shops`, `GET|PUT|DELETE /api/v1/shops/:id`
//! - `GET|POST /api/v1/shops/:id/gateways`, `GET|PUT|DELETE /api/v1/gateways/:id`
//! - `GET|POST /api/v1/shops/:id/tables`, `GET|PUT|DELETE /api/v1/tables/:id`,
//!   `POST /api/v1/tables/:id/remind`
//! - `GET|POST /api/v1/shops/:id/devices`, `GET /api/v1/shops/:id/available-tables`,
//!   `GET|PUT|DELETE /api/v1/devices/:id`
//! - `GET|POST /api/v1/devices/:id/messages`, `PUT|DELETE /api/v1/messages/:id`,
//!   `POST /api/v1/messages/:id/toggle`
//! - `GET /api/v1/shops/:id/reminders`, `GET|POST /api/v1/reminders`,
//!   `GET|DELETE /api/v1/reminders/:id`, `POST /api/v1/reminders/:id/{send,cancel,retry}`
//!
//! ## Notifications
//! - `GET /api/v1/notifications`, `POST /api/v1/notifications/:id/read`,
//!   `POST /api/v1/notifications/clear`, `GET /api/v1/push/status`
//!
//! ## Other
//! - `GET /api/v1/overview`, `POST /api/v1/contact`
//! - `GET /health/live`, `GET /health/ready`, `GET /health`
//! - `GET /ws` - Real-time notification stream

pub mod access;
pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::CurrentUser;
pub use state::{AppState, StoreBackend};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api_routes = Router::new()
        // Auth routes
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        // Shop routes
        .route(
            "/shops",
            get(routes::shops::list_shops).post(routes::shops::create_shop),
        )
        .route(
            "/shops/:id",
            get(routes::shops::get_shop)
                .put(routes::shops::update_shop)
                .delete(routes::shops::delete_shop),
        )
        // Gateway routes
        .route(
            "/shops/:id/gateways",
            get(routes::gateways::list_gateways).post(routes::gateways::create_gateway),
        )
        .route(
            "/gateways/:id",
            get(routes::gateways::get_gateway)
                .put(routes::gateways::update_gateway)
                .delete(routes::gateways::delete_gateway),
        )
        // Table routes
        .route(
            "/shops/:id/tables",
            get(routes::tables::list_tables).post(routes::tables::create_table),
        )
        .route(
            "/tables/:id",
            get(routes::tables::get_table)
                .put(routes::tables::update_table)
                .delete(routes::tables::delete_table),
        )
        .route("/tables/:id/remind", post(routes::tables::remind_table))
        // Device routes
        .route(
            "/shops/:id/devices",
            get(routes::devices::list_devices).post(routes::devices::create_device),
        )
        .route(
            "/shops/:id/available-tables",
            get(routes::devices::available_tables),
        )
        .route(
            "/devices/:id",
            get(routes::devices::get_device)
                .put(routes::devices::update_device)
                .delete(routes::devices::delete_device),
        )
        // Message routes
        .route(
            "/devices/:id/messages",
            get(routes::messages::list_messages).post(routes::messages::create_message),
        )
        .route(
            "/messages/:id",
            axum::routing::put(routes::messages::update_message)
                .delete(routes::messages::delete_message),
        )
        .route("/messages/:id/toggle", post(routes::messages::toggle_message))
        // Reminder routes
        .route(
            "/shops/:id/reminders",
            get(routes::reminders::list_shop_reminders),
        )
        .route(
            "/reminders",
            get(routes::reminders::list_reminders).post(routes::reminders::create_reminder),
        )
        .route(
            "/reminders/:id",
            get(routes::reminders::get_reminder).delete(routes::reminders::delete_reminder),
        )
        .route("/reminders/:id/send", post(routes::reminders::send_reminder))
        .route("/reminders/:id/cancel", post(routes::reminders::cancel_reminder))
        .route("/reminders/:id/retry", post(routes::reminders::retry_reminder))
        // Notification routes
        .route(
            "/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/notifications/clear",
            post(routes::notifications::clear_notifications),
        )
        .route(
            "/notifications/:id/read",
            post(routes::notifications::mark_read),
        )
        .route("/push/status", get(routes::notifications::push_status))
        // Overview and landing page
        .route("/overview", get(routes::overview::overview))
        .route("/contact", post(routes::overview::submit_contact));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Configured origins, or any origin when none are listed
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve<F>(state: AppState, shutdown: F) -> Result<(), ApiError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Khách Vui API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Khách Vui API shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
