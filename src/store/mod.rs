//! Remote Store
//!
//! Row-level access to the hosted relational store.
//!
//! ## Architecture
//!
//! - **RecordStore**: untyped create/read/update/delete over JSON rows
//! - **RestStore**: PostgREST client used in production
//! - **MemoryStore**: in-process store used by tests and offline demos
//!
//! Typed access lives one level up in [`crate::repo`].

mod error;
mod memory;
mod query;
mod rest;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, Operation, OperationKind};
pub use query::{Filter, Order, Query};
pub use rest::{RestStore, RestStoreConfig};

use async_trait::async_trait;
use serde_json::Value;

/// Untyped access to remote tables
///
/// Rows are JSON objects. Implementations assign `id`, `created_at` and
/// `updated_at` on insert and return the stored row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `table` matching `query`
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Value>>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: &str, row: Value) -> StoreResult<Value>;

    /// Merge `patch` into the row with `id` and return the updated row
    async fn update(&self, table: &str, id: &str, patch: Value) -> StoreResult<Value>;

    /// Hard-delete the row with `id`
    async fn delete(&self, table: &str, id: &str) -> StoreResult<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::{
        http::{header::CONTENT_TYPE, StatusCode},
        Router,
    };

    /// Answer every request with `status` and the JSON `body`; returns the
    /// base URL
    pub(crate) async fn canned_server(status: u16, body: &'static str) -> String {
        let status = StatusCode::from_u16(status).unwrap();
        let app = Router::new().fallback(move || async move {
            (status, [(CONTENT_TYPE, "application/json")], body)
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
