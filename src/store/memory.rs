//! In-memory record store
//!
//! Behaves like the remote store closely enough for tests and offline
//! demos: generated UUID ids, creation/update stamps, equality and
//! membership filters, ordering. Every call is journaled so callers can
//! assert on the exact remote traffic a page produced.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

use super::{Query, RecordStore, StoreError, StoreResult};

/// Kind of a journaled store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// One journaled store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub table: String,
    /// Target row for update/delete
    pub id: Option<String>,
}

/// Thread-safe in-memory store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    journal: Mutex<Vec<Operation>>,
    /// Message of an error to return from the next call
    fail_next: Mutex<Option<String>>,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with a remote error carrying `message`
    pub async fn fail_next(&self, message: impl Into<String>) {
        *self.fail_next.lock().await = Some(message.into());
    }

    /// All calls made so far, oldest first
    pub async fn operations(&self) -> Vec<Operation> {
        self.journal.lock().await.clone()
    }

    /// Calls of one kind made so far
    pub async fn count(&self, kind: OperationKind) -> usize {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|op| op.kind == kind)
            .count()
    }

    /// Number of rows currently stored in `table`
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }

    async fn record(&self, kind: OperationKind, table: &str, id: Option<&str>) -> StoreResult<()> {
        self.journal.lock().await.push(Operation {
            kind,
            table: table.to_string(),
            id: id.map(str::to_string),
        });

        match self.fail_next.lock().await.take() {
            Some(message) => Err(StoreError::Remote {
                status: 500,
                code: None,
                message,
            }),
            None => Ok(()),
        }
    }

    /// Strictly increasing timestamps keep `created_at` ordering total.
    async fn next_stamp(&self) -> String {
        let mut last = self.last_stamp.lock().await;
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Value>> {
        self.record(OperationKind::Select, table, None).await?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut rows);

        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> StoreResult<Value> {
        self.record(OperationKind::Insert, table, None).await?;

        let Value::Object(mut fields) = row else {
            return Err(StoreError::Serialization(
                "insert payload must be a JSON object".to_string(),
            ));
        };

        let stamp = self.next_stamp().await;
        fields
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(stamp.clone()));
        fields
            .entry("updated_at")
            .or_insert_with(|| Value::String(stamp));

        let stored = Value::Object(fields);
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> StoreResult<Value> {
        self.record(OperationKind::Update, table, Some(id)).await?;

        let Value::Object(patch) = patch else {
            return Err(StoreError::Serialization(
                "update payload must be a JSON object".to_string(),
            ));
        };

        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        if let Value::Object(fields) = row {
            merge(fields, patch);
        }

        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<()> {
        self.record(OperationKind::Delete, table, Some(id)).await?;

        // Deleting a missing row is not an error, matching the remote store.
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            rows.retain(|row| row_id(row) != Some(id));
        }

        Ok(())
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn merge(fields: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if key != "id" {
            fields.insert(key, value);
        }
    }
}
