//! PostgREST Store Client
//!
//! HTTP client for the hosted store's REST interface
//! (`{url}/rest/v1/{table}`).

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{Query, RecordStore, StoreError, StoreResult};

/// Connection settings for the REST store
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL (e.g., "https://xyz.supabase.co")
    pub url: String,
    /// Public API key, sent as `apikey`
    pub api_key: String,
    /// Bearer token; defaults to the API key when unset
    pub access_token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            access_token: None,
            request_timeout_ms: 10_000,
        }
    }
}

/// PostgREST-backed [`RecordStore`]
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    config: RestStoreConfig,
}

impl RestStore {
    /// Create a new store client with the given configuration
    pub fn new(config: RestStoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Same store, acting as the user holding `access_token`
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        let mut config = self.config.clone();
        config.access_token = Some(access_token.into());
        Self {
            client: self.client.clone(),
            config,
        }
    }

    pub fn config(&self) -> &RestStoreConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let token = self
            .config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key);

        if let Ok(value) = self.config.api_key.parse() {
            headers.insert("apikey", value);
        }
        if let Ok(value) = format!("Bearer {}", token).parse() {
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        headers
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.headers(self.headers()).send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout
            } else if e.is_connect() {
                StoreError::Unavailable
            } else {
                StoreError::Request(e)
            }
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(remote_error(response).await)
        }
    }

    /// Writes ask for the affected rows back and expect exactly one.
    async fn single_row(&self, request: RequestBuilder, table: &str, id: &str) -> StoreResult<Value> {
        let response = self
            .send(request.header("Prefer", "return=representation"))
            .await?;
        let rows: Vec<Value> = response.json().await?;

        rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        })
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Value>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.to_params());

        let request = self.client.get(self.table_url(table)).query(&params);
        let rows: Vec<Value> = self.send(request).await?.json().await?;

        tracing::debug!(table = %table, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> StoreResult<Value> {
        let request = self
            .client
            .post(self.table_url(table))
            .json(&Value::Array(vec![row]));

        let created = self.single_row(request, table, "<new>").await?;
        tracing::debug!(table = %table, id = ?created.get("id"), "Inserted row");
        Ok(created)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> StoreResult<Value> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch);

        self.single_row(request, table, id).await
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<()> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))]);

        self.send(request).await?;
        tracing::debug!(table = %table, id = %id, "Deleted row");
        Ok(())
    }
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

async fn remote_error(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<PostgrestError>(&text) {
        Ok(body) => StoreError::Remote {
            status,
            code: body.code,
            message: body.message.or(body.details).unwrap_or(text),
        },
        Err(_) => StoreError::Remote {
            status,
            code: None,
            message: text,
        },
    }
}
