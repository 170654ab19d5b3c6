//! Identity Provider
//!
//! The hosted identity service (GoTrue REST at `{url}/auth/v1`) and an
//! in-memory stand-in with the same observable behavior.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::store::RestStoreConfig;

/// An authenticated account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

/// Tokens issued by a password sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Errors raised by an [`IdentityProvider`]
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The provider refused the request; the message is the provider's own
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Identity service unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for IdentityError {
    fn from(err: serde_json::Error) -> Self {
        IdentityError::InvalidResponse(err.to_string())
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Account operations offered by the identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account; `metadata` is stored on the user
    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> IdentityResult<AuthUser>;

    /// Exchange email and password for a session
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session>;

    /// Resolve the user behind an access token
    async fn get_user(&self, access_token: &str) -> IdentityResult<AuthUser>;

    /// Revoke an access token
    async fn sign_out(&self, access_token: &str) -> IdentityResult<()>;
}

/// GoTrue REST client
#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoTrueClient {
    /// Build a client against the same project as the record store
    pub fn new(config: &RestStoreConfig) -> IdentityResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/auth/v1", config.url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, bearer: Option<&str>) -> IdentityResult<Response> {
        let token = bearer.unwrap_or(&self.api_key);
        let response = request
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Timeout
                } else if e.is_connect() {
                    IdentityError::Unavailable
                } else {
                    IdentityError::Request(e)
                }
            })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Err(IdentityError::Rejected {
            status,
            message: error_message(&body),
        })
    }
}

/// GoTrue puts its error text under different keys depending on the endpoint.
fn error_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .unwrap_or("Unknown identity error")
        .to_string()
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> IdentityResult<AuthUser> {
        let request = self.client.post(self.url("/signup")).json(&serde_json::json!({
            "email": email,
            "password": password,
            "data": metadata,
        }));

        let body: Value = self.send(request, None).await?.json().await?;

        // With auto-confirm the provider answers with a session, otherwise
        // with the bare user.
        let user = match body.get("user") {
            Some(user) => user.clone(),
            None => body,
        };
        let user: AuthUser = serde_json::from_value(user)?;

        tracing::info!(user_id = %user.id, "Signed up");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session> {
        let request = self
            .client
            .post(self.url("/token"))
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));

        let session: Session = self.send(request, None).await?.json().await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn get_user(&self, access_token: &str) -> IdentityResult<AuthUser> {
        let request = self.client.get(self.url("/user"));
        Ok(self.send(request, Some(access_token)).await?.json().await?)
    }

    async fn sign_out(&self, access_token: &str) -> IdentityResult<()> {
        let request = self.client.post(self.url("/logout"));
        self.send(request, Some(access_token)).await?;
        Ok(())
    }
}

struct Account {
    password: String,
    user: AuthUser,
}

/// In-memory identity provider for tests and offline demos
///
/// Mirrors the provider's error texts so callers map them the same way.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    sessions: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of provider calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn rejected(status: u16, message: &str) -> IdentityError {
        IdentityError::Rejected {
            status,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> IdentityResult<AuthUser> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(Self::rejected(422, "User already registered"));
        }

        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            user_metadata: metadata,
        };
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );

        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let accounts = self.accounts.lock().await;
        let account = accounts
            .get(email)
            .filter(|account| account.password == password)
            .ok_or_else(|| Self::rejected(400, "Invalid login credentials"))?;

        let access_token = uuid::Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .await
            .insert(access_token.clone(), email.to_string());

        Ok(Session {
            access_token,
            refresh_token: None,
            expires_in: Some(3600),
            user: account.user.clone(),
        })
    }

    async fn get_user(&self, access_token: &str) -> IdentityResult<AuthUser> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let email = self
            .sessions
            .lock()
            .await
            .get(access_token)
            .cloned()
            .ok_or_else(|| Self::rejected(401, "invalid JWT"))?;

        self.accounts
            .lock()
            .await
            .get(&email)
            .map(|account| account.user.clone())
            .ok_or_else(|| Self::rejected(404, "User not found"))
    }

    async fn sign_out(&self, access_token: &str) -> IdentityResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().await.remove(access_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthFlow, AuthFlowError, LoginForm, RegistrationForm};
    use crate::repo::Repository;
    use crate::store::{testing::canned_server, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_error_message_keys() {
        assert_eq!(error_message(&json!({"msg": "User already registered"})), "User already registered");
        assert_eq!(
            error_message(&json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
            "Invalid login credentials"
        );
        assert_eq!(error_message(&Value::Null), "Unknown identity error");
    }

    #[test]
    fn test_gotrue_base_url() {
        let client = GoTrueClient::new(&RestStoreConfig {
            url: "https://example.supabase.co/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.url("/signup"), "https://example.supabase.co/auth/v1/signup");
    }

    #[tokio::test]
    async fn test_memory_identity_round() {
        let identity = MemoryIdentity::new();
        let user = identity.sign_up("a@b.co", "password1", json!({})).await.unwrap();

        let session = identity.sign_in("a@b.co", "password1").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(identity.get_user(&session.access_token).await.unwrap().id, user.id);

        identity.sign_out(&session.access_token).await.unwrap();
        assert!(identity.get_user(&session.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_identity_duplicate_email() {
        let identity = MemoryIdentity::new();
        identity.sign_up("a@b.co", "password1", json!({})).await.unwrap();

        let err = identity.sign_up("a@b.co", "password2", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    async fn gotrue_flow(status: u16, body: &'static str) -> AuthFlow {
        let client = GoTrueClient::new(&RestStoreConfig {
            url: canned_server(status, body).await,
            api_key: "anon-key".to_string(),
            ..Default::default()
        })
        .unwrap();
        AuthFlow::new(Arc::new(client), Repository::new(Arc::new(MemoryStore::new())))
    }

    fn registration() -> RegistrationForm {
        RegistrationForm {
            first_name: "Lan".to_string(),
            last_name: "Nguyễn".to_string(),
            email: "lan@quan.vn".to_string(),
            phone: "0901234567".to_string(),
            business: "Quán Lan".to_string(),
            password: "matkhau123".to_string(),
            confirm_password: "matkhau123".to_string(),
            terms: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_gotrue_rejection_carries_provider_message() {
        let client = GoTrueClient::new(&RestStoreConfig {
            url: canned_server(
                422,
                r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#,
            )
            .await,
            ..Default::default()
        })
        .unwrap();

        let err = client.sign_up("lan@quan.vn", "matkhau123", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            IdentityError::Rejected { status: 422, ref message } if message == "User already registered"
        ));
    }

    #[tokio::test]
    async fn test_gotrue_duplicate_signup_is_email_taken() {
        let flow = gotrue_flow(
            422,
            r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#,
        )
        .await;

        let err = flow.register(&registration()).await.unwrap_err();
        assert!(matches!(err, AuthFlowError::EmailTaken));
    }

    #[tokio::test]
    async fn test_gotrue_bad_password_is_invalid_credentials() {
        let login = LoginForm::new("lan@quan.vn", "sai-mat-khau");

        let legacy = gotrue_flow(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .await;
        assert!(matches!(
            legacy.login(&login).await,
            Err(AuthFlowError::InvalidCredentials)
        ));

        let current = gotrue_flow(
            400,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        )
        .await;
        assert!(matches!(
            current.login(&login).await,
            Err(AuthFlowError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_gotrue_other_failures_stay_generic() {
        let flow = gotrue_flow(500, r#"{"code":500,"msg":"Database error saving new user"}"#).await;
        assert!(matches!(
            flow.register(&registration()).await,
            Err(AuthFlowError::RegistrationFailed)
        ));

        let flow = gotrue_flow(
            403,
            r#"{"code":403,"error_code":"bad_jwt","msg":"invalid JWT: token is expired"}"#,
        )
        .await;
        assert!(matches!(
            flow.current_user("expired").await,
            Err(AuthFlowError::SessionExpired)
        ));
    }
}
