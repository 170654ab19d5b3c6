//! Registration and login flows
//!
//! Validate locally, call the identity provider, translate its errors into
//! messages a shop owner can act on.

use std::sync::Arc;
use thiserror::Error;

use super::forms::{LoginForm, RegistrationForm, ValidationError};
use super::identity::{AuthUser, IdentityError, IdentityProvider, Session};
use crate::models::{NewUserProfile, UserProfile};
use crate::repo::Repository;

pub const REGISTERED_MESSAGE: &str = "Tài khoản đã được tạo thành công! Bạn có thể đăng nhập ngay.";
pub const LOGGED_IN_MESSAGE: &str = "Đăng nhập thành công! Đang chuyển hướng...";

/// User-facing auth failures
#[derive(Error, Debug)]
pub enum AuthFlowError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Email này đã được đăng ký. Vui lòng sử dụng email khác hoặc đăng nhập.")]
    EmailTaken,

    #[error("Có lỗi xảy ra khi tạo tài khoản. Vui lòng thử lại.")]
    RegistrationFailed,

    #[error("Email hoặc mật khẩu không đúng. Vui lòng thử lại.")]
    InvalidCredentials,

    #[error("Có lỗi xảy ra khi đăng nhập. Vui lòng thử lại.")]
    LoginFailed,

    #[error("Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.")]
    SessionExpired,

    #[error("Có lỗi xảy ra. Vui lòng thử lại sau.")]
    Unexpected,
}

/// Account flows over an identity provider and the profile table
#[derive(Clone)]
pub struct AuthFlow {
    identity: Arc<dyn IdentityProvider>,
    profiles: Repository<UserProfile>,
}

impl AuthFlow {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Repository<UserProfile>) -> Self {
        Self { identity, profiles }
    }

    /// Create an account, then write its profile row
    ///
    /// A failed profile write is logged; the account stays created.
    pub async fn register(&self, form: &RegistrationForm) -> Result<AuthUser, AuthFlowError> {
        form.validate()?;

        let user = self
            .identity
            .sign_up(&form.email, &form.password, form.metadata())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, email = %form.email, "Registration failed");
                registration_error(&e)
            })?;

        let profile = NewUserProfile {
            user_id: user.id.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone: form.phone.clone(),
            business_name: form.business.clone(),
            business_type: form.business_type.clone(),
            notes: form.notes.clone(),
            newsletter_subscribed: form.newsletter,
        };
        if let Err(e) = self.profiles.create(&profile).await {
            tracing::warn!(error = %e, user_id = %user.id, "Profile creation failed");
        }

        tracing::info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Session, AuthFlowError> {
        form.validate()?;

        self.identity
            .sign_in(&form.email, &form.password)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, email = %form.email, "Login failed");
                login_error(&e)
            })
    }

    /// User behind a session token
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser, AuthFlowError> {
        self.identity.get_user(access_token).await.map_err(|e| {
            tracing::debug!(error = %e, "Session lookup failed");
            match e {
                IdentityError::Rejected { .. } => AuthFlowError::SessionExpired,
                _ => AuthFlowError::Unexpected,
            }
        })
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthFlowError> {
        self.identity.sign_out(access_token).await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-out failed");
            AuthFlowError::Unexpected
        })
    }
}

fn registration_error(err: &IdentityError) -> AuthFlowError {
    let message = err.to_string();
    if message.contains("already registered") || message.contains("already exists") {
        AuthFlowError::EmailTaken
    } else {
        AuthFlowError::RegistrationFailed
    }
}

fn login_error(err: &IdentityError) -> AuthFlowError {
    if err.to_string().contains("Invalid login credentials") {
        AuthFlowError::InvalidCredentials
    } else {
        AuthFlowError::LoginFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryIdentity;
    use crate::store::{MemoryStore, OperationKind, Query, RecordStore};

    struct Harness {
        identity: Arc<MemoryIdentity>,
        store: Arc<MemoryStore>,
        flow: AuthFlow,
    }

    fn harness() -> Harness {
        let identity = Arc::new(MemoryIdentity::new());
        let store = Arc::new(MemoryStore::new());
        let flow = AuthFlow::new(identity.clone(), Repository::new(store.clone()));
        Harness {
            identity,
            store,
            flow,
        }
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Bình".to_string(),
            last_name: "Trần".to_string(),
            email: "binh@quan.vn".to_string(),
            phone: "0911111111".to_string(),
            business: "Quán Bình".to_string(),
            password: "12345678".to_string(),
            confirm_password: "12345678".to_string(),
            terms: true,
            newsletter: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_writes_profile() {
        let h = harness();
        let user = h.flow.register(&form()).await.unwrap();

        let rows = h
            .store
            .select("user_profiles", &Query::new().eq("user_id", &user.id))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["business_name"], "Quán Bình");
        assert_eq!(rows[0]["newsletter_subscribed"], true);
    }

    #[tokio::test]
    async fn test_invalid_form_makes_no_identity_call() {
        let h = harness();
        let mut bad = form();
        bad.confirm_password = "87654321".to_string();

        let err = h.flow.register(&bad).await.unwrap_err();
        assert!(matches!(err, AuthFlowError::Invalid(ValidationError::PasswordMismatch)));
        assert_eq!(h.identity.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_maps_to_localized_message() {
        let h = harness();
        h.flow.register(&form()).await.unwrap();

        let err = h.flow.register(&form()).await.unwrap_err();
        assert!(matches!(err, AuthFlowError::EmailTaken));
        assert!(err.to_string().starts_with("Email này đã được đăng ký"));
    }

    #[tokio::test]
    async fn test_profile_failure_does_not_fail_registration() {
        let h = harness();
        h.store.fail_next("permission denied for table user_profiles").await;

        assert!(h.flow.register(&form()).await.is_ok());
        assert_eq!(h.store.count(OperationKind::Insert).await, 1);
        assert_eq!(h.store.row_count("user_profiles").await, 0);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let h = harness();
        h.flow.register(&form()).await.unwrap();

        let err = h
            .flow
            .login(&LoginForm::new("binh@quan.vn", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_then_current_user_then_sign_out() {
        let h = harness();
        let user = h.flow.register(&form()).await.unwrap();

        let session = h
            .flow
            .login(&LoginForm::new("binh@quan.vn", "12345678"))
            .await
            .unwrap();
        let me = h.flow.current_user(&session.access_token).await.unwrap();
        assert_eq!(me.id, user.id);

        h.flow.sign_out(&session.access_token).await.unwrap();
        assert!(matches!(
            h.flow.current_user(&session.access_token).await,
            Err(AuthFlowError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let h = harness();
        let err = h.flow.login(&LoginForm::new("a@b.c", "")).await.unwrap_err();
        assert!(matches!(err, AuthFlowError::Invalid(ValidationError::MissingCredentials)));
        assert_eq!(h.identity.calls(), 0);
    }
}
