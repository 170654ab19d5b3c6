//! Landing-page contact form

use thiserror::Error;

use crate::models::{ContactSubmission, NewContactSubmission};
use crate::repo::Repository;

pub const SUBMITTED_MESSAGE: &str =
    "Cảm ơn bạn đã đăng ký! Chúng tôi sẽ liên hệ với bạn trong thời gian sớm nhất.";

#[derive(Error, Debug)]
pub enum ContactError {
    #[error("Vui lòng điền đầy đủ thông tin bắt buộc")]
    MissingFields,

    /// The store's message is logged, not shown
    #[error("Có lỗi xảy ra khi gửi thông tin. Vui lòng thử lại.")]
    SubmitFailed,
}

/// Validate and store a submission
///
/// Optional fields left blank are stored as absent.
pub async fn submit(
    repo: &Repository<ContactSubmission>,
    mut form: NewContactSubmission,
) -> Result<ContactSubmission, ContactError> {
    form.name = form.name.trim().to_string();
    form.business = form.business.trim().to_string();
    form.phone = form.phone.trim().to_string();
    if form.name.is_empty() || form.business.is_empty() || form.phone.is_empty() {
        return Err(ContactError::MissingFields);
    }
    form.email = form.email.filter(|s| !s.trim().is_empty());
    form.message = form.message.filter(|s| !s.trim().is_empty());

    repo.create(&form).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to store contact submission");
        ContactError::SubmitFailed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, OperationKind};
    use std::sync::Arc;

    fn form() -> NewContactSubmission {
        NewContactSubmission {
            name: "Lan".to_string(),
            business: "Quán Cà Phê Lan".to_string(),
            phone: "0901234567".to_string(),
            email: Some("".to_string()),
            message: Some("Tư vấn giúp tôi".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_row() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());

        let saved = submit(&repo, form()).await.unwrap();

        assert_eq!(saved.business, "Quán Cà Phê Lan");
        assert!(saved.email.is_none());
        assert_eq!(store.row_count("form_submissions").await, 1);
    }

    #[tokio::test]
    async fn test_missing_phone_skips_store() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());

        let err = submit(
            &repo,
            NewContactSubmission {
                phone: "  ".to_string(),
                ..form()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ContactError::MissingFields));
        assert_eq!(store.count(OperationKind::Insert).await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_generic() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        store.fail_next("new row violates row-level security").await;

        let err = submit(&repo, form()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Có lỗi xảy ra khi gửi thông tin. Vui lòng thử lại."
        );
    }
}
