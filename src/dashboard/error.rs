//! Page-level errors

use thiserror::Error;

use crate::models::ReminderStatus;
use crate::store::StoreError;

/// Errors shown on a dashboard page
///
/// Store errors pass through with the store's own message.
#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Vui lòng điền đầy đủ thông tin bắt buộc")]
    MissingFields,

    #[error("Nội dung tin nhắn không được để trống")]
    EmptyMessage,

    #[error("Không tìm thấy {what}")]
    NotFound { what: &'static str, id: String },

    #[error("Gateway không thuộc cửa hàng này")]
    GatewayNotInShop,

    #[error("Bàn không thuộc cửa hàng này")]
    TableNotInShop,

    #[error("Thiết bị không thuộc cửa hàng này")]
    DeviceNotInShop,

    #[error("Bàn {number} đã được liên kết với thiết bị khác")]
    TableTaken { number: String },

    #[error("Không thể thực hiện với nhắc nhở đang ở trạng thái \"{}\"", .0.label())]
    InvalidReminderState(ReminderStatus),
}

impl PageError {
    pub(crate) fn not_found(what: &'static str, id: &str) -> Self {
        PageError::NotFound {
            what,
            id: id.to_string(),
        }
    }

    /// True for errors raised before any remote call
    pub fn is_validation(&self) -> bool {
        !matches!(self, PageError::Store(_) | PageError::NotFound { .. })
    }
}

pub type PageResult<T> = Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_message_passes_through() {
        let err: PageError = StoreError::Remote {
            status: 403,
            code: None,
            message: "permission denied".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "permission denied");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_reminder_state_label() {
        let err = PageError::InvalidReminderState(ReminderStatus::Sent);
        assert_eq!(
            err.to_string(),
            "Không thể thực hiện với nhắc nhở đang ở trạng thái \"Đã gửi\""
        );
        assert!(err.is_validation());
    }
}
