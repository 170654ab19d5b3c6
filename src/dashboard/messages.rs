//! Messages shown on one device

use super::collection::{Collection, Placement};
use super::error::{PageError, PageResult};
use super::DashboardContext;
use crate::models::{DeviceMessage, MessageKind, MessagePatch, NewDeviceMessage};

pub struct MessagesPage {
    ctx: DashboardContext,
    device_id: String,
    messages: Collection<DeviceMessage>,
}

impl MessagesPage {
    pub(super) fn new(ctx: DashboardContext, device_id: String) -> Self {
        Self {
            ctx,
            device_id,
            messages: Collection::new(),
        }
    }

    pub fn messages(&self) -> &[DeviceMessage] {
        self.messages.items()
    }

    pub fn collection(&self) -> &Collection<DeviceMessage> {
        &self.messages
    }

    pub fn active(&self) -> impl Iterator<Item = &DeviceMessage> {
        self.messages().iter().filter(|m| m.is_active)
    }

    pub async fn refresh(&mut self) -> PageResult<()> {
        let repo = &self.ctx.repos.messages;
        self.messages.load(repo.list_for_device(&self.device_id)).await
    }

    /// Add an active message; content is trimmed and must not be empty
    pub async fn add(&mut self, content: &str, kind: MessageKind) -> PageResult<DeviceMessage> {
        let content = content.trim();
        if content.is_empty() {
            return Err(self.messages.fail(PageError::EmptyMessage));
        }

        let form = NewDeviceMessage::new(self.device_id.clone(), content, kind);
        let result = self.ctx.repos.messages.create(&form).await;
        self.messages.created(result, Placement::Front)
    }

    pub async fn update(&mut self, id: &str, mut patch: MessagePatch) -> PageResult<DeviceMessage> {
        if let Some(content) = patch.content.as_mut() {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(self.messages.fail(PageError::EmptyMessage));
            }
            *content = trimmed.to_string();
        }

        let result = self.ctx.repos.messages.update(id, &patch).await;
        self.messages.updated(result)
    }

    /// Flip `is_active` for a message on this page
    pub async fn toggle(&mut self, id: &str) -> PageResult<DeviceMessage> {
        let Some(current) = self.messages.get(id).map(|m| m.is_active) else {
            return Err(self.messages.fail(PageError::not_found("tin nhắn", id)));
        };

        let patch = MessagePatch {
            is_active: Some(!current),
            ..Default::default()
        };
        let result = self.ctx.repos.messages.update(id, &patch).await;
        self.messages.updated(result)
    }

    pub async fn delete(&mut self, id: &str) -> PageResult<()> {
        let result = self.ctx.repos.messages.delete(id).await;
        self.messages.deleted(id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::context;

    #[tokio::test]
    async fn test_add_trims_and_prepends() {
        let (_, ctx) = context();
        let mut page = ctx.messages("dev-1");

        page.add("Xin chào", MessageKind::Greeting).await.unwrap();
        let second = page
            .add("  Giảm 10% hôm nay  ", MessageKind::Promotion)
            .await
            .unwrap();

        assert_eq!(second.content, "Giảm 10% hôm nay");
        assert!(second.is_active);
        assert_eq!(page.messages()[0].id, second.id);
        assert_eq!(page.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let (store, ctx) = context();
        let mut page = ctx.messages("dev-1");

        let err = page.add("   ", MessageKind::Custom).await.unwrap_err();

        assert!(matches!(err, PageError::EmptyMessage));
        assert!(store.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_flips_active() {
        let (_, ctx) = context();
        let mut page = ctx.messages("dev-1");
        let msg = page.add("Cảm ơn", MessageKind::Farewell).await.unwrap();

        let off = page.toggle(&msg.id).await.unwrap();
        assert!(!off.is_active);
        assert_eq!(page.active().count(), 0);

        let on = page.toggle(&msg.id).await.unwrap();
        assert!(on.is_active);
    }

    #[tokio::test]
    async fn test_toggle_unknown_message() {
        let (_, ctx) = context();
        let mut page = ctx.messages("dev-1");
        let err = page.toggle("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Không tìm thấy tin nhắn");
    }

    #[tokio::test]
    async fn test_delete_only_that_message() {
        let (_, ctx) = context();
        let mut page = ctx.messages("dev-1");
        let a = page.add("A", MessageKind::Custom).await.unwrap();
        let b = page.add("B", MessageKind::Custom).await.unwrap();

        page.delete(&a.id).await.unwrap();
        page.refresh().await.unwrap();

        assert_eq!(page.messages().len(), 1);
        assert_eq!(page.messages()[0].id, b.id);
    }
}
