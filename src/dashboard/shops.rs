//! Shops screen

use super::collection::{Collection, Placement};
use super::error::{PageError, PageResult};
use super::DashboardContext;
use crate::models::{NewShop, Shop, ShopPatch};

pub struct ShopsPage {
    ctx: DashboardContext,
    owner_id: String,
    shops: Collection<Shop>,
}

impl ShopsPage {
    pub(super) fn new(ctx: DashboardContext, owner_id: String) -> Self {
        Self {
            ctx,
            owner_id,
            shops: Collection::new(),
        }
    }

    pub fn shops(&self) -> &[Shop] {
        self.shops.items()
    }

    pub fn collection(&self) -> &Collection<Shop> {
        &self.shops
    }

    pub async fn refresh(&mut self) -> PageResult<()> {
        let repo = &self.ctx.repos.shops;
        self.shops.load(repo.list_for_owner(&self.owner_id)).await
    }

    /// Create a shop owned by the page's user
    pub async fn create(&mut self, mut form: NewShop) -> PageResult<Shop> {
        if form.name.trim().is_empty() {
            return Err(self.shops.fail(PageError::MissingFields));
        }
        form.user_id = self.owner_id.clone();

        let result = self.ctx.repos.shops.create(&form).await;
        self.shops.created(result, Placement::Front)
    }

    pub async fn update(&mut self, id: &str, patch: ShopPatch) -> PageResult<Shop> {
        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(self.shops.fail(PageError::MissingFields));
        }

        let result = self.ctx.repos.shops.update(id, &patch).await;
        self.shops.updated(result)
    }

    pub async fn delete(&mut self, id: &str) -> PageResult<()> {
        let result = self.ctx.repos.shops.delete(id).await;
        self.shops.deleted(id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::context;
    use crate::models::ReminderUnit;
    use crate::store::OperationKind;

    #[tokio::test]
    async fn test_create_shop_with_defaults() {
        let (_, ctx) = context();
        let mut page = ctx.shops("owner-1");
        page.refresh().await.unwrap();

        let form = NewShop::new("", "Café A")
            .address("1 Main St")
            .phone("0900000000");
        let shop = page.create(form).await.unwrap();

        assert!(!shop.id.is_empty());
        assert_eq!(shop.user_id, "owner-1");
        assert_eq!(page.shops().len(), 1);
        assert_eq!(page.shops()[0].name, "Café A");
        assert_eq!(page.shops()[0].reminder_time, 30);
        assert_eq!(page.shops()[0].reminder_unit, ReminderUnit::Minutes);
    }

    #[tokio::test]
    async fn test_delete_one_shop() {
        let (store, ctx) = context();
        let mut page = ctx.shops("owner-1");
        let a = page.create(NewShop::new("", "A")).await.unwrap();
        let b = page.create(NewShop::new("", "B")).await.unwrap();

        page.delete(&a.id).await.unwrap();

        assert_eq!(store.count(OperationKind::Delete).await, 1);
        let ids: Vec<_> = page.shops().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str()]);
    }

    #[tokio::test]
    async fn test_blank_name_rejected_without_remote_call() {
        let (store, ctx) = context();
        let mut page = ctx.shops("owner-1");

        let err = page.create(NewShop::new("", "  ")).await.unwrap_err();
        assert!(matches!(err, PageError::MissingFields));
        assert!(store.operations().await.is_empty());
        assert!(page.collection().error().is_some());
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let (_, ctx) = context();
        let mut page = ctx.shops("owner-1");
        let a = page.create(NewShop::new("", "A")).await.unwrap();
        page.create(NewShop::new("", "B")).await.unwrap();

        let patch = ShopPatch {
            reminder_time: Some(10),
            reminder_unit: Some(ReminderUnit::Seconds),
            ..Default::default()
        };
        page.update(&a.id, patch).await.unwrap();

        assert_eq!(page.shops()[1].id, a.id);
        assert_eq!(page.shops()[1].reminder_label(), "10 giây");
    }
}
