//! `SeaORM` implementation of the `BasketService` trait.

use crate::db::Store;
use crate::domain::BasketItemId;
use crate::models::basket::{AddBasketItem, BasketItem, BasketLine};
use crate::services::basket_service::{BasketError, BasketService};
use async_trait::async_trait;
use tracing::debug;

pub struct SeaOrmBasketService {
    store: Store,
}

impl SeaOrmBasketService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn require_user(user_id: &str) -> Result<(), BasketError> {
        if user_id.trim().is_empty() {
            return Err(BasketError::Unauthenticated);
        }
        Ok(())
    }

    fn require_positive(quantity: i32) -> Result<(), BasketError> {
        if quantity <= 0 {
            return Err(BasketError::Validation(
                "Quantity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BasketService for SeaOrmBasketService {
    async fn add_item(
        &self,
        user_id: &str,
        request: AddBasketItem,
    ) -> Result<BasketItem, BasketError> {
        Self::require_user(user_id)?;

        let product_id = request
            .product_id
            .ok_or_else(|| BasketError::Validation("product_id is required".to_string()))?;
        let quantity = request
            .quantity
            .ok_or_else(|| BasketError::Validation("quantity is required".to_string()))?;
        Self::require_positive(quantity)?;

        if !self.store.product_exists(product_id).await? {
            return Err(BasketError::ProductNotFound(product_id));
        }

        let item = self
            .store
            .add_to_basket(user_id, product_id, quantity)
            .await?;

        debug!(
            user_id,
            product_id = product_id.value(),
            added = quantity,
            total = item.quantity,
            "Basket item upserted"
        );

        Ok(item)
    }

    async fn update_quantity(
        &self,
        user_id: &str,
        item_id: BasketItemId,
        quantity: i32,
    ) -> Result<BasketItem, BasketError> {
        Self::require_user(user_id)?;
        Self::require_positive(quantity)?;

        self.store
            .set_basket_quantity(user_id, item_id, quantity)
            .await?
            .ok_or(BasketError::ItemNotFound(item_id))
    }

    async fn remove_item(&self, user_id: &str, item_id: BasketItemId) -> Result<(), BasketError> {
        Self::require_user(user_id)?;

        if !self.store.remove_basket_item(user_id, item_id).await? {
            return Err(BasketError::ItemNotFound(item_id));
        }
        Ok(())
    }

    async fn list_items(&self, user_id: &str) -> Result<Vec<BasketLine>, BasketError> {
        Self::require_user(user_id)?;
        Ok(self.store.list_basket(user_id).await?)
    }
}
