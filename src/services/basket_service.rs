//! Domain service for per-user baskets.
//!
//! Adding a product the user already has merges into the existing line
//! instead of creating a second one.

use crate::domain::{BasketItemId, ProductId};
use crate::models::basket::{AddBasketItem, BasketItem, BasketLine};
use thiserror::Error;

/// Errors specific to basket operations.
#[derive(Debug, Error)]
pub enum BasketError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Basket item not found: {0}")]
    ItemNotFound(BasketItemId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for BasketError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BasketError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for baskets.
#[async_trait::async_trait]
pub trait BasketService: Send + Sync {
    /// Adds `quantity` of a product to the user's basket, merging with an
    /// existing line for the same product. Returns the line after the merge.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::Validation`] for a missing product or a
    /// non-positive quantity, and [`BasketError::ProductNotFound`] when the
    /// product does not exist. Storage is untouched in both cases.
    async fn add_item(
        &self,
        user_id: &str,
        request: AddBasketItem,
    ) -> Result<BasketItem, BasketError>;

    /// Overwrites the quantity of one of the user's lines.
    async fn update_quantity(
        &self,
        user_id: &str,
        item_id: BasketItemId,
        quantity: i32,
    ) -> Result<BasketItem, BasketError>;

    async fn remove_item(&self, user_id: &str, item_id: BasketItemId) -> Result<(), BasketError>;

    /// Lists the user's lines joined with their products, ordered by id.
    async fn list_items(&self, user_id: &str) -> Result<Vec<BasketLine>, BasketError>;
}
