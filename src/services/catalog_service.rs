//! Domain service for the product and category catalog.
//!
//! Covers filtered browsing, point lookups and the admin mutations.

use crate::domain::{CategoryId, CategoryType, ProductId};
use crate::models::catalog::{Category, Product, ProductFilter, ProductInput};
use thiserror::Error;

/// Errors specific to catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for the catalog.
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Lists products matching every predicate set in `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for out-of-range spiciness bounds.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, CatalogError>;

    async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError>;

    /// Creates a product in an existing category.
    async fn create_product(&self, input: ProductInput) -> Result<Product, CatalogError>;

    /// Replaces every field of a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Conflict`] if `body_id` is present and differs from `id`.
    async fn update_product(
        &self,
        id: ProductId,
        body_id: Option<ProductId>,
        input: ProductInput,
    ) -> Result<Product, CatalogError>;

    /// Deletes a product together with the basket lines that reference it.
    async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError>;

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;

    async fn get_category(&self, id: CategoryId) -> Result<Category, CatalogError>;

    async fn create_category(&self, name: CategoryType) -> Result<Category, CatalogError>;

    async fn update_category(
        &self,
        id: CategoryId,
        body_id: Option<CategoryId>,
        name: CategoryType,
    ) -> Result<Category, CatalogError>;

    /// Deletes an empty category.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Conflict`] while products still reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError>;
}
