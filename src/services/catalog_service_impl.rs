//! `SeaORM` implementation of the `CatalogService` trait.

use crate::db::Store;
use crate::domain::{CategoryId, CategoryType, MAX_SPICINESS, ProductId};
use crate::models::catalog::{Category, Product, ProductFilter, ProductInput};
use crate::services::catalog_service::{CatalogError, CatalogService};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmCatalogService {
    store: Store,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn check_spiciness(field: &str, value: Option<i32>) -> Result<(), CatalogError> {
        match value {
            Some(v) if !(0..=MAX_SPICINESS).contains(&v) => Err(CatalogError::Validation(
                format!("{field} must be between 0 and {MAX_SPICINESS}"),
            )),
            _ => Ok(()),
        }
    }

    fn validate_filter(filter: &ProductFilter) -> Result<(), CatalogError> {
        Self::check_spiciness("spiciness", filter.spiciness)?;
        Self::check_spiciness("min_spiciness", filter.min_spiciness)?;
        Self::check_spiciness("max_spiciness", filter.max_spiciness)?;

        if let (Some(min), Some(max)) = (filter.min_spiciness, filter.max_spiciness)
            && min > max
        {
            return Err(CatalogError::Validation(
                "min_spiciness cannot be greater than max_spiciness".to_string(),
            ));
        }

        Ok(())
    }

    async fn validate_input(&self, input: &ProductInput) -> Result<(), CatalogError> {
        if input.name.trim().is_empty() {
            return Err(CatalogError::Validation(
                "Product name cannot be empty".to_string(),
            ));
        }
        Self::check_spiciness("spiciness", Some(input.spiciness))?;

        if !self.store.category_exists(input.category_id).await? {
            return Err(CatalogError::CategoryNotFound(input.category_id));
        }

        Ok(())
    }
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, CatalogError> {
        Self::validate_filter(&filter)?;
        Ok(self.store.list_products(&filter).await?)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    async fn create_product(&self, input: ProductInput) -> Result<Product, CatalogError> {
        self.validate_input(&input).await?;
        Ok(self.store.add_product(&input).await?)
    }

    async fn update_product(
        &self,
        id: ProductId,
        body_id: Option<ProductId>,
        input: ProductInput,
    ) -> Result<Product, CatalogError> {
        if let Some(body_id) = body_id
            && body_id != id
        {
            return Err(CatalogError::Conflict(format!(
                "Product id {body_id} in body does not match {id} in path"
            )));
        }

        self.validate_input(&input).await?;

        self.store
            .update_product(id, &input)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        if !self.store.remove_product(id).await? {
            return Err(CatalogError::ProductNotFound(id));
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.store.list_categories().await?)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.store
            .get_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }

    async fn create_category(&self, name: CategoryType) -> Result<Category, CatalogError> {
        Ok(self.store.add_category(name).await?)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        body_id: Option<CategoryId>,
        name: CategoryType,
    ) -> Result<Category, CatalogError> {
        if let Some(body_id) = body_id
            && body_id != id
        {
            return Err(CatalogError::Conflict(format!(
                "Category id {body_id} in body does not match {id} in path"
            )));
        }

        self.store
            .update_category(id, name)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        if !self.store.category_exists(id).await? {
            return Err(CatalogError::CategoryNotFound(id));
        }

        let products = self.store.count_products_in_category(id).await?;
        if products > 0 {
            return Err(CatalogError::Conflict(format!(
                "Category {id} still has {products} product(s)"
            )));
        }

        self.store.remove_category(id).await?;
        info!("Deleted category {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rejects_out_of_range_spiciness() {
        let filter = ProductFilter {
            spiciness: Some(5),
            ..ProductFilter::default()
        };
        assert!(matches!(
            SeaOrmCatalogService::validate_filter(&filter),
            Err(CatalogError::Validation(_))
        ));

        let filter = ProductFilter {
            min_spiciness: Some(-1),
            ..ProductFilter::default()
        };
        assert!(SeaOrmCatalogService::validate_filter(&filter).is_err());
    }

    #[test]
    fn test_filter_rejects_inverted_range() {
        let filter = ProductFilter {
            min_spiciness: Some(3),
            max_spiciness: Some(1),
            ..ProductFilter::default()
        };
        assert!(SeaOrmCatalogService::validate_filter(&filter).is_err());

        let filter = ProductFilter {
            min_spiciness: Some(1),
            max_spiciness: Some(1),
            ..ProductFilter::default()
        };
        assert!(SeaOrmCatalogService::validate_filter(&filter).is_ok());
    }
}
