use crate::domain::{CategoryId, Price, ProductId};
use crate::entities::{basket_items, prelude::*, products};
use crate::models::catalog::{Product, ProductFilter, ProductInput};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

/// Repository for product operations
pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    pub(crate) fn map_model(model: products::Model) -> Result<Product> {
        let price = Price::from_cents(model.price_cents)
            .ok_or_else(|| anyhow::anyhow!("Product {} has a non-positive price", model.id))?;

        Ok(Product {
            id: ProductId::new(model.id),
            name: model.name,
            price,
            spiciness: model.spiciness,
            contains_nuts: model.contains_nuts,
            is_vegetarian: model.is_vegetarian,
            image_url: model.image_url,
            category_id: CategoryId::new(model.category_id),
        })
    }

    fn apply_input(active: &mut products::ActiveModel, input: &ProductInput) {
        active.name = Set(input.name.clone());
        active.price_cents = Set(input.price.cents());
        active.spiciness = Set(input.spiciness);
        active.contains_nuts = Set(input.contains_nuts);
        active.is_vegetarian = Set(input.is_vegetarian);
        active.image_url = Set(input.image_url.clone());
        active.category_id = Set(input.category_id.value());
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut query = Products::find();

        if let Some(category_id) = filter.category_id {
            query = query.filter(products::Column::CategoryId.eq(category_id.value()));
        }
        if let Some(spiciness) = filter.spiciness {
            query = query.filter(products::Column::Spiciness.eq(spiciness));
        }
        if let Some(min) = filter.min_spiciness {
            query = query.filter(products::Column::Spiciness.gte(min));
        }
        if let Some(max) = filter.max_spiciness {
            query = query.filter(products::Column::Spiciness.lte(max));
        }
        if let Some(nuts) = filter.contains_nuts {
            query = query.filter(products::Column::ContainsNuts.eq(nuts));
        }
        if let Some(vegetarian) = filter.is_vegetarian {
            query = query.filter(products::Column::IsVegetarian.eq(vegetarian));
        }

        let rows = query
            .order_by_asc(products::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list products")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn get(&self, id: ProductId) -> Result<Option<Product>> {
        let row = Products::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query product")?;

        row.map(Self::map_model).transpose()
    }

    pub async fn exists(&self, id: ProductId) -> Result<bool> {
        let count = Products::find()
            .filter(products::Column::Id.eq(id.value()))
            .count(&self.conn)
            .await
            .context("Failed to check product existence")?;

        Ok(count > 0)
    }

    pub async fn count_in_category(&self, category_id: CategoryId) -> Result<u64> {
        Products::find()
            .filter(products::Column::CategoryId.eq(category_id.value()))
            .count(&self.conn)
            .await
            .context("Failed to count products in category")
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create(&self, input: &ProductInput) -> Result<Product> {
        let mut active = <products::ActiveModel as Default>::default();
        Self::apply_input(&mut active, input);

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert product")?;

        info!("Created product {} ({})", model.id, model.name);
        Self::map_model(model)
    }

    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Option<Product>> {
        let Some(existing) = Products::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = existing.into();
        Self::apply_input(&mut active, input);
        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update product")?;

        Self::map_model(model).map(Some)
    }

    /// Deletes the product and every basket line that references it.
    pub async fn remove(&self, id: ProductId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let lines = BasketItems::delete_many()
            .filter(basket_items::Column::ProductId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete basket lines for product")?;

        let result = Products::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete product")?;

        txn.commit().await?;

        if result.rows_affected > 0 {
            info!(
                "Deleted product {} and {} basket line(s)",
                id, lines.rows_affected
            );
        }

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    async fn repo() -> ProductRepository {
        let store = Store::new("sqlite::memory:").await.unwrap();
        ProductRepository::new(store.conn)
    }

    async fn ids(repo: &ProductRepository, filter: ProductFilter) -> Vec<i32> {
        repo.list(&filter)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id.value())
            .collect()
    }

    #[tokio::test]
    async fn test_empty_filter_returns_every_product_in_id_order() {
        let repo = repo().await;
        assert_eq!(ids(&repo, ProductFilter::default()).await, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_filters_combine_with_and() {
        let repo = repo().await;

        let vegetarian_and_mild = ProductFilter {
            is_vegetarian: Some(true),
            max_spiciness: Some(1),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&repo, vegetarian_and_mild).await, vec![1]);

        let meat_and_hot = ProductFilter {
            is_vegetarian: Some(false),
            min_spiciness: Some(2),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&repo, meat_and_hot).await, vec![2, 3]);

        let category_and_exact = ProductFilter {
            category_id: Some(CategoryId::new(2)),
            spiciness: Some(3),
            ..ProductFilter::default()
        };
        assert!(ids(&repo, category_and_exact).await.is_empty());
    }

    #[tokio::test]
    async fn test_spiciness_range_is_inclusive() {
        let repo = repo().await;

        let range = ProductFilter {
            min_spiciness: Some(1),
            max_spiciness: Some(3),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&repo, range).await, vec![2, 3, 4]);

        let nuts = ProductFilter {
            contains_nuts: Some(true),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&repo, nuts).await, vec![3]);
    }

    #[tokio::test]
    async fn test_created_product_is_found_by_filters() {
        let repo = repo().await;

        let created = repo
            .create(&ProductInput {
                name: "Garden Soup".to_string(),
                price: Price::from_cents(650).unwrap(),
                spiciness: 1,
                contains_nuts: false,
                is_vegetarian: true,
                image_url: None,
                category_id: CategoryId::new(2),
            })
            .await
            .unwrap();
        assert_eq!(created.id.value(), 5);
        assert_eq!(created.price.cents(), 650);

        let vegetarian_and_mild = ProductFilter {
            is_vegetarian: Some(true),
            max_spiciness: Some(1),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&repo, vegetarian_and_mild).await, vec![1, 5]);
    }
}
