use crate::domain::{BasketItemId, ProductId};
use crate::entities::{basket_items, prelude::*};
use crate::models::basket::{BasketItem, BasketLine};
use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::product::ProductRepository;

/// Merges the incoming quantity into the existing row, clamped to `i32::MAX`.
const MERGE_QUANTITY_SQL: &str = "MIN(basket_items.quantity + excluded.quantity, 2147483647)";

pub struct BasketRepository {
    conn: DatabaseConnection,
}

impl From<basket_items::Model> for BasketItem {
    fn from(model: basket_items::Model) -> Self {
        Self {
            id: BasketItemId::new(model.id),
            user_id: model.user_id,
            product_id: ProductId::new(model.product_id),
            quantity: model.quantity,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl BasketRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a line for (user, product) or adds `quantity` to the existing one.
    ///
    /// Runs as a single `INSERT .. ON CONFLICT DO UPDATE`, so concurrent callers
    /// for the same key are serialised by the unique index.
    pub async fn upsert_add(
        &self,
        user_id: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<BasketItem> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = basket_items::ActiveModel {
            user_id: Set(user_id.to_string()),
            product_id: Set(product_id.value()),
            quantity: Set(quantity),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        BasketItems::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    basket_items::Column::UserId,
                    basket_items::Column::ProductId,
                ])
                .value(basket_items::Column::Quantity, Expr::cust(MERGE_QUANTITY_SQL))
                .value(
                    basket_items::Column::UpdatedAt,
                    Expr::cust("excluded.updated_at"),
                )
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to upsert basket item")?;

        self.find_by_key(user_id, product_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Basket item vanished after upsert"))
    }

    async fn find_by_key(
        &self,
        user_id: &str,
        product_id: ProductId,
    ) -> Result<Option<BasketItem>> {
        let row = BasketItems::find()
            .filter(basket_items::Column::UserId.eq(user_id))
            .filter(basket_items::Column::ProductId.eq(product_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query basket item")?;

        Ok(row.map(BasketItem::from))
    }

    /// Items owned by another user are treated as absent.
    async fn get_owned(&self, user_id: &str, id: BasketItemId) -> Result<Option<BasketItem>> {
        let row = BasketItems::find_by_id(id.value())
            .filter(basket_items::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query basket item")?;

        Ok(row.map(BasketItem::from))
    }

    pub async fn set_quantity(
        &self,
        user_id: &str,
        id: BasketItemId,
        quantity: i32,
    ) -> Result<Option<BasketItem>> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = BasketItems::update_many()
            .col_expr(basket_items::Column::Quantity, Expr::value(quantity))
            .col_expr(basket_items::Column::UpdatedAt, Expr::value(now))
            .filter(basket_items::Column::Id.eq(id.value()))
            .filter(basket_items::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to update basket item quantity")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_owned(user_id, id).await
    }

    pub async fn remove(&self, user_id: &str, id: BasketItemId) -> Result<bool> {
        let result = BasketItems::delete_many()
            .filter(basket_items::Column::Id.eq(id.value()))
            .filter(basket_items::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete basket item")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<BasketLine>> {
        let rows = BasketItems::find()
            .filter(basket_items::Column::UserId.eq(user_id))
            .find_also_related(Products)
            .order_by_asc(basket_items::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list basket items")?;

        let mut lines = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            let product = product.ok_or_else(|| {
                anyhow::anyhow!("Basket item {} references a missing product", item.id)
            })?;
            lines.push(BasketLine {
                item: BasketItem::from(item),
                product: ProductRepository::map_model(product)?,
            });
        }

        Ok(lines)
    }
}
