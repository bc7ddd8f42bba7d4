use crate::domain::{CategoryId, CategoryType};
use crate::entities::{categories, prelude::*};
use crate::models::catalog::Category;
use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

/// Repository for category operations
pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: categories::Model) -> Result<Category> {
        let name = model
            .name
            .parse::<CategoryType>()
            .map_err(|e| anyhow::anyhow!("Category {} is corrupt: {e}", model.id))?;

        Ok(Category {
            id: CategoryId::new(model.id),
            name,
        })
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows = Categories::find()
            .order_by_asc(categories::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = Categories::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query category")?;

        row.map(Self::map_model).transpose()
    }

    pub async fn exists(&self, id: CategoryId) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    pub async fn create(&self, name: CategoryType) -> Result<Category> {
        let active_model = categories::ActiveModel {
            name: Set(name.as_str().to_string()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert category")?;

        info!("Created category {} ({})", model.id, model.name);
        Self::map_model(model)
    }

    pub async fn update(&self, id: CategoryId, name: CategoryType) -> Result<Option<Category>> {
        let Some(existing) = Categories::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = existing.into();
        active.name = Set(name.as_str().to_string());
        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update category")?;

        Self::map_model(model).map(Some)
    }

    pub async fn remove(&self, id: CategoryId) -> Result<bool> {
        let result = Categories::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete category")?;

        Ok(result.rows_affected > 0)
    }
}
