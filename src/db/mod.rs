use crate::domain::{BasketItemId, CategoryId, CategoryType, ProductId};
use crate::models::basket::{BasketItem, BasketLine};
use crate::models::catalog::{Category, Product, ProductFilter, ProductInput};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{ConfirmOutcome, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` would see its own empty database.
        let max_connections = if in_memory { 1 } else { max_connections };
        let min_connections = min_connections.min(max_connections);

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn basket_repo(&self) -> repositories::basket::BasketRepository {
        repositories::basket::BasketRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.category_repo().list().await
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.category_repo().get(id).await
    }

    pub async fn category_exists(&self, id: CategoryId) -> Result<bool> {
        self.category_repo().exists(id).await
    }

    pub async fn add_category(&self, name: CategoryType) -> Result<Category> {
        self.category_repo().create(name).await
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        name: CategoryType,
    ) -> Result<Option<Category>> {
        self.category_repo().update(id, name).await
    }

    pub async fn remove_category(&self, id: CategoryId) -> Result<bool> {
        self.category_repo().remove(id).await
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.product_repo().list(filter).await
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.product_repo().get(id).await
    }

    pub async fn product_exists(&self, id: ProductId) -> Result<bool> {
        self.product_repo().exists(id).await
    }

    pub async fn count_products_in_category(&self, category_id: CategoryId) -> Result<u64> {
        self.product_repo().count_in_category(category_id).await
    }

    pub async fn add_product(&self, input: &ProductInput) -> Result<Product> {
        self.product_repo().create(input).await
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>> {
        self.product_repo().update(id, input).await
    }

    pub async fn remove_product(&self, id: ProductId) -> Result<bool> {
        self.product_repo().remove(id).await
    }

    // ========================================================================
    // Basket
    // ========================================================================

    pub async fn add_to_basket(
        &self,
        user_id: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<BasketItem> {
        self.basket_repo()
            .upsert_add(user_id, product_id, quantity)
            .await
    }

    pub async fn set_basket_quantity(
        &self,
        user_id: &str,
        id: BasketItemId,
        quantity: i32,
    ) -> Result<Option<BasketItem>> {
        self.basket_repo().set_quantity(user_id, id, quantity).await
    }

    pub async fn remove_basket_item(&self, user_id: &str, id: BasketItemId) -> Result<bool> {
        self.basket_repo().remove(user_id, id).await
    }

    pub async fn list_basket(&self, user_id: &str) -> Result<Vec<BasketLine>> {
        self.basket_repo().list_for_user(user_id).await
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: String,
        confirmation_token: &str,
        confirmation_expires_at: DateTime<Utc>,
    ) -> Result<User> {
        self.user_repo()
            .create(
                email,
                password_hash,
                confirmation_token,
                confirmation_expires_at,
            )
            .await
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn confirm_user_email(&self, id: &str, token: &str) -> Result<ConfirmOutcome> {
        self.user_repo().confirm_email(id, token).await
    }
}
