use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::email;
use crate::services::{
    AuthService, BasketService, CatalogService, JwtIssuer, Mailer, SeaOrmAuthService,
    SeaOrmBasketService, SeaOrmCatalogService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub catalog_service: Arc<dyn CatalogService>,

    pub basket_service: Arc<dyn BasketService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer = email::from_config(&config.email)?;
        Self::with_mailer(config, mailer).await
    }

    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = JwtIssuer::new(&config.jwt);
        let config = Arc::new(RwLock::new(config));

        let catalog_service = Arc::new(SeaOrmCatalogService::new(store.clone()));
        let basket_service = Arc::new(SeaOrmBasketService::new(store.clone()));
        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.clone(),
            mailer.clone(),
            tokens,
        ));

        Ok(Self {
            config,
            store,
            mailer,
            catalog_service,
            basket_service,
            auth_service,
        })
    }
}
