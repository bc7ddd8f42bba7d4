//! Config and database check command handler

use crate::config::Config;
use crate::db::Store;
use crate::models::catalog::ProductFilter;

pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    config.validate()?;
    println!("✓ Configuration is valid");

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    store.ping().await?;
    println!("✓ Database reachable: {}", config.general.database_path);

    let categories = store.list_categories().await?;
    let products = store.list_products(&ProductFilter::default()).await?;
    println!(
        "  {} categories, {} products",
        categories.len(),
        products.len()
    );

    Ok(())
}
