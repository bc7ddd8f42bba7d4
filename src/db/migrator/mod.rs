use sea_orm_migration::prelude::*;

mod m20260301_create_catalog;
mod m20260302_create_basket_items;
mod m20260303_create_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_create_catalog::Migration),
            Box::new(m20260302_create_basket_items::Migration),
            Box::new(m20260303_create_users::Migration),
        ]
    }
}
