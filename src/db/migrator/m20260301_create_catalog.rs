use crate::domain::CategoryType;
use crate::entities::{categories, prelude::*, products};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (name, price in cents, contains nuts, image, vegetarian, spiciness, category id)
const SEED_PRODUCTS: [(&str, i64, bool, &str, bool, i32, i32); 4] = [
    (
        "Caesar Salad",
        1299,
        false,
        "https://example.com/caesar-salad.jpg",
        true,
        0,
        1,
    ),
    (
        "Hot and Sour Soup",
        899,
        false,
        "https://example.com/hot-sour-soup.jpg",
        false,
        2,
        2,
    ),
    (
        "Kung Pao Chicken",
        1599,
        true,
        "https://example.com/kung-pao-chicken.jpg",
        false,
        3,
        3,
    ),
    (
        "Beef Stir Fry",
        1699,
        false,
        "https://example.com/beef-stir-fry.jpg",
        false,
        1,
        4,
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Categories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Products)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id)",
        )
        .await?;

        let mut insert_categories = Query::insert()
            .into_table(Categories)
            .columns([categories::Column::Id, categories::Column::Name])
            .to_owned();
        for (index, category) in (1_i32..).zip(CategoryType::ALL) {
            insert_categories.values_panic([index.into(), category.as_str().into()]);
        }
        manager.exec_stmt(insert_categories).await?;

        let mut insert_products = Query::insert()
            .into_table(Products)
            .columns([
                products::Column::Id,
                products::Column::Name,
                products::Column::PriceCents,
                products::Column::ContainsNuts,
                products::Column::ImageUrl,
                products::Column::IsVegetarian,
                products::Column::Spiciness,
                products::Column::CategoryId,
            ])
            .to_owned();
        for (index, (name, cents, nuts, image, vegetarian, spiciness, category)) in
            (1_i32..).zip(SEED_PRODUCTS)
        {
            insert_products.values_panic([
                index.into(),
                name.into(),
                cents.into(),
                nuts.into(),
                image.into(),
                vegetarian.into(),
                spiciness.into(),
                category.into(),
            ]);
        }
        manager.exec_stmt(insert_products).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories).to_owned())
            .await?;

        Ok(())
    }
}
