use crate::domain::{CategoryId, CategoryType, Price, ProductId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub spiciness: i32,
    pub contains_nuts: bool,
    pub is_vegetarian: bool,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

/// Validated product fields used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub price: Price,
    pub spiciness: i32,
    pub contains_nuts: bool,
    pub is_vegetarian: bool,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

/// Conjunction of optional predicates. `None` means "do not filter".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub spiciness: Option<i32>,
    pub min_spiciness: Option<i32>,
    pub max_spiciness: Option<i32>,
    pub contains_nuts: Option<bool>,
    pub is_vegetarian: Option<bool>,
}
