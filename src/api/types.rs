use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::CategoryType;
use crate::models::basket::{BasketItem, BasketLine};
use crate::models::catalog::{Category, Product};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub spiciness: i32,
    pub contains_nuts: bool,
    pub is_vegetarian: bool,
    pub image_url: Option<String>,
    pub category_id: i32,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.value(),
            name: product.name,
            price: product.price.to_decimal(),
            spiciness: product.spiciness,
            contains_nuts: product.contains_nuts,
            is_vegetarian: product.is_vegetarian,
            image_url: product.image_url,
            category_id: product.category_id.value(),
        }
    }
}

/// Create/update body. Older clients send `nuts`, `vegeterian` and `image`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub spiciness: Option<i32>,
    #[serde(alias = "nuts")]
    pub contains_nuts: Option<bool>,
    #[serde(alias = "vegeterian")]
    pub is_vegetarian: Option<bool>,
    #[serde(alias = "image")]
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilterQuery {
    pub category_id: Option<i32>,
    pub spiciness: Option<i32>,
    pub min_spiciness: Option<i32>,
    pub max_spiciness: Option<i32>,
    #[serde(alias = "nuts")]
    pub contains_nuts: Option<bool>,
    #[serde(alias = "vegeterian")]
    pub is_vegetarian: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: CategoryType,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.value(),
            name: category.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryRequest {
    pub id: Option<i32>,
    pub name: Option<String>,
}

// ============================================================================
// Basket
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BasketItemDto {
    pub id: i32,
    pub user_id: String,
    pub product_id: i32,
    pub quantity: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BasketItem> for BasketItemDto {
    fn from(item: BasketItem) -> Self {
        Self {
            id: item.id.value(),
            user_id: item.user_id,
            product_id: item.product_id.value(),
            quantity: item.quantity,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BasketLineDto {
    #[serde(flatten)]
    pub item: BasketItemDto,
    pub product: ProductDto,
}

impl From<BasketLine> for BasketLineDto {
    fn from(line: BasketLine) -> Self {
        Self {
            item: line.item.into(),
            product: line.product.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddBasketItemRequest {
    pub product_id: Option<i32>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<i32>,
}
