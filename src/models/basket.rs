use crate::domain::{BasketItemId, ProductId};
use crate::models::catalog::Product;

/// One line of a user's basket. At most one exists per (user, product).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketItem {
    pub id: BasketItemId,
    pub user_id: String,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// A basket item together with the product it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketLine {
    pub item: BasketItem,
    pub product: Product,
}

/// Add-to-basket request as received; both fields are required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddBasketItem {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}
