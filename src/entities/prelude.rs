pub use super::basket_items::Entity as BasketItems;
pub use super::categories::Entity as Categories;
pub use super::products::Entity as Products;
pub use super::users::Entity as Users;
