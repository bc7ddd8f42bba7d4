pub mod basket;
pub mod category;
pub mod product;
pub mod user;
