pub mod basket;
pub mod catalog;
