pub mod prelude;

pub mod basket_items;
pub mod categories;
pub mod products;
pub mod users;
