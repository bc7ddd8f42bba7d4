pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, RegisterResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod basket_service;
pub mod basket_service_impl;
pub use basket_service::{BasketError, BasketService};
pub use basket_service_impl::SeaOrmBasketService;

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogService};
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod email;
pub use email::{LogMailer, Mailer, MemoryMailer, OutgoingEmail, SmtpMailer};

pub mod token;
pub use token::{AuthUser, JwtIssuer};
