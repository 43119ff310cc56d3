pub mod auth;
pub mod extractors;
pub mod health;
pub mod products;
pub mod upload;
