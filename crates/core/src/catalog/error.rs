use thiserror::Error;

/// Errors raised while validating users and products.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),
    #[error("Product name cannot be empty")]
    EmptyName,
    #[error("Product name too long (max {0} characters)")]
    NameTooLong(usize),
    #[error("Price must be a non-negative number")]
    NegativePrice,
    #[error("Stock cannot be negative")]
    NegativeStock,
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}
