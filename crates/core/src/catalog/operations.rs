use rust_decimal::Decimal;

use super::error::CatalogError;
use super::requests::{NewProduct, NewUser, ProductPatch, UserPatch};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum accepted product name length.
pub const MAX_PRODUCT_NAME_LEN: usize = 255;

/// Loose email shape check: one `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn validate_password(password: &str) -> Result<(), CatalogError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CatalogError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(CatalogError::NameTooLong(MAX_PRODUCT_NAME_LEN));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), CatalogError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CatalogError::NegativePrice);
    }
    Ok(())
}

fn validate_stock(stock: i64) -> Result<(), CatalogError> {
    if stock < 0 {
        return Err(CatalogError::NegativeStock);
    }
    Ok(())
}

/// Validates a registration payload.
pub fn validate_new_user(new_user: &NewUser) -> Result<(), CatalogError> {
    if !is_valid_email(&new_user.email) {
        return Err(CatalogError::InvalidEmail(new_user.email.clone()));
    }
    validate_password(&new_user.password)
}

/// Validates a profile patch.
pub fn validate_user_patch(patch: &UserPatch) -> Result<(), CatalogError> {
    match &patch.password {
        Some(password) => validate_password(password),
        None => Ok(()),
    }
}

/// Validates a product before creation.
pub fn validate_new_product(product: &NewProduct) -> Result<(), CatalogError> {
    validate_name(&product.name)?;
    validate_price(product.price)?;
    validate_stock(product.stock)
}

/// Validates the fields present in a product patch.
pub fn validate_product_patch(patch: &ProductPatch) -> Result<(), CatalogError> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
    }
    Ok(())
}
