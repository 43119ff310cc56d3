//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and domain types.
//! These are testable in isolation without DynamoDB access.

use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shopkeep_core::catalog::{Credentials, Product, Role, User};
use shopkeep_core::storage::RepositoryError;
use uuid::Uuid;

use super::keys;
use super::table::{Item, PK, SK};

// ============================================================================
// Entity type constants
// ============================================================================

pub const ENTITY_TYPE_USER: &str = "USER";
pub const ENTITY_TYPE_PRODUCT: &str = "PRODUCT";
pub const ENTITY_TYPE_EMAIL_INDEX: &str = "USER_EMAIL";
pub const ENTITY_TYPE_OWNER_INDEX: &str = "USER_PRODUCT";
pub const ENTITY_TYPE_CATEGORY_INDEX: &str = "CATEGORY_PRODUCT";

/// Attribute used as the optimistic-concurrency version.
pub const VERSION_ATTRIBUTE: &str = "updatedAt";

fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn insert_optional(item: &mut Item, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        item.insert(key.to_string(), s(value.clone()));
    }
}

fn keyed_item(pk: String, sk: String, entity_type: &str) -> Item {
    let mut item = Item::new();
    item.insert(PK.to_string(), s(pk));
    item.insert(SK.to_string(), s(sk));
    item.insert("entityType".to_string(), s(entity_type));
    item
}

// ============================================================================
// User conversions
// ============================================================================

/// Convert a User and its password hash to a DynamoDB item.
pub fn user_to_item(user: &User, password_hash: &str) -> Item {
    let mut item = keyed_item(keys::user_pk(user.id), keys::user_sk(user.id), ENTITY_TYPE_USER);

    item.insert("id".to_string(), s(user.id.to_string()));
    item.insert("email".to_string(), s(user.email.clone()));
    item.insert("passwordHash".to_string(), s(password_hash));
    insert_optional(&mut item, "firstName", &user.first_name);
    insert_optional(&mut item, "lastName", &user.last_name);
    insert_optional(&mut item, "profileImage", &user.profile_image);
    item.insert("role".to_string(), s(user.role.as_str()));
    item.insert("isActive".to_string(), AttributeValue::Bool(user.is_active));
    item.insert("createdAt".to_string(), s(user.created_at.to_rfc3339()));
    item.insert(VERSION_ATTRIBUTE.to_string(), s(user.updated_at.to_rfc3339()));
    if let Some(last_login) = user.last_login {
        item.insert("lastLogin".to_string(), s(last_login.to_rfc3339()));
    }

    item
}

/// Convert a DynamoDB item to User.
pub fn item_to_user(item: &Item) -> Result<User, RepositoryError> {
    let role = get_string(item, "role")?;
    Ok(User {
        id: get_uuid(item, "id")?,
        email: get_string(item, "email")?,
        first_name: get_optional_string(item, "firstName"),
        last_name: get_optional_string(item, "lastName"),
        profile_image: get_optional_string(item, "profileImage"),
        role: Role::from_str(&role).map_err(|e| RepositoryError::Serialization(e.to_string()))?,
        is_active: get_bool(item, "isActive")?,
        created_at: get_datetime(item, "createdAt")?,
        updated_at: get_datetime(item, VERSION_ATTRIBUTE)?,
        last_login: get_optional_datetime(item, "lastLogin")?,
    })
}

/// Convert a DynamoDB item to a User plus its password hash.
pub fn item_to_credentials(item: &Item) -> Result<Credentials, RepositoryError> {
    Ok(Credentials {
        user: item_to_user(item)?,
        password_hash: get_string(item, "passwordHash")?,
    })
}

/// Build the email uniqueness/lookup record for a user.
pub fn email_index_item(email: &str, user_id: Uuid) -> Item {
    let key = keys::email_key(email);
    let mut item = keyed_item(key.pk, key.sk, ENTITY_TYPE_EMAIL_INDEX);
    item.insert("userId".to_string(), s(user_id.to_string()));
    item
}

// ============================================================================
// Product conversions
// ============================================================================

/// Convert a Product to a DynamoDB item.
pub fn product_to_item(product: &Product) -> Item {
    let mut item = keyed_item(
        keys::product_pk(product.id),
        keys::product_sk(product.id),
        ENTITY_TYPE_PRODUCT,
    );

    item.insert("id".to_string(), s(product.id.to_string()));
    item.insert("name".to_string(), s(product.name.clone()));
    insert_optional(&mut item, "description", &product.description);
    item.insert(
        "price".to_string(),
        AttributeValue::N(product.price.to_string()),
    );
    insert_optional(&mut item, "imageUrl", &product.image_url);
    insert_optional(&mut item, "category", &product.category);
    item.insert(
        "stock".to_string(),
        AttributeValue::N(product.stock.to_string()),
    );
    item.insert("isActive".to_string(), AttributeValue::Bool(product.is_active));
    item.insert("userId".to_string(), s(product.user_id.to_string()));
    item.insert("createdAt".to_string(), s(product.created_at.to_rfc3339()));
    item.insert(
        VERSION_ATTRIBUTE.to_string(),
        s(product.updated_at.to_rfc3339()),
    );

    item
}

/// Convert a DynamoDB item to Product.
pub fn item_to_product(item: &Item) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: get_uuid(item, "id")?,
        name: get_string(item, "name")?,
        description: get_optional_string(item, "description"),
        price: get_decimal(item, "price")?,
        image_url: get_optional_string(item, "imageUrl"),
        category: get_optional_string(item, "category"),
        stock: get_i64(item, "stock")?,
        is_active: get_bool(item, "isActive")?,
        user_id: get_uuid(item, "userId")?,
        created_at: get_datetime(item, "createdAt")?,
        updated_at: get_datetime(item, VERSION_ATTRIBUTE)?,
    })
}

/// Build the owner index record of a product.
pub fn owner_index_item(owner_id: Uuid, product_id: Uuid) -> Item {
    let key = keys::owner_index_key(owner_id, product_id);
    let mut item = keyed_item(key.pk, key.sk, ENTITY_TYPE_OWNER_INDEX);
    item.insert("productId".to_string(), s(product_id.to_string()));
    item
}

/// Build the category index record of a product.
pub fn category_index_item(category: &str, product_id: Uuid) -> Item {
    let key = keys::category_index_key(category, product_id);
    let mut item = keyed_item(key.pk, key.sk, ENTITY_TYPE_CATEGORY_INDEX);
    item.insert("productId".to_string(), s(product_id.to_string()));
    item
}

/// Product id referenced by an owner or category index record.
pub fn indexed_product_id(item: &Item) -> Result<Uuid, RepositoryError> {
    get_uuid(item, "productId")
}

/// User id referenced by an email index record.
pub fn indexed_user_id(item: &Item) -> Result<Uuid, RepositoryError> {
    get_uuid(item, "userId")
}

/// Raw version string of a stored item.
pub fn item_version(item: &Item) -> Result<String, RepositoryError> {
    get_string(item, VERSION_ATTRIBUTE)
}

// ============================================================================
// Attribute helpers
// ============================================================================

/// Get a required string attribute.
fn get_string(item: &Item, key: &str) -> Result<String, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::Serialization(format!("Missing or invalid field: {}", key)))
}

/// Get an optional string attribute.
fn get_optional_string(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

/// Get a required UUID attribute.
fn get_uuid(item: &Item, key: &str) -> Result<Uuid, RepositoryError> {
    let s = get_string(item, key)?;
    Uuid::parse_str(&s)
        .map_err(|e| RepositoryError::Serialization(format!("Invalid UUID {}: {}", key, e)))
}

/// Get a required boolean attribute.
fn get_bool(item: &Item, key: &str) -> Result<bool, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .ok_or_else(|| RepositoryError::Serialization(format!("Missing or invalid field: {}", key)))
}

fn get_number<'a>(item: &'a Item, key: &str) -> Result<&'a str, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .map(String::as_str)
        .ok_or_else(|| RepositoryError::Serialization(format!("Missing or invalid field: {}", key)))
}

/// Get a required integer attribute.
fn get_i64(item: &Item, key: &str) -> Result<i64, RepositoryError> {
    get_number(item, key)?
        .parse()
        .map_err(|e| RepositoryError::Serialization(format!("Invalid integer {}: {}", key, e)))
}

/// Get a required decimal attribute.
fn get_decimal(item: &Item, key: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(get_number(item, key)?)
        .map_err(|e| RepositoryError::Serialization(format!("Invalid decimal {}: {}", key, e)))
}

/// Get a required datetime attribute (RFC 3339 format).
fn get_datetime(item: &Item, key: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let s = get_string(item, key)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Serialization(format!("Invalid datetime {}: {}", key, e)))
}

fn get_optional_datetime(item: &Item, key: &str) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    match item.get(key) {
        Some(_) => get_datetime(item, key).map(Some),
        None => Ok(None),
    }
}
