//! DynamoDB key generation functions.
//!
//! Pure functions for generating partition and sort keys following the single-table design.
//! All functions are sync and have no side effects.
//!
//! | Record          | PK                 | SK                  |
//! |-----------------|--------------------|---------------------|
//! | user profile    | `USER#<id>`        | `PROFILE#<id>`      |
//! | email index     | `EMAIL#<email>`    | `USER`              |
//! | product details | `PRODUCT#<id>`     | `DETAILS#<id>`      |
//! | owner index     | `USER#<owner_id>`  | `PRODUCT#<id>`      |
//! | category index  | `CATEGORY#<name>`  | `PRODUCT#<id>`      |
//!
//! The email record has a constant sort key so that a `NotExists` condition
//! on it covers the whole `EMAIL#<email>` partition. The owning user id is
//! stored as an attribute.

use uuid::Uuid;

use super::table::ItemKey;

// ============================================================================
// Key prefixes
// ============================================================================

pub const USER_PREFIX: &str = "USER#";
pub const PROFILE_PREFIX: &str = "PROFILE#";
pub const EMAIL_PREFIX: &str = "EMAIL#";
pub const PRODUCT_PREFIX: &str = "PRODUCT#";
pub const DETAILS_PREFIX: &str = "DETAILS#";
pub const CATEGORY_PREFIX: &str = "CATEGORY#";

// ============================================================================
// User keys
// ============================================================================

/// Generate partition key for a User profile.
///
/// Pattern: `USER#<user_id>`
pub fn user_pk(user_id: Uuid) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Generate sort key for a User profile.
///
/// Pattern: `PROFILE#<user_id>`
pub fn user_sk(user_id: Uuid) -> String {
    format!("{PROFILE_PREFIX}{user_id}")
}

/// Primary key of a User profile record.
pub fn user_key(user_id: Uuid) -> ItemKey {
    ItemKey::new(user_pk(user_id), user_sk(user_id))
}

/// Generate partition key for the email index record.
///
/// Pattern: `EMAIL#<email>` (email is expected to be normalized)
pub fn email_pk(email: &str) -> String {
    format!("{EMAIL_PREFIX}{email}")
}

/// Sort key of the email index record.
pub const EMAIL_SK: &str = "USER";

/// Every user id maps the same email to this one key, so a `NotExists`
/// condition on it lets exactly one registration per email commit.
pub fn email_key(email: &str) -> ItemKey {
    ItemKey::new(email_pk(email), EMAIL_SK)
}

// ============================================================================
// Product keys
// ============================================================================

/// Generate partition key for Product details.
///
/// Pattern: `PRODUCT#<product_id>`
pub fn product_pk(product_id: Uuid) -> String {
    format!("{PRODUCT_PREFIX}{product_id}")
}

/// Generate sort key for Product details.
///
/// Pattern: `DETAILS#<product_id>`
pub fn product_sk(product_id: Uuid) -> String {
    format!("{DETAILS_PREFIX}{product_id}")
}

/// Primary key of a Product details record.
pub fn product_key(product_id: Uuid) -> ItemKey {
    ItemKey::new(product_pk(product_id), product_sk(product_id))
}

/// Generate sort key for product index records (owner and category).
///
/// Pattern: `PRODUCT#<product_id>`
pub fn product_ref_sk(product_id: Uuid) -> String {
    format!("{PRODUCT_PREFIX}{product_id}")
}

/// Key of the owner index record. Lives in the owner's `USER#` partition.
pub fn owner_index_key(owner_id: Uuid, product_id: Uuid) -> ItemKey {
    ItemKey::new(user_pk(owner_id), product_ref_sk(product_id))
}

/// Generate partition key for the category index.
///
/// Pattern: `CATEGORY#<category>`
pub fn category_pk(category: &str) -> String {
    format!("{CATEGORY_PREFIX}{category}")
}

pub fn category_index_key(category: &str, product_id: Uuid) -> ItemKey {
    ItemKey::new(category_pk(category), product_ref_sk(product_id))
}

/// Sort key prefix shared by owner and category index records.
pub fn product_ref_sk_prefix() -> &'static str {
    PRODUCT_PREFIX
}

/// Partition key prefix of product detail records, used by the list scan.
pub fn product_pk_prefix() -> &'static str {
    PRODUCT_PREFIX
}
