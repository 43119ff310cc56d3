//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! These are testable in isolation without database access.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;
use shopkeep_core::catalog::{Credentials, Product, Role, User};
use uuid::Uuid;

// ============================================================================
// User conversions
// ============================================================================

/// Convert a SQLite row to a User.
///
/// Expected columns: id, email, first_name, last_name, profile_image, role,
/// is_active, created_at, updated_at, last_login
pub fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let role: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    let last_login: Option<String> = row.get(9)?;

    Ok(User {
        id: parse_uuid(0, &id)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        profile_image: row.get(4)?,
        role: Role::from_str(&role).map_err(|e| conversion_error(5, e))?,
        is_active: row.get(6)?,
        created_at: parse_datetime(7, &created_at)?,
        updated_at: parse_datetime(8, &updated_at)?,
        last_login: last_login
            .as_deref()
            .map(|s| parse_datetime(9, s))
            .transpose()?,
    })
}

/// Convert a SQLite row to Credentials.
///
/// Expected columns: the user columns followed by password_hash
pub fn row_to_credentials(row: &Row) -> rusqlite::Result<Credentials> {
    Ok(Credentials {
        user: row_to_user(row)?,
        password_hash: row.get(10)?,
    })
}

// ============================================================================
// Product conversions
// ============================================================================

/// Convert a SQLite row to a Product.
///
/// Expected columns: id, name, description, price, image_url, category,
/// stock, is_active, user_id, created_at, updated_at
pub fn row_to_product(row: &Row) -> rusqlite::Result<Product> {
    let id: String = row.get(0)?;
    let price: String = row.get(3)?;
    let user_id: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Product {
        id: parse_uuid(0, &id)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: parse_decimal(3, &price)?,
        image_url: row.get(4)?,
        category: row.get(5)?,
        stock: row.get(6)?,
        is_active: row.get(7)?,
        user_id: parse_uuid(8, &user_id)?,
        created_at: parse_datetime(9, &created_at)?,
        updated_at: parse_datetime(10, &updated_at)?,
    })
}

/// Convert a paged row to a Product plus its rowid (trailing column).
pub fn row_to_product_with_rowid(row: &Row) -> rusqlite::Result<(Product, i64)> {
    Ok((row_to_product(row)?, row.get(11)?))
}

// ============================================================================
// Helper functions
// ============================================================================

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Parse a UUID from string.
fn parse_uuid(column: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| conversion_error(column, e))
}

/// Parse a decimal stored as text.
fn parse_decimal(column: usize, s: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(s).map_err(|e| conversion_error(column, e))
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

/// Format a DateTime<Utc> for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
