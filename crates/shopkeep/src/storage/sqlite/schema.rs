//! SQLite schema definitions and SQL query constants.
//!
//! This module contains all SQL statements used by the SQLite repository,
//! following the Functional Core pattern - pure data, no I/O.

/// SQL statement to create all tables. Safe to run on every start.
pub const CREATE_TABLES: &str = r#"
PRAGMA foreign_keys = ON;

-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    profile_image TEXT,
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_login TEXT
);

-- Products table
CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    price TEXT NOT NULL,
    image_url TEXT,
    category TEXT,
    stock INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Indexes for efficient queries
CREATE INDEX IF NOT EXISTS idx_products_user_id ON products(user_id);
CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
"#;

// User queries
pub const INSERT_USER: &str = r#"
INSERT INTO users (id, email, password_hash, first_name, last_name, profile_image, role, is_active, created_at, updated_at, last_login)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;

pub const SELECT_USER_BY_ID: &str = r#"
SELECT id, email, first_name, last_name, profile_image, role, is_active, created_at, updated_at, last_login
FROM users
WHERE id = ?1
"#;

pub const SELECT_USER_BY_EMAIL: &str = r#"
SELECT id, email, first_name, last_name, profile_image, role, is_active, created_at, updated_at, last_login
FROM users
WHERE email = ?1
"#;

pub const SELECT_CREDENTIALS_BY_ID: &str = r#"
SELECT id, email, first_name, last_name, profile_image, role, is_active, created_at, updated_at, last_login, password_hash
FROM users
WHERE id = ?1
"#;

pub const SELECT_CREDENTIALS_BY_EMAIL: &str = r#"
SELECT id, email, first_name, last_name, profile_image, role, is_active, created_at, updated_at, last_login, password_hash
FROM users
WHERE email = ?1
"#;

pub const UPDATE_USER: &str = r#"
UPDATE users
SET first_name = ?2, last_name = ?3, profile_image = ?4, password_hash = ?5, updated_at = ?6
WHERE id = ?1
"#;

pub const UPDATE_LAST_LOGIN: &str = r#"
UPDATE users
SET last_login = ?2, updated_at = ?2
WHERE id = ?1
"#;

// Product queries
pub const INSERT_PRODUCT: &str = r#"
INSERT INTO products (id, name, description, price, image_url, category, stock, is_active, user_id, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;

pub const SELECT_PRODUCT_BY_ID: &str = r#"
SELECT id, name, description, price, image_url, category, stock, is_active, user_id, created_at, updated_at
FROM products
WHERE id = ?1
"#;

/// Keyset page: rows after rowid `?1`, at most `?2` of them.
pub const SELECT_PRODUCTS_PAGE: &str = r#"
SELECT id, name, description, price, image_url, category, stock, is_active, user_id, created_at, updated_at, rowid
FROM products
WHERE rowid > ?1
ORDER BY rowid ASC
LIMIT ?2
"#;

pub const SELECT_PRODUCTS_BY_OWNER: &str = r#"
SELECT id, name, description, price, image_url, category, stock, is_active, user_id, created_at, updated_at
FROM products
WHERE user_id = ?1
ORDER BY rowid ASC
"#;

pub const SELECT_PRODUCTS_BY_CATEGORY: &str = r#"
SELECT id, name, description, price, image_url, category, stock, is_active, user_id, created_at, updated_at
FROM products
WHERE category = ?1
ORDER BY rowid ASC
"#;

pub const UPDATE_PRODUCT: &str = r#"
UPDATE products
SET name = ?2, description = ?3, price = ?4, image_url = ?5, category = ?6, stock = ?7, is_active = ?8, updated_at = ?9
WHERE id = ?1
"#;

pub const DELETE_PRODUCT: &str = r#"
DELETE FROM products
WHERE id = ?1
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_valid_sql() {
        assert!(CREATE_TABLES.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(CREATE_TABLES.contains("CREATE TABLE IF NOT EXISTS products"));
        assert!(CREATE_TABLES.contains("PRAGMA foreign_keys = ON"));
        assert!(CREATE_TABLES.contains("REFERENCES users(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_user_selects_never_expose_password_hash() {
        assert!(!SELECT_USER_BY_ID.contains("password_hash"));
        assert!(!SELECT_USER_BY_EMAIL.contains("password_hash"));
        assert!(SELECT_CREDENTIALS_BY_EMAIL.contains("password_hash"));
    }

    #[test]
    fn test_schema_applies_to_fresh_database() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_TABLES).unwrap();
        // Second run is a no-op.
        conn.execute_batch(CREATE_TABLES).unwrap();

        let foreign_keys: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
