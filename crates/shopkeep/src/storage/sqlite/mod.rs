//! SQLite storage backend implementation.
//!
//! This module provides a SQLite-based implementation of the repository traits
//! using `rusqlite` for synchronous operations and `tokio-rusqlite` for async wrapping.
//! Uniqueness and ownership are enforced by the schema: a UNIQUE email column
//! and a foreign key from products to users.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::SqliteRepository;
