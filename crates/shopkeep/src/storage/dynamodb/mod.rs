//! Key-value storage backend.
//!
//! Single-table design over DynamoDB: every entity has a primary record and
//! duplicated index records (by email, by owner, by category) that are kept
//! in step through transactional writes. The same repository runs against
//! an in-process table for the `memory` backend.

mod client;
mod conversions;
mod error;
mod keys;
mod memory;
mod repository;
mod table;

pub use client::DynamoDbTable;
pub use memory::MemoryTable;
pub use repository::KeyValueRepository;
