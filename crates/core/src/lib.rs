//! Functional core for shopkeep.
//!
//! Entity schema, validation, repository contracts, password hashing, bearer
//! tokens and pagination cursors. Nothing in this crate performs I/O.

pub mod auth;
pub mod catalog;
pub mod pagination;
pub mod serde;
pub mod storage;
