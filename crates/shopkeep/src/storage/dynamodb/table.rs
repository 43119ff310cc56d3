//! Single-table access seam.
//!
//! [`ItemTable`] is the narrow slice of DynamoDB the repository needs: point
//! reads, partition queries, a prefix-filtered scan and conditional
//! (optionally transactional) writes. [`DynamoDbTable`](super::DynamoDbTable)
//! talks to the real service, [`MemoryTable`](super::MemoryTable) keeps the
//! same semantics in process.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use thiserror::Error;

/// A raw table item.
pub type Item = HashMap<String, AttributeValue>;

pub const PK: &str = "PK";
pub const SK: &str = "SK";

/// Composite primary key of a table item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub pk: String,
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Reads the key attributes of an item.
    pub fn of(item: &Item) -> Option<Self> {
        match (item.get(PK), item.get(SK)) {
            (Some(AttributeValue::S(pk)), Some(AttributeValue::S(sk))) => {
                Some(Self::new(pk.clone(), sk.clone()))
            }
            _ => None,
        }
    }

    /// Key attributes as an item map, the shape the SDK expects.
    pub fn to_item(&self) -> Item {
        HashMap::from([
            (PK.to_string(), AttributeValue::S(self.pk.clone())),
            (SK.to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }
}

/// Precondition attached to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Unconditional.
    None,
    /// The key must not exist yet.
    NotExists,
    /// The key must exist.
    Exists,
    /// The key must exist and its `updatedAt` attribute must equal the value.
    ExistsWithVersion(String),
}

/// One member of a transactional write.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put { item: Item, condition: Condition },
    Delete { key: ItemKey, condition: Condition },
    Check { key: ItemKey, condition: Condition },
}

impl WriteOp {
    pub fn put(item: Item, condition: Condition) -> Self {
        Self::Put { item, condition }
    }

    pub fn delete(key: ItemKey) -> Self {
        Self::Delete {
            key,
            condition: Condition::None,
        }
    }

    pub fn check(key: ItemKey, condition: Condition) -> Self {
        Self::Check { key, condition }
    }
}

/// Result of a single scan call.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// Last key evaluated, present when the scan stopped before the end.
    pub last_key: Option<ItemKey>,
}

/// Errors raised by an [`ItemTable`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The condition of the write at `index` did not hold. Single writes use
    /// index 0.
    #[error("Condition failed for operation {index}")]
    ConditionFailed { index: usize },
    /// Two transactions touched the same items concurrently.
    #[error("Transaction conflict")]
    TransactionConflict,
    #[error("Throttled: {0}")]
    Throttled(String),
    #[error("Table unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Table error: {0}")]
    Service(String),
}

/// Table operations used by the key-value repository.
#[async_trait]
pub trait ItemTable: Send + Sync {
    /// Strongly consistent point read.
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, TableError>;

    /// All items of a partition whose sort key starts with `sk_prefix`.
    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>, TableError>;

    /// Scans up to `limit` items after `start`, keeping those whose partition
    /// key starts with `pk_prefix`. The limit counts evaluated items, so a
    /// page can hold fewer matches than `limit` while `last_key` is still set.
    async fn scan(
        &self,
        pk_prefix: &str,
        limit: usize,
        start: Option<ItemKey>,
    ) -> Result<ScanPage, TableError>;

    /// Conditional single-item write.
    async fn put(&self, item: Item, condition: Condition) -> Result<(), TableError>;

    /// All-or-nothing multi-item write.
    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), TableError>;
}
