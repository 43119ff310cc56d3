//! In-process [`ItemTable`].
//!
//! Items live in one ordered map behind a single lock, so every transaction
//! sees and writes a consistent snapshot. Used by the `memory` backend and by
//! the repository tests.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;

use super::table::{Condition, Item, ItemKey, ItemTable, ScanPage, TableError, WriteOp};

/// Attribute compared by [`Condition::ExistsWithVersion`].
const VERSION_ATTRIBUTE: &str = "updatedAt";

#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    items: Arc<RwLock<BTreeMap<ItemKey, Item>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items, index records included.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

fn condition_holds(condition: &Condition, existing: Option<&Item>) -> bool {
    match condition {
        Condition::None => true,
        Condition::NotExists => existing.is_none(),
        Condition::Exists => existing.is_some(),
        Condition::ExistsWithVersion(expected) => matches!(
            existing.and_then(|item| item.get(VERSION_ATTRIBUTE)),
            Some(AttributeValue::S(actual)) if actual == expected
        ),
    }
}

fn key_of(item: &Item) -> Result<ItemKey, TableError> {
    ItemKey::of(item).ok_or_else(|| TableError::InvalidRequest("item has no PK/SK".to_string()))
}

#[async_trait]
impl ItemTable for MemoryTable {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, TableError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>, TableError> {
        let items = self.items.read().await;
        Ok(items
            .range(ItemKey::new(pk, sk_prefix)..)
            .take_while(|(key, _)| key.pk == pk && key.sk.starts_with(sk_prefix))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn scan(
        &self,
        pk_prefix: &str,
        limit: usize,
        start: Option<ItemKey>,
    ) -> Result<ScanPage, TableError> {
        let items = self.items.read().await;
        let lower = match start {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let mut range = items.range((lower, Bound::Unbounded));

        let mut page = ScanPage::default();
        let mut last_evaluated = None;
        for (key, item) in range.by_ref().take(limit.max(1)) {
            if key.pk.starts_with(pk_prefix) {
                page.items.push(item.clone());
            }
            last_evaluated = Some(key.clone());
        }
        if range.next().is_some() {
            page.last_key = last_evaluated;
        }
        Ok(page)
    }

    async fn put(&self, item: Item, condition: Condition) -> Result<(), TableError> {
        let key = key_of(&item)?;
        let mut items = self.items.write().await;
        if !condition_holds(&condition, items.get(&key)) {
            return Err(TableError::ConditionFailed { index: 0 });
        }
        items.insert(key, item);
        Ok(())
    }

    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), TableError> {
        let mut items = self.items.write().await;

        // Evaluate every condition before touching anything.
        let mut seen = HashSet::new();
        let mut keyed = Vec::with_capacity(ops.len());
        for (index, op) in ops.into_iter().enumerate() {
            let (key, condition) = match &op {
                WriteOp::Put { item, condition } => (key_of(item)?, condition),
                WriteOp::Delete { key, condition } | WriteOp::Check { key, condition } => {
                    (key.clone(), condition)
                }
            };
            if !seen.insert(key.clone()) {
                return Err(TableError::InvalidRequest(
                    "transaction touches the same item twice".to_string(),
                ));
            }
            if !condition_holds(condition, items.get(&key)) {
                return Err(TableError::ConditionFailed { index });
            }
            keyed.push((key, op));
        }

        for (key, op) in keyed {
            match op {
                WriteOp::Put { item, .. } => {
                    items.insert(key, item);
                }
                WriteOp::Delete { .. } => {
                    items.remove(&key);
                }
                WriteOp::Check { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pk: &str, sk: &str) -> Item {
        ItemKey::new(pk, sk).to_item()
    }

    fn versioned(pk: &str, sk: &str, version: &str) -> Item {
        let mut item = item(pk, sk);
        item.insert(
            VERSION_ATTRIBUTE.to_string(),
            AttributeValue::S(version.to_string()),
        );
        item
    }

    #[tokio::test]
    async fn test_put_not_exists_rejects_duplicate() {
        let table = MemoryTable::new();
        table.put(item("A", "1"), Condition::NotExists).await.unwrap();

        let err = table
            .put(item("A", "1"), Condition::NotExists)
            .await
            .unwrap_err();
        assert_eq!(err, TableError::ConditionFailed { index: 0 });
    }

    #[tokio::test]
    async fn test_put_version_condition() {
        let table = MemoryTable::new();
        table
            .put(versioned("A", "1", "v1"), Condition::None)
            .await
            .unwrap();

        let stale = table
            .put(versioned("A", "1", "v2"), Condition::ExistsWithVersion("v0".to_string()))
            .await;
        assert_eq!(stale, Err(TableError::ConditionFailed { index: 0 }));

        table
            .put(versioned("A", "1", "v2"), Condition::ExistsWithVersion("v1".to_string()))
            .await
            .unwrap();

        let missing = table
            .put(versioned("B", "1", "v1"), Condition::ExistsWithVersion("v1".to_string()))
            .await;
        assert_eq!(missing, Err(TableError::ConditionFailed { index: 0 }));
    }

    #[tokio::test]
    async fn test_transact_is_all_or_nothing() {
        let table = MemoryTable::new();
        table.put(item("EMAIL#a", "U#1"), Condition::None).await.unwrap();

        let err = table
            .transact(vec![
                WriteOp::put(item("USER#2", "PROFILE#2"), Condition::NotExists),
                WriteOp::put(item("EMAIL#a", "U#1"), Condition::NotExists),
            ])
            .await
            .unwrap_err();

        assert_eq!(err, TableError::ConditionFailed { index: 1 });
        assert!(table
            .get(&ItemKey::new("USER#2", "PROFILE#2"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_transact_check_and_delete() {
        let table = MemoryTable::new();
        table.put(item("A", "1"), Condition::None).await.unwrap();
        table.put(item("B", "1"), Condition::None).await.unwrap();

        table
            .transact(vec![
                WriteOp::check(ItemKey::new("A", "1"), Condition::Exists),
                WriteOp::delete(ItemKey::new("B", "1")),
            ])
            .await
            .unwrap();
        assert_eq!(table.len().await, 1);

        let err = table
            .transact(vec![
                WriteOp::check(ItemKey::new("B", "1"), Condition::Exists),
                WriteOp::delete(ItemKey::new("A", "1")),
            ])
            .await
            .unwrap_err();
        assert_eq!(err, TableError::ConditionFailed { index: 0 });
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_transact_rejects_same_item_twice() {
        let table = MemoryTable::new();
        let err = table
            .transact(vec![
                WriteOp::put(item("A", "1"), Condition::None),
                WriteOp::delete(ItemKey::new("A", "1")),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_concurrent_unique_writes_single_winner() {
        let table = MemoryTable::new();
        let mut handles = Vec::new();
        for n in 0..16 {
            let table = table.clone();
            handles.push(tokio::spawn(async move {
                table
                    .transact(vec![
                        WriteOp::put(item(&format!("USER#{n}"), "P"), Condition::NotExists),
                        WriteOp::put(item("EMAIL#same", "U"), Condition::NotExists),
                    ])
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn test_query_by_partition_and_prefix() {
        let table = MemoryTable::new();
        for (pk, sk) in [
            ("USER#1", "PROFILE#1"),
            ("USER#1", "PRODUCT#a"),
            ("USER#1", "PRODUCT#b"),
            ("USER#10", "PRODUCT#c"),
            ("USER#2", "PRODUCT#d"),
        ] {
            table.put(item(pk, sk), Condition::None).await.unwrap();
        }

        let found = table.query("USER#1", "PRODUCT#").await.unwrap();
        let keys: Vec<_> = found.iter().filter_map(ItemKey::of).collect();
        assert_eq!(
            keys,
            vec![
                ItemKey::new("USER#1", "PRODUCT#a"),
                ItemKey::new("USER#1", "PRODUCT#b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_limit_counts_evaluated_items() {
        let table = MemoryTable::new();
        for (pk, sk) in [
            ("CATEGORY#x", "PRODUCT#1"),
            ("EMAIL#a", "USER#1"),
            ("PRODUCT#1", "DETAILS#1"),
            ("PRODUCT#2", "DETAILS#2"),
        ] {
            table.put(item(pk, sk), Condition::None).await.unwrap();
        }

        let first = table.scan("PRODUCT#", 2, None).await.unwrap();
        assert!(first.items.is_empty());
        assert_eq!(first.last_key, Some(ItemKey::new("EMAIL#a", "USER#1")));

        let second = table.scan("PRODUCT#", 2, first.last_key).await.unwrap();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.last_key, None);
    }
}
