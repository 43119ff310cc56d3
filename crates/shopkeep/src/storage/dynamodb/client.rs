//! [`ItemTable`] backed by a DynamoDB table.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ConditionCheck, Delete, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;

use super::error::{
    map_get_item_error, map_put_item_error, map_query_error, map_scan_error, map_transact_error,
};
use super::table::{Condition, Item, ItemKey, ItemTable, ScanPage, TableError, WriteOp};

/// DynamoDB caps a single TransactWriteItems call at 100 operations.
const MAX_TRANSACTION_OPS: usize = 100;

/// A DynamoDB table holding every entity of the single-table design.
#[derive(Debug, Clone)]
pub struct DynamoDbTable {
    client: Client,
    table_name: String,
}

/// Condition expression plus the values it references.
struct ConditionExpr {
    expression: Option<String>,
    values: Option<HashMap<String, AttributeValue>>,
}

impl From<&Condition> for ConditionExpr {
    fn from(condition: &Condition) -> Self {
        match condition {
            Condition::None => Self {
                expression: None,
                values: None,
            },
            Condition::NotExists => Self {
                expression: Some("attribute_not_exists(PK)".to_string()),
                values: None,
            },
            Condition::Exists => Self {
                expression: Some("attribute_exists(PK)".to_string()),
                values: None,
            },
            Condition::ExistsWithVersion(expected) => Self {
                expression: Some("attribute_exists(PK) AND updatedAt = :expected".to_string()),
                values: Some(HashMap::from([(
                    ":expected".to_string(),
                    AttributeValue::S(expected.clone()),
                )])),
            },
        }
    }
}

impl DynamoDbTable {
    /// Creates a table handle from an existing client.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Connects with the default AWS credential chain, optionally against a
    /// custom endpoint (DynamoDB Local, LocalStack).
    pub async fn connect(table_name: impl Into<String>, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), table_name)
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn transact_item(&self, op: WriteOp) -> Result<TransactWriteItem, TableError> {
        let invalid = |e: aws_sdk_dynamodb::error::BuildError| {
            TableError::InvalidRequest(e.to_string())
        };

        let item = match op {
            WriteOp::Put { item, condition } => {
                let expr = ConditionExpr::from(&condition);
                let put = Put::builder()
                    .table_name(&self.table_name)
                    .set_item(Some(item))
                    .set_condition_expression(expr.expression)
                    .set_expression_attribute_values(expr.values)
                    .build()
                    .map_err(invalid)?;
                TransactWriteItem::builder().put(put).build()
            }
            WriteOp::Delete { key, condition } => {
                let expr = ConditionExpr::from(&condition);
                let delete = Delete::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(key.to_item()))
                    .set_condition_expression(expr.expression)
                    .set_expression_attribute_values(expr.values)
                    .build()
                    .map_err(invalid)?;
                TransactWriteItem::builder().delete(delete).build()
            }
            WriteOp::Check { key, condition } => {
                let expr = ConditionExpr::from(&condition);
                if expr.expression.is_none() {
                    return Err(TableError::InvalidRequest(
                        "condition check without a condition".to_string(),
                    ));
                }
                let check = ConditionCheck::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(key.to_item()))
                    .set_condition_expression(expr.expression)
                    .set_expression_attribute_values(expr.values)
                    .build()
                    .map_err(invalid)?;
                TransactWriteItem::builder().condition_check(check).build()
            }
        };
        Ok(item)
    }
}

#[async_trait]
impl ItemTable for DynamoDbTable {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, TableError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key.to_item()))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        Ok(result.item)
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>, TableError> {
        let mut items = Vec::new();
        let mut start_key = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .expression_attribute_values(":prefix", AttributeValue::S(sk_prefix.to_string()))
                .consistent_read(true)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_query_error)?;

            items.extend(result.items.unwrap_or_default());
            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn scan(
        &self,
        pk_prefix: &str,
        limit: usize,
        start: Option<ItemKey>,
    ) -> Result<ScanPage, TableError> {
        let result = self
            .client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("begins_with(PK, :prefix)")
            .expression_attribute_values(":prefix", AttributeValue::S(pk_prefix.to_string()))
            .limit(i32::try_from(limit.max(1)).unwrap_or(i32::MAX))
            .set_exclusive_start_key(start.as_ref().map(ItemKey::to_item))
            .send()
            .await
            .map_err(map_scan_error)?;

        Ok(ScanPage {
            items: result.items.unwrap_or_default(),
            last_key: result.last_evaluated_key.as_ref().and_then(ItemKey::of),
        })
    }

    async fn put(&self, item: Item, condition: Condition) -> Result<(), TableError> {
        let expr = ConditionExpr::from(&condition);

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .set_condition_expression(expr.expression)
            .set_expression_attribute_values(expr.values)
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), TableError> {
        if ops.len() > MAX_TRANSACTION_OPS {
            return Err(TableError::InvalidRequest(format!(
                "transaction has {} operations, at most {MAX_TRANSACTION_OPS} allowed",
                ops.len()
            )));
        }

        let items = ops
            .into_iter()
            .map(|op| self.transact_item(op))
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_transact_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_expressions() {
        assert!(ConditionExpr::from(&Condition::None).expression.is_none());
        assert_eq!(
            ConditionExpr::from(&Condition::NotExists).expression.as_deref(),
            Some("attribute_not_exists(PK)")
        );
        assert_eq!(
            ConditionExpr::from(&Condition::Exists).expression.as_deref(),
            Some("attribute_exists(PK)")
        );

        let versioned = ConditionExpr::from(&Condition::ExistsWithVersion("v1".to_string()));
        assert_eq!(
            versioned.expression.as_deref(),
            Some("attribute_exists(PK) AND updatedAt = :expected")
        );
        assert_eq!(
            versioned.values.unwrap().get(":expected"),
            Some(&AttributeValue::S("v1".to_string()))
        );
    }
}
