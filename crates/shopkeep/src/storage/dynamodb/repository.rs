//! Key-value repository implementation.
//!
//! Implements the repository traits from `shopkeep_core::storage` over any
//! [`ItemTable`]. Every primary record and the index records derived from it
//! are written in a single transaction.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use shopkeep_core::catalog::{
    normalize_email, Credentials, NewProduct, NewUser, Product, ProductPatch, User, UserPatch,
};
use shopkeep_core::storage::{
    Page, PageMarker, PageRequest, ProductRepository, RepositoryError, Result, UserRepository,
};

use super::conversions::{
    category_index_item, email_index_item, indexed_product_id, indexed_user_id,
    item_to_credentials, item_to_product, item_to_user, item_version, owner_index_item,
    product_to_item, user_to_item,
};
use super::error::map_table_error;
use crate::storage::hash_password;
use super::keys;
use super::table::{Condition, Item, ItemKey, ItemTable, TableError, WriteOp};

const MARKER_PK: &str = "PK";
const MARKER_SK: &str = "SK";

/// Repository over a single-table key-value store.
#[derive(Debug, Clone)]
pub struct KeyValueRepository<T> {
    table: T,
}

impl<T: ItemTable> KeyValueRepository<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    #[cfg(test)]
    pub fn table(&self) -> &T {
        &self.table
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>> {
        self.table.get(key).await.map_err(map_table_error)
    }

    async fn get_user_item(&self, id: Uuid) -> Result<Option<Item>> {
        self.get_item(&keys::user_key(id)).await
    }

    /// Follows the email index record to the user profile.
    async fn get_user_item_by_email(&self, email: &str) -> Result<Option<Item>> {
        let email = normalize_email(email);
        let Some(index) = self.get_item(&keys::email_key(&email)).await? else {
            return Ok(None);
        };

        let user_id = indexed_user_id(&index)?;
        let user = self.get_user_item(user_id).await?;
        if user.is_none() {
            warn!(%user_id, "Email index points at a missing user");
        }
        Ok(user)
    }

    /// Resolves owner or category index records to products, skipping any
    /// whose primary record is gone.
    async fn resolve_products(&self, index_items: Vec<Item>) -> Result<Vec<Product>> {
        let mut products = Vec::with_capacity(index_items.len());
        for index in &index_items {
            let product_id = indexed_product_id(index)?;
            match self.get_item(&keys::product_key(product_id)).await? {
                Some(item) => products.push(item_to_product(&item)?),
                None => debug!(%product_id, "Skipping index record without a product"),
            }
        }
        Ok(products)
    }

    /// Reads a product and checks that `caller_id` owns it.
    async fn get_owned_product(&self, id: Uuid, caller_id: Uuid) -> Result<(Product, String)> {
        let item = self
            .get_item(&keys::product_key(id))
            .await?
            .ok_or_else(|| RepositoryError::not_found("Product", id))?;

        let product = item_to_product(&item)?;
        if product.user_id != caller_id {
            return Err(RepositoryError::unauthorized("Product", id));
        }
        Ok((product, item_version(&item)?))
    }

    /// Writes a new version of a user profile, guarded by the version read.
    async fn replace_user(&self, user: &User, password_hash: &str, version: String) -> Result<()> {
        self.table
            .put(
                user_to_item(user, password_hash),
                Condition::ExistsWithVersion(version),
            )
            .await
            .map_err(|e| lost_race(e, "User", user.id))
    }
}

/// Maps a failed version check to `Conflict`, anything else to the generic mapping.
fn lost_race(err: TableError, entity_type: &str, id: Uuid) -> RepositoryError {
    match err {
        TableError::ConditionFailed { .. } | TableError::TransactionConflict => {
            RepositoryError::Conflict(format!("{entity_type} {id} was modified concurrently"))
        }
        err => map_table_error(err),
    }
}

fn marker_to_key(marker: &PageMarker) -> Result<ItemKey> {
    match (marker.get(MARKER_PK), marker.get(MARKER_SK)) {
        (Some(pk), Some(sk)) => Ok(ItemKey::new(pk, sk)),
        _ => Err(RepositoryError::InvalidData(
            "Invalid pagination marker".to_string(),
        )),
    }
}

fn key_to_marker(key: ItemKey) -> PageMarker {
    PageMarker::new()
        .with(MARKER_PK, key.pk)
        .with(MARKER_SK, key.sk)
}

// ============================================================================
// UserRepository implementation
// ============================================================================

#[async_trait]
impl<T: ItemTable> UserRepository for KeyValueRepository<T> {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let password_hash = hash_password(&new_user.password).await?;
        let user = new_user.to_user(Utc::now());

        self.table
            .transact(vec![
                WriteOp::put(user_to_item(&user, &password_hash), Condition::NotExists),
                WriteOp::put(email_index_item(&user.email, user.id), Condition::NotExists),
            ])
            .await
            .map_err(|e| match e {
                TableError::ConditionFailed { index: 1 } => {
                    RepositoryError::already_exists("User", &user.email)
                }
                TableError::ConditionFailed { .. } => {
                    RepositoryError::already_exists("User", user.id)
                }
                e => map_table_error(e),
            })?;

        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        match self.get_user_item(id).await? {
            Some(item) => Ok(Some(item_to_user(&item)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.get_user_item_by_email(email).await? {
            Some(item) => Ok(Some(item_to_user(&item)?)),
            None => Ok(None),
        }
    }

    async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>> {
        match self.get_user_item_by_email(email).await? {
            Some(item) => Ok(Some(item_to_credentials(&item)?)),
            None => Ok(None),
        }
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User> {
        let new_hash = match patch.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let item = self
            .get_user_item(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("User", id))?;
        let version = item_version(&item)?;
        let Credentials {
            mut user,
            mut password_hash,
        } = item_to_credentials(&item)?;

        patch.apply_to(&mut user, Utc::now());
        if let Some(new_hash) = new_hash {
            password_hash = new_hash;
        }

        self.replace_user(&user, &password_hash, version).await?;
        Ok(user)
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        let item = self
            .get_user_item(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("User", id))?;
        let version = item_version(&item)?;
        let Credentials {
            mut user,
            password_hash,
        } = item_to_credentials(&item)?;

        let now = Utc::now();
        user.last_login = Some(now);
        user.updated_at = now;

        self.replace_user(&user, &password_hash, version).await
    }
}

// ============================================================================
// ProductRepository implementation
// ============================================================================

#[async_trait]
impl<T: ItemTable> ProductRepository for KeyValueRepository<T> {
    async fn create_product(&self, owner_id: Uuid, new_product: NewProduct) -> Result<Product> {
        let product = new_product.into_product(owner_id, Utc::now());

        let mut ops = vec![
            WriteOp::check(keys::user_key(owner_id), Condition::Exists),
            WriteOp::put(product_to_item(&product), Condition::NotExists),
            WriteOp::put(owner_index_item(owner_id, product.id), Condition::NotExists),
        ];
        if let Some(category) = &product.category {
            ops.push(WriteOp::put(
                category_index_item(category, product.id),
                Condition::NotExists,
            ));
        }

        self.table.transact(ops).await.map_err(|e| match e {
            TableError::ConditionFailed { index: 0 } => {
                RepositoryError::Conflict(format!("Owner {owner_id} does not exist"))
            }
            TableError::ConditionFailed { .. } => {
                RepositoryError::already_exists("Product", product.id)
            }
            e => map_table_error(e),
        })?;

        debug!(product_id = %product.id, %owner_id, "Created product");
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        match self.get_item(&keys::product_key(id)).await? {
            Some(item) => Ok(Some(item_to_product(&item)?)),
            None => Ok(None),
        }
    }

    async fn list_products(&self, page: PageRequest) -> Result<Page<Product>> {
        let start = page.after.as_ref().map(marker_to_key).transpose()?;

        let scan = self
            .table
            .scan(keys::product_pk_prefix(), page.limit, start)
            .await
            .map_err(map_table_error)?;

        let products = scan
            .items
            .iter()
            .map(item_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(products, scan.last_key.map(key_to_marker)))
    }

    async fn get_products_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>> {
        let index_items = self
            .table
            .query(&keys::user_pk(owner_id), keys::product_ref_sk_prefix())
            .await
            .map_err(map_table_error)?;

        self.resolve_products(index_items).await
    }

    async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let index_items = self
            .table
            .query(&keys::category_pk(category), keys::product_ref_sk_prefix())
            .await
            .map_err(map_table_error)?;

        self.resolve_products(index_items).await
    }

    async fn update_product(
        &self,
        id: Uuid,
        caller_id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product> {
        let (current, version) = self.get_owned_product(id, caller_id).await?;
        let updated = patch.apply(&current, Utc::now());
        let item = product_to_item(&updated);
        let condition = Condition::ExistsWithVersion(version);

        let result = if current.category == updated.category {
            self.table.put(item, condition).await
        } else {
            let mut ops = vec![WriteOp::put(item, condition)];
            if let Some(old) = &current.category {
                ops.push(WriteOp::delete(keys::category_index_key(old, id)));
            }
            if let Some(new) = &updated.category {
                ops.push(WriteOp::put(
                    category_index_item(new, id),
                    Condition::NotExists,
                ));
            }
            self.table.transact(ops).await
        };
        result.map_err(|e| lost_race(e, "Product", id))?;

        debug!(product_id = %id, "Updated product");
        Ok(updated)
    }

    async fn delete_product(&self, id: Uuid, caller_id: Uuid) -> Result<()> {
        let (product, version) = self.get_owned_product(id, caller_id).await?;

        let mut ops = vec![
            WriteOp::Delete {
                key: keys::product_key(id),
                condition: Condition::ExistsWithVersion(version),
            },
            WriteOp::delete(keys::owner_index_key(product.user_id, id)),
        ];
        if let Some(category) = &product.category {
            ops.push(WriteOp::delete(keys::category_index_key(category, id)));
        }

        self.table
            .transact(ops)
            .await
            .map_err(|e| lost_race(e, "Product", id))?;

        debug!(product_id = %id, "Deleted product");
        Ok(())
    }
}
