//! SQLite repository implementation.
//!
//! Implements the repository traits from `shopkeep_core::storage` using SQLite.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use shopkeep_core::catalog::{
    normalize_email, Credentials, NewProduct, NewUser, Product, ProductPatch, User, UserPatch,
};
use shopkeep_core::storage::{
    Page, PageMarker, PageRequest, ProductRepository, RepositoryError, Result, UserRepository,
};

use crate::storage::hash_password;

use super::conversions::{
    format_datetime, row_to_credentials, row_to_product, row_to_product_with_rowid, row_to_user,
};
use super::error::{domain_err, map_tokio_rusqlite_error, wrap_err};
use super::schema;

const MARKER_ROWID: &str = "rowid";

/// SQLite-based repository implementation.
///
/// Provides async access to SQLite storage for all entity types.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Data is lost when the connection is dropped.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    async fn query_products(
        &self,
        sql: &'static str,
        param: String,
    ) -> Result<Vec<Product>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&param], row_to_product)
                    .map_err(wrap_err)?;

                let mut products = Vec::new();
                for row_result in rows {
                    products.push(row_result.map_err(wrap_err)?);
                }
                Ok(products)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Product", "*"))
    }
}

/// Loads a product inside a transaction and checks that `caller_id` owns it.
fn owned_product(
    tx: &rusqlite::Transaction<'_>,
    id: Uuid,
    caller_id: Uuid,
) -> std::result::Result<Product, tokio_rusqlite::Error> {
    let product = tx
        .query_row(schema::SELECT_PRODUCT_BY_ID, [id.to_string()], row_to_product)
        .optional()
        .map_err(wrap_err)?
        .ok_or_else(|| domain_err(RepositoryError::not_found("Product", id)))?;

    if product.user_id != caller_id {
        return Err(domain_err(RepositoryError::unauthorized("Product", id)));
    }
    Ok(product)
}

fn marker_to_rowid(marker: &PageMarker) -> Result<i64> {
    marker
        .get(MARKER_ROWID)
        .and_then(|rowid| rowid.parse().ok())
        .ok_or_else(|| RepositoryError::InvalidData("Invalid pagination marker".to_string()))
}

// ============================================================================
// UserRepository implementation
// ============================================================================

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let password_hash = hash_password(&new_user.password).await?;
        let user = new_user.to_user(Utc::now());
        let row = user.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_USER,
                    params![
                        row.id.to_string(),
                        row.email,
                        password_hash,
                        row.first_name,
                        row.last_name,
                        row.profile_image,
                        row.role.as_str(),
                        row.is_active,
                        format_datetime(&row.created_at),
                        format_datetime(&row.updated_at),
                        row.last_login.as_ref().map(format_datetime),
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", user.email.clone()))?;

        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_USER_BY_ID, [&id_str], row_to_user)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", id.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        let email_key = email.clone();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_USER_BY_EMAIL, [&email_key], row_to_user)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", email))
    }

    async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>> {
        let email = normalize_email(email);
        let email_key = email.clone();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_CREDENTIALS_BY_EMAIL,
                    [&email_key],
                    row_to_credentials,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", email))
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User> {
        let new_hash = match patch.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let now = Utc::now();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let Credentials {
                    mut user,
                    password_hash,
                } = tx
                    .query_row(
                        schema::SELECT_CREDENTIALS_BY_ID,
                        [id.to_string()],
                        row_to_credentials,
                    )
                    .map_err(wrap_err)?;

                patch.apply_to(&mut user, now);
                tx.execute(
                    schema::UPDATE_USER,
                    params![
                        user.id.to_string(),
                        user.first_name,
                        user.last_name,
                        user.profile_image,
                        new_hash.unwrap_or(password_hash),
                        format_datetime(&user.updated_at),
                    ],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(user)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", id.to_string()))
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        let now = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::UPDATE_LAST_LOGIN, params![id.to_string(), now])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", id.to_string()))
    }
}

// ============================================================================
// ProductRepository implementation
// ============================================================================

#[async_trait]
impl ProductRepository for SqliteRepository {
    async fn create_product(&self, owner_id: Uuid, new_product: NewProduct) -> Result<Product> {
        let product = new_product.into_product(owner_id, Utc::now());
        let row = product.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_PRODUCT,
                    params![
                        row.id.to_string(),
                        row.name,
                        row.description,
                        row.price.to_string(),
                        row.image_url,
                        row.category,
                        row.stock,
                        row.is_active,
                        row.user_id.to_string(),
                        format_datetime(&row.created_at),
                        format_datetime(&row.updated_at),
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Product", product.id.to_string()))?;

        debug!(product_id = %product.id, %owner_id, "Created product");
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_PRODUCT_BY_ID, [&id_str], row_to_product)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Product", id.to_string()))
    }

    async fn list_products(&self, page: PageRequest) -> Result<Page<Product>> {
        let after = page.after.as_ref().map(marker_to_rowid).transpose()?.unwrap_or(0);
        let limit = page.limit;
        // One extra row tells whether another page exists.
        let fetch = i64::try_from(limit + 1).unwrap_or(i64::MAX);

        let mut rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_PRODUCTS_PAGE)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map(params![after, fetch], row_to_product_with_rowid)
                    .map_err(wrap_err)?;

                let mut products = Vec::new();
                for row_result in rows {
                    products.push(row_result.map_err(wrap_err)?);
                }
                Ok(products)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Product", "*"))?;

        let next = if rows.len() > limit {
            rows.truncate(limit);
            rows.last()
                .map(|(_, rowid)| PageMarker::new().with(MARKER_ROWID, rowid.to_string()))
        } else {
            None
        };

        let products = rows.into_iter().map(|(product, _)| product).collect();
        Ok(Page::new(products, next))
    }

    async fn get_products_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>> {
        self.query_products(schema::SELECT_PRODUCTS_BY_OWNER, owner_id.to_string())
            .await
    }

    async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.query_products(schema::SELECT_PRODUCTS_BY_CATEGORY, category.to_string())
            .await
    }

    async fn update_product(
        &self,
        id: Uuid,
        caller_id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product> {
        let now = Utc::now();

        let updated = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let current = owned_product(&tx, id, caller_id)?;
                let updated = patch.apply(&current, now);

                tx.execute(
                    schema::UPDATE_PRODUCT,
                    params![
                        updated.id.to_string(),
                        updated.name,
                        updated.description,
                        updated.price.to_string(),
                        updated.image_url,
                        updated.category,
                        updated.stock,
                        updated.is_active,
                        format_datetime(&updated.updated_at),
                    ],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(updated)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Product", id.to_string()))?;

        debug!(product_id = %id, "Updated product");
        Ok(updated)
    }

    async fn delete_product(&self, id: Uuid, caller_id: Uuid) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                owned_product(&tx, id, caller_id)?;
                tx.execute(schema::DELETE_PRODUCT, [id.to_string()])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Product", id.to_string()))?;

        debug!(product_id = %id, "Deleted product");
        Ok(())
    }
}
