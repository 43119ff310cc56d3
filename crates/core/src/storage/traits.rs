use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{Credentials, NewProduct, NewUser, Product, ProductPatch, User, UserPatch};

use super::{Page, PageRequest, Result};

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a user, hashing the password. Fails with `AlreadyExists` when
    /// the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Gets a user by their ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Gets a user by their email address.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Gets a user together with the stored password hash.
    async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>>;

    /// Applies a profile patch, re-hashing the password if one is given.
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User>;

    /// Refreshes the last-login timestamp.
    async fn record_login(&self, id: Uuid) -> Result<()>;
}

/// Repository for products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Creates a product owned by `owner_id`. The owner must exist.
    async fn create_product(&self, owner_id: Uuid, new_product: NewProduct) -> Result<Product>;

    /// Gets a product by its ID.
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;

    /// Lists products one page at a time, in storage order.
    async fn list_products(&self, page: PageRequest) -> Result<Page<Product>>;

    /// Gets all products owned by a user.
    async fn get_products_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>>;

    /// Gets all products in a category.
    async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>>;

    /// Patches a product. `caller_id` must be the owner.
    async fn update_product(&self, id: Uuid, caller_id: Uuid, patch: ProductPatch)
        -> Result<Product>;

    /// Deletes a product. `caller_id` must be the owner.
    async fn delete_product(&self, id: Uuid, caller_id: Uuid) -> Result<()>;
}
