//! Request payloads for creating and patching users and products.
//!
//! Protected fields (ids, owner reference, creation timestamp, email) have no
//! representation here, so a patch can never touch them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::serde::{deserialize_optional_string, deserialize_patch_string};

use super::types::{normalize_email, normalize_price, Product, Role, User};

/// Registration payload. The password is plain text until an adapter hashes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Builds the stored user (without any password material).
    pub fn to_user(&self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            email: normalize_email(&self.email),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_image: None,
            role: Role::User,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

/// Profile patch submitted by the account owner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, deserialize_with = "deserialize_patch_string")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch_string")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch_string")]
    pub profile_image: Option<Option<String>>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UserPatch {
    /// Applies the non-password fields. Password changes are handled by the
    /// adapters because they have to re-hash.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(profile_image) = &self.profile_image {
            user.profile_image = profile_image.clone();
        }
        user.updated_at = now;
    }
}

fn default_active() -> bool {
    true
}

/// Payload for creating a product. The owner comes from the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            image_url: None,
            category: None,
            stock: 0,
            is_active: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    /// Builds the stored product owned by `owner_id`.
    pub fn into_product(self, owner_id: Uuid, now: DateTime<Utc>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            description: self.description,
            price: normalize_price(self.price),
            image_url: self.image_url,
            category: self.category,
            stock: self.stock,
            is_active: self.is_active,
            user_id: owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field-by-field product patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_patch_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "deserialize_patch_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_patch_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProductPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = Some(category.map(str::to_string));
        self
    }

    /// Applies the patch to a copy of `product`, returning the new version.
    pub fn apply(&self, product: &Product, now: DateTime<Utc>) -> Product {
        let mut updated = product.clone();
        if let Some(name) = &self.name {
            updated.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(price) = self.price {
            updated.price = normalize_price(price);
        }
        if let Some(image_url) = &self.image_url {
            updated.image_url = image_url.clone();
        }
        if let Some(category) = &self.category {
            updated.category = category.clone();
        }
        if let Some(stock) = self.stock {
            updated.stock = stock;
        }
        if let Some(is_active) = self.is_active {
            updated.is_active = is_active;
        }
        updated.updated_at = now;
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_to_user_normalizes_email() {
        let user = NewUser::new(" A@X.com ", "Abcd1234").to_user(Utc::now());
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_new_product_defaults_from_json() {
        let payload: NewProduct =
            serde_json::from_str(r#"{"name": "Widget", "price": 9.99}"#).unwrap();
        assert_eq!(payload.stock, 0);
        assert!(payload.is_active);
        assert_eq!(payload.price, Decimal::new(999, 2));
        assert_eq!(payload.category, None);
    }

    #[test]
    fn test_into_product_rounds_price_and_sets_owner() {
        let owner = Uuid::new_v4();
        let product = NewProduct::new(" Widget ", Decimal::new(12345, 3)).into_product(owner, Utc::now());
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, Decimal::new(1235, 2));
        assert_eq!(product.user_id, owner);
    }

    #[test]
    fn test_product_patch_ignores_protected_fields() {
        let patch: ProductPatch = serde_json::from_str(
            r#"{"id": "x", "userId": "y", "createdAt": "z", "stock": 3}"#,
        )
        .unwrap();
        assert_eq!(patch.stock, Some(3));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_product_patch_apply_changes_only_given_fields() {
        let owner = Uuid::new_v4();
        let created = Utc::now();
        let product = NewProduct::new("Widget", Decimal::new(999, 2))
            .with_category("tools")
            .into_product(owner, created);

        let later = created + chrono::Duration::seconds(5);
        let patched = ProductPatch::new()
            .with_price(Decimal::new(500, 2))
            .with_category(None)
            .apply(&product, later);

        assert_eq!(patched.name, "Widget");
        assert_eq!(patched.price, Decimal::new(500, 2));
        assert_eq!(patched.category, None);
        assert_eq!(patched.id, product.id);
        assert_eq!(patched.user_id, owner);
        assert_eq!(patched.created_at, created);
        assert_eq!(patched.updated_at, later);
    }

    #[test]
    fn test_user_patch_apply() {
        let mut user = NewUser::new("a@x.com", "Abcd1234").to_user(Utc::now());
        let patch: UserPatch =
            serde_json::from_str(r#"{"firstName": "Ada", "lastName": null, "email": "b@x.com"}"#)
                .unwrap();
        let now = Utc::now();
        patch.apply_to(&mut user, now);
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name, None);
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.updated_at, now);
    }
}
