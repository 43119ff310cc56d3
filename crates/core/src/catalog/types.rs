use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CatalogError;

/// Access role of a user account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(CatalogError::UnknownRole(s.to_string())),
        }
    }
}

/// A registered account.
///
/// There is deliberately no password field here: the stored hash only ever
/// travels inside [`Credentials`], which is not serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// A user together with the stored password hash.
///
/// Only returned by credential lookups; used to check a login attempt.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

impl Credentials {
    /// Checks a plain-text password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        crate::auth::verify_password(&self.password_hash, password).unwrap_or(false)
    }
}

/// A product listed by one of the users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub stock: i64,
    pub is_active: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rounds a price to the two-decimal precision every backend stores.
pub fn normalize_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Normalizes an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_strings() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_serializes_without_password() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            profile_image: None,
            role: Role::User,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["role"], "user");
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_product_price_serializes_as_number() {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: "Widget".to_string(),
            description: None,
            price: Decimal::new(999, 2),
            image_url: None,
            category: None,
            stock: 0,
            is_active: true,
            user_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"].as_f64(), Some(9.99));
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_normalize_price_rounds_to_cents() {
        assert_eq!(normalize_price(Decimal::new(10999, 3)), Decimal::new(1100, 2));
        assert_eq!(normalize_price(Decimal::new(5, 0)), Decimal::new(5, 0));
        assert_eq!(normalize_price(Decimal::new(12345, 3)), Decimal::new(1235, 2));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
