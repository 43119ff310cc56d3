use std::{env, str::FromStr, time::Duration};

/// Secret used when `JWT_SECRET` is unset. Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "shopkeep-dev-secret-change-me";

const MAX_JWT_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend name, parsed by the storage facade (default: "sqlite")
    pub db_type: String,
    /// Path to SQLite database file (default: "shopkeep.db")
    pub sqlite_path: String,
    /// DynamoDB table name (default: "shopkeep")
    pub dynamodb_table_name: String,
    /// Custom DynamoDB endpoint, e.g. DynamoDB Local
    pub dynamodb_endpoint: Option<String>,
    /// Bucket receiving uploads (default: "shopkeep-uploads")
    pub s3_bucket: String,
    /// Canned ACL applied to uploaded objects (default: "public-read")
    pub s3_acl: String,
    /// Public base URL of uploaded objects (default: the bucket's S3 URL)
    pub s3_public_url: Option<String>,
    /// Lifetime of pre-signed upload URLs in seconds (default: 300)
    pub signed_url_expiry_secs: u64,
    /// Secret signing bearer tokens and pagination cursors
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds (default: 7 days)
    pub jwt_expiry_secs: u64,
    /// Requests allowed per client per window (default: 100)
    pub rate_limit_max: u32,
    /// Rate limit window in seconds (default: 900)
    pub rate_limit_window_secs: u64,
    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DB_TYPE` - `sqlite`, `dynamodb` or `memory` (default: "sqlite")
    /// - `SQLITE_PATH` - SQLite database path (default: "shopkeep.db")
    /// - `DYNAMODB_TABLE_NAME` - DynamoDB table (default: "shopkeep")
    /// - `DYNAMODB_ENDPOINT` - Custom DynamoDB endpoint (optional)
    /// - `S3_BUCKET` - Upload bucket (default: "shopkeep-uploads")
    /// - `S3_ACL` - Upload object ACL (default: "public-read")
    /// - `S3_PUBLIC_URL` - Public base URL for uploaded files (optional)
    /// - `SIGNED_URL_EXPIRY_SECS` - Upload URL lifetime (default: 300)
    /// - `JWT_SECRET` - Token signing secret (default: development secret)
    /// - `JWT_EXPIRY_SECS` - Token lifetime (default: 604800)
    /// - `RATE_LIMIT_MAX` - Requests per window (default: 100)
    /// - `RATE_LIMIT_WINDOW_SECS` - Window length (default: 900)
    /// - `REQUEST_TIMEOUT_SECS` - Request timeout (default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str, default| parse_or(lookup(key), default);

        Self {
            db_type: lookup("DB_TYPE").unwrap_or_else(|| "sqlite".to_string()),
            sqlite_path: lookup("SQLITE_PATH").unwrap_or_else(|| "shopkeep.db".to_string()),
            dynamodb_table_name: lookup("DYNAMODB_TABLE_NAME")
                .unwrap_or_else(|| "shopkeep".to_string()),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|v| !v.is_empty()),
            s3_bucket: lookup("S3_BUCKET").unwrap_or_else(|| "shopkeep-uploads".to_string()),
            s3_acl: lookup("S3_ACL").unwrap_or_else(|| "public-read".to_string()),
            s3_public_url: lookup("S3_PUBLIC_URL").filter(|v| !v.is_empty()),
            signed_url_expiry_secs: parsed("SIGNED_URL_EXPIRY_SECS", 300),
            jwt_secret: lookup("JWT_SECRET")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            jwt_expiry_secs: parsed("JWT_EXPIRY_SECS", 7 * 24 * 60 * 60),
            rate_limit_max: parse_or(lookup("RATE_LIMIT_MAX"), 100),
            rate_limit_window_secs: parsed("RATE_LIMIT_WINDOW_SECS", 900),
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", 30),
        }
    }

    /// Whether the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }

    /// Token lifetime, capped at one year.
    pub fn jwt_expiry(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jwt_expiry_secs.min(MAX_JWT_EXPIRY_SECS) as i64)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL under which uploaded objects are publicly reachable.
    pub fn public_base_url(&self) -> String {
        match &self.s3_public_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.s3.amazonaws.com", self.s3_bucket),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config_from(&[]);

        assert_eq!(config.db_type, "sqlite");
        assert_eq!(config.sqlite_path, "shopkeep.db");
        assert_eq!(config.dynamodb_table_name, "shopkeep");
        assert_eq!(config.dynamodb_endpoint, None);
        assert_eq!(config.s3_acl, "public-read");
        assert_eq!(config.signed_url_expiry(), Duration::from_secs(300));
        assert_eq!(config.jwt_expiry(), chrono::Duration::days(7));
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(900));
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_values_from_environment() {
        let config = config_from(&[
            ("DB_TYPE", "dynamodb"),
            ("DYNAMODB_ENDPOINT", "http://localhost:8000"),
            ("JWT_SECRET", "s3cret"),
            ("RATE_LIMIT_MAX", "5"),
            ("SIGNED_URL_EXPIRY_SECS", "60"),
        ]);

        assert_eq!(config.db_type, "dynamodb");
        assert_eq!(
            config.dynamodb_endpoint.as_deref(),
            Some("http://localhost:8000")
        );
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(!config.uses_dev_secret());
        assert_eq!(config.rate_limit_max, 5);
        assert_eq!(config.signed_url_expiry_secs, 60);
    }

    #[test]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        let config = config_from(&[("RATE_LIMIT_MAX", "lots"), ("JWT_EXPIRY_SECS", "-1")]);

        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.jwt_expiry_secs, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_jwt_expiry_is_capped() {
        let config = config_from(&[("JWT_EXPIRY_SECS", "99999999999")]);
        assert_eq!(config.jwt_expiry(), chrono::Duration::days(365));
    }

    #[test]
    fn test_public_base_url() {
        let config = config_from(&[("S3_BUCKET", "media")]);
        assert_eq!(config.public_base_url(), "https://media.s3.amazonaws.com");

        let config = config_from(&[("S3_PUBLIC_URL", "https://cdn.example.com/")]);
        assert_eq!(config.public_base_url(), "https://cdn.example.com");
    }
}
