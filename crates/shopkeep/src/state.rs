//! Shared application state.
//!
//! Cloned into every handler. The storage binding is chosen once at startup
//! and never changes afterwards.

use std::sync::Arc;

use shopkeep_core::auth::TokenKeys;
use shopkeep_core::pagination::CursorCodec;

use crate::{config::Config, rate_limit::RateLimiter, storage::Storage, upload::UploadService};

#[derive(Clone)]
pub struct AppState {
    /// User and product repositories of the active backend.
    pub storage: Storage,
    /// Bearer token signing keys.
    pub token_keys: Arc<TokenKeys>,
    /// Pagination cursor signing keys.
    pub cursors: Arc<CursorCodec>,
    /// Pre-signed upload service.
    pub uploads: UploadService,
    /// Per-client request counters.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(storage: Storage, uploads: UploadService, config: &Config) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            storage,
            token_keys: Arc::new(TokenKeys::new(secret, config.jwt_expiry())),
            cursors: Arc::new(CursorCodec::new(secret)),
            uploads,
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window(),
            )),
        }
    }

    /// In-memory state for tests, with default configuration.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::for_tests_with(Config::from_lookup(|_| None))
    }

    #[cfg(test)]
    pub fn for_tests_with(config: Config) -> Self {
        use crate::upload::memory::MemoryObjectStore;

        let uploads = UploadService::new(
            Arc::new(MemoryObjectStore::new()),
            config.signed_url_expiry(),
            config.public_base_url(),
        );
        Self::new(Storage::memory(), uploads, &config)
    }
}
