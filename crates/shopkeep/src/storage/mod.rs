//! Storage backend selection.
//!
//! The backend is chosen once at startup from `DB_TYPE` and bound to the
//! repository trait objects in [`Storage`]. Handlers only ever see the
//! traits from `shopkeep_core::storage`.
//!
//! # Backends
//!
//! - `sqlite` (aliases `sql`, `relational`): SQLite via `rusqlite` and `tokio-rusqlite`
//! - `dynamodb` (alias `dynamo`): AWS DynamoDB single-table design via `aws-sdk-dynamodb`
//! - `memory`: the key-value repository over an in-process table

pub mod dynamodb;
pub mod sqlite;

use std::{fmt, str::FromStr, sync::Arc};

use shopkeep_core::storage::{ProductRepository, RepositoryError, UserRepository};
use thiserror::Error;

use crate::config::Config;

use self::dynamodb::{DynamoDbTable, KeyValueRepository, MemoryTable};
use self::sqlite::SqliteRepository;

/// Errors raised while binding the storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported storage backend '{0}', expected one of: sqlite, dynamodb, memory")]
    UnsupportedBackend(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Storage backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    DynamoDb,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::DynamoDb => "dynamodb",
            StorageBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sql" | "relational" => Ok(StorageBackend::Sqlite),
            "dynamodb" | "dynamo" => Ok(StorageBackend::DynamoDb),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(StorageError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Repositories bound to the active backend.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub backend: StorageBackend,
}

impl Storage {
    /// Parses `config.db_type` and opens the matching backend.
    pub async fn connect(config: &Config) -> Result<Self, StorageError> {
        let backend: StorageBackend = config.db_type.parse()?;

        let storage = match backend {
            StorageBackend::Sqlite => {
                let repo = SqliteRepository::new(&config.sqlite_path).await?;
                tracing::info!(path = %config.sqlite_path, "Opened SQLite database");
                Self::bind(Arc::new(repo), backend)
            }
            StorageBackend::DynamoDb => {
                let table = DynamoDbTable::connect(
                    config.dynamodb_table_name.clone(),
                    config.dynamodb_endpoint.as_deref(),
                )
                .await;
                tracing::info!(table = %table.table_name(), "Using DynamoDB table");
                Self::bind(Arc::new(KeyValueRepository::new(table)), backend)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                Self::memory()
            }
        };

        Ok(storage)
    }

    /// Empty in-process storage.
    pub fn memory() -> Self {
        Self::bind(
            Arc::new(KeyValueRepository::new(MemoryTable::new())),
            StorageBackend::Memory,
        )
    }

    fn bind<R>(repo: Arc<R>, backend: StorageBackend) -> Self
    where
        R: UserRepository + ProductRepository + 'static,
    {
        Self {
            users: repo.clone(),
            products: repo,
            backend,
        }
    }
}

/// Hashes a password on the blocking pool so argon2 never stalls the runtime.
pub(crate) async fn hash_password(password: &str) -> Result<String, RepositoryError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || shopkeep_core::auth::hash_password(&password))
        .await
        .map_err(|e| RepositoryError::QueryFailed(format!("password hashing task failed: {e}")))?
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
