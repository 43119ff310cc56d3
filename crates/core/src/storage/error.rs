use thiserror::Error;

/// Errors that can occur during repository operations.
///
/// Both storage backends raise the same variants for the same situations so
/// callers never need to know which one is active.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Not allowed to modify {entity_type}: {id}")]
    Unauthorized {
        entity_type: &'static str,
        id: String,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity_type: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn unauthorized(entity_type: &'static str, id: impl ToString) -> Self {
        Self::Unauthorized {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_not_found_display() {
        let error = RepositoryError::not_found("Product", "abc-123");
        assert_eq!(error.to_string(), "Product not found: abc-123");
    }

    #[test]
    fn test_repository_error_already_exists_display() {
        let error = RepositoryError::already_exists("User", "a@x.com");
        assert_eq!(error.to_string(), "User already exists: a@x.com");
    }

    #[test]
    fn test_repository_error_unauthorized_display() {
        let error = RepositoryError::unauthorized("Product", "p-1");
        assert_eq!(error.to_string(), "Not allowed to modify Product: p-1");
    }

    #[test]
    fn test_repository_error_conflict_display() {
        let error = RepositoryError::Conflict("owner does not exist".to_string());
        assert_eq!(error.to_string(), "Conflict: owner does not exist");
    }

    #[test]
    fn test_repository_error_connection_failed_display() {
        let error = RepositoryError::ConnectionFailed("timeout after 30s".to_string());
        assert_eq!(error.to_string(), "Connection failed: timeout after 30s");
    }

    #[test]
    fn test_repository_error_invalid_data_display() {
        let error = RepositoryError::InvalidData("bad price".to_string());
        assert_eq!(error.to_string(), "Invalid data: bad price");
    }
}
