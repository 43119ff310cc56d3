use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// True for failures caused by the caller's credentials rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Hashing(_))
    }
}
