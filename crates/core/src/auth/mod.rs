mod error;
mod password;
mod token;

pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{bearer_token, Claims, IssuedToken, TokenKeys};
