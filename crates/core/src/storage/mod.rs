mod error;
mod http_mapping;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_status_code;
pub use traits::{ProductRepository, UserRepository};
pub use types::{Page, PageMarker, PageRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
