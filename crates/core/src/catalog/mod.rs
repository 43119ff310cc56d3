mod error;
mod operations;
mod requests;
mod types;

pub use error::CatalogError;
pub use operations::{
    is_valid_email, validate_new_product, validate_new_user, validate_product_patch,
    validate_user_patch, MAX_PRODUCT_NAME_LEN, MIN_PASSWORD_LEN,
};
pub use requests::{NewProduct, NewUser, ProductPatch, UserPatch};
pub use types::{normalize_email, normalize_price, Credentials, Product, Role, User};
