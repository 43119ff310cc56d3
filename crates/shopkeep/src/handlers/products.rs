//! Product CRUD endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopkeep_core::catalog::{
    validate_new_product, validate_product_patch, NewProduct, Product, ProductPatch,
};
use shopkeep_core::storage::{PageRequest, DEFAULT_PAGE_LIMIT};

use super::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Vec<Product>> for ProductListResponse {
    fn from(products: Vec<Product>) -> Self {
        Self {
            count: products.len(),
            products,
            next_cursor: None,
        }
    }
}

/// One page of products (GET /api/products).
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let mut request = PageRequest::new(query.limit.unwrap_or(DEFAULT_PAGE_LIMIT));
    if let Some(cursor) = query.cursor.as_deref().filter(|c| !c.is_empty()) {
        request = request.after(state.cursors.decode(cursor)?);
    }

    let page = state.storage.products.list_products(request).await?;
    let next_cursor = page
        .next
        .as_ref()
        .map(|marker| state.cursors.encode(marker))
        .transpose()?;

    let mut response = ProductListResponse::from(page.items);
    response.next_cursor = next_cursor;

    Ok(Json(response))
}

/// Fetch one product (GET /api/products/{id}).
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .storage
        .products
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductResponse { product }))
}

/// Products in one category (GET /api/products/category/{category}).
pub async fn list_by_category(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<String>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state
        .storage
        .products
        .get_products_by_category(&category)
        .await?;

    Ok(Json(products.into()))
}

/// The caller's own products (GET /api/products/user/me).
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state
        .storage
        .products
        .get_products_by_owner(auth.user_id)
        .await?;

    Ok(Json(products.into()))
}

/// Create a product owned by the caller (POST /api/products).
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    validate_new_product(&payload)?;

    let product = state
        .storage
        .products
        .create_product(auth.user_id, payload)
        .await?;

    tracing::info!(product_id = %product.id, user_id = %auth.user_id, "Created product");

    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

/// Patch one of the caller's products (PUT /api/products/{id}).
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<ProductResponse>, ApiError> {
    validate_product_patch(&patch)?;

    let product = state
        .storage
        .products
        .update_product(id, auth.user_id, patch)
        .await?;

    tracing::info!(product_id = %id, "Updated product");

    Ok(Json(ProductResponse { product }))
}

/// Delete one of the caller's products (DELETE /api/products/{id}).
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .storage
        .products
        .delete_product(id, auth.user_id)
        .await?;

    tracing::info!(product_id = %id, "Deleted product");

    Ok(StatusCode::NO_CONTENT)
}
