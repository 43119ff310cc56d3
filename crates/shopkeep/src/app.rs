use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        auth::{get_profile, login, register, update_profile},
        health::health,
        products::{
            create_product, delete_product, get_product, list_by_category, list_mine,
            list_products, update_product,
        },
        upload::{delete_file, list_files, list_folder, sign_url},
    },
    rate_limit::rate_limit,
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api_routes = Router::new()
        // Auth routes
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(get_profile).put(update_profile))
        // Product routes
        .route("/products", get(list_products).post(create_product))
        .route("/products/user/me", get(list_mine))
        .route("/products/category/{category}", get(list_by_category))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        // Upload routes
        .route("/upload/sign-url", post(sign_url))
        .route("/upload/list", get(list_files))
        .route("/upload/list/{folder}", get(list_folder))
        .route("/upload/{*key}", delete(delete_file))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ))
        .layer(cors);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}
