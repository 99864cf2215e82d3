//! HTTP surface: storefront routes under `/api/v1`, back-office under `/api/v1/admin`.

mod admin;
mod cart;
mod checkout;
mod extract;
mod products;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::checkout::PaymentSimulator;
use crate::config::Config;
use crate::error::{EcommerceError, Result};
use crate::store::{Seed, Store};

pub use extract::AdminUser;
pub use products::ProductView;

/// Header naming the back-office user a request acts as.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState { pub store: Arc<Store>, pub payments: PaymentSimulator }

impl AppState {
    pub fn new(config: &Config, seed: Seed) -> Result<Self> {
        Ok(Self {
            store: Arc::new(Store::new(seed, &config.currency, config.shipping.clone())?),
            payments: PaymentSimulator::new(config.payment_delay),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/me", get(admin::me))
        .route("/dashboard", get(admin::dashboard))
        .route("/orders", get(admin::list_orders))
        .route("/orders/:id", get(admin::get_order).delete(admin::delete_order))
        .route("/orders/:id/status", post(admin::update_order_status))
        .route("/orders/:id/note", put(admin::update_order_note))
        .route("/orders/:id/tracking", put(admin::update_order_tracking))
        .route("/orders/:id/tags", post(admin::add_order_tag))
        .route("/orders/:id/tags/:tag", delete(admin::remove_order_tag))
        .route("/products", get(admin::list_products).post(admin::create_product))
        .route("/products/:id", get(admin::get_product).put(admin::update_product).delete(admin::delete_product))
        .route("/products/:id/stock", post(admin::adjust_stock))
        .route("/products/:id/status", post(admin::set_product_status))
        .route("/categories", get(admin::list_categories).post(admin::create_category))
        .route("/categories/:id", put(admin::update_category).delete(admin::delete_category))
        .route("/roles", get(admin::list_roles))
        .route("/users", get(admin::list_users))
        .route("/users/:id/role", put(admin::set_user_role));

    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "elecxo-commerce"})) }))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/:id", get(products::get_product))
        .route("/api/v1/products/:id/quote", post(products::quote))
        .route("/api/v1/categories", get(products::list_categories))
        .route("/api/v1/categories/:key", get(products::get_category))
        .route("/api/v1/brands", get(products::list_brands))
        .route("/api/v1/cart/:session", get(cart::get_cart).post(cart::add_to_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/:session/items/:line", put(cart::update_item).delete(cart::remove_item))
        .route("/api/v1/checkout/:session", get(checkout::get_checkout).post(checkout::begin_checkout))
        .route("/api/v1/checkout/:session/pay", post(checkout::pay))
        .nest("/api/v1/admin", admin)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> EcommerceError { EcommerceError::NotFound("Route") }

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Something went wrong. Please try again." }))).into_response()
}
