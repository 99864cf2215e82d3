//! Back-office routes. Every handler names the gate it is guarded by.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{products::ProductQuery, AdminUser, AppState};
use crate::catalog::PaginatedResponse;
use crate::domain::aggregates::{Category, FulfillmentStatus, Order, OrderStatus, PaymentStatus, Product, ProductStatus, ProductUpdate};
use crate::error::{EcommerceError, Result};
use crate::orders::{DashboardSummary, OrderFilter, OrderSort, OrderSortField, SortDirection};
use crate::permissions::{Action, CurrentUser, PermissionGate, Resource, Role, User};
use crate::store::{CategorySummary, NewProduct};

fn gate(resource: Resource, action: Action) -> PermissionGate { PermissionGate::permission(resource, action) }

pub async fn me(user: AdminUser) -> Json<CurrentUser> { Json(user.0) }

pub async fn dashboard(State(state): State<AppState>, user: AdminUser) -> Result<Json<DashboardSummary>> {
    user.require(gate(Resource::Dashboard, Action::View))?;
    Ok(Json(state.store.dashboard().await))
}

// --- orders ----------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub tag: Option<String>,
    #[serde(default)]
    pub sort: OrderSortField,
    #[serde(default)]
    pub direction: SortDirection,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderQuery {
    fn filter(&self) -> OrderFilter {
        OrderFilter {
            search: self.search.clone(),
            status: self.status,
            payment_status: self.payment_status,
            fulfillment_status: self.fulfillment_status,
            from: self.from,
            to: self.to,
            min_total: self.min_total,
            max_total: self.max_total,
            tag: self.tag.clone(),
        }
    }
}

pub async fn list_orders(State(state): State<AppState>, user: AdminUser, Query(query): Query<OrderQuery>) -> Result<Json<PaginatedResponse<Order>>> {
    user.require(gate(Resource::Orders, Action::View))?;
    let sort = OrderSort { field: query.sort, direction: query.direction };
    Ok(Json(state.store.list_orders(&query.filter(), sort, query.page, query.per_page).await))
}

pub async fn get_order(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>) -> Result<Json<Order>> {
    user.require(gate(Resource::Orders, Action::View))?;
    Ok(Json(state.store.get_order(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest { pub status: OrderStatus, pub message: Option<String> }

pub async fn update_order_status(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<StatusRequest>) -> Result<Json<Order>> {
    let actor = user.require(gate(Resource::Orders, Action::Edit))?;
    tracing::info!(order_id = %id, to = %req.status, user_id = %actor.user.id, "order status change requested");
    Ok(Json(state.store.transition_order(&id, req.status, req.message).await?))
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest { pub note: Option<String> }

pub async fn update_order_note(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<NoteRequest>) -> Result<Json<Order>> {
    user.require(gate(Resource::Orders, Action::Edit))?;
    let order = state.store.update_order(&id, |order| { order.set_note(req.note); Ok(()) }).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct TrackingRequest { pub carrier: Option<String>, pub tracking_number: Option<String> }

pub async fn update_order_tracking(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<TrackingRequest>) -> Result<Json<Order>> {
    user.require(gate(Resource::Orders, Action::Edit))?;
    let order = state.store.update_order(&id, |order| { order.set_tracking(req.carrier, req.tracking_number); Ok(()) }).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct TagRequest { pub tag: String }

pub async fn add_order_tag(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<TagRequest>) -> Result<Json<Order>> {
    user.require(gate(Resource::Orders, Action::Edit))?;
    let tag = req.tag.trim();
    if tag.is_empty() {
        return Err(EcommerceError::BadRequest("Tag must not be empty".into()));
    }
    Ok(Json(state.store.update_order(&id, |order| { order.add_tag(tag); Ok(()) }).await?))
}

pub async fn remove_order_tag(State(state): State<AppState>, user: AdminUser, Path((id, tag)): Path<(String, String)>) -> Result<Json<Order>> {
    user.require(gate(Resource::Orders, Action::Edit))?;
    Ok(Json(state.store.update_order(&id, |order| { order.remove_tag(&tag); Ok(()) }).await?))
}

pub async fn delete_order(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>) -> Result<StatusCode> {
    user.require(gate(Resource::Orders, Action::Delete))?;
    state.store.delete_order(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- products --------------------------------------------------------------

pub async fn list_products(State(state): State<AppState>, user: AdminUser, Query(query): Query<ProductQuery>) -> Result<Json<PaginatedResponse<Product>>> {
    user.require(gate(Resource::Products, Action::View))?;
    let filter = query.to_filter(&state).await;
    Ok(Json(state.store.list_products(&filter, query.sort, query.page, query.per_page).await))
}

pub async fn get_product(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>) -> Result<Json<Product>> {
    user.require(gate(Resource::Products, Action::View))?;
    Ok(Json(state.store.get_product(&id).await?))
}

pub async fn create_product(State(state): State<AppState>, user: AdminUser, Json(req): Json<NewProduct>) -> Result<(StatusCode, Json<Product>)> {
    user.require(gate(Resource::Products, Action::Create))?;
    Ok((StatusCode::CREATED, Json(state.store.create_product(req).await?)))
}

pub async fn update_product(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<ProductUpdate>) -> Result<Json<Product>> {
    user.require(gate(Resource::Products, Action::Edit))?;
    Ok(Json(state.store.update_product(&id, req).await?))
}

#[derive(Debug, Deserialize)]
pub struct StockRequest { pub delta: i64 }

pub async fn adjust_stock(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<StockRequest>) -> Result<Json<Product>> {
    user.require(gate(Resource::Products, Action::Edit))?;
    Ok(Json(state.store.adjust_stock(&id, req.delta).await?))
}

#[derive(Debug, Deserialize)]
pub struct ProductStatusRequest { pub status: ProductStatus }

pub async fn set_product_status(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<ProductStatusRequest>) -> Result<Json<Product>> {
    user.require(gate(Resource::Products, Action::Edit))?;
    Ok(Json(state.store.set_product_status(&id, req.status).await?))
}

pub async fn delete_product(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>) -> Result<StatusCode> {
    user.require(gate(Resource::Products, Action::Delete))?;
    state.store.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- categories ------------------------------------------------------------

pub async fn list_categories(State(state): State<AppState>, user: AdminUser) -> Result<Json<Vec<CategorySummary>>> {
    user.require(gate(Resource::Categories, Action::View))?;
    Ok(Json(state.store.categories().await))
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest { pub name: String, pub description: Option<String>, pub parent_id: Option<String> }

pub async fn create_category(State(state): State<AppState>, user: AdminUser, Json(req): Json<CategoryRequest>) -> Result<(StatusCode, Json<Category>)> {
    user.require(gate(Resource::Categories, Action::Create))?;
    let category = state.store.create_category(&req.name, req.description, req.parent_id).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
pub struct CategoryUpdate { pub name: Option<String>, pub description: Option<String> }

pub async fn update_category(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<CategoryUpdate>) -> Result<Json<Category>> {
    user.require(gate(Resource::Categories, Action::Edit))?;
    Ok(Json(state.store.update_category(&id, req.name.as_deref(), req.description).await?))
}

pub async fn delete_category(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>) -> Result<StatusCode> {
    user.require(gate(Resource::Categories, Action::Delete))?;
    state.store.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- access ----------------------------------------------------------------

pub async fn list_roles(State(state): State<AppState>, user: AdminUser) -> Result<Json<Vec<Role>>> {
    user.require(gate(Resource::Permissions, Action::View))?;
    Ok(Json(state.store.roles().await))
}

pub async fn list_users(State(state): State<AppState>, user: AdminUser) -> Result<Json<Vec<User>>> {
    user.require(gate(Resource::Permissions, Action::View))?;
    Ok(Json(state.store.users().await))
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest { pub role: String }

pub async fn set_user_role(State(state): State<AppState>, user: AdminUser, Path(id): Path<String>, Json(req): Json<RoleRequest>) -> Result<Json<User>> {
    user.require(gate(Resource::Permissions, Action::Edit).and_min_level(80))?;
    Ok(Json(state.store.set_user_role(&id, &req.role).await?))
}
