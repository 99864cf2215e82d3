use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::domain::aggregates::{Cart, VariantSelection};
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default)]
    pub selection: VariantSelection,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest { pub quantity: u32 }

pub async fn get_cart(State(state): State<AppState>, Path(session): Path<String>) -> Json<Cart> {
    Json(state.store.cart(&session).await)
}

pub async fn add_to_cart(State(state): State<AppState>, Path(session): Path<String>, Json(req): Json<AddToCartRequest>) -> Result<(StatusCode, Json<Cart>)> {
    let cart = state.store.add_to_cart(&session, &req.product_id, &req.selection, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((session, line)): Path<(String, String)>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<Cart>> {
    Ok(Json(state.store.update_cart_item(&session, &line, req.quantity).await?))
}

pub async fn remove_item(State(state): State<AppState>, Path((session, line)): Path<(String, String)>) -> Result<Json<Cart>> {
    Ok(Json(state.store.remove_cart_item(&session, &line).await?))
}

pub async fn clear_cart(State(state): State<AppState>, Path(session): Path<String>) -> StatusCode {
    state.store.clear_cart(&session).await;
    StatusCode::NO_CONTENT
}
