use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::AppState;
use crate::checkout::{CheckoutData, CheckoutForm, PaymentRequest};
use crate::domain::aggregates::Order;
use crate::error::Result;

pub async fn begin_checkout(State(state): State<AppState>, Path(session): Path<String>, Json(form): Json<CheckoutForm>) -> Result<Json<CheckoutData>> {
    Ok(Json(state.store.begin_checkout(&session, form).await?))
}

pub async fn get_checkout(State(state): State<AppState>, Path(session): Path<String>) -> Result<Json<CheckoutData>> {
    Ok(Json(state.store.checkout_data(&session).await?))
}

pub async fn pay(State(state): State<AppState>, Path(session): Path<String>, Json(req): Json<PaymentRequest>) -> Result<(StatusCode, Json<Order>)> {
    let order = state.store.pay(&session, &req, &state.payments).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
