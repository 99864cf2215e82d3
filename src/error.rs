//! Unified error type. Handlers return `Result<T>`; the error renders itself
//! as a JSON body with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::aggregates::{CartError, CategoryError, OrderError, ProductError};

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Missing or unknown user")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),
}

impl From<serde_json::Error> for EcommerceError {
    fn from(e: serde_json::Error) -> Self { Self::StorageError(e.to_string()) }
}

impl EcommerceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::Cart(CartError::ItemNotFound) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) | Self::Order(OrderError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Self::Product(ProductError::InsufficientInventory { .. }) => StatusCode::CONFLICT,
            Self::BadRequest(_) | Self::Product(_) | Self::Order(_) | Self::Cart(_) | Self::Category(_) => StatusCode::BAD_REQUEST,
            Self::StorageError(_) | Self::InvalidSeed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::StorageError(_) | Self::InvalidSeed(_) => {
                tracing::error!(error = %self, "request failed");
                json!({ "error": "Internal server error" })
            }
            Self::Validation(errors) => json!({ "error": self.to_string(), "details": errors }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
