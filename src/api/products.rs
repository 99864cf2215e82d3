//! Storefront catalog routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::catalog::{PaginatedResponse, ProductFilter, ProductSort};
use crate::domain::aggregates::{Category, Product, ProductImage, ProductStatus, StockLevel, VariantOptions, VariantQuote, VariantSelection};
use crate::domain::value_objects::Money;
use crate::error::{EcommerceError, Result};
use crate::store::CategorySummary;

/// Query string for catalog listings. `category` and `brand` take comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<ProductStatus>,
    pub stock_level: Option<StockLevel>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split(',').map(str::trim).filter(|v| !v.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

impl ProductQuery {
    pub async fn to_filter(&self, state: &AppState) -> ProductFilter {
        let categories = state.store.resolve_categories(&split_list(self.category.as_deref())).await;
        ProductFilter {
            search: self.search.clone(),
            categories,
            brands: split_list(self.brand.as_deref()),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            in_stock: self.in_stock,
            status: self.status,
            stock_level: self.stock_level,
        }
    }
}

/// Shopper-facing product; leaves out cost price.
#[derive(Clone, Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category_id: String,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub stock: u32,
    pub stock_level: StockLevel,
    pub rating: f32,
    pub review_count: u32,
    pub featured: bool,
    pub tags: Vec<String>,
    pub images: Vec<ProductImage>,
    pub variants: VariantOptions,
    pub created_at: DateTime<Utc>,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id().to_string(),
            sku: p.sku().to_string(),
            name: p.name().to_string(),
            description: p.description().to_string(),
            brand: p.brand().to_string(),
            category_id: p.category_id().to_string(),
            price: p.price().clone(),
            compare_at_price: p.compare_at_price().cloned(),
            stock: p.inventory().value(),
            stock_level: p.stock_level(),
            rating: p.rating(),
            review_count: p.review_count(),
            featured: p.is_featured(),
            tags: p.tags().to_vec(),
            images: p.images().to_vec(),
            variants: p.variants().clone(),
            created_at: p.created_at(),
        }
    }
}

pub async fn list_products(State(state): State<AppState>, Query(query): Query<ProductQuery>) -> Json<PaginatedResponse<ProductView>> {
    let filter = ProductFilter { status: Some(ProductStatus::Active), stock_level: None, ..query.to_filter(&state).await };
    let page = state.store.list_products(&filter, query.sort, query.page, query.per_page).await;
    Json(page.map(|p| ProductView::from(&p)))
}

pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ProductView>> {
    let product = state.store.get_product(&id).await?;
    if product.status() != ProductStatus::Active {
        return Err(EcommerceError::NotFound("Product"));
    }
    Ok(Json(ProductView::from(&product)))
}

pub async fn quote(State(state): State<AppState>, Path(id): Path<String>, Json(selection): Json<VariantSelection>) -> Result<Json<VariantQuote>> {
    Ok(Json(state.store.quote(&id, &selection).await?))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(state.store.categories().await)
}

pub async fn get_category(State(state): State<AppState>, Path(key): Path<String>) -> Result<Json<Category>> {
    Ok(Json(state.store.get_category(&key).await?))
}

pub async fn list_brands(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.brands().await)
}
