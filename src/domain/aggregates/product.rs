//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{Sku, SkuError, Money, Quantity};
use crate::domain::events::{DomainEvent, ProductEvent};

const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    id: String,
    sku: Sku,
    name: String,
    #[serde(default)]
    description: String,
    brand: String,
    category_id: String,
    price: Money,
    #[serde(default)]
    compare_at_price: Option<Money>,
    #[serde(default)]
    cost_price: Option<Money>,
    #[serde(default)]
    stock: Quantity,
    #[serde(default = "default_low_stock_threshold")]
    low_stock_threshold: u32,
    #[serde(default)]
    rating: f32,
    #[serde(default)]
    review_count: u32,
    #[serde(default)]
    status: ProductStatus,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    images: Vec<ProductImage>,
    #[serde(default)]
    variants: VariantOptions,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

fn default_low_stock_threshold() -> u32 { DEFAULT_LOW_STOCK_THRESHOLD }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductImage { pub url: String, #[serde(default)] pub alt: Option<String>, #[serde(default)] pub position: u32 }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus { #[default] Draft, Active, Archived }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel { InStock, LowStock, OutOfStock }

/// A selectable option in one variant dimension, e.g. "256GB" storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantOption {
    pub name: String,
    #[serde(default)]
    pub price_delta: Decimal,
    pub stock: u32,
}

/// Flat option lists per dimension. An empty list means the product does not vary on it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantOptions {
    #[serde(default)]
    pub colors: Vec<VariantOption>,
    #[serde(default)]
    pub storage: Vec<VariantOption>,
    #[serde(default)]
    pub memory: Vec<VariantOption>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind { Color, Storage, Memory }

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::Color => write!(f, "color"), Self::Storage => write!(f, "storage"), Self::Memory => write!(f, "memory") }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSelection {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
}

impl VariantSelection {
    fn get(&self, kind: VariantKind) -> Option<&str> {
        match kind {
            VariantKind::Color => self.color.as_deref(),
            VariantKind::Storage => self.storage.as_deref(),
            VariantKind::Memory => self.memory.as_deref(),
        }
    }

    fn set(&mut self, kind: VariantKind, name: String) {
        match kind {
            VariantKind::Color => self.color = Some(name),
            VariantKind::Storage => self.storage = Some(name),
            VariantKind::Memory => self.memory = Some(name),
        }
    }

    /// Stable identity for the selection, used to merge cart lines.
    pub fn key(&self) -> String {
        [&self.color, &self.storage, &self.memory]
            .iter()
            .map(|o| o.as_deref().unwrap_or("-"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl VariantOptions {
    fn dimension(&self, kind: VariantKind) -> &[VariantOption] {
        match kind {
            VariantKind::Color => &self.colors,
            VariantKind::Storage => &self.storage,
            VariantKind::Memory => &self.memory,
        }
    }

    fn dimension_mut(&mut self, kind: VariantKind) -> &mut Vec<VariantOption> {
        match kind {
            VariantKind::Color => &mut self.colors,
            VariantKind::Storage => &mut self.storage,
            VariantKind::Memory => &mut self.memory,
        }
    }

    pub fn is_empty(&self) -> bool { self.colors.is_empty() && self.storage.is_empty() && self.memory.is_empty() }
}

const VARIANT_KINDS: [VariantKind; 3] = [VariantKind::Color, VariantKind::Storage, VariantKind::Memory];

/// Resolved price and availability for one variant selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariantQuote {
    pub product_id: String,
    pub selection: VariantSelection,
    pub label: String,
    pub unit_price: Money,
    pub stock: u32,
}

/// Admin patch; absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category_id: Option<String>,
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub low_stock_threshold: Option<u32>,
    pub featured: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub variants: Option<VariantOptions>,
}

impl Product {
    pub fn create(sku: Sku, name: impl Into<String>, brand: impl Into<String>, category_id: impl Into<String>, price: Money) -> Self {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();
        let mut product = Self {
            id: id.clone(), sku: sku.clone(), name: name.into(), description: String::new(),
            brand: brand.into(), category_id: category_id.into(), price, compare_at_price: None, cost_price: None,
            stock: Quantity::default(), low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD, rating: 0.0, review_count: 0,
            status: ProductStatus::Draft, featured: false, tags: vec![], images: vec![],
            variants: VariantOptions::default(), created_at: now, updated_at: now, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, sku }));
        product
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn sku(&self) -> &Sku { &self.sku }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn brand(&self) -> &str { &self.brand }
    pub fn category_id(&self) -> &str { &self.category_id }
    pub fn price(&self) -> &Money { &self.price }
    pub fn compare_at_price(&self) -> Option<&Money> { self.compare_at_price.as_ref() }
    pub fn cost_price(&self) -> Option<&Money> { self.cost_price.as_ref() }
    pub fn inventory(&self) -> Quantity { self.stock }
    pub fn low_stock_threshold(&self) -> u32 { self.low_stock_threshold }
    pub fn rating(&self) -> f32 { self.rating }
    pub fn review_count(&self) -> u32 { self.review_count }
    pub fn status(&self) -> ProductStatus { self.status }
    pub fn is_featured(&self) -> bool { self.featured }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn images(&self) -> &[ProductImage] { &self.images }
    pub fn variants(&self) -> &VariantOptions { &self.variants }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_in_stock(&self) -> bool { !self.stock.is_zero() }

    pub fn stock_level(&self) -> StockLevel {
        match self.stock.value() {
            0 => StockLevel::OutOfStock,
            n if n <= self.low_stock_threshold => StockLevel::LowStock,
            _ => StockLevel::InStock,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn with_variants(mut self, variants: VariantOptions) -> Self { self.variants = variants; self }

    pub fn publish(&mut self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        self.status = ProductStatus::Active;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Published { product_id: self.id.clone() }));
        Ok(())
    }

    pub fn archive(&mut self) {
        self.status = ProductStatus::Archived;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Archived { product_id: self.id.clone() }));
    }

    pub fn update_price(&mut self, new_price: Money) {
        self.raise_event(DomainEvent::Product(ProductEvent::PriceChanged { product_id: self.id.clone(), price: new_price.amount() }));
        self.price = new_price;
        self.touch();
    }

    pub fn apply(&mut self, update: ProductUpdate) -> Result<(), ProductError> {
        let currency = self.price.currency().to_string();
        if [update.price, update.compare_at_price, update.cost_price].iter().flatten().any(|p| p.is_sign_negative()) {
            return Err(ProductError::InvalidPrice);
        }
        if let Some(name) = update.name {
            if name.trim().is_empty() { return Err(ProductError::MissingName); }
            self.name = name;
        }
        if let Some(description) = update.description { self.description = description; }
        if let Some(brand) = update.brand { self.brand = brand; }
        if let Some(category_id) = update.category_id { self.category_id = category_id; }
        if let Some(price) = update.price { self.update_price(Money::new(price, &currency)); }
        if let Some(price) = update.compare_at_price { self.compare_at_price = Some(Money::new(price, &currency)); }
        if let Some(price) = update.cost_price { self.cost_price = Some(Money::new(price, &currency)); }
        if let Some(threshold) = update.low_stock_threshold { self.low_stock_threshold = threshold; }
        if let Some(featured) = update.featured { self.featured = featured; }
        if let Some(tags) = update.tags { self.tags = tags; }
        if let Some(variants) = update.variants { self.variants = variants; }
        self.touch();
        Ok(())
    }

    pub fn add_inventory(&mut self, qty: u32) {
        self.stock = self.stock.add(qty);
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::InventoryAdded { product_id: self.id.clone(), quantity: qty }));
    }

    pub fn remove_inventory(&mut self, qty: u32) -> Result<(), ProductError> {
        self.stock = self.stock.subtract(qty).ok_or(ProductError::InsufficientInventory { available: self.stock.value(), requested: qty })?;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::InventoryRemoved { product_id: self.id.clone(), quantity: qty }));
        Ok(())
    }

    /// Resolves the selected options, defaulting each varying dimension to its first option.
    pub fn quote(&self, selection: &VariantSelection) -> Result<VariantQuote, ProductError> {
        let mut resolved = VariantSelection::default();
        let mut delta = Decimal::ZERO;
        let mut stock = self.stock.value();
        let mut names = Vec::new();

        for kind in VARIANT_KINDS {
            let options = self.variants.dimension(kind);
            let chosen = match selection.get(kind) {
                Some(name) => options
                    .iter()
                    .find(|o| o.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| ProductError::UnknownVariant { kind, name: name.to_string() })?,
                None => match options.first() {
                    Some(first) => first,
                    None => continue,
                },
            };
            delta += chosen.price_delta;
            stock = stock.min(chosen.stock);
            names.push(chosen.name.clone());
            resolved.set(kind, chosen.name.clone());
        }

        Ok(VariantQuote {
            product_id: self.id.clone(),
            selection: resolved,
            label: names.join(" / "),
            unit_price: self.price.plus(delta),
            stock,
        })
    }

    /// Takes `qty` units of the resolved variant out of stock.
    pub fn reserve(&mut self, selection: &VariantSelection, qty: u32) -> Result<VariantQuote, ProductError> {
        let quote = self.quote(selection)?;
        if qty > quote.stock {
            return Err(ProductError::InsufficientInventory { available: quote.stock, requested: qty });
        }
        for kind in VARIANT_KINDS {
            if let Some(name) = quote.selection.get(kind) {
                if let Some(option) = self.variants.dimension_mut(kind).iter_mut().find(|o| o.name == name) {
                    option.stock -= qty;
                }
            }
        }
        self.remove_inventory(qty)?;
        Ok(quote)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductError {
    #[error("Missing name")]
    MissingName,
    #[error("Prices must not be negative")]
    InvalidPrice,
    #[error("Insufficient inventory: {available} available, {requested} requested")]
    InsufficientInventory { available: u32, requested: u32 },
    #[error("Unknown {kind} option '{name}'")]
    UnknownVariant { kind: VariantKind, name: String },
    #[error(transparent)]
    Sku(#[from] SkuError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str, delta: i64, stock: u32) -> VariantOption {
        VariantOption { name: name.into(), price_delta: Decimal::new(delta, 0), stock }
    }

    fn phone() -> Product {
        let mut p = Product::create(Sku::new("IPH-15").unwrap(), "iPhone 15", "Apple", "phones", Money::usd(Decimal::new(799, 0)))
            .with_variants(VariantOptions {
                colors: vec![option("Black", 0, 10), option("Blue", 0, 2)],
                storage: vec![option("128GB", 0, 8), option("256GB", 100, 3)],
                memory: vec![],
            });
        p.add_inventory(20);
        p
    }

    #[test]
    fn test_product_create() {
        let mut p = Product::create(Sku::new("TEST-001").unwrap(), "Test Product", "Acme", "misc", Money::usd(Decimal::new(1999, 2)));
        assert_eq!(p.name(), "Test Product");
        assert_eq!(p.status(), ProductStatus::Draft);
        assert!(matches!(p.take_events().as_slice(), [DomainEvent::Product(ProductEvent::Created { .. })]));
    }

    #[test]
    fn test_inventory() {
        let mut p = Product::create(Sku::new("TEST").unwrap(), "P", "Acme", "misc", Money::usd(Decimal::new(10, 0)));
        p.add_inventory(10);
        assert!(p.is_in_stock());
        p.remove_inventory(5).unwrap();
        assert_eq!(p.inventory().value(), 5);
        assert_eq!(p.stock_level(), StockLevel::LowStock);
        assert_eq!(p.remove_inventory(6), Err(ProductError::InsufficientInventory { available: 5, requested: 6 }));
    }

    #[test]
    fn test_quote_defaults_to_first_option() {
        let quote = phone().quote(&VariantSelection::default()).unwrap();
        assert_eq!(quote.selection.color.as_deref(), Some("Black"));
        assert_eq!(quote.selection.storage.as_deref(), Some("128GB"));
        assert_eq!(quote.selection.memory, None);
        assert_eq!(quote.label, "Black / 128GB");
        assert_eq!(quote.unit_price.amount(), Decimal::new(799, 0));
        assert_eq!(quote.stock, 8);
    }

    #[test]
    fn test_quote_adds_deltas_and_takes_min_stock() {
        let selection = VariantSelection { color: Some("blue".into()), storage: Some("256GB".into()), memory: None };
        let quote = phone().quote(&selection).unwrap();
        assert_eq!(quote.unit_price.amount(), Decimal::new(899, 0));
        assert_eq!(quote.stock, 2);
    }

    #[test]
    fn test_quote_rejects_unknown_option() {
        let selection = VariantSelection { storage: Some("1TB".into()), ..Default::default() };
        assert!(matches!(phone().quote(&selection), Err(ProductError::UnknownVariant { kind: VariantKind::Storage, .. })));
    }

    #[test]
    fn test_reserve_decrements_product_and_options() {
        let mut p = phone();
        let selection = VariantSelection { storage: Some("256GB".into()), ..Default::default() };
        p.reserve(&selection, 2).unwrap();
        assert_eq!(p.inventory().value(), 18);
        assert_eq!(p.variants().storage[1].stock, 1);
        assert_eq!(p.variants().colors[0].stock, 8);
        assert!(matches!(p.reserve(&selection, 2), Err(ProductError::InsufficientInventory { available: 1, requested: 2 })));
    }

    #[test]
    fn test_apply_rejects_negative_price() {
        let mut p = phone();
        let update = ProductUpdate { price: Some(Decimal::new(-1, 0)), ..Default::default() };
        assert_eq!(p.apply(update), Err(ProductError::InvalidPrice));
        let update = ProductUpdate { price: Some(Decimal::new(749, 0)), featured: Some(true), ..Default::default() };
        p.apply(update).unwrap();
        assert_eq!(p.price().amount(), Decimal::new(749, 0));
        assert!(p.is_featured());
    }
}
