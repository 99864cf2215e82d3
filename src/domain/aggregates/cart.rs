//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::category::slugify;
use crate::domain::aggregates::product::VariantSelection;
use crate::domain::value_objects::{Money, MoneyError};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    id: String,
    session_id: String,
    items: Vec<CartItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub line_id: String,
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub selection: VariantSelection,
    pub variant_label: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }

    /// Lines for the same product and resolved variant share an id, safe to use in a URL path.
    pub fn line_id_for(product_id: &str, selection: &VariantSelection) -> String {
        slugify(&format!("{product_id} {}", selection.key()))
    }
}

impl Cart {
    pub fn for_session(session_id: impl Into<String>, currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(), session_id: session_id.into(),
            items: vec![], subtotal: Money::zero(currency), currency: currency.to_string(),
            created_at: now, updated_at: now,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn quantity_of(&self, line_id: &str) -> u32 {
        self.items.iter().find(|i| i.line_id == line_id).map_or(0, |i| i.quantity)
    }

    /// Adds `item`, merging it into an existing line for the same variant.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.unit_price.currency() != self.currency {
            return Err(MoneyError::CurrencyMismatch.into());
        }
        if let Some(existing) = self.items.iter_mut().find(|i| i.line_id == item.line_id) {
            existing.quantity = existing.quantity.checked_add(item.quantity).ok_or(CartError::QuantityTooLarge)?;
            existing.unit_price = item.unit_price;
        } else {
            self.items.push(item);
        }
        self.recalculate()
    }

    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.line_id == line_id).ok_or(CartError::ItemNotFound)?;
        if quantity == 0 { self.items.retain(|i| i.line_id != line_id); }
        else { item.quantity = quantity; }
        self.recalculate()
    }

    pub fn remove_item(&mut self, line_id: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.line_id != line_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.recalculate()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.subtotal = Money::zero(&self.currency);
        self.updated_at = Utc::now();
    }

    fn recalculate(&mut self) -> Result<(), CartError> {
        let line_totals: Vec<Money> = self.items.iter().map(CartItem::line_total).collect();
        self.subtotal = Money::sum(&line_totals, &self.currency)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    #[error("Item not found")]
    ItemNotFound,
    #[error("Quantity too large")]
    QuantityTooLarge,
    #[error(transparent)]
    Money(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn widget(storage: &str, quantity: u32, price: i64) -> CartItem {
        let selection = VariantSelection { storage: Some(storage.into()), ..Default::default() };
        CartItem {
            line_id: CartItem::line_id_for("P1", &selection), product_id: "P1".into(), name: "Widget".into(), sku: "W1".into(),
            variant_label: storage.into(), selection, quantity, unit_price: Money::usd(Decimal::new(price, 0)),
        }
    }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::for_session("s1", "USD");
        cart.add_item(widget("128GB", 2, 10)).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.subtotal().amount(), Decimal::new(20, 0));
        cart.add_item(widget("128GB", 1, 10)).unwrap();
        assert_eq!(cart.items()[0].quantity, 3); // Merged
        cart.add_item(widget("256GB", 1, 15)).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.subtotal().amount(), Decimal::new(45, 0));
    }

    #[test]
    fn test_line_id_is_path_safe() {
        let selection = VariantSelection { color: Some("Space Gray".into()), storage: Some("256GB".into()), memory: None };
        assert_eq!(CartItem::line_id_for("p-mba-13", &selection), "p-mba-13-space-gray-256gb");
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::for_session("s1", "USD");
        let item = widget("128GB", 2, 10);
        let line_id = item.line_id.clone();
        cart.add_item(item).unwrap();
        cart.update_quantity(&line_id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().amount(), Decimal::ZERO);
        assert_eq!(cart.remove_item(&line_id), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_merge_overflow_is_rejected() {
        let mut cart = Cart::for_session("s1", "USD");
        cart.add_item(widget("128GB", 5, 10)).unwrap();
        assert_eq!(cart.add_item(widget("128GB", u32::MAX - 2, 10)), Err(CartError::QuantityTooLarge));
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_foreign_currency_line_is_rejected() {
        let mut cart = Cart::for_session("s1", "KHR");
        assert_eq!(cart.add_item(widget("128GB", 2, 10)), Err(CartError::Money(MoneyError::CurrencyMismatch)));
        assert!(cart.is_empty());
        assert!(cart.subtotal().is_zero());
    }
}
