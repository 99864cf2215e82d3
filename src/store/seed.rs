//! Mock dataset the store starts from.

use serde::Deserialize;
use std::path::Path;

use crate::domain::aggregates::{Category, Order, Product};
use crate::error::{EcommerceError, Result};
use crate::permissions::{Role, User};

const BUNDLED: &str = include_str!("../../data/seed.json");

#[derive(Debug, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Seed {
    pub fn bundled() -> Result<Self> { Ok(serde_json::from_str(BUNDLED)?) }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| EcommerceError::StorageError(format!("{}: {e}", path.display())))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Fails unless every product and order is priced in `currency`.
    pub fn ensure_currency(&self, currency: &str) -> Result<()> {
        let product_prices = self.products.iter().flat_map(|p| {
            std::iter::once(p.price()).chain(p.compare_at_price()).chain(p.cost_price()).map(move |m| (p.sku().as_str(), m))
        });
        let order_totals = self.orders.iter().flat_map(|o| {
            o.items().iter().map(|i| &i.unit_price).chain([o.subtotal(), o.shipping(), o.total()]).map(move |m| (o.id(), m))
        });
        match product_prices.chain(order_totals).find(|(_, m)| m.currency() != currency) {
            Some((owner, money)) => Err(EcommerceError::InvalidSeed(format!(
                "{owner} is priced in {}, but the store currency is {currency}",
                money.currency()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::ProductStatus;

    #[test]
    fn test_currency_must_match_seed() {
        let seed = Seed::bundled().unwrap();
        assert!(seed.ensure_currency("USD").is_ok());
        assert!(matches!(seed.ensure_currency("KHR"), Err(EcommerceError::InvalidSeed(_))));
    }

    #[test]
    fn test_bundled_seed_is_consistent() {
        let seed = Seed::bundled().unwrap();
        assert!(!seed.products.is_empty());
        assert!(!seed.orders.is_empty());
        for product in &seed.products {
            assert!(seed.categories.iter().any(|c| c.id() == product.category_id()), "{} has unknown category", product.name());
            assert_eq!(product.status(), ProductStatus::Active);
        }
        for user in &seed.users {
            assert!(seed.roles.iter().any(|r| r.name == user.role), "{} has unknown role", user.id);
        }
        for order in &seed.orders {
            let shipping_plus_subtotal = order.subtotal().add(order.shipping()).unwrap();
            assert_eq!(&shipping_plus_subtotal, order.total(), "{}", order.display_number());
        }
    }
}
