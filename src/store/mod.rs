//! In-memory application state.
//!
//! Each collection sits behind its own lock. Operations touching several of
//! them lock in the order catalog, orders, carts, checkout.

pub mod seed;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::catalog::{filter_products, paginate, sort_products, PaginatedResponse, ProductFilter, ProductSort};
use crate::checkout::{CheckoutData, CheckoutForm, CheckoutStore, CheckoutTotals, PaymentRequest, PaymentSimulator, ShippingRates};
use crate::domain::aggregates::{
    category::slugify, Cart, CartError, CartItem, Category, LineItem, Order, OrderStatus, Product, ProductError, ProductStatus, ProductUpdate,
    VariantOptions, VariantQuote, VariantSelection,
};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{Money, Sku};
use crate::error::{EcommerceError, Result};
use crate::orders::{filter_orders, sort_orders, summarize, DashboardSummary, OrderFilter, OrderSort};
use crate::permissions::{CurrentUser, Role, User};
use validator::Validate;

pub use seed::Seed;

const FIRST_ORDER_NUMBER: u64 = 1001;

#[derive(Debug, Default)]
struct Catalog { products: Vec<Product>, categories: Vec<Category> }

#[derive(Debug, Default)]
struct OrderBook { orders: Vec<Order>, next_number: u64 }

#[derive(Debug, Default)]
struct Access { roles: Vec<Role>, users: Vec<User> }

#[derive(Debug)]
pub struct Store {
    currency: String,
    shipping: ShippingRates,
    catalog: RwLock<Catalog>,
    orders: RwLock<OrderBook>,
    carts: RwLock<HashMap<String, Cart>>,
    checkout: RwLock<CheckoutStore>,
    access: RwLock<Access>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub brand: String,
    pub category_id: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub variants: VariantOptions,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: usize,
}

fn publish(events: Vec<DomainEvent>) {
    for event in events {
        event.log();
    }
}

impl Store {
    /// Builds the store from `seed`, which must be priced in `currency`.
    pub fn new(seed: Seed, currency: &str, shipping: ShippingRates) -> Result<Self> {
        seed.ensure_currency(currency)?;
        let next_number = seed.orders.iter().map(Order::order_number).max().map_or(FIRST_ORDER_NUMBER, |n| n + 1);
        tracing::info!(
            products = seed.products.len(),
            categories = seed.categories.len(),
            orders = seed.orders.len(),
            users = seed.users.len(),
            "store seeded"
        );
        Ok(Self {
            currency: currency.to_string(),
            shipping,
            catalog: RwLock::new(Catalog { products: seed.products, categories: seed.categories }),
            orders: RwLock::new(OrderBook { orders: seed.orders, next_number }),
            carts: RwLock::new(HashMap::new()),
            checkout: RwLock::new(CheckoutStore::default()),
            access: RwLock::new(Access { roles: seed.roles, users: seed.users }),
        })
    }

    pub fn currency(&self) -> &str { &self.currency }

    // --- catalog -----------------------------------------------------------

    /// Maps category slugs to ids; unknown keys pass through unchanged.
    pub async fn resolve_categories(&self, keys: &[String]) -> Vec<String> {
        let catalog = self.catalog.read().await;
        keys.iter()
            .map(|key| catalog.categories.iter().find(|c| c.matches(key)).map_or_else(|| key.clone(), |c| c.id().to_string()))
            .collect()
    }

    pub async fn list_products(&self, filter: &ProductFilter, sort: ProductSort, page: Option<u32>, per_page: Option<u32>) -> PaginatedResponse<Product> {
        let catalog = self.catalog.read().await;
        let mut matched = filter_products(&catalog.products, filter);
        sort_products(&mut matched, sort);
        paginate(matched.into_iter().cloned().collect(), page, per_page)
    }

    pub async fn brands(&self) -> Vec<String> {
        let catalog = self.catalog.read().await;
        let mut brands: Vec<String> = catalog.products.iter().map(|p| p.brand().to_string()).collect();
        brands.sort_by_key(|b| b.to_lowercase());
        brands.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        brands
    }

    pub async fn get_product(&self, id: &str) -> Result<Product> {
        let catalog = self.catalog.read().await;
        catalog.products.iter().find(|p| p.id() == id).cloned().ok_or(EcommerceError::NotFound("Product"))
    }

    pub async fn quote(&self, id: &str, selection: &VariantSelection) -> Result<VariantQuote> {
        let catalog = self.catalog.read().await;
        let product = catalog.products.iter()
            .find(|p| p.id() == id && p.status() == ProductStatus::Active)
            .ok_or(EcommerceError::NotFound("Product"))?;
        Ok(product.quote(selection)?)
    }

    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let mut catalog = self.catalog.write().await;
        let sku = Sku::new(new.sku).map_err(ProductError::from)?;
        if catalog.products.iter().any(|p| p.sku() == &sku) {
            return Err(EcommerceError::Conflict(format!("SKU {sku} already exists")));
        }
        if !catalog.categories.iter().any(|c| c.id() == new.category_id) {
            return Err(EcommerceError::NotFound("Category"));
        }
        if new.price.is_sign_negative() {
            return Err(ProductError::InvalidPrice.into());
        }
        let mut product = Product::create(sku, new.name, new.brand, new.category_id, Money::new(new.price, &self.currency))
            .with_description(new.description)
            .with_variants(new.variants);
        if new.stock > 0 {
            product.add_inventory(new.stock);
        }
        if new.publish {
            product.publish()?;
        }
        publish(product.take_events());
        catalog.products.push(product.clone());
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> Result<Product> {
        let mut catalog = self.catalog.write().await;
        if let Some(category_id) = &update.category_id {
            if !catalog.categories.iter().any(|c| c.id() == category_id.as_str()) {
                return Err(EcommerceError::NotFound("Category"));
            }
        }
        let product = catalog.products.iter_mut().find(|p| p.id() == id).ok_or(EcommerceError::NotFound("Product"))?;
        product.apply(update)?;
        publish(product.take_events());
        Ok(product.clone())
    }

    pub async fn set_product_status(&self, id: &str, status: ProductStatus) -> Result<Product> {
        let mut catalog = self.catalog.write().await;
        let product = catalog.products.iter_mut().find(|p| p.id() == id).ok_or(EcommerceError::NotFound("Product"))?;
        match status {
            ProductStatus::Active => product.publish()?,
            ProductStatus::Archived => product.archive(),
            ProductStatus::Draft => return Err(EcommerceError::BadRequest("Products cannot be moved back to draft".into())),
        }
        publish(product.take_events());
        Ok(product.clone())
    }

    /// Adds or removes stock; a negative `delta` cannot take stock below zero.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> Result<Product> {
        let mut catalog = self.catalog.write().await;
        let product = catalog.products.iter_mut().find(|p| p.id() == id).ok_or(EcommerceError::NotFound("Product"))?;
        let amount = u32::try_from(delta.unsigned_abs()).map_err(|_| EcommerceError::BadRequest("Stock adjustment too large".into()))?;
        if delta >= 0 { product.add_inventory(amount) } else { product.remove_inventory(amount)? }
        publish(product.take_events());
        Ok(product.clone())
    }

    pub async fn delete_product(&self, id: &str) -> Result<()> {
        let mut catalog = self.catalog.write().await;
        let before = catalog.products.len();
        catalog.products.retain(|p| p.id() != id);
        if catalog.products.len() == before { return Err(EcommerceError::NotFound("Product")); }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn categories(&self) -> Vec<CategorySummary> {
        let catalog = self.catalog.read().await;
        catalog.categories.iter()
            .map(|c| CategorySummary {
                category: c.clone(),
                product_count: catalog.products.iter().filter(|p| p.category_id() == c.id()).count(),
            })
            .collect()
    }

    pub async fn get_category(&self, key: &str) -> Result<Category> {
        let catalog = self.catalog.read().await;
        catalog.categories.iter().find(|c| c.matches(key)).cloned().ok_or(EcommerceError::NotFound("Category"))
    }

    pub async fn create_category(&self, name: &str, description: Option<String>, parent_id: Option<String>) -> Result<Category> {
        let mut catalog = self.catalog.write().await;
        if let Some(parent) = &parent_id {
            if !catalog.categories.iter().any(|c| c.id() == parent.as_str()) {
                return Err(EcommerceError::NotFound("Parent category"));
            }
        }
        let category = Category::create(name, description, parent_id)?;
        if catalog.categories.iter().any(|c| c.slug() == category.slug()) {
            return Err(EcommerceError::Conflict(format!("Category '{}' already exists", category.slug())));
        }
        tracing::info!(category_id = %category.id(), slug = %category.slug(), "category created");
        catalog.categories.push(category.clone());
        Ok(category)
    }

    pub async fn update_category(&self, id: &str, name: Option<&str>, description: Option<String>) -> Result<Category> {
        let mut catalog = self.catalog.write().await;
        if let Some(name) = name {
            let slug = slugify(name);
            if catalog.categories.iter().any(|c| c.id() != id && c.slug() == slug) {
                return Err(EcommerceError::Conflict(format!("Category '{slug}' already exists")));
            }
        }
        let category = catalog.categories.iter_mut().find(|c| c.id() == id).ok_or(EcommerceError::NotFound("Category"))?;
        if let Some(name) = name { category.rename(name)?; }
        if description.is_some() { category.set_description(description); }
        Ok(category.clone())
    }

    pub async fn delete_category(&self, id: &str) -> Result<()> {
        let mut catalog = self.catalog.write().await;
        if catalog.products.iter().any(|p| p.category_id() == id) {
            return Err(EcommerceError::Conflict("Category still has products".into()));
        }
        if catalog.categories.iter().any(|c| c.parent_id() == Some(id)) {
            return Err(EcommerceError::Conflict("Category still has subcategories".into()));
        }
        let before = catalog.categories.len();
        catalog.categories.retain(|c| c.id() != id);
        if catalog.categories.len() == before { return Err(EcommerceError::NotFound("Category")); }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    // --- carts -------------------------------------------------------------

    pub async fn cart(&self, session: &str) -> Cart {
        let carts = self.carts.read().await;
        carts.get(session).cloned().unwrap_or_else(|| Cart::for_session(session, &self.currency))
    }

    pub async fn add_to_cart(&self, session: &str, product_id: &str, selection: &VariantSelection, quantity: u32) -> Result<Cart> {
        if quantity == 0 { return Err(EcommerceError::BadRequest("Quantity must be at least 1".into())); }
        let catalog = self.catalog.read().await;
        let product = catalog.products.iter()
            .find(|p| p.id() == product_id && p.status() == ProductStatus::Active)
            .ok_or(EcommerceError::NotFound("Product"))?;
        let quote = product.quote(selection)?;
        let line_id = CartItem::line_id_for(product_id, &quote.selection);

        let mut carts = self.carts.write().await;
        let cart = carts.entry(session.to_string()).or_insert_with(|| Cart::for_session(session, &self.currency));
        let requested = cart.quantity_of(&line_id).checked_add(quantity).ok_or(CartError::QuantityTooLarge)?;
        if requested > quote.stock {
            return Err(ProductError::InsufficientInventory { available: quote.stock, requested }.into());
        }
        cart.add_item(CartItem {
            line_id,
            product_id: product_id.to_string(),
            name: product.name().to_string(),
            sku: product.sku().to_string(),
            selection: quote.selection,
            variant_label: quote.label,
            quantity,
            unit_price: quote.unit_price,
        })?;
        tracing::debug!(%session, %product_id, quantity, "added to cart");
        Ok(cart.clone())
    }

    pub async fn update_cart_item(&self, session: &str, line_id: &str, quantity: u32) -> Result<Cart> {
        let catalog = self.catalog.read().await;
        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(session).ok_or(EcommerceError::NotFound("Cart"))?;
        if quantity > 0 {
            let item = cart.items().iter().find(|i| i.line_id == line_id).ok_or(CartError::ItemNotFound)?;
            let product = catalog.products.iter().find(|p| p.id() == item.product_id).ok_or(EcommerceError::NotFound("Product"))?;
            let quote = product.quote(&item.selection)?;
            if quantity > quote.stock {
                return Err(ProductError::InsufficientInventory { available: quote.stock, requested: quantity }.into());
            }
        }
        cart.update_quantity(line_id, quantity)?;
        Ok(cart.clone())
    }

    pub async fn remove_cart_item(&self, session: &str, line_id: &str) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(session).ok_or(EcommerceError::NotFound("Cart"))?;
        cart.remove_item(line_id)?;
        Ok(cart.clone())
    }

    pub async fn clear_cart(&self, session: &str) {
        let mut carts = self.carts.write().await;
        if let Some(cart) = carts.get_mut(session) {
            cart.clear();
        }
    }

    // --- checkout ----------------------------------------------------------

    /// Validates the form, re-prices the cart and stores the checkout blob.
    pub async fn begin_checkout(&self, session: &str, form: CheckoutForm) -> Result<CheckoutData> {
        form.validate()?;
        let catalog = self.catalog.read().await;
        let carts = self.carts.read().await;
        let cart = carts.get(session).filter(|c| !c.is_empty()).ok_or_else(|| EcommerceError::BadRequest("Cart is empty".into()))?;

        let mut items = Vec::with_capacity(cart.items().len());
        for item in cart.items() {
            let product = catalog.products.iter().find(|p| p.id() == item.product_id).ok_or(EcommerceError::NotFound("Product"))?;
            let quote = product.quote(&item.selection)?;
            if item.quantity > quote.stock {
                return Err(ProductError::InsufficientInventory { available: quote.stock, requested: item.quantity }.into());
            }
            items.push(CartItem { unit_price: quote.unit_price, ..item.clone() });
        }
        let line_totals: Vec<Money> = items.iter().map(CartItem::line_total).collect();
        let subtotal = Money::sum(&line_totals, &self.currency).map_err(|e| EcommerceError::BadRequest(e.to_string()))?;
        let totals = CheckoutTotals::compute(&subtotal, form.shipping_method, &self.shipping);
        let data = CheckoutData {
            session_id: session.to_string(),
            customer: form.customer,
            shipping_address: form.shipping_address,
            shipping_method: form.shipping_method,
            items,
            totals,
            created_at: Utc::now(),
        };
        drop(carts);
        drop(catalog);

        self.checkout.write().await.save(&data)?;
        tracing::info!(%session, total = %data.totals.total, "checkout started");
        Ok(data)
    }

    pub async fn checkout_data(&self, session: &str) -> Result<CheckoutData> {
        self.checkout.read().await.load(session)?.ok_or(EcommerceError::NotFound("Checkout"))
    }

    /// Charges the stored checkout, then turns it into an order.
    ///
    /// The checkout blob is taken out before charging so a session can only
    /// be paid once; it is put back when the charge or the order fails.
    pub async fn pay(&self, session: &str, request: &PaymentRequest, payments: &PaymentSimulator) -> Result<Order> {
        let data = self.checkout.write().await.take(session)?.ok_or(EcommerceError::NotFound("Checkout"))?;
        match self.settle(&data, request, payments).await {
            Ok(order) => Ok(order),
            Err(err) => {
                self.checkout.write().await.save(&data)?;
                Err(err)
            }
        }
    }

    async fn settle(&self, data: &CheckoutData, request: &PaymentRequest, payments: &PaymentSimulator) -> Result<Order> {
        let receipt = payments.charge(request, &data.totals.total).await?;

        let mut catalog = self.catalog.write().await;
        let mut book = self.orders.write().await;

        // Reserve against copies so a failing line leaves stock untouched.
        let mut reserved: HashMap<usize, Product> = HashMap::new();
        let mut lines = Vec::with_capacity(data.items.len());
        for item in &data.items {
            let idx = catalog.products.iter().position(|p| p.id() == item.product_id).ok_or(EcommerceError::NotFound("Product"))?;
            let product = reserved.entry(idx).or_insert_with(|| catalog.products[idx].clone());
            let quote = product.reserve(&item.selection, item.quantity)?;
            lines.push(LineItem {
                id: item.line_id.clone(),
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                sku: item.sku.clone(),
                variant: Some(quote.label).filter(|l| !l.is_empty()),
                quantity: item.quantity,
                total: item.unit_price.multiply(item.quantity),
                unit_price: item.unit_price.clone(),
            });
        }

        let mut order = Order::create(
            book.next_number,
            data.customer.to_customer(),
            (&data.shipping_address).into(),
            receipt.method,
            data.shipping_method,
            &self.currency,
        );
        for line in lines {
            order.add_item(line)?;
        }
        order.set_shipping(data.totals.shipping.clone())?;
        order.place()?;
        if receipt.captured {
            order.mark_paid(&receipt.transaction_id);
        }

        for (idx, mut product) in reserved {
            publish(product.take_events());
            catalog.products[idx] = product;
        }
        publish(order.take_events());
        book.next_number += 1;
        book.orders.push(order.clone());

        self.carts.write().await.remove(&data.session_id);
        Ok(order)
    }

    // --- orders ------------------------------------------------------------

    pub async fn list_orders(&self, filter: &OrderFilter, sort: OrderSort, page: Option<u32>, per_page: Option<u32>) -> PaginatedResponse<Order> {
        let book = self.orders.read().await;
        let mut matched = filter_orders(&book.orders, filter);
        sort_orders(&mut matched, sort);
        paginate(matched.into_iter().cloned().collect(), page, per_page)
    }

    pub async fn get_order(&self, id: &str) -> Result<Order> {
        let book = self.orders.read().await;
        book.orders.iter().find(|o| o.id() == id || o.display_number().eq_ignore_ascii_case(id)).cloned().ok_or(EcommerceError::NotFound("Order"))
    }

    /// Applies `change` to the order and logs whatever events it raised.
    pub async fn update_order<F>(&self, id: &str, change: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> Result<()>,
    {
        let mut book = self.orders.write().await;
        let order = book.orders.iter_mut().find(|o| o.id() == id).ok_or(EcommerceError::NotFound("Order"))?;
        let mut draft = order.clone();
        change(&mut draft)?;
        publish(draft.take_events());
        *order = draft;
        Ok(order.clone())
    }

    pub async fn transition_order(&self, id: &str, status: OrderStatus, message: Option<String>) -> Result<Order> {
        self.update_order(id, |order| {
            let message = message.unwrap_or_else(|| format!("Order {status}"));
            Ok(order.transition(status, message)?)
        })
        .await
    }

    pub async fn delete_order(&self, id: &str) -> Result<()> {
        let mut book = self.orders.write().await;
        let before = book.orders.len();
        book.orders.retain(|o| o.id() != id);
        if book.orders.len() == before { return Err(EcommerceError::NotFound("Order")); }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    pub async fn dashboard(&self) -> DashboardSummary {
        let catalog = self.catalog.read().await;
        let book = self.orders.read().await;
        summarize(&book.orders, &catalog.products)
    }

    // --- access ------------------------------------------------------------

    pub async fn current_user(&self, user_id: &str) -> Option<CurrentUser> {
        let access = self.access.read().await;
        access.users.iter().find(|u| u.id == user_id).and_then(|u| CurrentUser::resolve(u, &access.roles))
    }

    pub async fn roles(&self) -> Vec<Role> { self.access.read().await.roles.clone() }

    pub async fn users(&self) -> Vec<User> { self.access.read().await.users.clone() }

    pub async fn set_user_role(&self, user_id: &str, role: &str) -> Result<User> {
        let mut access = self.access.write().await;
        let role = access.roles.iter().find(|r| r.name.eq_ignore_ascii_case(role)).map(|r| r.name.clone()).ok_or(EcommerceError::NotFound("Role"))?;
        let user = access.users.iter_mut().find(|u| u.id == user_id).ok_or(EcommerceError::NotFound("User"))?;
        tracing::info!(user_id = %user.id, from = %user.role, to = %role, "user role changed");
        user.role = role;
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{CustomerInfo, ShippingAddress};
    use crate::domain::aggregates::{PaymentMethod, PaymentStatus, ShippingMethod};
    use std::time::Duration;

    fn store() -> Store { Store::new(Seed::bundled().unwrap(), "USD", ShippingRates::default()).unwrap() }

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer: CustomerInfo { first_name: "Sok".into(), last_name: "Dara".into(), email: "dara@example.com".into(), phone: "012345678".into() },
            shipping_address: ShippingAddress { street: "1 Street 51".into(), city: "Phnom Penh".into(), state: None, postal_code: "12000".into(), country: "Cambodia".into() },
            shipping_method: ShippingMethod::Standard,
        }
    }

    async fn first_product(store: &Store) -> Product {
        store.list_products(&ProductFilter { in_stock: true, ..Default::default() }, ProductSort::PriceAsc, None, None).await.data.remove(0)
    }

    #[tokio::test]
    async fn test_add_to_cart_respects_stock() {
        let store = store();
        let product = first_product(&store).await;
        let quote = store.quote(product.id(), &VariantSelection::default()).await.unwrap();
        store.add_to_cart("s1", product.id(), &VariantSelection::default(), quote.stock).await.unwrap();
        let err = store.add_to_cart("s1", product.id(), &VariantSelection::default(), 1).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Product(_)));
        assert_eq!(store.cart("s1").await.item_count(), quote.stock);
    }

    #[tokio::test]
    async fn test_checkout_and_pay_creates_order_and_clears_state() {
        let store = store();
        let product = first_product(&store).await;
        let stock_before = product.inventory().value();
        store.add_to_cart("s1", product.id(), &VariantSelection::default(), 1).await.unwrap();

        let data = store.begin_checkout("s1", form()).await.unwrap();
        assert_eq!(data.totals.total, data.totals.subtotal.add(&data.totals.shipping).unwrap());
        assert_eq!(store.checkout_data("s1").await.unwrap(), data);

        let payments = PaymentSimulator::new(Duration::ZERO);
        let order = store.pay("s1", &PaymentRequest { method: PaymentMethod::AbaPay, card: None }, &payments).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.total(), &data.totals.total);

        assert!(matches!(store.checkout_data("s1").await, Err(EcommerceError::NotFound(_))));
        assert!(store.cart("s1").await.is_empty());
        assert_eq!(store.get_product(product.id()).await.unwrap().inventory().value(), stock_before - 1);
        assert_eq!(store.get_order(&order.display_number()).await.unwrap().id(), order.id());
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let err = store().begin_checkout("nobody", form()).await.unwrap_err();
        assert!(matches!(err, EcommerceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_category_in_use_conflicts() {
        let store = store();
        let product = first_product(&store).await;
        let err = store.delete_category(product.category_id()).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Conflict(_)));
        let created = store.create_category("Smart Home", None, None).await.unwrap();
        assert!(matches!(store.create_category("smart home", None, None).await, Err(EcommerceError::Conflict(_))));
        store.delete_category(created.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_order_untouched() {
        let store = store();
        let order = store.list_orders(&OrderFilter { status: Some(OrderStatus::Delivered), ..Default::default() }, OrderSort::default(), None, None).await.data.remove(0);
        let err = store.transition_order(order.id(), OrderStatus::Shipped, None).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Order(_)));
        assert_eq!(store.get_order(order.id()).await.unwrap().timeline().len(), order.timeline().len());
    }

    #[tokio::test]
    async fn test_set_user_role() {
        let store = store();
        let user = store.users().await.into_iter().find(|u| u.role == "viewer").unwrap();
        store.set_user_role(&user.id, "Manager").await.unwrap();
        assert_eq!(store.current_user(&user.id).await.unwrap().role.level, 60);
        assert!(matches!(store.set_user_role(&user.id, "owner").await, Err(EcommerceError::NotFound("Role"))));
    }

    async fn ready_checkout(store: &Store, session: &str) -> Product {
        let product = first_product(store).await;
        store.add_to_cart(session, product.id(), &VariantSelection::default(), 1).await.unwrap();
        store.begin_checkout(session, form()).await.unwrap();
        product
    }

    #[tokio::test]
    async fn test_concurrent_payments_create_one_order() {
        let store = store();
        let product = ready_checkout(&store, "s1").await;
        let stock_before = product.inventory().value();
        let orders_before = store.list_orders(&OrderFilter::default(), OrderSort::default(), None, None).await.total;

        let payments = PaymentSimulator::new(Duration::from_millis(20));
        let request = PaymentRequest { method: PaymentMethod::AbaPay, card: None };
        let (first, second) = tokio::join!(store.pay("s1", &request, &payments), store.pay("s1", &request, &payments));
        assert_eq!(u8::from(first.is_ok()) + u8::from(second.is_ok()), 1);
        assert!(matches!(first.err().or(second.err()), Some(EcommerceError::NotFound("Checkout"))));

        assert_eq!(store.get_product(product.id()).await.unwrap().inventory().value(), stock_before - 1);
        assert_eq!(store.list_orders(&OrderFilter::default(), OrderSort::default(), None, None).await.total, orders_before + 1);
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_checkout() {
        let store = store();
        ready_checkout(&store, "s1").await;
        let payments = PaymentSimulator::new(Duration::ZERO);
        let err = store.pay("s1", &PaymentRequest { method: PaymentMethod::Card, card: None }, &payments).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Validation(_)));
        assert!(store.checkout_data("s1").await.is_ok());
        assert!(!store.cart("s1").await.is_empty());
    }

    #[tokio::test]
    async fn test_cash_on_delivery_leaves_payment_pending() {
        let store = store();
        ready_checkout(&store, "s1").await;
        let payments = PaymentSimulator::new(Duration::ZERO);
        let order = store.pay("s1", &PaymentRequest { method: PaymentMethod::CashOnDelivery, card: None }, &payments).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.payment().method, PaymentMethod::CashOnDelivery);
        assert!(order.payment().transaction_id.is_none());
        assert!(order.payment().paid_at.is_none());
    }

    #[tokio::test]
    async fn test_cart_quantity_overflow_is_rejected() {
        let store = store();
        let product = first_product(&store).await;
        store.add_to_cart("s1", product.id(), &VariantSelection::default(), 5).await.unwrap();
        let err = store.add_to_cart("s1", product.id(), &VariantSelection::default(), u32::MAX - 2).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Cart(CartError::QuantityTooLarge)));
        assert_eq!(store.cart("s1").await.item_count(), 5);
    }

    #[tokio::test]
    async fn test_quote_hides_inactive_products() {
        let store = store();
        let product = first_product(&store).await;
        store.set_product_status(product.id(), ProductStatus::Archived).await.unwrap();
        let err = store.quote(product.id(), &VariantSelection::default()).await.unwrap_err();
        assert!(matches!(err, EcommerceError::NotFound("Product")));
    }

    #[test]
    fn test_store_rejects_seed_in_other_currency() {
        let err = Store::new(Seed::bundled().unwrap(), "KHR", ShippingRates::default()).unwrap_err();
        assert!(matches!(err, EcommerceError::InvalidSeed(_)));
    }
}
