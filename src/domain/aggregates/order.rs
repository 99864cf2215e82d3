//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{Money, MoneyError};
use crate::domain::events::{DomainEvent, OrderEvent};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    id: String,
    order_number: u64,
    customer: Customer,
    status: OrderStatus,
    payment_status: PaymentStatus,
    fulfillment_status: FulfillmentStatus,
    items: Vec<LineItem>,
    subtotal: Money,
    shipping: Money,
    #[serde(default)]
    tax: Money,
    #[serde(default)]
    discount: Money,
    total: Money,
    shipping_address: Address,
    #[serde(default)]
    billing_address: Option<Address>,
    payment: PaymentInfo,
    shipping_info: ShippingInfo,
    #[serde(default)]
    timeline: Vec<TimelineEntry>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer { #[serde(default)] pub id: Option<String>, pub name: String, pub email: String, #[serde(default)] pub phone: Option<String> }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem { pub id: String, pub product_id: String, pub name: String, pub sku: String, #[serde(default)] pub variant: Option<String>, pub quantity: u32, pub unit_price: Money, pub total: Money }

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address { pub street: String, pub city: String, #[serde(default)] pub state: Option<String>, pub postal_code: String, pub country: String }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo { pub method: PaymentMethod, #[serde(default)] pub transaction_id: Option<String>, #[serde(default)] pub paid_at: Option<DateTime<Utc>> }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo { pub method: ShippingMethod, #[serde(default)] pub carrier: Option<String>, #[serde(default)] pub tracking_number: Option<String> }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry { pub status: OrderStatus, pub message: String, pub at: DateTime<Utc> }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled, Refunded }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus { #[default] Unfulfilled, Partial, Fulfilled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { Card, AbaPay, CashOnDelivery }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod { #[default] Standard, Express }

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        Self::Pending, Self::Confirmed, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled, Self::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed | Processing | Cancelled)
                | (Confirmed, Processing | Cancelled)
                | (Processing, Shipped | Cancelled)
                | (Shipped, Delivered)
                | (Delivered, Refunded)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl Order {
    pub fn create(order_number: u64, customer: Customer, shipping_address: Address, payment_method: PaymentMethod, shipping_method: ShippingMethod, currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(), order_number, customer,
            status: OrderStatus::Pending, payment_status: PaymentStatus::Pending, fulfillment_status: FulfillmentStatus::Unfulfilled,
            items: vec![], subtotal: Money::zero(currency), shipping: Money::zero(currency), tax: Money::zero(currency),
            discount: Money::zero(currency), total: Money::zero(currency), shipping_address, billing_address: None,
            payment: PaymentInfo { method: payment_method, transaction_id: None, paid_at: None },
            shipping_info: ShippingInfo { method: shipping_method, carrier: None, tracking_number: None },
            timeline: vec![TimelineEntry { status: OrderStatus::Pending, message: "Order placed".into(), at: now }],
            note: None, tags: vec![], created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn order_number(&self) -> u64 { self.order_number }
    pub fn display_number(&self) -> String { format!("ORD-{}", self.order_number) }
    pub fn customer(&self) -> &Customer { &self.customer }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn fulfillment_status(&self) -> FulfillmentStatus { self.fulfillment_status }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn shipping(&self) -> &Money { &self.shipping }
    pub fn total(&self) -> &Money { &self.total }
    pub fn payment(&self) -> &PaymentInfo { &self.payment }
    pub fn shipping_info(&self) -> &ShippingInfo { &self.shipping_info }
    pub fn timeline(&self) -> &[TimelineEntry] { &self.timeline }
    pub fn note(&self) -> Option<&str> { self.note.as_deref() }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn add_item(&mut self, item: LineItem) -> Result<(), OrderError> { self.items.push(item); self.recalculate() }

    pub fn set_shipping(&mut self, shipping: Money) -> Result<(), OrderError> { self.shipping = shipping; self.recalculate() }

    pub fn place(&mut self) -> Result<(), OrderError> {
        if self.items.is_empty() { return Err(OrderError::NoItems); }
        self.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: self.id.clone(), order_number: self.order_number, total: self.total.amount() }));
        self.transition(OrderStatus::Confirmed, "Order confirmed")
    }

    pub fn mark_paid(&mut self, transaction_id: impl Into<String>) {
        let transaction_id = transaction_id.into();
        let now = Utc::now();
        self.payment_status = PaymentStatus::Paid;
        self.payment.transaction_id = Some(transaction_id.clone());
        self.payment.paid_at = Some(now);
        self.timeline.push(TimelineEntry { status: self.status, message: format!("Payment received ({transaction_id})"), at: now });
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Paid { order_id: self.id.clone(), transaction_id }));
    }

    /// Moves the order along the fulfillment graph and records it on the timeline.
    pub fn transition(&mut self, next: OrderStatus, message: impl Into<String>) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        let from = self.status;
        self.status = next;
        match next {
            OrderStatus::Shipped => {
                self.fulfillment_status = FulfillmentStatus::Fulfilled;
                self.raise_event(DomainEvent::Order(OrderEvent::Shipped { order_id: self.id.clone(), tracking: self.shipping_info.tracking_number.clone() }));
            }
            OrderStatus::Refunded => self.payment_status = PaymentStatus::Refunded,
            OrderStatus::Cancelled => self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id.clone() })),
            _ => {}
        }
        self.timeline.push(TimelineEntry { status: next, message: message.into(), at: Utc::now() });
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id.clone(), from: from.to_string(), to: next.to_string() }));
        Ok(())
    }

    pub fn set_tracking(&mut self, carrier: Option<String>, tracking_number: Option<String>) {
        self.shipping_info.carrier = carrier;
        self.shipping_info.tracking_number = tracking_number;
        self.touch();
    }

    pub fn set_note(&mut self, note: Option<String>) { self.note = note.filter(|n| !n.trim().is_empty()); self.touch(); }

    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            self.tags.push(tag.to_string());
            self.touch();
        }
    }

    pub fn remove_tag(&mut self, tag: &str) { self.tags.retain(|t| !t.eq_ignore_ascii_case(tag)); self.touch(); }

    fn recalculate(&mut self) -> Result<(), OrderError> {
        self.subtotal = Money::sum(self.items.iter().map(|i| &i.total), self.subtotal.currency())?;
        self.total = self.subtotal.add(&self.shipping)?.add(&self.tax)?.subtract(&self.discount)?;
        self.touch();
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("No items")]
    NoItems,
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error(transparent)]
    Money(#[from] MoneyError),
}
