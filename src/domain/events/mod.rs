//! Domain events
use crate::domain::value_objects::Sku;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProductEvent {
    Created { product_id: String, sku: Sku },
    Published { product_id: String },
    Archived { product_id: String },
    PriceChanged { product_id: String, price: Decimal },
    InventoryAdded { product_id: String, quantity: u32 },
    InventoryRemoved { product_id: String, quantity: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Placed { order_id: String, order_number: u64, total: Decimal },
    StatusChanged { order_id: String, from: String, to: String },
    Paid { order_id: String, transaction_id: String },
    Shipped { order_id: String, tracking: Option<String> },
    Cancelled { order_id: String },
}

impl DomainEvent {
    /// Writes the event to the log.
    pub fn log(&self) {
        match self {
            Self::Product(ProductEvent::Created { product_id, sku }) => tracing::info!(%product_id, %sku, "product created"),
            Self::Product(ProductEvent::Published { product_id }) => tracing::info!(%product_id, "product published"),
            Self::Product(ProductEvent::Archived { product_id }) => tracing::info!(%product_id, "product archived"),
            Self::Product(ProductEvent::PriceChanged { product_id, price }) => tracing::info!(%product_id, %price, "product price changed"),
            Self::Product(ProductEvent::InventoryAdded { product_id, quantity }) => tracing::info!(%product_id, quantity, "inventory added"),
            Self::Product(ProductEvent::InventoryRemoved { product_id, quantity }) => tracing::info!(%product_id, quantity, "inventory removed"),
            Self::Order(OrderEvent::Placed { order_id, order_number, total }) => tracing::info!(%order_id, order_number, %total, "order placed"),
            Self::Order(OrderEvent::StatusChanged { order_id, from, to }) => tracing::info!(%order_id, %from, %to, "order status changed"),
            Self::Order(OrderEvent::Paid { order_id, transaction_id }) => tracing::info!(%order_id, %transaction_id, "order paid"),
            Self::Order(OrderEvent::Shipped { order_id, tracking }) => tracing::info!(%order_id, tracking = ?tracking, "order shipped"),
            Self::Order(OrderEvent::Cancelled { order_id }) => tracing::info!(%order_id, "order cancelled"),
        }
    }
}
