//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod category;

pub use product::{Product, ProductError, ProductImage, ProductStatus, ProductUpdate, StockLevel, VariantKind, VariantOption, VariantOptions, VariantQuote, VariantSelection};
pub use order::{Address, Customer, FulfillmentStatus, LineItem, Order, OrderError, OrderStatus, PaymentInfo, PaymentMethod, PaymentStatus, ShippingInfo, ShippingMethod, TimelineEntry};
pub use cart::{Cart, CartError, CartItem};
pub use category::{Category, CategoryError};
