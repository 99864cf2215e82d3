//! Elecxo Commerce
//!
//! Electronics storefront with an admin back-office, served over HTTP.
//!
//! ## Features
//! - Product catalog with search, filters, sorting and pagination
//! - Variant pricing and stock (color, storage, memory)
//! - Session carts, validated checkout and a simulated payment step
//! - Order management with a status timeline
//! - Role-based permission gates for the back-office

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod error;
pub mod orders;
pub mod permissions;
pub mod store;

pub use api::{router, AppState};
pub use config::Config;
pub use error::{EcommerceError, Result};
pub use store::{Seed, Store};
