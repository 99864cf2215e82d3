//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `ELECXO_HOST` - Bind address (default: 0.0.0.0)
//! - `ELECXO_PORT` or `PORT` - Listen port (default: 8083)
//! - `ELECXO_CURRENCY` - Store currency code (default: USD)
//! - `ELECXO_STANDARD_SHIPPING` - Standard shipping fee (default: 5.00)
//! - `ELECXO_EXPRESS_SHIPPING` - Express shipping fee (default: 15.00)
//! - `ELECXO_FREE_SHIPPING_THRESHOLD` - Subtotal for free standard shipping (default: 100.00)
//! - `ELECXO_PAYMENT_DELAY_MS` - Simulated payment processing time (default: 1500)
//! - `ELECXO_SEED_PATH` - JSON dataset replacing the bundled mock data

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::checkout::ShippingRates;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub currency: String,
    pub shipping: ShippingRates,
    pub payment_delay: Duration,
    pub seed_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8083,
            currency: "USD".to_string(),
            shipping: ShippingRates::default(),
            payment_delay: Duration::from_millis(1500),
            seed_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port_var = if lookup("ELECXO_PORT").is_some() { "ELECXO_PORT" } else { "PORT" };
        let currency = lookup("ELECXO_CURRENCY").map(|c| c.trim().to_uppercase()).unwrap_or(defaults.currency);
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidEnvVar("ELECXO_CURRENCY".into(), format!("'{currency}' is not a currency code")));
        }
        let shipping = ShippingRates {
            standard: parse(&lookup, "ELECXO_STANDARD_SHIPPING")?.unwrap_or(defaults.shipping.standard),
            express: parse(&lookup, "ELECXO_EXPRESS_SHIPPING")?.unwrap_or(defaults.shipping.express),
            free_shipping_threshold: parse(&lookup, "ELECXO_FREE_SHIPPING_THRESHOLD")?.unwrap_or(defaults.shipping.free_shipping_threshold),
        };
        for (key, value) in [("ELECXO_STANDARD_SHIPPING", shipping.standard), ("ELECXO_EXPRESS_SHIPPING", shipping.express), ("ELECXO_FREE_SHIPPING_THRESHOLD", shipping.free_shipping_threshold)] {
            if value < Decimal::ZERO {
                return Err(ConfigError::InvalidEnvVar(key.into(), "must not be negative".into()));
            }
        }
        Ok(Self {
            host: parse(&lookup, "ELECXO_HOST")?.unwrap_or(defaults.host),
            port: parse(&lookup, port_var)?.unwrap_or(defaults.port),
            currency,
            shipping,
            payment_delay: parse::<u64>(&lookup, "ELECXO_PAYMENT_DELAY_MS")?.map_or(defaults.payment_delay, Duration::from_millis),
            seed_path: lookup("ELECXO_SEED_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())))
        .transpose()
}
