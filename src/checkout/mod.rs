//! Checkout: form validation, totals, the stored checkout blob and the
//! simulated payment step.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::aggregates::{Address, CartItem, Customer, PaymentMethod, ShippingMethod};
use crate::domain::value_objects::Money;

/// Storage key of the checkout blob; entries are namespaced per session.
pub const CHECKOUT_STORAGE_KEY: &str = "elecxo-checkout-data";

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn required(message: &'static str) -> ValidationError { invalid("required", message) }

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(required("This field is required")) } else { Ok(()) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(custom = "not_blank")]
    pub first_name: String,
    #[validate(custom = "not_blank")]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(custom = "not_blank")]
    pub street: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[validate(custom = "not_blank")]
    pub postal_code: String,
    #[validate(custom = "not_blank")]
    pub country: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct CheckoutForm {
    #[validate]
    pub customer: CustomerInfo,
    #[validate]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

impl CustomerInfo {
    pub fn full_name(&self) -> String { format!("{} {}", self.first_name.trim(), self.last_name.trim()) }

    pub fn to_customer(&self) -> Customer {
        Customer { id: None, name: self.full_name(), email: self.email.trim().to_string(), phone: Some(self.phone.trim().to_string()) }
    }
}

impl From<&ShippingAddress> for Address {
    fn from(a: &ShippingAddress) -> Self {
        Address {
            street: a.street.trim().to_string(),
            city: a.city.trim().to_string(),
            state: a.state.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            postal_code: a.postal_code.trim().to_string(),
            country: a.country.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShippingRates { pub standard: Decimal, pub express: Decimal, pub free_shipping_threshold: Decimal }

impl Default for ShippingRates {
    fn default() -> Self {
        Self { standard: Decimal::new(500, 2), express: Decimal::new(1500, 2), free_shipping_threshold: Decimal::new(100, 0) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutTotals { pub subtotal: Money, pub shipping: Money, pub total: Money }

impl CheckoutTotals {
    /// Standard shipping is free from the threshold up; express is always charged.
    pub fn compute(subtotal: &Money, method: ShippingMethod, rates: &ShippingRates) -> Self {
        let fee = match method {
            ShippingMethod::Standard if subtotal.amount() >= rates.free_shipping_threshold => Decimal::ZERO,
            ShippingMethod::Standard => rates.standard,
            ShippingMethod::Express => rates.express,
        };
        let shipping = Money::new(fee, subtotal.currency());
        Self { subtotal: subtotal.clone(), total: subtotal.plus(fee), shipping }
    }
}

/// Everything the payment step needs, captured when the form is submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutData {
    pub session_id: String,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub shipping_method: ShippingMethod,
    pub items: Vec<CartItem>,
    pub totals: CheckoutTotals,
    pub created_at: DateTime<Utc>,
}

/// Key/value store of serialized checkout blobs.
#[derive(Debug, Default)]
pub struct CheckoutStore { entries: HashMap<String, String> }

impl CheckoutStore {
    pub fn storage_key(session_id: &str) -> String { format!("{CHECKOUT_STORAGE_KEY}:{session_id}") }

    pub fn save(&mut self, data: &CheckoutData) -> Result<(), serde_json::Error> {
        let blob = serde_json::to_string(data)?;
        self.entries.insert(Self::storage_key(&data.session_id), blob);
        Ok(())
    }

    pub fn load(&self, session_id: &str) -> Result<Option<CheckoutData>, serde_json::Error> {
        self.entries.get(&Self::storage_key(session_id)).map(|blob| serde_json::from_str(blob)).transpose()
    }

    /// Removes and returns the blob, so only one caller can claim it.
    pub fn take(&mut self, session_id: &str) -> Result<Option<CheckoutData>, serde_json::Error> {
        self.entries.remove(&Self::storage_key(session_id)).map(|blob| serde_json::from_str(&blob)).transpose()
    }

    pub fn clear(&mut self, session_id: &str) -> bool { self.entries.remove(&Self::storage_key(session_id)).is_some() }
}

fn card_number(value: &str) -> Result<(), ValidationError> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if (13..=19).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) { Ok(()) }
    else { Err(invalid("card_number", "Enter a valid card number")) }
}

fn card_expiry(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .trim()
        .split_once('/')
        .filter(|(mm, yy)| mm.len() == 2 && yy.len() == 2 && yy.chars().all(|c| c.is_ascii_digit()))
        .and_then(|(mm, _)| mm.parse::<u8>().ok())
        .is_some_and(|month| (1..=12).contains(&month));
    if valid { Ok(()) } else { Err(invalid("card_expiry", "Expiry must be MM/YY")) }
}

fn card_cvc(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if (3..=4).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit()) { Ok(()) }
    else { Err(invalid("card_cvc", "Enter a valid security code")) }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Validate)]
pub struct CardDetails {
    #[validate(custom = "not_blank")]
    pub holder: String,
    #[validate(custom = "card_number")]
    pub number: String,
    #[validate(custom = "card_expiry")]
    pub expiry: String,
    #[validate(custom = "card_cvc")]
    pub cvc: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

impl PaymentRequest {
    /// Card payments need valid card details; other methods ignore them.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        if self.method != PaymentMethod::Card {
            return Ok(());
        }
        match &self.card {
            Some(card) => card.validate(),
            None => {
                let mut errors = ValidationErrors::new();
                errors.add("card", required("Card details are required"));
                Err(errors)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    /// False for cash on delivery, which is collected later.
    pub captured: bool,
    pub processed_at: DateTime<Utc>,
}

/// Stand-in payment processor: waits, then succeeds.
#[derive(Clone, Debug)]
pub struct PaymentSimulator { delay: Duration }

impl PaymentSimulator {
    pub fn new(delay: Duration) -> Self { Self { delay } }

    pub async fn charge(&self, request: &PaymentRequest, amount: &Money) -> Result<PaymentReceipt, ValidationErrors> {
        request.check()?;
        tokio::time::sleep(self.delay).await;
        let transaction_id = format!("TXN-{}", Uuid::new_v4().simple().to_string()[..12].to_uppercase());
        tracing::info!(%transaction_id, method = ?request.method, %amount, "payment processed");
        Ok(PaymentReceipt {
            transaction_id,
            method: request.method,
            amount: amount.clone(),
            captured: request.method != PaymentMethod::CashOnDelivery,
            processed_at: Utc::now(),
        })
    }
}
