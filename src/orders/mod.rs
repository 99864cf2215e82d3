//! Back-office order queries: filtering, sorting and the dashboard summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::aggregates::{FulfillmentStatus, Order, OrderStatus, PaymentStatus, Product, StockLevel};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub tag: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortField { #[default] Date, Total, OrderNumber, Customer, Status }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection { Asc, #[default] Desc }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderSort { pub field: OrderSortField, pub direction: SortDirection }

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        let created = order.created_at().date_naive();
        self.matches_search(order)
            && self.status.map_or(true, |s| order.status() == s)
            && self.payment_status.map_or(true, |s| order.payment_status() == s)
            && self.fulfillment_status.map_or(true, |s| order.fulfillment_status() == s)
            && self.from.map_or(true, |from| created >= from)
            && self.to.map_or(true, |to| created <= to)
            && self.min_total.map_or(true, |min| order.total().amount() >= min)
            && self.max_total.map_or(true, |max| order.total().amount() <= max)
            && self.tag.as_deref().map_or(true, |tag| order.tags().iter().any(|t| t.eq_ignore_ascii_case(tag.trim())))
    }

    fn matches_search(&self, order: &Order) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        let customer = order.customer();
        [order.display_number(), customer.name.clone(), customer.email.clone()]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn filter_orders<'a>(orders: &'a [Order], filter: &OrderFilter) -> Vec<&'a Order> {
    orders.iter().filter(|o| filter.matches(o)).collect()
}

/// Stable sort; descending order reverses the comparator, not the slice, so ties keep their order.
pub fn sort_orders(orders: &mut [&Order], sort: OrderSort) {
    orders.sort_by(|a, b| {
        let ordering = match sort.field {
            OrderSortField::Date => a.created_at().cmp(&b.created_at()),
            OrderSortField::Total => a.total().amount().cmp(&b.total().amount()),
            OrderSortField::OrderNumber => a.order_number().cmp(&b.order_number()),
            OrderSortField::Customer => a.customer().name.to_lowercase().cmp(&b.customer().name.to_lowercase()),
            OrderSortField::Status => a.status().cmp(&b.status()),
        };
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_orders: usize,
    pub pending_orders: usize,
    pub revenue: Decimal,
    pub orders_by_status: BTreeMap<&'static str, usize>,
    pub total_products: usize,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
}

/// Revenue counts paid orders only.
pub fn summarize(orders: &[Order], products: &[Product]) -> DashboardSummary {
    let mut orders_by_status: BTreeMap<&'static str, usize> = OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for order in orders {
        *orders_by_status.entry(order.status().as_str()).or_default() += 1;
    }
    let stock_count = |level: StockLevel| products.iter().filter(|p| p.stock_level() == level).count();
    DashboardSummary {
        total_orders: orders.len(),
        pending_orders: orders.iter().filter(|o| o.status() == OrderStatus::Pending).count(),
        revenue: orders.iter().filter(|o| o.payment_status() == PaymentStatus::Paid).map(|o| o.total().amount()).sum(),
        orders_by_status,
        total_products: products.len(),
        low_stock_products: stock_count(StockLevel::LowStock),
        out_of_stock_products: stock_count(StockLevel::OutOfStock),
    }
}
