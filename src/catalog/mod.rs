//! Catalog queries: product filtering, sorting and pagination.
//!
//! Filters are plain predicates ANDed together; an unset field never excludes
//! a product. Sorting is stable, so products that tie keep dataset order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::aggregates::{Product, ProductStatus, StockLevel};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f32>,
    pub in_stock: bool,
    pub status: Option<ProductStatus>,
    pub stock_level: Option<StockLevel>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
    Name,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_search(product)
            && (self.categories.is_empty() || self.categories.iter().any(|c| c.eq_ignore_ascii_case(product.category_id())))
            && (self.brands.is_empty() || self.brands.iter().any(|b| b.eq_ignore_ascii_case(product.brand())))
            && self.min_price.map_or(true, |min| product.price().amount() >= min)
            && self.max_price.map_or(true, |max| product.price().amount() <= max)
            && self.min_rating.map_or(true, |min| product.rating() >= min)
            && (!self.in_stock || product.is_in_stock())
            && self.status.map_or(true, |s| product.status() == s)
            && self.stock_level.map_or(true, |l| product.stock_level() == l)
    }

    fn matches_search(&self, product: &Product) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        let fields = [product.name(), product.brand(), product.description(), product.sku().as_str()];
        fields
            .into_iter()
            .chain(product.tags().iter().map(String::as_str))
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn filter_products<'a>(products: &'a [Product], filter: &ProductFilter) -> Vec<&'a Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

pub fn sort_products(products: &mut [&Product], sort: ProductSort) {
    match sort {
        ProductSort::Featured => products.sort_by_key(|p| !p.is_featured()),
        ProductSort::PriceAsc => products.sort_by(|a, b| a.price().amount().cmp(&b.price().amount())),
        ProductSort::PriceDesc => products.sort_by(|a, b| b.price().amount().cmp(&a.price().amount())),
        ProductSort::Rating => products.sort_by(|a, b| {
            b.rating().total_cmp(&a.rating()).then_with(|| b.review_count().cmp(&a.review_count()))
        }),
        ProductSort::Newest => products.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
        ProductSort::Name => products.sort_by(|a, b| compare_names(a.name(), b.name())),
    }
}

fn compare_names(a: &str, b: &str) -> Ordering { a.to_lowercase().cmp(&b.to_lowercase()) }

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: usize, pub page: u32, pub per_page: u32, pub total_pages: u32 }

impl<T> PaginatedResponse<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse { data: self.data.into_iter().map(f).collect(), total: self.total, page: self.page, per_page: self.per_page, total_pages: self.total_pages }
    }
}

/// Slices one page out of `items`. Page numbers start at 1.
pub fn paginate<T>(items: Vec<T>, page: Option<u32>, per_page: Option<u32>) -> PaginatedResponse<T> {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let total = items.len();
    let total_pages = u32::try_from(total.div_ceil(per_page as usize)).unwrap_or(u32::MAX);
    let skip = (page as usize - 1).saturating_mul(per_page as usize);
    let data = items.into_iter().skip(skip).take(per_page as usize).collect();
    PaginatedResponse { data, total, page, per_page, total_pages }
}


#[cfg(test)]
mod tests {
    use super::fixtures::catalog;
    use super::*;

    fn skus(products: &[&Product]) -> Vec<String> { products.iter().map(|p| p.sku().to_string()).collect() }

    #[test]
    fn test_empty_filter_returns_everything() {
        let products = catalog();
        assert_eq!(filter_products(&products, &ProductFilter::default()).len(), products.len());
    }

    #[test]
    fn test_filter_by_category_and_brand() {
        let products = catalog();
        let filter = ProductFilter { categories: vec!["PHONES".into(), "audio".into()], brands: vec!["apple".into()], ..Default::default() };
        assert_eq!(skus(&filter_products(&products, &filter)), ["IPH-15", "AIRP-2"]);
    }

    #[test]
    fn test_filter_by_price_range_is_inclusive() {
        let products = catalog();
        let filter = ProductFilter { min_price: Some(Decimal::new(349, 0)), max_price: Some(Decimal::new(999, 0)), ..Default::default() };
        assert_eq!(skus(&filter_products(&products, &filter)), ["IPH-15", "GS-24", "XPS-13", "WH-1000"]);
    }

    #[test]
    fn test_filter_by_rating_and_stock() {
        let products = catalog();
        let filter = ProductFilter { min_rating: Some(4.6), in_stock: true, ..Default::default() };
        assert_eq!(skus(&filter_products(&products, &filter)), ["IPH-15", "MBA-13", "WH-1000"]);
    }

    #[test]
    fn test_search_matches_name_brand_and_sku() {
        let products = catalog();
        let by_name = ProductFilter { search: Some("macbook".into()), ..Default::default() };
        assert_eq!(skus(&filter_products(&products, &by_name)), ["MBA-13"]);
        let by_brand = ProductFilter { search: Some(" SONY ".into()), ..Default::default() };
        assert_eq!(skus(&filter_products(&products, &by_brand)), ["WH-1000"]);
        let blank = ProductFilter { search: Some("   ".into()), ..Default::default() };
        assert_eq!(filter_products(&products, &blank).len(), products.len());
    }

    #[test]
    fn test_filter_by_stock_level() {
        let products = catalog();
        let low = ProductFilter { stock_level: Some(StockLevel::LowStock), ..Default::default() };
        assert_eq!(skus(&filter_products(&products, &low)), ["MBA-13"]);
        let out = ProductFilter { stock_level: Some(StockLevel::OutOfStock), ..Default::default() };
        assert_eq!(skus(&filter_products(&products, &out)), ["GS-24"]);
    }

    #[test]
    fn test_price_sorts_are_monotonic() {
        let products = catalog();
        let mut refs = filter_products(&products, &ProductFilter::default());
        sort_products(&mut refs, ProductSort::PriceAsc);
        assert!(refs.windows(2).all(|w| w[0].price().amount() <= w[1].price().amount()));
        sort_products(&mut refs, ProductSort::PriceDesc);
        assert!(refs.windows(2).all(|w| w[0].price().amount() >= w[1].price().amount()));
    }

    #[test]
    fn test_featured_sort_is_stable() {
        let products = catalog();
        let mut refs = filter_products(&products, &ProductFilter::default());
        sort_products(&mut refs, ProductSort::Featured);
        assert_eq!(skus(&refs), ["IPH-15", "MBA-13", "GS-24", "XPS-13", "WH-1000", "AIRP-2"]);
    }

    #[test]
    fn test_rating_sort_breaks_ties_by_reviews() {
        let products = catalog();
        let mut refs = filter_products(&products, &ProductFilter::default());
        sort_products(&mut refs, ProductSort::Rating);
        assert_eq!(skus(&refs), ["MBA-13", "IPH-15", "WH-1000", "XPS-13", "AIRP-2", "GS-24"]);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let products = catalog();
        let mut refs = filter_products(&products, &ProductFilter::default());
        sort_products(&mut refs, ProductSort::Name);
        assert_eq!(skus(&refs), ["AIRP-2", "GS-24", "IPH-15", "MBA-13", "WH-1000", "XPS-13"]);
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=45).collect::<Vec<_>>(), Some(3), None);
        assert_eq!(page.data, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
        let capped = paginate((1..=5).collect::<Vec<_>>(), Some(0), Some(500));
        assert_eq!(capped.page, 1);
        assert_eq!(capped.per_page, MAX_PER_PAGE);
    }
}
