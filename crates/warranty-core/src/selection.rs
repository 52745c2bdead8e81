//! Final selection: stock filter, cap and popularity ranking

use crate::types::WarrantyProduct;

/// Drop products whose inventory reports out of stock
///
/// Products without an inventory record are kept.
#[must_use]
pub fn filter_in_stock(products: Vec<WarrantyProduct>) -> Vec<WarrantyProduct> {
    products.into_iter().filter(WarrantyProduct::is_available).collect()
}

/// Keep at most `limit` products
#[must_use]
pub fn cap(mut products: Vec<WarrantyProduct>, limit: usize) -> Vec<WarrantyProduct> {
    products.truncate(limit);
    products
}

/// Stable sort with most popular products first
pub fn rank_most_popular(products: &mut [WarrantyProduct]) {
    products.sort_by_key(|p| !p.most_popular);
}

/// Filter, cap and rank in that order
#[must_use]
pub fn select(products: Vec<WarrantyProduct>, limit: usize) -> Vec<WarrantyProduct> {
    let mut selected = cap(filter_in_stock(products), limit);
    rank_most_popular(&mut selected);
    selected
}
