//! Canonicalization of hydrated products
//!
//! A product may declare a replacement SKU (`rpl_sku`). When the product
//! carrying that SKU is part of the same list, it takes the declaring
//! product's place. Products are then deduplicated by id, keeping the first
//! occurrence.

use crate::types::{ProductId, WarrantyProduct};
use std::collections::{HashMap, HashSet};

/// Canonicalize and deduplicate `products`, preserving first-occurrence order
///
/// Replacement chains (`A -> B -> C`) are followed to their end. Members of a
/// replacement cycle all resolve to the cycle member listed first. When SKUs
/// repeat, one pass can change which product a SKU names, so passes repeat
/// until the list stops shrinking. Running this on its own output returns the
/// output unchanged.
#[must_use]
pub fn canonicalize(products: &[WarrantyProduct]) -> Vec<WarrantyProduct> {
    let mut current = substitute(products);
    loop {
        // A pass that keeps every product maps each one to itself.
        let next = substitute(&current);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

/// One substitution and dedup pass
fn substitute(products: &[WarrantyProduct]) -> Vec<WarrantyProduct> {
    let mut by_sku: HashMap<&str, usize> = HashMap::with_capacity(products.len());
    for (index, product) in products.iter().enumerate() {
        by_sku.entry(product.sku.as_str()).or_insert(index);
    }

    let mut seen: HashSet<ProductId> = HashSet::with_capacity(products.len());
    let mut canonical = Vec::with_capacity(products.len());

    for start in 0..products.len() {
        let chosen = &products[resolve(products, &by_sku, start)];
        if seen.insert(chosen.id) {
            canonical.push(chosen.clone());
        }
    }

    canonical
}

/// Index of the product that finally represents `products[start]`
fn resolve(products: &[WarrantyProduct], by_sku: &HashMap<&str, usize>, start: usize) -> usize {
    let mut path = vec![start];
    let mut current = start;

    loop {
        let next = products[current]
            .rpl_sku
            .as_deref()
            .and_then(|sku| by_sku.get(sku).copied());

        match next {
            None => return current,
            Some(next) if next == current => return current,
            Some(next) => {
                if let Some(cycle_start) = path.iter().position(|&i| i == next) {
                    return path[cycle_start..]
                        .iter()
                        .copied()
                        .min()
                        .unwrap_or(current);
                }
                path.push(next);
                current = next;
            }
        }
    }
}
