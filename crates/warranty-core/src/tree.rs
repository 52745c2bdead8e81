//! Replacement tree lookup and candidate extraction
//!
//! - [`find_node`]: first top-level node matching the product's categories
//! - [`collect_candidates`]: depth-first walk producing unique product ids

use crate::types::{CategoryId, CategoryNode, ProductId, ReplacementTree, TreeChild};
use indexmap::IndexSet;

/// Find the first top-level node whose category is in `category_ids`
///
/// Tree order decides: the first match wins, not the best one.
#[must_use]
pub fn find_node<'a>(
    tree: &'a ReplacementTree,
    category_ids: &[CategoryId],
) -> Option<&'a CategoryNode> {
    tree.tree
        .iter()
        .find(|node| category_ids.contains(&node.category_id))
}

/// Collect candidate product ids reachable from `node`
///
/// When a child category of `node` is also one of `category_ids`, the walk
/// narrows to that child, provided it yields any products. Otherwise the
/// whole subtree is walked depth-first in declared order. Ids are unique and
/// keep their first-seen position. Returns `None` if nothing was found.
#[must_use]
pub fn collect_candidates(node: &CategoryNode, category_ids: &[CategoryId]) -> Option<Vec<ProductId>> {
    let narrowed = node.children.iter().find_map(|child| match child {
        TreeChild::Category(inner) if category_ids.contains(&inner.category_id) => Some(inner),
        _ => None,
    });

    if let Some(inner) = narrowed {
        if let Some(found) = collect_candidates(inner, category_ids) {
            return Some(found);
        }
    }

    let mut seen = IndexSet::new();
    walk(node, &mut seen);

    if seen.is_empty() {
        None
    } else {
        Some(seen.into_iter().collect())
    }
}

fn walk(node: &CategoryNode, seen: &mut IndexSet<ProductId>) {
    for child in &node.children {
        match child {
            TreeChild::Product(id) => {
                seen.insert(*id);
            }
            TreeChild::Category(inner) => walk(inner, seen),
        }
    }
}
