//! Eligibility filtering of tree candidates
//!
//! A candidate survives when it is:
//! - not the claimed product itself
//! - compatible with every device the claimed product declares
//! - registerable under warranty
//! - not hidden from warranty flows
//!
//! Warranty flags come from one bulk metafield fetch; candidates absent from
//! that response are looked up individually, concurrently.

use crate::config::ResolverConfig;
use crate::deadline::guarded;
use crate::error::{ResolveError, Stage};
use crate::metafield::WarrantyFlags;
use crate::source::{CatalogSource, LookupKind};
use crate::types::{CustomerId, ProductId, ReplaceProduct, ReplacementTree, UpgradeOptions};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::time::Duration;

/// Check device compatibility
///
/// Every selected device must appear in the candidate's device list. An
/// empty selection accepts any candidate.
#[must_use]
pub fn is_device_compatible(selected: &[String], candidate: &[String]) -> bool {
    selected.iter().all(|device| candidate.contains(device))
}

/// Candidate filter bound to a catalog source
pub struct EligibilityFilter<'a> {
    source: &'a dyn CatalogSource,
    timeout: Option<Duration>,
    concurrency: usize,
}

impl<'a> EligibilityFilter<'a> {
    /// Create filter
    #[must_use]
    pub fn new(source: &'a dyn CatalogSource, config: &ResolverConfig) -> Self {
        Self {
            source,
            timeout: config.fetch_timeout(),
            concurrency: config.fallback_concurrency.max(1),
        }
    }

    /// Fetch warranty flags for every candidate
    ///
    /// `original` is skipped by the per-id fallback since it is never kept.
    pub async fn warranty_flags(
        &self,
        candidates: &[ProductId],
        original: ProductId,
        customer_id: Option<CustomerId>,
    ) -> Result<HashMap<ProductId, WarrantyFlags>, ResolveError> {
        let bulk = guarded(
            Stage::WarrantyFields,
            self.timeout,
            self.source.fetch_warranty_fields(candidates),
        )
        .await?;

        let mut flags = HashMap::with_capacity(candidates.len());
        for record in &bulk {
            flags
                .entry(record.entity_id)
                .or_insert_with(|| WarrantyFlags::from_metafields(record.metafields.iter()));
        }

        let missing: Vec<ProductId> = candidates
            .iter()
            .copied()
            .filter(|id| *id != original && !flags.contains_key(id))
            .collect();
        if missing.is_empty() {
            return Ok(flags);
        }

        tracing::debug!(
            "Bulk warranty fields missing {} candidates; looking up individually",
            missing.len()
        );

        let looked_up: Vec<(ProductId, WarrantyFlags)> = stream::iter(missing)
            .map(|id| async move {
                let product = guarded(
                    Stage::ProductLookup,
                    self.timeout,
                    self.source.fetch_product_by_id(id, LookupKind::Id, customer_id),
                )
                .await?;
                let found = product
                    .and_then(|p| p.metafields)
                    .map_or(WarrantyFlags::MISSING, |fields| {
                        WarrantyFlags::from_metafields(fields.iter())
                    });
                Ok::<_, ResolveError>((id, found))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        flags.extend(looked_up);
        Ok(flags)
    }

    /// Keep the candidates eligible as upgrade options, in candidate order
    pub async fn filter(
        &self,
        tree: &ReplacementTree,
        candidates: &[ProductId],
        original: ProductId,
        selected_devices: &[String],
        customer_id: Option<CustomerId>,
    ) -> Result<UpgradeOptions, ResolveError> {
        let flags = self.warranty_flags(candidates, original, customer_id).await?;
        let mut options = UpgradeOptions::default();

        for &id in candidates {
            if id == original {
                continue;
            }

            let entry = tree
                .product(id)
                .cloned()
                .unwrap_or_else(|| ReplaceProduct::new(id));
            let candidate_flags = flags.get(&id).copied().unwrap_or(WarrantyFlags::MISSING);

            if !is_device_compatible(selected_devices, entry.devices()) {
                tracing::trace!("Candidate {} rejected: device mismatch", id);
                continue;
            }
            if !candidate_flags.is_offerable() {
                tracing::trace!("Candidate {} rejected: {:?}", id, candidate_flags);
                continue;
            }

            options.push(entry);
        }

        tracing::debug!(
            "{} of {} candidates eligible",
            options.len(),
            candidates.len()
        );
        Ok(options)
    }
}

impl std::fmt::Debug for EligibilityFilter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EligibilityFilter")
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metafield::{Metafield, MetafieldConnection};
    use crate::source::StaticCatalog;
    use crate::types::{ApiProduct, CategoryId, CategoryNode, WarrantyFieldsRecord};

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn bulk(id: u64, registerable: &str, hidden: &str) -> WarrantyFieldsRecord {
        WarrantyFieldsRecord {
            entity_id: ProductId(id),
            metafields: [
                Metafield::new("is_registerable", registerable),
                Metafield::new("hide_from_warranty", hidden),
            ]
            .into_iter()
            .collect::<MetafieldConnection>(),
        }
    }

    fn tree(entries: Vec<ReplaceProduct>) -> ReplacementTree {
        let mut node = CategoryNode::new(CategoryId(5));
        let mut tree = ReplacementTree::default();
        for entry in entries {
            node = node.with_product(entry.id);
            tree.products.insert(entry.id, entry);
        }
        tree.tree.push(node);
        tree
    }

    #[test]
    fn compatibility_requires_every_selected_device() {
        assert!(is_device_compatible(&[], &tags(&["a"])));
        assert!(is_device_compatible(&[], &[]));
        assert!(is_device_compatible(&tags(&["a"]), &tags(&["b", "a"])));
        assert!(!is_device_compatible(&tags(&["a", "c"]), &tags(&["a", "b"])));
        assert!(!is_device_compatible(&tags(&["a"]), &[]));
    }

    #[tokio::test]
    async fn filters_hidden_unregisterable_and_self() {
        let tree = tree(vec![
            ReplaceProduct::new(ProductId(1)),
            ReplaceProduct::new(ProductId(2)),
            ReplaceProduct::new(ProductId(3)),
            ReplaceProduct::new(ProductId(9)),
        ]);
        let mut catalog = StaticCatalog::new();
        catalog.warranty_fields = vec![
            bulk(1, "true", "false"),
            bulk(2, "true", "TRUE"),
            bulk(3, "True", "false"),
            bulk(9, "true", "false"),
        ];

        let config = ResolverConfig::default();
        let filter = EligibilityFilter::new(&catalog, &config);
        let candidates = [ProductId(1), ProductId(2), ProductId(3), ProductId(9)];
        let options = filter
            .filter(&tree, &candidates, ProductId(9), &[], None)
            .await
            .unwrap();

        assert_eq!(options.product_ids, vec![ProductId(1)]);
        assert!(options.products.contains_key(&ProductId(1)));
    }

    #[tokio::test]
    async fn falls_back_to_per_id_lookup() {
        let tree = tree(vec![
            ReplaceProduct::new(ProductId(1)),
            ReplaceProduct::new(ProductId(2)),
            ReplaceProduct::new(ProductId(3)),
        ]);
        let mut catalog = StaticCatalog::new();
        catalog.warranty_fields = vec![bulk(1, "true", "false")];
        let mut hidden = ApiProduct::new(ProductId(2), "B");
        hidden.metafields = Some(vec![Metafield::new("is_registerable", "true")]);
        catalog.hidden_products.push(hidden);

        let config = ResolverConfig::default();
        let filter = EligibilityFilter::new(&catalog, &config);
        let candidates = [ProductId(1), ProductId(2), ProductId(3)];
        let options = filter
            .filter(&tree, &candidates, ProductId(0), &[], None)
            .await
            .unwrap();

        // 3 has no metadata anywhere and is treated as not registerable
        assert_eq!(options.product_ids, vec![ProductId(1), ProductId(2)]);
    }

    #[tokio::test]
    async fn applies_device_compatibility() {
        let tree = tree(vec![
            ReplaceProduct::new(ProductId(1)).with_devices(["phone-12", "phone-12-pro"]),
            ReplaceProduct::new(ProductId(2)).with_devices(["phone-12"]),
        ]);
        let mut catalog = StaticCatalog::new();
        catalog.warranty_fields = vec![bulk(1, "true", "false"), bulk(2, "true", "false")];

        let config = ResolverConfig::default();
        let filter = EligibilityFilter::new(&catalog, &config);
        let selected = tags(&["phone-12", "phone-12-pro"]);
        let options = filter
            .filter(&tree, &[ProductId(1), ProductId(2)], ProductId(0), &selected, None)
            .await
            .unwrap();

        assert_eq!(options.product_ids, vec![ProductId(1)]);
    }
}
