//! Product hydration
//!
//! Turns eligible ids into [`WarrantyProduct`]s: one bulk storefront fetch,
//! then concurrent per-id lookups for anything the bulk fetch left out
//! (typically products hidden from the storefront).

use crate::config::ResolverConfig;
use crate::deadline::guarded;
use crate::error::{HydrationError, ResolveError, Stage};
use crate::format::format_product;
use crate::source::{CatalogSource, LookupKind, StorefrontContext};
use crate::types::{ProductId, ProductRecord, WarrantyProduct};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Result of a hydration pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hydrated {
    /// Normalized products: bulk order first, then recovered ids in request order
    pub products: Vec<WarrantyProduct>,
    /// Ids neither source could produce, or whose record failed to normalize
    pub unavailable: Vec<ProductId>,
}

/// Product hydrator bound to a catalog source
pub struct Hydrator<'a> {
    source: &'a dyn CatalogSource,
    timeout: Option<Duration>,
    concurrency: usize,
}

impl<'a> Hydrator<'a> {
    /// Create hydrator
    #[must_use]
    pub fn new(source: &'a dyn CatalogSource, config: &ResolverConfig) -> Self {
        Self {
            source,
            timeout: config.fetch_timeout(),
            concurrency: config.fallback_concurrency.max(1),
        }
    }

    /// Hydrate `ids`
    ///
    /// Ids missing from both sources, and records that fail to normalize, are
    /// logged and reported in [`Hydrated::unavailable`]. Only when nothing at all was hydrated does
    /// that become [`HydrationError::ProductUnavailable`].
    pub async fn hydrate(
        &self,
        ctx: &StorefrontContext,
        ids: &[ProductId],
    ) -> Result<Hydrated, ResolveError> {
        let mut records = guarded(
            Stage::ProductHydration,
            self.timeout,
            self.source.fetch_products_by_ids(ctx, ids),
        )
        .await?;

        let present: HashSet<ProductId> = records.iter().map(|r| r.entity_id).collect();
        let missing: Vec<ProductId> = ids
            .iter()
            .copied()
            .filter(|id| !present.contains(id))
            .collect();

        let mut unavailable = Vec::new();
        if !missing.is_empty() {
            tracing::debug!(
                "Bulk product fetch missing {} of {} products; looking up individually",
                missing.len(),
                ids.len()
            );
            let (recovered, failed) = self.recover(ctx, &missing).await;
            records.extend(recovered);
            unavailable = failed;
        }

        for id in &unavailable {
            tracing::error!("system error: unable to load product data for {}", id);
        }

        let mut products = Vec::with_capacity(records.len());
        for record in &records {
            match format_product(record) {
                Ok(product) => products.push(product),
                Err(e) => {
                    tracing::error!("Dropping product {}: {}", record.entity_id, e);
                    unavailable.push(record.entity_id);
                }
            }
        }

        if products.is_empty() && !unavailable.is_empty() {
            return Err(HydrationError::ProductUnavailable(unavailable).into());
        }

        Ok(Hydrated {
            products,
            unavailable,
        })
    }

    /// Look up missing ids one by one; results come back in `missing` order
    ///
    /// A failed lookup counts the id as unavailable.
    async fn recover(
        &self,
        ctx: &StorefrontContext,
        missing: &[ProductId],
    ) -> (Vec<ProductRecord>, Vec<ProductId>) {
        let customer_id = ctx.customer_id;
        let mut found: HashMap<ProductId, ProductRecord> = stream::iter(missing.iter().copied())
            .map(|id| async move {
                let lookup = guarded(
                    Stage::ProductLookup,
                    self.timeout,
                    self.source.fetch_product_by_id(id, LookupKind::Id, customer_id),
                )
                .await;
                match lookup {
                    Ok(product) => product.map(|p| (id, ProductRecord::from(p))),
                    Err(e) => {
                        tracing::warn!("Lookup for product {} failed: {}", id, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(std::future::ready)
            .collect()
            .await;

        let mut recovered = Vec::with_capacity(found.len());
        let mut failed = Vec::new();
        for id in missing {
            match found.remove(id) {
                Some(record) => recovered.push(record),
                None => failed.push(*id),
            }
        }
        (recovered, failed)
    }
}

impl std::fmt::Debug for Hydrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hydrator")
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticCatalog;
    use crate::types::{ApiProduct, Prices};

    fn ids(raw: &[u64]) -> Vec<ProductId> {
        raw.iter().copied().map(ProductId).collect()
    }

    fn catalog_with(visible: &[u64], hidden: &[u64]) -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        for &id in visible {
            catalog
                .products
                .push(ProductRecord::new(ProductId(id), format!("SKU-{id}")));
        }
        for &id in hidden {
            catalog
                .hidden_products
                .push(ApiProduct::new(ProductId(id), format!("SKU-{id}")));
        }
        catalog
    }

    #[tokio::test]
    async fn bulk_fetch_covers_everything() {
        let catalog = catalog_with(&[1, 2], &[]);
        let config = ResolverConfig::default();
        let hydrated = Hydrator::new(&catalog, &config)
            .hydrate(&StorefrontContext::default(), &ids(&[1, 2]))
            .await
            .unwrap();

        let got: Vec<_> = hydrated.products.iter().map(|p| p.id).collect();
        assert_eq!(got, ids(&[1, 2]));
        assert!(hydrated.unavailable.is_empty());
    }

    #[tokio::test]
    async fn recovers_hidden_products_in_request_order() {
        let catalog = catalog_with(&[2], &[3, 1]);
        let config = ResolverConfig::default().with_fallback_concurrency(1);
        let hydrated = Hydrator::new(&catalog, &config)
            .hydrate(&StorefrontContext::default(), &ids(&[1, 2, 3]))
            .await
            .unwrap();

        let got: Vec<_> = hydrated.products.iter().map(|p| p.id).collect();
        assert_eq!(got, ids(&[2, 1, 3]));
    }

    #[tokio::test]
    async fn partial_failure_keeps_what_was_hydrated() {
        let catalog = catalog_with(&[1, 2], &[]);
        let config = ResolverConfig::default();
        let hydrated = Hydrator::new(&catalog, &config)
            .hydrate(&StorefrontContext::default(), &ids(&[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(hydrated.products.len(), 2);
        assert_eq!(hydrated.unavailable, ids(&[3]));
    }

    #[tokio::test]
    async fn malformed_record_is_unavailable() {
        let mut catalog = catalog_with(&[1, 3], &[]);
        catalog.products.push({
            let mut bad = ProductRecord::new(ProductId(2), "SKU-2");
            bad.prices = Some(Prices::flat(-1.0));
            bad
        });
        let config = ResolverConfig::default();
        let hydrated = Hydrator::new(&catalog, &config)
            .hydrate(&StorefrontContext::default(), &ids(&[1, 2, 3]))
            .await
            .unwrap();

        let got: Vec<_> = hydrated.products.iter().map(|p| p.id).collect();
        assert_eq!(got, ids(&[1, 3]));
        assert_eq!(hydrated.unavailable, ids(&[2]));
    }

    #[tokio::test]
    async fn total_failure_is_an_error() {
        let catalog = catalog_with(&[], &[]);
        let config = ResolverConfig::default();
        let err = Hydrator::new(&catalog, &config)
            .hydrate(&StorefrontContext::default(), &ids(&[4, 5]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Hydration(HydrationError::ProductUnavailable(ref missing)) if *missing == ids(&[4, 5])
        ));
    }
}
