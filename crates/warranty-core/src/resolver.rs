//! Upgrade option resolution
//!
//! Runs the pipeline for one claim, strictly in stage order:
//! 1. Tree lookup and candidate extraction
//! 2. Eligibility filter (warranty metadata, device compatibility)
//! 3. Hydration into [`WarrantyProduct`]s
//! 4. Canonicalization and dedup
//! 5. Stock filter, cap, popularity ranking
//!
//! Only a missing original product escapes [`UpgradeResolver::resolve`] as an
//! error. Everything else ends in a [`Resolution`], degraded to "no results"
//! when a collaborator fails.

use crate::canonical::canonicalize;
use crate::config::ResolverConfig;
use crate::deadline::guarded;
use crate::eligibility::EligibilityFilter;
use crate::error::{ResolveError, Stage};
use crate::hydration::Hydrator;
use crate::selection;
use crate::session::{ResolutionContext, SessionDelta};
use crate::source::{CatalogSource, StorefrontContext};
use crate::tree::{collect_candidates, find_node};
use crate::types::{ProductId, UpgradeOptions, WarrantyProduct};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Ranked upgrade options
    pub upgrade_options: Vec<WarrantyProduct>,
    /// Set when there is nothing to offer
    pub no_results: bool,
}

impl Resolution {
    /// Nothing to offer
    #[inline]
    #[must_use]
    pub fn no_results() -> Self {
        Self {
            upgrade_options: Vec::new(),
            no_results: true,
        }
    }

    /// Options to offer; an empty list means no results
    #[must_use]
    pub fn found(upgrade_options: Vec<WarrantyProduct>) -> Self {
        let no_results = upgrade_options.is_empty();
        Self {
            upgrade_options,
            no_results,
        }
    }

    /// Session update carrying the options
    #[must_use]
    pub fn into_delta(self) -> SessionDelta {
        SessionDelta {
            upgrade_options: self.upgrade_options,
        }
    }
}

/// Resolves upgrade options against a catalog source
pub struct UpgradeResolver {
    config: ResolverConfig,
    source: Arc<dyn CatalogSource>,
}

impl UpgradeResolver {
    /// Create resolver
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, config: ResolverConfig) -> Self {
        Self { config, source }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Eligible candidate ids for the claim
    ///
    /// Never fails: collaborator errors are logged and yield an empty set.
    pub async fn upgrade_options(&self, ctx: &ResolutionContext) -> UpgradeOptions {
        let Some(original) = ctx.original_product_id else {
            tracing::debug!("No original product; skipping upgrade lookup");
            return UpgradeOptions::default();
        };

        match self.eligible_candidates(original, ctx).await {
            Ok(options) => options,
            Err(e) => {
                log_degraded("Upgrade lookup", original, &e);
                UpgradeOptions::default()
            }
        }
    }

    async fn eligible_candidates(
        &self,
        original: ProductId,
        ctx: &ResolutionContext,
    ) -> Result<UpgradeOptions, ResolveError> {
        let Some(category_ids) = ctx.category_ids.as_deref() else {
            tracing::debug!("Product {} has no categories", original);
            return Ok(UpgradeOptions::default());
        };

        let tree = guarded(
            Stage::TreeFetch,
            self.config.fetch_timeout(),
            self.source.fetch_replacement_tree(),
        )
        .await?;
        let Some(tree) = tree else {
            tracing::debug!("Replacement tree unavailable");
            return Ok(UpgradeOptions::default());
        };

        let Some(node) = find_node(&tree, category_ids) else {
            tracing::debug!("No tree node for categories {:?}", category_ids);
            return Ok(UpgradeOptions::default());
        };
        let Some(candidates) = collect_candidates(node, category_ids) else {
            tracing::debug!("Category {} has no candidates", node.category_id);
            return Ok(UpgradeOptions::default());
        };
        tree.check_candidates(node.category_id, &candidates)?;
        tracing::debug!(
            "Category {} yielded {} candidates",
            node.category_id,
            candidates.len()
        );

        let selected_devices = match &ctx.selected_device_tags {
            Some(tags) => tags.clone(),
            None => tree
                .product(original)
                .map(|entry| entry.devices().to_vec())
                .unwrap_or_default(),
        };

        EligibilityFilter::new(self.source.as_ref(), &self.config)
            .filter(
                &tree,
                &candidates,
                original,
                &selected_devices,
                ctx.customer_id,
            )
            .await
    }

    /// Resolve ranked upgrade options for the claim
    ///
    /// # Errors
    /// [`ResolveError::MissingOriginalProduct`] when the context names no
    /// product. Every other failure degrades to [`Resolution::no_results`].
    pub async fn resolve(&self, ctx: &ResolutionContext) -> Result<Resolution, ResolveError> {
        let original = ctx
            .original_product_id
            .ok_or(ResolveError::MissingOriginalProduct)?;
        tracing::info!("Resolving upgrade options for product {}", original);

        let options = self.upgrade_options(ctx).await;
        if options.is_empty() {
            tracing::info!("No upgrade options for product {}", original);
            return Ok(Resolution::no_results());
        }

        match self.hydrate_and_select(ctx, &options).await {
            Ok(products) => {
                tracing::info!(
                    "Resolved {} upgrade options for product {}",
                    products.len(),
                    original
                );
                Ok(Resolution::found(products))
            }
            Err(e) => {
                log_degraded("Upgrade resolution", original, &e);
                Ok(Resolution::no_results())
            }
        }
    }

    async fn hydrate_and_select(
        &self,
        ctx: &ResolutionContext,
        options: &UpgradeOptions,
    ) -> Result<Vec<WarrantyProduct>, ResolveError> {
        let storefront = StorefrontContext::for_customer(ctx.customer_id);
        let hydrated = Hydrator::new(self.source.as_ref(), &self.config)
            .hydrate(&storefront, &options.product_ids)
            .await?;

        let canonical = canonicalize(&hydrated.products);
        Ok(selection::select(
            canonical,
            self.config.upgrade_options_limit,
        ))
    }
}

fn log_degraded(operation: &str, original: ProductId, e: &ResolveError) {
    tracing::error!(
        stage = ?e.stage(),
        retryable = e.is_retryable(),
        "{} for product {} failed: {}",
        operation,
        original,
        e
    );
}

impl std::fmt::Debug for UpgradeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
