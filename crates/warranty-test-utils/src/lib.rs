//! Testing utilities for the warranty workspace
//!
//! Catalog fixtures and a scriptable [`CatalogSource`] with failure
//! injection, delays and call recording.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warranty_core::metafield::{Metafield, MetafieldConnection};
use warranty_core::types::{CategoryRef, Inventory, Prices};
use warranty_core::{
    ApiProduct, CatalogSource, CategoryId, CategoryNode, CustomerId, LookupKind, ProductId,
    ProductRecord, ReplaceProduct, ReplacementTree, ResolverConfig, SourceError, StaticCatalog,
    StorefrontContext, TreeChild, UpgradeResolver, WarrantyFieldsRecord,
};

// =============================================================================
// Fixtures
// =============================================================================

pub fn ids(raw: &[u64]) -> Vec<ProductId> {
    raw.iter().copied().map(ProductId).collect()
}

pub fn warranty_fields(id: u64, fields: &[(&str, &str)]) -> WarrantyFieldsRecord {
    WarrantyFieldsRecord {
        entity_id: ProductId(id),
        metafields: fields
            .iter()
            .map(|(key, value)| Metafield::new(*key, *value))
            .collect::<MetafieldConnection>(),
    }
}

pub fn registerable(id: u64) -> WarrantyFieldsRecord {
    warranty_fields(id, &[("is_registerable", "true"), ("hide_from_warranty", "false")])
}

/// In-stock record priced at `id` dollars, in category 10
pub fn product_record(id: u64, sku: &str) -> ProductRecord {
    let mut record = ProductRecord::new(ProductId(id), sku);
    record.name = format!("Product {id}");
    record.prices = Some(Prices::flat(id as f64));
    record.inventory = Some(Inventory { is_in_stock: true });
    record.categories = vec![CategoryRef { id: CategoryId(10) }];
    record
}

pub fn with_metafield(mut record: ProductRecord, key: &str, value: &str) -> ProductRecord {
    record.metafields.push(Metafield::new(key, value));
    record
}

pub fn out_of_stock(mut record: ProductRecord) -> ProductRecord {
    record.inventory = Some(Inventory { is_in_stock: false });
    record
}

pub fn hidden_product(id: u64, sku: &str) -> ApiProduct {
    let mut product = ApiProduct::new(ProductId(id), sku);
    product.name = format!("Hidden {id}");
    product.price = id as f64;
    product
}

/// Fluent builder for [`StaticCatalog`] snapshots
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: StaticCatalog,
    tree: ReplacementTree,
    has_tree: bool,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: CategoryNode) -> Self {
        self.tree.tree.push(node);
        self.has_tree = true;
        self
    }

    pub fn entry(mut self, entry: ReplaceProduct) -> Self {
        self.tree.products.insert(entry.id, entry);
        self.has_tree = true;
        self
    }

    /// Tree entries without device tags for every id
    pub fn entries(self, raw: &[u64]) -> Self {
        raw.iter()
            .fold(self, |builder, id| builder.entry(ReplaceProduct::new(ProductId(*id))))
    }

    /// Append `id` to the last category node, adding a plain tree entry if missing
    pub fn candidate(mut self, id: u64) -> Self {
        let id = ProductId(id);
        if let Some(node) = self.tree.tree.last_mut() {
            node.children.push(TreeChild::Product(id));
        }
        self.tree
            .products
            .entry(id)
            .or_insert_with(|| ReplaceProduct::new(id));
        self.has_tree = true;
        self
    }

    pub fn fields(mut self, record: WarrantyFieldsRecord) -> Self {
        self.catalog.warranty_fields.push(record);
        self
    }

    /// Registerable, visible warranty fields for every id
    pub fn registerable(self, raw: &[u64]) -> Self {
        raw.iter().fold(self, |builder, id| builder.fields(registerable(*id)))
    }

    pub fn product(mut self, record: ProductRecord) -> Self {
        self.catalog.products.push(record);
        self
    }

    /// Default in-stock records (`SKU-{id}`) for every id
    pub fn products(self, raw: &[u64]) -> Self {
        raw.iter().fold(self, |builder, id| {
            builder.product(product_record(*id, &format!("SKU-{id}")))
        })
    }

    pub fn hidden(mut self, product: ApiProduct) -> Self {
        self.catalog.hidden_products.push(product);
        self
    }

    pub fn build(mut self) -> StaticCatalog {
        if self.has_tree {
            self.catalog.tree = Some(self.tree);
        }
        self.catalog
    }
}

/// Category 10 holding `raw` as direct children, each with a plain tree entry,
/// registerable warranty fields and an in-stock product record
pub fn flat_catalog(raw: &[u64]) -> CatalogBuilder {
    let node = raw.iter().fold(CategoryNode::new(CategoryId(10)), |node, id| {
        node.with_product(ProductId(*id))
    });
    CatalogBuilder::new()
        .node(node)
        .entries(raw)
        .registerable(raw)
        .products(raw)
}

pub fn setup_test_resolver(source: Arc<dyn CatalogSource>) -> UpgradeResolver {
    UpgradeResolver::new(source, ResolverConfig::new())
}

// =============================================================================
// Scripted catalog
// =============================================================================

/// Collaborator call kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Tree,
    WarrantyFields,
    ProductById,
    ProductsByIds,
}

/// A recorded collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub call: Call,
    pub ids: Vec<ProductId>,
}

/// [`StaticCatalog`] wrapper with scripted failures and delays
#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    inner: StaticCatalog,
    failures: Mutex<HashMap<Call, SourceError>>,
    failing_lookups: Mutex<HashSet<ProductId>>,
    delays: Mutex<HashMap<Call, Duration>>,
    requests: Mutex<Vec<Request>>,
    tree_calls: AtomicUsize,
    field_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    bulk_calls: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn new(inner: StaticCatalog) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Every `call` fails with `error`
    pub fn fail(self, call: Call, error: SourceError) -> Self {
        self.failures.lock().insert(call, error);
        self
    }

    /// Per-id lookups for `id` fail
    pub fn fail_lookup(self, id: ProductId) -> Self {
        self.failing_lookups.lock().insert(id);
        self
    }

    /// Every `call` sleeps for `delay` first
    pub fn delay(self, call: Call, delay: Duration) -> Self {
        self.delays.lock().insert(call, delay);
        self
    }

    pub fn calls(&self, call: Call) -> usize {
        self.counter(call).load(Ordering::SeqCst)
    }

    /// Calls in the order they were issued
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }

    fn counter(&self, call: Call) -> &AtomicUsize {
        match call {
            Call::Tree => &self.tree_calls,
            Call::WarrantyFields => &self.field_calls,
            Call::ProductById => &self.lookup_calls,
            Call::ProductsByIds => &self.bulk_calls,
        }
    }

    async fn enter(&self, call: Call, ids: &[ProductId]) -> Result<(), SourceError> {
        self.requests.lock().push(Request {
            call,
            ids: ids.to_vec(),
        });
        self.counter(call).fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().get(&call).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().get(&call).cloned();
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_replacement_tree(&self) -> Result<Option<ReplacementTree>, SourceError> {
        self.enter(Call::Tree, &[]).await?;
        self.inner.fetch_replacement_tree().await
    }

    async fn fetch_warranty_fields(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<WarrantyFieldsRecord>, SourceError> {
        self.enter(Call::WarrantyFields, ids).await?;
        self.inner.fetch_warranty_fields(ids).await
    }

    async fn fetch_product_by_id(
        &self,
        id: ProductId,
        kind: LookupKind,
        customer_id: Option<CustomerId>,
    ) -> Result<Option<ApiProduct>, SourceError> {
        self.enter(Call::ProductById, &[id]).await?;
        if self.failing_lookups.lock().contains(&id) {
            return Err(SourceError::Unavailable(format!("product {id} not found")));
        }
        self.inner.fetch_product_by_id(id, kind, customer_id).await
    }

    async fn fetch_products_by_ids(
        &self,
        ctx: &StorefrontContext,
        ids: &[ProductId],
    ) -> Result<Vec<ProductRecord>, SourceError> {
        self.enter(Call::ProductsByIds, ids).await?;
        self.inner.fetch_products_by_ids(ctx, ids).await
    }
}
