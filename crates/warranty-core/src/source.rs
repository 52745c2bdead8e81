//! Catalog collaborators
//!
//! The pipeline reaches the storefront only through [`CatalogSource`].
//! [`StaticCatalog`] serves a fixed snapshot and backs the CLI and tests.

use crate::error::SourceError;
use crate::types::{
    ApiProduct, CustomerId, ProductId, ProductRecord, ReplacementTree, WarrantyFieldsRecord,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a per-product lookup identifies the product
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Lookup by product id
    Id,
    /// Lookup by SKU; the id argument is ignored
    Sku(String),
}

impl LookupKind {
    /// Check if a product with `id` and `sku` is the one looked up
    #[must_use]
    pub fn matches(&self, requested: ProductId, id: ProductId, sku: &str) -> bool {
        match self {
            Self::Id => id == requested,
            Self::Sku(wanted) => sku == wanted,
        }
    }
}

/// Storefront request context for bulk product fetches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontContext {
    /// Signed-in customer
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
}

impl StorefrontContext {
    /// Context for a signed-in customer
    #[inline]
    #[must_use]
    pub fn for_customer(customer_id: Option<CustomerId>) -> Self {
        Self {
            customer_id,
            ..Self::default()
        }
    }
}

/// Catalog service consumed by the resolution pipeline
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Global replacement tree, or `None` if unavailable
    async fn fetch_replacement_tree(&self) -> Result<Option<ReplacementTree>, SourceError>;

    /// Warranty metafields for many products in one request
    async fn fetch_warranty_fields(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<WarrantyFieldsRecord>, SourceError>;

    /// Single product lookup that also sees hidden products
    async fn fetch_product_by_id(
        &self,
        id: ProductId,
        kind: LookupKind,
        customer_id: Option<CustomerId>,
    ) -> Result<Option<ApiProduct>, SourceError>;

    /// Storefront product records for many products in one request
    async fn fetch_products_by_ids(
        &self,
        ctx: &StorefrontContext,
        ids: &[ProductId],
    ) -> Result<Vec<ProductRecord>, SourceError>;
}

/// Fixed catalog snapshot
///
/// `products` are visible to the bulk storefront fetch; `hidden_products`
/// only to the per-id lookup. The per-id lookup serves both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticCatalog {
    /// Replacement tree
    #[serde(default)]
    pub tree: Option<ReplacementTree>,
    /// Bulk warranty metafield records
    #[serde(default)]
    pub warranty_fields: Vec<WarrantyFieldsRecord>,
    /// Storefront-visible products
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    /// Products served only by the per-id lookup
    #[serde(default)]
    pub hidden_products: Vec<ApiProduct>,
}

impl StaticCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON snapshot
    pub fn from_json(input: &str) -> Result<Self, SourceError> {
        serde_json::from_str(input).map_err(|e| SourceError::Decode(e.to_string()))
    }

    fn api_product(record: &ProductRecord) -> ApiProduct {
        let prices = record.prices.as_ref();
        ApiProduct {
            id: record.entity_id,
            name: record.name.clone(),
            sku: record.sku.clone(),
            price: prices.map_or(0.0, |p| p.price.value),
            sale_price: prices
                .and_then(|p| p.sale_price.as_ref())
                .map_or(0.0, |m| m.value),
            retail_price: prices
                .and_then(|p| p.base_price.as_ref())
                .map_or(0.0, |m| m.value),
            inventory_level: record.inventory.map(|inv| i64::from(inv.is_in_stock)),
            availability: record.inventory.map_or(true, |inv| inv.is_in_stock),
            categories: record.categories.iter().map(|c| c.id).collect(),
            image_url: record.default_image.as_ref().map(|img| img.url.clone()),
            metafields: Some(record.metafields.clone()),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_replacement_tree(&self) -> Result<Option<ReplacementTree>, SourceError> {
        Ok(self.tree.clone())
    }

    async fn fetch_warranty_fields(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<WarrantyFieldsRecord>, SourceError> {
        let wanted: HashSet<ProductId> = ids.iter().copied().collect();
        Ok(self
            .warranty_fields
            .iter()
            .filter(|record| wanted.contains(&record.entity_id))
            .cloned()
            .collect())
    }

    async fn fetch_product_by_id(
        &self,
        id: ProductId,
        kind: LookupKind,
        _customer_id: Option<CustomerId>,
    ) -> Result<Option<ApiProduct>, SourceError> {
        let hidden = self
            .hidden_products
            .iter()
            .find(|p| kind.matches(id, p.id, &p.sku));
        if let Some(product) = hidden {
            return Ok(Some(product.clone()));
        }
        Ok(self
            .products
            .iter()
            .find(|p| kind.matches(id, p.entity_id, &p.sku))
            .map(Self::api_product))
    }

    async fn fetch_products_by_ids(
        &self,
        _ctx: &StorefrontContext,
        ids: &[ProductId],
    ) -> Result<Vec<ProductRecord>, SourceError> {
        let wanted: HashSet<ProductId> = ids.iter().copied().collect();
        Ok(self
            .products
            .iter()
            .filter(|record| wanted.contains(&record.entity_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metafield::Metafield;

    fn catalog() -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        catalog.products.push(ProductRecord::new(ProductId(1), "A"));
        let mut hidden = ApiProduct::new(ProductId(2), "B");
        hidden.metafields = Some(vec![Metafield::new("is_registerable", "true")]);
        catalog.hidden_products.push(hidden);
        catalog
    }

    #[tokio::test]
    async fn bulk_fetch_skips_hidden_products() {
        let records = catalog()
            .fetch_products_by_ids(&StorefrontContext::default(), &[ProductId(1), ProductId(2)])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_id, ProductId(1));
    }

    #[tokio::test]
    async fn lookup_sees_hidden_and_visible_products() {
        let catalog = catalog();
        let hidden = catalog
            .fetch_product_by_id(ProductId(2), LookupKind::Id, None)
            .await
            .unwrap();
        assert_eq!(hidden.map(|p| p.sku), Some("B".to_string()));

        let visible = catalog
            .fetch_product_by_id(ProductId(1), LookupKind::Id, None)
            .await
            .unwrap();
        assert_eq!(visible.map(|p| p.sku), Some("A".to_string()));

        let missing = catalog
            .fetch_product_by_id(ProductId(3), LookupKind::Id, None)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn lookup_by_sku_ignores_id() {
        let catalog = catalog();
        let found = catalog
            .fetch_product_by_id(ProductId(0), LookupKind::Sku("B".to_string()), None)
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id), Some(ProductId(2)));

        let found = catalog
            .fetch_product_by_id(ProductId(2), LookupKind::Sku("A".to_string()), None)
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id), Some(ProductId(1)));
    }

    #[test]
    fn parses_json_snapshot() {
        let catalog = StaticCatalog::from_json(
            r#"{"tree": {"tree": [], "products": {}}, "hiddenProducts": [{"id": 4, "sku": "H"}]}"#,
        )
        .unwrap();
        assert!(catalog.tree.is_some());
        assert_eq!(catalog.hidden_products[0].id, ProductId(4));
        assert!(StaticCatalog::from_json("{").is_err());
    }
}
