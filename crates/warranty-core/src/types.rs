//! Core types for warranty resolution
//!
//! Defines the fundamental types shared across the pipeline:
//! - Identifiers for products, categories and customers
//! - The replacement tree and its candidate entries
//! - Raw collaborator records and the UI-ready [`WarrantyProduct`]

use crate::error::TreeError;
use crate::metafield::{Metafield, MetafieldConnection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique product identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique category identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storefront customer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Replacement tree
// =============================================================================

/// Global category → replacement product graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplacementTree {
    /// Top-level category nodes, in lookup order
    #[serde(default)]
    pub tree: Vec<CategoryNode>,
    /// Candidate entries keyed by product id
    #[serde(default)]
    pub products: BTreeMap<ProductId, ReplaceProduct>,
}

impl ReplacementTree {
    /// Check that every product referenced by a node has a table entry
    pub fn validate(&self) -> Result<(), TreeError> {
        fn check(
            node: &CategoryNode,
            products: &BTreeMap<ProductId, ReplaceProduct>,
        ) -> Result<(), TreeError> {
            for child in &node.children {
                match child {
                    TreeChild::Product(id) if !products.contains_key(id) => {
                        return Err(TreeError::DanglingProduct {
                            category: node.category_id,
                            product: *id,
                        });
                    }
                    TreeChild::Product(_) => {}
                    TreeChild::Category(inner) => check(inner, products)?,
                }
            }
            Ok(())
        }

        self.tree.iter().try_for_each(|node| check(node, &self.products))
    }

    /// Check that every candidate collected under `category` has a table entry
    pub fn check_candidates(
        &self,
        category: CategoryId,
        candidates: &[ProductId],
    ) -> Result<(), TreeError> {
        match candidates.iter().find(|id| !self.products.contains_key(id)) {
            Some(id) => Err(TreeError::DanglingProduct {
                category,
                product: *id,
            }),
            None => Ok(()),
        }
    }

    /// Candidate entry for a product
    #[inline]
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&ReplaceProduct> {
        self.products.get(&id)
    }
}

/// A category node in the replacement tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    /// Category this node stands for
    pub category_id: CategoryId,
    /// Nested categories and leaf product references, in declared order
    #[serde(default)]
    pub children: Vec<TreeChild>,
}

impl CategoryNode {
    /// Create an empty node
    #[inline]
    #[must_use]
    pub fn new(category_id: CategoryId) -> Self {
        Self {
            category_id,
            children: Vec::new(),
        }
    }

    /// Append a leaf product reference
    #[inline]
    #[must_use]
    pub fn with_product(mut self, id: ProductId) -> Self {
        self.children.push(TreeChild::Product(id));
        self
    }

    /// Append a nested category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, node: CategoryNode) -> Self {
        self.children.push(TreeChild::Category(node));
        self
    }
}

/// Child of a category node
///
/// A bare number is a leaf product reference; an object is a nested category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeChild {
    /// Leaf product reference
    Product(ProductId),
    /// Nested category
    Category(CategoryNode),
}

/// Candidate entry in the replacement tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceProduct {
    /// Product id
    pub id: ProductId,
    /// Compatible device tags
    #[serde(default)]
    pub device: Option<Vec<String>>,
    /// Owning category
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl ReplaceProduct {
    /// Create entry without device tags
    #[inline]
    #[must_use]
    pub fn new(id: ProductId) -> Self {
        Self {
            id,
            device: None,
            category_id: None,
        }
    }

    /// With device tags
    #[must_use]
    pub fn with_devices<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device = Some(devices.into_iter().map(Into::into).collect());
        self
    }

    /// Device tags, empty when none declared
    #[inline]
    #[must_use]
    pub fn devices(&self) -> &[String] {
        self.device.as_deref().unwrap_or_default()
    }
}

/// Candidate ids surviving eligibility, with their tree entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Eligible ids in candidate order
    pub product_ids: Vec<ProductId>,
    /// Tree entry per eligible id
    pub products: BTreeMap<ProductId, ReplaceProduct>,
}

impl UpgradeOptions {
    /// Record an eligible candidate
    pub fn push(&mut self, product: ReplaceProduct) {
        self.product_ids.push(product.id);
        self.products.insert(product.id, product);
    }

    /// Check if no candidates survived
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// Number of eligible candidates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.product_ids.len()
    }
}

// =============================================================================
// Pricing and inventory
// =============================================================================

/// Monetary amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Amount in major units
    pub value: f64,
    /// ISO currency code
    #[serde(default)]
    pub currency_code: Option<String>,
}

impl Money {
    /// Amount without currency
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value,
            currency_code: None,
        }
    }
}

/// Product price set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prices {
    /// Current price
    pub price: Money,
    /// List price
    #[serde(default)]
    pub base_price: Option<Money>,
    /// Sale price, when on sale
    #[serde(default)]
    pub sale_price: Option<Money>,
}

impl Prices {
    /// Flat price with no base or sale price
    #[inline]
    #[must_use]
    pub fn flat(value: f64) -> Self {
        Self {
            price: Money::new(value),
            base_price: None,
            sale_price: None,
        }
    }
}

/// Inventory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    /// Whether the product can be purchased
    pub is_in_stock: bool,
}

// =============================================================================
// Options and variants
// =============================================================================

/// Configurable product option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyProductOption {
    /// Option id
    pub entity_id: u64,
    /// Display name
    pub display_name: String,
    /// Short label (typically the option price)
    #[serde(default)]
    pub label: String,
}

/// Selected value of a variant option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    /// Display label
    pub label: String,
}

/// Variant option with its selected values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    /// Option name
    pub display_name: String,
    /// Selected values
    #[serde(default)]
    pub values: Vec<OptionValue>,
}

/// Variant selection attached to a product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Selected options
    #[serde(default)]
    pub options: Vec<VariantOption>,
}

/// Category association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Category id
    pub id: CategoryId,
}

/// Product image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL
    pub url: String,
    /// Alternate text
    #[serde(default)]
    pub alt_text: String,
}

// =============================================================================
// Collaborator records
// =============================================================================

/// Product record returned by the bulk storefront fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Product id
    pub entity_id: ProductId,
    /// Default variant id
    #[serde(default)]
    pub variant_entity_id: Option<u64>,
    /// Product name
    #[serde(default)]
    pub name: String,
    /// SKU
    #[serde(default)]
    pub sku: String,
    /// Price set
    #[serde(default)]
    pub prices: Option<Prices>,
    /// Inventory record
    #[serde(default)]
    pub inventory: Option<Inventory>,
    /// Default image
    #[serde(default)]
    pub default_image: Option<Image>,
    /// Category associations
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    /// Configurable options
    #[serde(default)]
    pub product_options: Vec<WarrantyProductOption>,
    /// Variant selection, when the record is a variant
    #[serde(default)]
    pub variant: Option<ProductVariant>,
    /// Product metafields
    #[serde(default)]
    pub metafields: Vec<Metafield>,
}

impl ProductRecord {
    /// Minimal record with id and SKU
    #[must_use]
    pub fn new(id: ProductId, sku: impl Into<String>) -> Self {
        Self {
            entity_id: id,
            variant_entity_id: None,
            name: String::new(),
            sku: sku.into(),
            prices: None,
            inventory: None,
            default_image: None,
            categories: Vec::new(),
            product_options: Vec::new(),
            variant: None,
            metafields: Vec::new(),
        }
    }
}

/// Product returned by the per-id lookup endpoint
///
/// This endpoint also serves hidden products that the bulk storefront
/// fetch omits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiProduct {
    /// Product id
    pub id: ProductId,
    /// Product name
    #[serde(default)]
    pub name: String,
    /// SKU
    #[serde(default)]
    pub sku: String,
    /// Current price
    #[serde(default)]
    pub price: f64,
    /// Sale price (zero when not on sale)
    #[serde(default)]
    pub sale_price: f64,
    /// Retail price (zero when unset)
    #[serde(default)]
    pub retail_price: f64,
    /// Stock level, when tracked
    #[serde(default)]
    pub inventory_level: Option<i64>,
    /// Whether the product is purchasable at all
    #[serde(default = "default_true")]
    pub availability: bool,
    /// Category ids
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    /// Image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Product metafields
    #[serde(default)]
    pub metafields: Option<Vec<Metafield>>,
}

fn default_true() -> bool {
    true
}

impl ApiProduct {
    /// Minimal product with id and SKU
    #[must_use]
    pub fn new(id: ProductId, sku: impl Into<String>) -> Self {
        Self {
            id,
            name: String::new(),
            sku: sku.into(),
            price: 0.0,
            sale_price: 0.0,
            retail_price: 0.0,
            inventory_level: None,
            availability: true,
            categories: Vec::new(),
            image_url: None,
            metafields: None,
        }
    }
}

impl From<ApiProduct> for ProductRecord {
    fn from(api: ApiProduct) -> Self {
        let positive = |v: f64| (v > 0.0).then(|| Money::new(v));
        let inventory = match api.inventory_level {
            Some(level) => Some(Inventory {
                is_in_stock: api.availability && level > 0,
            }),
            None if !api.availability => Some(Inventory { is_in_stock: false }),
            None => None,
        };
        Self {
            entity_id: api.id,
            variant_entity_id: None,
            name: api.name,
            sku: api.sku,
            prices: Some(Prices {
                price: Money::new(api.price),
                base_price: positive(api.retail_price),
                sale_price: positive(api.sale_price),
            }),
            inventory,
            default_image: api.image_url.map(|url| Image {
                url,
                alt_text: String::new(),
            }),
            categories: api.categories.into_iter().map(|id| CategoryRef { id }).collect(),
            product_options: Vec::new(),
            variant: None,
            metafields: api.metafields.unwrap_or_default(),
        }
    }
}

/// Bulk warranty metafield record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyFieldsRecord {
    /// Product id
    pub entity_id: ProductId,
    /// Metafield edges
    #[serde(default)]
    pub metafields: MetafieldConnection,
}

// =============================================================================
// UI-ready product
// =============================================================================

/// Hydrated, UI-ready product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantyProduct {
    /// Product id
    pub id: ProductId,
    /// Default variant id
    pub variant_id: Option<u64>,
    /// Product name
    pub name: String,
    /// SKU
    pub sku: String,
    /// SKU of the product that supersedes this one
    pub rpl_sku: Option<String>,
    /// Price set
    pub prices: Option<Prices>,
    /// Inventory record
    pub inventory: Option<Inventory>,
    /// Promoted as most popular
    pub most_popular: bool,
    /// End of life
    pub eol: bool,
    /// Compatible devices, comma separated
    pub compatibility: Option<String>,
    /// Image URL
    pub image: Option<String>,
    /// Image alternate text
    pub alt_text: Option<String>,
    /// Category associations
    pub categories: Vec<CategoryRef>,
    /// Configurable options
    pub product_options: Vec<WarrantyProductOption>,
    /// Whether this product is a specific variant
    pub is_variant: bool,
    /// Variant selection
    pub variant: Option<ProductVariant>,
}

impl WarrantyProduct {
    /// Bare product with id and SKU
    #[must_use]
    pub fn new(id: ProductId, sku: impl Into<String>) -> Self {
        Self {
            id,
            variant_id: None,
            name: String::new(),
            sku: sku.into(),
            rpl_sku: None,
            prices: None,
            inventory: None,
            most_popular: false,
            eol: false,
            compatibility: None,
            image: None,
            alt_text: None,
            categories: Vec::new(),
            product_options: Vec::new(),
            is_variant: false,
            variant: None,
        }
    }

    /// Check if stock is available (no inventory record counts as available)
    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inventory.map_or(true, |inv| inv.is_in_stock)
    }

    /// Check if inventory is known to be in stock
    #[inline]
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.inventory.is_some_and(|inv| inv.is_in_stock)
    }

    /// Category ids of this product
    #[must_use]
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|c| c.id).collect()
    }
}
