//! Claim session state
//!
//! The page owns a [`FormState`]. The pipeline never mutates it directly: it
//! reads a [`ResolutionContext`] and hands back a [`SessionDelta`].

use crate::isod::DeviceModifiers;
use crate::types::{CategoryId, CustomerId, ProductId, WarrantyProduct};
use serde::{Deserialize, Serialize};

/// Option chosen for a product in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProductOption {
    /// Option id
    pub name_id: u64,
    /// Option name
    pub name: String,
    /// Chosen value
    pub value: String,
}

/// Product placed in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    /// Product id
    pub id: ProductId,
    /// Variant id
    #[serde(default)]
    pub variant_id: Option<u64>,
    /// Quantity
    pub quantity: u32,
    /// Price after option selection, when known
    #[serde(default)]
    pub price: Option<f64>,
    /// Chosen options
    #[serde(default)]
    pub options: Vec<CartProductOption>,
}

impl CartProduct {
    /// Single unit of `product`
    #[must_use]
    pub fn single(product: &WarrantyProduct) -> Self {
        Self {
            id: product.id,
            variant_id: product.variant_id,
            quantity: 1,
            price: None,
            options: Vec::new(),
        }
    }
}

/// Cart selections for the claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartData {
    /// Chosen replacement
    #[serde(default)]
    pub replacement_product: Option<CartProduct>,
    /// Chosen add-ons
    #[serde(default)]
    pub add_on_products: Vec<CartProduct>,
}

impl CartData {
    /// Cart entry for the replacement, if it is `id`
    #[must_use]
    pub fn replacement(&self, id: ProductId) -> Option<&CartProduct> {
        self.replacement_product.as_ref().filter(|p| p.id == id)
    }

    /// Cart entry for add-on `id`
    #[must_use]
    pub fn add_on(&self, id: ProductId) -> Option<&CartProduct> {
        self.add_on_products.iter().find(|p| p.id == id)
    }
}

/// Claim form state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    /// Product the claim was filed for
    #[serde(default)]
    pub original_product: Option<WarrantyProduct>,
    /// Product superseding the original, when it declares one
    #[serde(default)]
    pub rpl_sku_product: Option<WarrantyProduct>,
    /// Resolved upgrade options; `None` while loading
    #[serde(default)]
    pub upgrade_options: Option<Vec<WarrantyProduct>>,
    /// Device tags overriding the tree's entry for the claimed product
    #[serde(default)]
    pub selected_device_tags: Option<Vec<String>>,
    /// Cart selections
    #[serde(default)]
    pub cart: CartData,
    /// Device modifiers from the storefront link
    #[serde(default)]
    pub modifiers: Option<DeviceModifiers>,
}

impl FormState {
    /// Form state for a claim on `product`
    #[must_use]
    pub fn for_product(product: WarrantyProduct) -> Self {
        Self {
            original_product: Some(product),
            ..Self::default()
        }
    }

    /// Product the page presents: the superseding product if any, else the original
    #[inline]
    #[must_use]
    pub fn active_product(&self) -> Option<&WarrantyProduct> {
        self.rpl_sku_product
            .as_ref()
            .or(self.original_product.as_ref())
    }

    /// Apply the pipeline's output
    pub fn apply(&mut self, delta: SessionDelta) {
        self.upgrade_options = Some(delta.upgrade_options);
    }

    /// Check if upgrade options resolved to a non-empty list
    #[must_use]
    pub fn has_upgrade_options(&self) -> bool {
        self.upgrade_options.as_ref().is_some_and(|o| !o.is_empty())
    }
}

/// Pipeline output written back to the form state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDelta {
    /// Ranked upgrade options
    pub upgrade_options: Vec<WarrantyProduct>,
}

/// Inputs the pipeline reads from the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Claimed product
    pub original_product_id: Option<ProductId>,
    /// Categories of the claimed product
    pub category_ids: Option<Vec<CategoryId>>,
    /// Device tags overriding the tree entry of the claimed product
    pub selected_device_tags: Option<Vec<String>>,
    /// Signed-in customer
    pub customer_id: Option<CustomerId>,
}

impl ResolutionContext {
    /// Context for `product` in `categories`
    #[must_use]
    pub fn new(product: ProductId, categories: Vec<CategoryId>) -> Self {
        Self {
            original_product_id: Some(product),
            category_ids: Some(categories),
            ..Self::default()
        }
    }

    /// With customer
    #[inline]
    #[must_use]
    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// With device tag override
    #[must_use]
    pub fn with_device_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_device_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Read the pipeline inputs out of the form state
    #[must_use]
    pub fn from_form_state(form: &FormState, customer_id: Option<CustomerId>) -> Self {
        let original = form.original_product.as_ref();
        Self {
            original_product_id: original.map(|p| p.id),
            category_ids: original.map(WarrantyProduct::category_ids),
            selected_device_tags: form.selected_device_tags.clone(),
            customer_id,
        }
    }
}
