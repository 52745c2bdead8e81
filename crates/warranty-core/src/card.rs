//! Product card view model
//!
//! Decides what a card shows and what choosing it does, for both roles:
//! - [`CardRole::Replacement`]: radio choice of the replacement product
//! - [`CardRole::AddOn`]: checkbox toggling an add-on

use crate::error::IsodError;
use crate::isod::DeviceModifiers;
use crate::session::{CartProduct, FormState};
use crate::types::{ProductId, WarrantyProduct, WarrantyProductOption};

const SCREEN_REPAIR_GUARANTEE: &str = "screen repair guarantee";

/// Role a card plays on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardRole {
    /// Replacement choice (radio input)
    Replacement,
    /// Add-on toggle (checkbox input)
    AddOn,
}

impl CardRole {
    /// Role for an input type (`radio` or `checkbox`)
    #[must_use]
    pub fn from_input_type(input_type: &str) -> Option<Self> {
        match input_type {
            "radio" => Some(Self::Replacement),
            "checkbox" => Some(Self::AddOn),
            _ => None,
        }
    }

    fn cart_entry<'a>(self, form: &'a FormState, id: ProductId) -> Option<&'a CartProduct> {
        match self {
            Self::Replacement => form.cart.replacement(id),
            Self::AddOn => form.cart.add_on(id),
        }
    }
}

fn is_screen_repair(name: &str) -> bool {
    name.to_lowercase().contains(SCREEN_REPAIR_GUARANTEE)
}

/// The product's screen repair guarantee option, if it offers one
#[must_use]
pub fn screen_repair_guarantee(product: &WarrantyProduct) -> Option<&WarrantyProductOption> {
    product
        .product_options
        .iter()
        .find(|option| is_screen_repair(&option.display_name))
}

/// Check if the guarantee is already chosen for this card's cart entry
#[must_use]
pub fn is_screen_repair_checked(product: &WarrantyProduct, role: CardRole, form: &FormState) -> bool {
    let Some(guarantee) = screen_repair_guarantee(product) else {
        return false;
    };
    role.cart_entry(form, product.id).is_some_and(|entry| {
        entry
            .options
            .iter()
            .any(|option| option.name_id == guarantee.entity_id)
    })
}

/// Name/value pair listed under the product name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOption {
    /// Option name
    pub name: String,
    /// Selected value
    pub value: String,
}

/// Options to list on the card
///
/// Variants list their own option values. Otherwise the options chosen for
/// the card's cart entry are listed, minus the screen repair guarantee
/// which has its own checkbox.
#[must_use]
pub fn selected_options(product: &WarrantyProduct, role: CardRole, form: &FormState) -> Vec<SelectedOption> {
    if product.is_variant {
        if let Some(variant) = &product.variant {
            return variant
                .options
                .iter()
                .map(|option| SelectedOption {
                    name: option.display_name.clone(),
                    value: option
                        .values
                        .first()
                        .map(|v| v.label.clone())
                        .unwrap_or_default(),
                })
                .collect();
        }
    }

    role.cart_entry(form, product.id)
        .map(|entry| {
            entry
                .options
                .iter()
                .filter(|option| !is_screen_repair(&option.name))
                .map(|option| SelectedOption {
                    name: option.name.clone(),
                    value: option.value.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Compatibility line; mobile layouts show only the first device
#[must_use]
pub fn compatibility_label(product: &WarrantyProduct, mobile: bool) -> Option<&str> {
    let compatibility = product.compatibility.as_deref()?;
    if mobile {
        compatibility.split(',').next()
    } else {
        Some(compatibility)
    }
}

/// Configurator products (`isod-` SKUs) have no quick view
#[inline]
#[must_use]
pub fn shows_quick_view_button(product: &WarrantyProduct) -> bool {
    !product.sku.contains("isod-")
}

/// Check if the card is the current choice
#[must_use]
pub fn is_selected(product: &WarrantyProduct, role: CardRole, form: &FormState) -> bool {
    role.cart_entry(form, product.id).is_some()
}

/// Request to open the quick view modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickViewRequest {
    /// Product to show
    pub product_id: ProductId,
    /// Role the product was chosen in
    pub role: CardRole,
}

/// Outcome of interacting with a card
#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    /// Make the product the replacement
    SelectReplacement {
        /// Cart entry
        product: CartProduct,
        /// Device modifiers from the storefront link
        modifiers: Option<DeviceModifiers>,
    },
    /// Add the product as an add-on
    AddOn(CartProduct),
    /// Remove the add-on
    RemoveAddOn(ProductId),
    /// Options must be chosen first
    ShowQuickView(QuickViewRequest),
}

impl CardAction {
    /// Apply the action to the form state
    ///
    /// Returns the quick view request for the page to open, if any.
    pub fn apply(self, form: &mut FormState) -> Option<QuickViewRequest> {
        match self {
            Self::SelectReplacement { product, modifiers } => {
                form.cart.replacement_product = Some(product);
                if modifiers.is_some() {
                    form.modifiers = modifiers;
                }
                None
            }
            Self::AddOn(product) => {
                if form.cart.add_on(product.id).is_none() {
                    form.cart.add_on_products.push(product);
                }
                None
            }
            Self::RemoveAddOn(id) => {
                form.cart.add_on_products.retain(|p| p.id != id);
                None
            }
            Self::ShowQuickView(request) => Some(request),
        }
    }
}

/// Decide what choosing (or un-choosing) a card does
///
/// `checked` is the new input state; `page_url` may carry device modifiers
/// from the configurator, which take precedence over the options modal.
pub fn select(
    product: &WarrantyProduct,
    role: CardRole,
    checked: bool,
    page_url: &str,
) -> Result<CardAction, IsodError> {
    let quick_view = CardAction::ShowQuickView(QuickViewRequest {
        product_id: product.id,
        role,
    });
    let has_options = !product.product_options.is_empty();

    match role {
        CardRole::Replacement => {
            if let Some(modifiers) = DeviceModifiers::from_url(page_url)? {
                return Ok(CardAction::SelectReplacement {
                    product: CartProduct::single(product),
                    modifiers: Some(modifiers),
                });
            }
            if has_options {
                return Ok(quick_view);
            }
            Ok(CardAction::SelectReplacement {
                product: CartProduct::single(product),
                modifiers: None,
            })
        }
        CardRole::AddOn if !checked => Ok(CardAction::RemoveAddOn(product.id)),
        CardRole::AddOn if has_options => Ok(quick_view),
        CardRole::AddOn => Ok(CardAction::AddOn(CartProduct::single(product))),
    }
}
