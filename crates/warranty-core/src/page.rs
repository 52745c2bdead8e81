//! Replacement page view model
//!
//! Derives what the claim page shows from the form state: the heading and
//! product panel for the claimed product, and whether the upgrade section
//! is shown, loading or populated.

use crate::pricing::item_price;
use crate::session::FormState;
use crate::types::WarrantyProduct;

/// Page heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageHeading {
    /// Active product is in stock
    SelectReplacement,
    /// Active product is end of life and out of stock
    DiscontinuedItem,
    /// Active product is temporarily out of stock
    NotifyWhenBackInStock,
}

impl PageHeading {
    /// Heading text
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::SelectReplacement => "Select Replacement",
            Self::DiscontinuedItem => "Discontinued Item",
            Self::NotifyWhenBackInStock => "Notify Me When Back in Stock",
        }
    }
}

/// Panel shown for the active product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductPanel {
    /// Product card offering the active product itself
    Replacement,
    /// End-of-life notice; points at the upgrades when there are any
    EndOfLife {
        /// Whether upgrade options resolved
        has_upgrade_options: bool,
    },
    /// Back-in-stock subscription
    BackInStock,
}

/// State of the upgrade options section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeSection {
    /// Not shown
    Hidden,
    /// Resolution in flight
    Loading,
    /// Resolved; `count` options listed under the heading when non-zero
    Ready {
        /// Number of options
        count: usize,
    },
}

/// Everything the page renders
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    /// Page heading, when there is an active product
    pub heading: Option<PageHeading>,
    /// Active product panel
    pub panel: Option<ProductPanel>,
    /// Price of the active product
    pub item_price: Option<f64>,
    /// Upgrade options section
    pub upgrades: UpgradeSection,
}

impl PageView {
    /// Build the view for `form`
    ///
    /// `no_results` is set when the last resolution degraded after an error.
    #[must_use]
    pub fn build(form: &FormState, no_results: bool) -> Self {
        let active = form.active_product();
        let has_upgrade_options = form.has_upgrade_options();

        let upgrades = match (&form.upgrade_options, no_results) {
            (_, true) => UpgradeSection::Hidden,
            (None, false) => UpgradeSection::Loading,
            (Some(options), false) => UpgradeSection::Ready {
                count: options.len(),
            },
        };

        Self {
            heading: active.map(heading),
            panel: active.map(|product| panel(product, has_upgrade_options)),
            item_price: active.and_then(item_price),
            upgrades,
        }
    }

    /// Check if the "Upgrade Options" heading is shown
    #[must_use]
    pub fn shows_upgrade_heading(&self) -> bool {
        matches!(self.upgrades, UpgradeSection::Ready { count } if count > 0)
    }
}

fn heading(product: &WarrantyProduct) -> PageHeading {
    if product.is_in_stock() {
        PageHeading::SelectReplacement
    } else if product.eol {
        PageHeading::DiscontinuedItem
    } else {
        PageHeading::NotifyWhenBackInStock
    }
}

fn panel(product: &WarrantyProduct, has_upgrade_options: bool) -> ProductPanel {
    if product.is_in_stock() {
        ProductPanel::Replacement
    } else if product.eol {
        ProductPanel::EndOfLife {
            has_upgrade_options,
        }
    } else {
        ProductPanel::BackInStock
    }
}
