//! Price resolution for the claim page and product cards

use crate::card::CardRole;
use crate::session::FormState;
use crate::types::{Money, WarrantyProduct};

fn non_zero(money: Option<&Money>) -> Option<f64> {
    money.map(|m| m.value).filter(|v| *v != 0.0)
}

/// Price the customer paid for `product`: the sale price when on sale
#[must_use]
pub fn item_price(product: &WarrantyProduct) -> Option<f64> {
    let prices = product.prices.as_ref()?;
    Some(non_zero(prices.sale_price.as_ref()).unwrap_or(prices.price.value))
}

/// Prices shown on a product card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPricing {
    /// Amount charged for choosing the card
    pub current: f64,
    /// List price
    pub original: f64,
}

impl CardPricing {
    /// Price label: `Free` or `+{symbol}{amount}`
    #[must_use]
    pub fn label(&self, currency_symbol: &str) -> String {
        if self.current > 0.0 {
            format!("+{}{:.2}", currency_symbol, self.current)
        } else {
            "Free".to_string()
        }
    }

    /// Struck-through list price label, when discounted
    #[must_use]
    pub fn original_label(&self, currency_symbol: &str) -> Option<String> {
        self.is_discounted()
            .then(|| format!("{}{:.2}", currency_symbol, self.original))
    }

    /// Check if the current price is below the list price
    #[inline]
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.current < self.original
    }
}

/// Compute card prices for `product` shown in `role`
///
/// A priced cart entry for the product (after option selection) overrides
/// the catalog price. Replacements other than the active product add
/// `upgrade_fee` while the active product is still in stock.
#[must_use]
pub fn card_pricing(
    product: &WarrantyProduct,
    role: CardRole,
    form: &FormState,
    upgrade_fee: f64,
) -> CardPricing {
    let prices = product.prices.as_ref();
    let price = prices.map_or(0.0, |p| p.price.value);
    let original = non_zero(prices.and_then(|p| p.base_price.as_ref())).unwrap_or(price);

    let cart_entry = match role {
        CardRole::Replacement => form.cart.replacement(product.id),
        CardRole::AddOn => form.cart.add_on(product.id),
    };
    let mut current = cart_entry
        .and_then(|entry| entry.price)
        .filter(|p| *p != 0.0)
        .unwrap_or(price);

    if role == CardRole::Replacement {
        if let Some(active) = form.active_product() {
            if active.is_in_stock() && active.id != product.id {
                current += upgrade_fee;
            }
        }
    }

    CardPricing { current, original }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CartProduct;
    use crate::types::{Inventory, Prices, ProductId};

    fn priced(id: u64, price: f64, base: Option<f64>, sale: Option<f64>) -> WarrantyProduct {
        let mut product = WarrantyProduct::new(ProductId(id), format!("SKU-{id}"));
        product.prices = Some(Prices {
            price: Money::new(price),
            base_price: base.map(Money::new),
            sale_price: sale.map(Money::new),
        });
        product
    }

    #[test]
    fn item_price_prefers_sale() {
        assert_eq!(item_price(&priced(1, 30.0, Some(40.0), Some(25.0))), Some(25.0));
        assert_eq!(item_price(&priced(1, 30.0, Some(40.0), None)), Some(30.0));
        assert_eq!(item_price(&priced(1, 30.0, None, Some(0.0))), Some(30.0));
        assert_eq!(item_price(&WarrantyProduct::new(ProductId(1), "A")), None);
    }

    #[test]
    fn labels() {
        let free = CardPricing {
            current: 0.0,
            original: 10.0,
        };
        assert_eq!(free.label("$"), "Free");
        assert_eq!(free.original_label("$").as_deref(), Some("$10.00"));

        let paid = CardPricing {
            current: 12.5,
            original: 12.5,
        };
        assert_eq!(paid.label("€"), "+€12.50");
        assert_eq!(paid.original_label("€"), None);
    }

    #[test]
    fn upgrade_fee_applies_to_other_products_when_original_in_stock() {
        let mut original = priced(1, 20.0, None, None);
        original.inventory = Some(Inventory { is_in_stock: true });
        let form = FormState::for_product(original.clone());
        let upgrade = priced(2, 5.0, Some(8.0), None);

        let pricing = card_pricing(&upgrade, CardRole::Replacement, &form, 10.0);
        assert_eq!(pricing.current, 15.0);
        assert_eq!(pricing.original, 8.0);

        let same = card_pricing(&original, CardRole::Replacement, &form, 10.0);
        assert_eq!(same.current, 20.0);

        let add_on = card_pricing(&upgrade, CardRole::AddOn, &form, 10.0);
        assert_eq!(add_on.current, 5.0);
    }

    #[test]
    fn no_fee_when_original_out_of_stock() {
        let mut original = priced(1, 20.0, None, None);
        original.inventory = Some(Inventory { is_in_stock: false });
        let form = FormState::for_product(original);

        let pricing = card_pricing(&priced(2, 5.0, None, None), CardRole::Replacement, &form, 10.0);
        assert_eq!(pricing.current, 5.0);
    }

    #[test]
    fn cart_price_overrides_catalog_price() {
        let product = priced(2, 5.0, None, None);
        let mut form = FormState::default();
        let mut entry = CartProduct::single(&product);
        entry.price = Some(9.0);
        form.cart.replacement_product = Some(entry.clone());
        form.cart.add_on_products.push(entry);

        assert_eq!(card_pricing(&product, CardRole::Replacement, &form, 0.0).current, 9.0);
        assert_eq!(card_pricing(&product, CardRole::AddOn, &form, 0.0).current, 9.0);
    }
}
