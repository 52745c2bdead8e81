//! Normalization of raw product records into [`WarrantyProduct`]

use crate::error::FormatError;
use crate::metafield::ProductMetafields;
use crate::types::{Money, Prices, ProductId, ProductRecord, WarrantyProduct};

/// Normalize a storefront record into the UI-ready shape
///
/// Prices must be finite and non-negative.
pub fn format_product(record: &ProductRecord) -> Result<WarrantyProduct, FormatError> {
    if let Some(prices) = &record.prices {
        check_prices(record.entity_id, prices)?;
    }

    let meta = ProductMetafields::from_metafields(record.metafields.iter());

    Ok(WarrantyProduct {
        id: record.entity_id,
        variant_id: record.variant_entity_id,
        name: record.name.clone(),
        sku: record.sku.clone(),
        rpl_sku: meta.rpl_sku,
        prices: record.prices.clone(),
        inventory: record.inventory,
        most_popular: meta.most_popular,
        eol: meta.eol,
        compatibility: meta.compatibility,
        image: record.default_image.as_ref().map(|img| img.url.clone()),
        alt_text: record
            .default_image
            .as_ref()
            .map(|img| img.alt_text.clone())
            .filter(|alt| !alt.is_empty()),
        categories: record.categories.clone(),
        product_options: record.product_options.clone(),
        is_variant: record.variant.is_some(),
        variant: record.variant.clone(),
    })
}

fn check_prices(product: ProductId, prices: &Prices) -> Result<(), FormatError> {
    let fields: [(&'static str, Option<&Money>); 3] = [
        ("current", Some(&prices.price)),
        ("base", prices.base_price.as_ref()),
        ("sale", prices.sale_price.as_ref()),
    ];
    for (field, money) in fields {
        if let Some(money) = money {
            if !money.value.is_finite() || money.value < 0.0 {
                return Err(FormatError::InvalidPrice {
                    product,
                    field,
                    value: money.value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metafield::Metafield;
    use crate::types::{Image, Inventory, ProductVariant};

    #[test]
    fn formats_metafields_and_image() {
        let mut record = ProductRecord::new(ProductId(1), "A-100");
        record.name = "Case".to_string();
        record.inventory = Some(Inventory { is_in_stock: true });
        record.default_image = Some(Image {
            url: "https://cdn.example/a.png".to_string(),
            alt_text: String::new(),
        });
        record.metafields = vec![
            Metafield::new("rpl_sku", "A-200"),
            Metafield::new("most_popular", "true"),
            Metafield::new("compatibility", "Phone 12,Phone 12 Pro"),
        ];

        let product = format_product(&record).unwrap();
        assert_eq!(product.rpl_sku.as_deref(), Some("A-200"));
        assert!(product.most_popular);
        assert!(!product.eol);
        assert_eq!(product.compatibility.as_deref(), Some("Phone 12,Phone 12 Pro"));
        assert_eq!(product.image.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(product.alt_text, None);
        assert!(!product.is_variant);
    }

    #[test]
    fn variant_record_is_marked() {
        let mut record = ProductRecord::new(ProductId(1), "A");
        record.variant = Some(ProductVariant::default());
        assert!(format_product(&record).unwrap().is_variant);
    }

    #[test]
    fn rejects_negative_price() {
        let mut record = ProductRecord::new(ProductId(7), "A");
        record.prices = Some(Prices {
            price: Money::new(10.0),
            base_price: None,
            sale_price: Some(Money::new(-1.0)),
        });

        let err = format_product(&record).unwrap_err();
        assert_eq!(
            err,
            FormatError::InvalidPrice {
                product: ProductId(7),
                field: "sale",
                value: -1.0,
            }
        );
    }

    #[test]
    fn rejects_nan_price() {
        let mut record = ProductRecord::new(ProductId(7), "A");
        record.prices = Some(Prices::flat(f64::NAN));
        assert!(format_product(&record).is_err());
    }
}
