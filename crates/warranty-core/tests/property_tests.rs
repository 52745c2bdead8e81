use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use warranty_core::canonical::canonicalize;
use warranty_core::{
    CategoryId, CategoryNode, ProductId, ReplaceProduct, Resolution, ResolutionContext, StaticCatalog,
    WarrantyProduct, UPGRADE_OPTIONS_LIMIT,
};
use warranty_test_utils::{
    out_of_stock, product_record, setup_test_resolver, warranty_fields, with_metafield,
    CatalogBuilder,
};

const DEVICES: [&str; 3] = ["phone", "tablet", "watch"];

#[derive(Debug, Clone)]
struct Candidate {
    devices: Vec<bool>,
    registerable: bool,
    hidden: bool,
    stock: Option<bool>,
    popular: bool,
}

fn candidate() -> impl Strategy<Value = Candidate> {
    (
        prop::collection::vec(any::<bool>(), DEVICES.len()),
        any::<bool>(),
        any::<bool>(),
        prop::option::of(any::<bool>()),
        any::<bool>(),
    )
        .prop_map(|(devices, registerable, hidden, stock, popular)| Candidate {
            devices,
            registerable,
            hidden,
            stock,
            popular,
        })
}

fn tags(mask: &[bool]) -> Vec<String> {
    DEVICES
        .iter()
        .zip(mask)
        .filter(|(_, on)| **on)
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}

/// Candidates get ids 1..=n in category 10
fn catalog(candidates: &[Candidate]) -> StaticCatalog {
    let mut node = CategoryNode::new(CategoryId(10));
    let mut builder = CatalogBuilder::new();
    for (index, c) in candidates.iter().enumerate() {
        let id = index as u64 + 1;
        node = node.with_product(ProductId(id));
        builder = builder
            .entry(ReplaceProduct::new(ProductId(id)).with_devices(tags(&c.devices)))
            .fields(warranty_fields(
                id,
                &[
                    ("is_registerable", if c.registerable { "true" } else { "false" }),
                    ("hide_from_warranty", if c.hidden { "true" } else { "false" }),
                ],
            ));

        let mut record = product_record(id, &format!("SKU-{id}"));
        if c.popular {
            record = with_metafield(record, "most_popular", "true");
        }
        record = match c.stock {
            Some(false) => out_of_stock(record),
            Some(true) => record,
            None => {
                record.inventory = None;
                record
            }
        };
        builder = builder.product(record);
    }
    builder.node(node).build()
}

fn resolve(catalog: StaticCatalog, ctx: &ResolutionContext) -> Resolution {
    let resolver = setup_test_resolver(Arc::new(catalog));
    tokio_test::block_on(resolver.resolve(ctx)).unwrap()
}

proptest! {
    #[test]
    fn prop_resolution_invariants(
        candidates in prop::collection::vec(candidate(), 0..25),
        original in 1u64..30,
        selected in prop::option::of(prop::collection::vec(any::<bool>(), DEVICES.len())),
    ) {
        let catalog = catalog(&candidates);
        let mut ctx = ResolutionContext::new(ProductId(original), vec![CategoryId(10)]);
        if let Some(mask) = &selected {
            ctx = ctx.with_device_tags(tags(mask));
        }

        let first = resolve(catalog.clone(), &ctx);
        let second = resolve(catalog, &ctx);
        prop_assert_eq!(&first, &second);

        let options = &first.upgrade_options;
        prop_assert_eq!(first.no_results, options.is_empty());
        prop_assert!(options.len() <= UPGRADE_OPTIONS_LIMIT);

        let selected_tags: Vec<String> = match &selected {
            Some(mask) => tags(mask),
            None => candidates
                .get(original as usize - 1)
                .map(|c| tags(&c.devices))
                .unwrap_or_default(),
        };

        let mut seen = HashSet::new();
        for product in options {
            prop_assert_ne!(product.id, ProductId(original));
            prop_assert!(seen.insert(product.id));
            prop_assert!(product.is_available());

            let c = &candidates[product.id.0 as usize - 1];
            prop_assert!(c.registerable && !c.hidden);
            let offered = tags(&c.devices);
            prop_assert!(selected_tags.iter().all(|t| offered.contains(t)));
        }

        let popular_prefix = options.iter().take_while(|p| p.most_popular).count();
        prop_assert!(options[popular_prefix..].iter().all(|p| !p.most_popular));
    }

    #[test]
    fn prop_canonicalize_is_idempotent(
        entries in prop::collection::vec(
            (0u64..8, 0usize..6, prop::option::of(0usize..8)),
            0..12,
        ),
    ) {
        // Small id and SKU ranges so duplicates and shared SKUs are common
        let products: Vec<WarrantyProduct> = entries
            .iter()
            .map(|(id, sku, target)| {
                let mut product = WarrantyProduct::new(ProductId(*id), format!("S{sku}"));
                product.rpl_sku = target.map(|t| format!("S{t}"));
                product
            })
            .collect();

        let once = canonicalize(&products);
        let twice = canonicalize(&once);
        prop_assert_eq!(&once, &twice);

        let ids: HashSet<ProductId> = once.iter().map(|p| p.id).collect();
        prop_assert_eq!(ids.len(), once.len());
        prop_assert!(once.len() <= products.len());
    }
}
