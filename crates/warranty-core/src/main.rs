use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use warranty_core::card::{compatibility_label, CardRole};
use warranty_core::page::PageView;
use warranty_core::pricing::card_pricing;
use warranty_core::{
    format, CatalogSource, CategoryId, CustomerId, FormState, LookupKind, ProductId,
    ProductRecord, ResolutionContext, ResolverConfig, StaticCatalog, UpgradeResolver,
};

fn cli() -> Command {
    Command::new("warranty-resolve")
        .version(warranty_core::VERSION)
        .about("Resolve warranty replacement and upgrade options against a catalog snapshot")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("resolve")
                .about("Resolve upgrade options for a claimed product")
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog snapshot (JSON)"),
                )
                .arg(
                    Arg::new("product")
                        .long("product")
                        .value_parser(value_parser!(u64))
                        .help("Claimed product id"),
                )
                .arg(
                    Arg::new("sku")
                        .long("sku")
                        .help("Claimed product SKU"),
                )
                .group(
                    ArgGroup::new("claimed")
                        .args(["product", "sku"])
                        .required(true),
                )
                .arg(
                    Arg::new("categories")
                        .long("categories")
                        .value_delimiter(',')
                        .value_parser(value_parser!(u64))
                        .help("Category ids; defaults to the product's own categories"),
                )
                .arg(
                    Arg::new("devices")
                        .long("devices")
                        .value_delimiter(',')
                        .help("Device tags overriding the tree entry of the product"),
                )
                .arg(
                    Arg::new("customer")
                        .long("customer")
                        .value_parser(value_parser!(u64))
                        .help("Signed-in customer id"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Resolver configuration (TOML)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a catalog snapshot's replacement tree")
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog snapshot (JSON)"),
                ),
        )
}

fn load_catalog(args: &ArgMatches) -> anyhow::Result<StaticCatalog> {
    let path = args
        .get_one::<PathBuf>("catalog")
        .context("--catalog is required")?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    StaticCatalog::from_json(&raw).with_context(|| format!("parsing catalog {}", path.display()))
}

async fn resolve(args: &ArgMatches) -> anyhow::Result<()> {
    let catalog = load_catalog(args)?;
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => ResolverConfig::from_path(path)?,
        None => ResolverConfig::new(),
    };
    let customer_id = args.get_one::<u64>("customer").copied().map(CustomerId);
    let (requested, kind) = match args.get_one::<String>("sku") {
        Some(sku) => (ProductId(0), LookupKind::Sku(sku.clone())),
        None => (
            ProductId(*args.get_one::<u64>("product").context("--product or --sku is required")?),
            LookupKind::Id,
        ),
    };

    let record = catalog
        .fetch_product_by_id(requested, kind.clone(), customer_id)
        .await?
        .map(ProductRecord::from);
    let product_id = match (&record, &kind) {
        (Some(record), _) => record.entity_id,
        (None, LookupKind::Id) => requested,
        (None, LookupKind::Sku(sku)) => bail!("no product with SKU {sku}"),
    };
    let mut form = match record {
        Some(record) => FormState::for_product(format::format_product(&record)?),
        None => FormState::default(),
    };
    if let Some(devices) = args.get_many::<String>("devices") {
        form.selected_device_tags = Some(devices.cloned().collect());
    }

    let mut ctx = ResolutionContext::from_form_state(&form, customer_id);
    ctx.original_product_id = Some(product_id);
    if let Some(categories) = args.get_many::<u64>("categories") {
        ctx.category_ids = Some(categories.copied().map(CategoryId).collect());
    }

    let resolver = UpgradeResolver::new(Arc::new(catalog), config);
    let resolution = resolver.resolve(&ctx).await?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    let no_results = resolution.no_results;
    form.apply(resolution.into_delta());
    let view = PageView::build(&form, no_results);
    if let Some(heading) = view.heading {
        println!("{}", heading.title());
    }
    if no_results {
        println!("No upgrade options for product {}", product_id);
        return Ok(());
    }

    let symbol = &resolver.config().currency_symbol;
    println!("Upgrade options for product {}:", product_id);
    for product in form.upgrade_options.iter().flatten() {
        let pricing = card_pricing(
            product,
            CardRole::Replacement,
            &form,
            resolver.config().upgrade_fee,
        );
        println!(
            "  {:>8}  {:<20} {:<32} {:>10}{}{}",
            product.id,
            product.sku,
            product.name,
            pricing.label(symbol),
            if product.most_popular { "  [most popular]" } else { "" },
            compatibility_label(product, false)
                .map(|c| format!("  ({})", c))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

fn validate(args: &ArgMatches) -> anyhow::Result<()> {
    let catalog = load_catalog(args)?;
    let Some(tree) = &catalog.tree else {
        bail!("catalog has no replacement tree");
    };
    tree.validate()?;

    println!("Replacement tree OK");
    println!("  Top-level categories: {}", tree.tree.len());
    println!("  Candidate entries: {}", tree.products.len());
    println!("  Warranty field records: {}", catalog.warranty_fields.len());
    println!(
        "  Products: {} visible, {} hidden",
        catalog.products.len(),
        catalog.hidden_products.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("resolve", args)) => resolve(args).await,
        Some(("validate", args)) => validate(args),
        Some((other, _)) => bail!("unknown subcommand {other}"),
        None => bail!("no subcommand given"),
    }
}
