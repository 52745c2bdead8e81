//! Warranty Core - replacement and upgrade option resolution
//!
//! Given a warranty claim on a product, finds the replacement products the
//! customer may choose instead:
//! - Looks the product's categories up in the global replacement tree
//! - Filters candidates by warranty metadata and device compatibility
//! - Hydrates, canonicalizes and ranks the survivors
//!
//! The page-side view models (form state, pricing, product cards, page
//! heading) live alongside the pipeline and consume its output.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warranty_core::prelude::*;
//!
//! # async fn example(catalog: StaticCatalog) -> Result<(), ResolveError> {
//! let resolver = UpgradeResolver::new(Arc::new(catalog), ResolverConfig::new());
//! let ctx = ResolutionContext::new(ProductId(42), vec![CategoryId(7)]);
//!
//! let resolution = resolver.resolve(&ctx).await?;
//! println!("{} upgrade options", resolution.upgrade_options.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Pipeline
pub mod canonical;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod format;
pub mod hydration;
pub mod metafield;
pub mod resolver;
pub mod selection;
pub mod source;
pub mod tree;
pub mod types;

mod deadline;

// Page-side view models
pub mod card;
pub mod isod;
pub mod page;
pub mod pricing;
pub mod session;

// Re-exports for convenience
pub use config::{ResolverConfig, DEFAULT_FETCH_TIMEOUT_MS, UPGRADE_OPTIONS_LIMIT};
pub use error::{
    ConfigError, FormatError, HydrationError, IsodError, ResolveError, SourceError, Stage,
    TreeError,
};
pub use metafield::{Metafield, MetafieldKey, ProductMetafields, WarrantyFlags};
pub use resolver::{Resolution, UpgradeResolver};
pub use session::{CartData, CartProduct, FormState, ResolutionContext, SessionDelta};
pub use source::{CatalogSource, LookupKind, StaticCatalog, StorefrontContext};
pub use types::{
    ApiProduct, CategoryId, CategoryNode, CustomerId, ProductId, ProductRecord, ReplaceProduct,
    ReplacementTree, TreeChild, UpgradeOptions, WarrantyFieldsRecord, WarrantyProduct,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for resolving upgrade options
    pub use crate::{
        CatalogSource, CategoryId, FormState, ProductId, Resolution, ResolutionContext,
        ResolveError, ResolverConfig, StaticCatalog, UpgradeResolver, WarrantyProduct,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
