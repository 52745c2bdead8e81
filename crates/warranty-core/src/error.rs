//! Error types for warranty resolution
//!
//! Two tiers:
//! - Precondition violations that escape [`crate::UpgradeResolver::resolve`]
//! - Unexpected collaborator failures that are logged and degraded into a
//!   "no upgrade options" outcome at the pipeline boundary

use crate::types::{CategoryId, ProductId};
use std::fmt;

/// Main resolution error type
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The form state carries no original product id
    #[error("required product id is missing from form data")]
    MissingOriginalProduct,

    /// A collaborator call failed
    #[error("{stage} failed: {source}")]
    Source {
        /// Pipeline stage that issued the call
        stage: Stage,
        /// Underlying collaborator error
        #[source]
        source: SourceError,
    },

    /// A collaborator call exceeded the configured deadline
    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout {
        /// Pipeline stage that issued the call
        stage: Stage,
        /// Configured deadline
        timeout_ms: u64,
    },

    /// Replacement tree is structurally invalid
    #[error("invalid replacement tree: {0}")]
    Tree(#[from] TreeError),

    /// Product hydration failed
    #[error("hydration failed: {0}")]
    Hydration(#[from] HydrationError),
}

impl ResolveError {
    /// Check if error is a caller precondition violation (never degraded)
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingOriginalProduct)
    }

    /// Stage the error originated from, if any
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Source { stage, .. } | Self::Timeout { stage, .. } => Some(*stage),
            Self::Tree(_) => Some(Stage::TreeFetch),
            Self::Hydration(_) => Some(Stage::ProductHydration),
            Self::MissingOriginalProduct => None,
        }
    }

    /// Check if a later attempt could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source { source, .. } => source.is_retryable(),
            Self::Timeout { .. } => true,
            Self::MissingOriginalProduct | Self::Tree(_) | Self::Hydration(_) => false,
        }
    }

    /// Wrap a collaborator error with its stage
    #[inline]
    pub fn collaborator(stage: Stage, source: SourceError) -> Self {
        Self::Source { stage, source }
    }
}

/// Pipeline stages that talk to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Replacement tree fetch
    TreeFetch,
    /// Bulk warranty metafield fetch
    WarrantyFields,
    /// Per-id product lookup (metadata or hydration fallback)
    ProductLookup,
    /// Bulk product hydration
    ProductHydration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TreeFetch => "replacement tree fetch",
            Self::WarrantyFields => "warranty fields fetch",
            Self::ProductLookup => "product lookup",
            Self::ProductHydration => "product hydration",
        };
        f.write_str(name)
    }
}

/// Errors reported by catalog collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Transport-level failure (network, HTTP status)
    #[error("transport error: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Service reported itself unavailable
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Unavailable(_))
    }
}

/// Replacement tree invariant violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A node references a product missing from the products table
    #[error("category {category} references unknown product {product}")]
    DanglingProduct {
        /// Category node holding the reference
        category: CategoryId,
        /// Product id absent from the table
        product: ProductId,
    },
}

/// Hydration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HydrationError {
    /// Neither the bulk fetch nor the per-id fallback produced these products
    #[error("unable to load product data for {}", join_ids(.0))]
    ProductUnavailable(Vec<ProductId>),
}

fn join_ids(ids: &[ProductId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors normalizing a raw product record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// A price field is negative or not finite
    #[error("product {product}: invalid {field} price {value}")]
    InvalidPrice {
        /// Offending product
        product: ProductId,
        /// Price field name
        field: &'static str,
        /// Raw value
        value: f64,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML did not parse into a config
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed values are out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Device modifier URL parameter errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IsodError {
    /// URL is not valid percent-encoded UTF-8
    #[error("malformed url encoding: {0}")]
    Encoding(String),

    /// The parameter list is shorter than expected
    #[error("device parameter missing field {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::collaborator(
            Stage::WarrantyFields,
            SourceError::Transport("connection reset".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "warranty fields fetch failed: transport error: connection reset"
        );
    }

    #[test]
    fn only_missing_product_is_precondition() {
        assert!(ResolveError::MissingOriginalProduct.is_precondition());
        assert!(!ResolveError::Timeout {
            stage: Stage::TreeFetch,
            timeout_ms: 10
        }
        .is_precondition());
        assert!(!ResolveError::Hydration(HydrationError::ProductUnavailable(vec![])).is_precondition());
    }

    #[test]
    fn stage_is_reported() {
        let err = ResolveError::Timeout {
            stage: Stage::ProductLookup,
            timeout_ms: 5,
        };
        assert_eq!(err.stage(), Some(Stage::ProductLookup));
        assert_eq!(ResolveError::MissingOriginalProduct.stage(), None);
    }

    #[test]
    fn hydration_error_lists_ids() {
        let err = HydrationError::ProductUnavailable(vec![ProductId(3), ProductId(7)]);
        assert_eq!(err.to_string(), "unable to load product data for 3, 7");
    }

    #[test]
    fn source_error_retryable() {
        assert!(SourceError::Transport("x".into()).is_retryable());
        assert!(SourceError::Unavailable("x".into()).is_retryable());
        assert!(!SourceError::Decode("x".into()).is_retryable());
    }

    #[test]
    fn resolve_error_retryable() {
        let decode = ResolveError::collaborator(Stage::TreeFetch, SourceError::Decode("x".into()));
        assert!(!decode.is_retryable());
        assert!(ResolveError::Timeout {
            stage: Stage::WarrantyFields,
            timeout_ms: 5
        }
        .is_retryable());
        assert!(!ResolveError::Tree(TreeError::DanglingProduct {
            category: CategoryId(1),
            product: ProductId(2)
        })
        .is_retryable());
    }
}
