//! Typed product metadata
//!
//! Metafields arrive as loosely-typed `key`/`value` string pairs in two
//! shapes: GraphQL edges from the bulk warranty fetch and a flat list from
//! the per-id lookup. Both are mapped onto a closed set of known keys here.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw metafield entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    /// Metafield key
    pub key: String,
    /// Metafield value
    #[serde(default)]
    pub value: Option<String>,
}

impl Metafield {
    /// Create metafield
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// GraphQL connection of metafields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetafieldConnection {
    /// Edges in response order
    #[serde(default)]
    pub edges: Vec<MetafieldEdge>,
}

impl MetafieldConnection {
    /// Iterate the metafields carried by the edges
    pub fn iter(&self) -> impl Iterator<Item = &Metafield> + Clone {
        self.edges.iter().map(|edge| &edge.node)
    }
}

impl FromIterator<Metafield> for MetafieldConnection {
    fn from_iter<I: IntoIterator<Item = Metafield>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().map(|node| MetafieldEdge { node }).collect(),
        }
    }
}

/// GraphQL edge wrapping a metafield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetafieldEdge {
    /// The metafield
    pub node: Metafield,
}

/// Metafield keys the pipeline understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetafieldKey {
    /// Product can be registered under warranty
    IsRegisterable,
    /// Product must not be offered as a warranty option
    HideFromWarranty,
    /// SKU of the product that supersedes this one
    ReplacementSku,
    /// Promoted as most popular
    MostPopular,
    /// End of life
    EndOfLife,
    /// Compatible devices
    Compatibility,
}

impl MetafieldKey {
    /// All known keys
    pub const ALL: [MetafieldKey; 6] = [
        Self::IsRegisterable,
        Self::HideFromWarranty,
        Self::ReplacementSku,
        Self::MostPopular,
        Self::EndOfLife,
        Self::Compatibility,
    ];

    /// Wire name of the key
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsRegisterable => "is_registerable",
            Self::HideFromWarranty => "hide_from_warranty",
            Self::ReplacementSku => "rpl_sku",
            Self::MostPopular => "most_popular",
            Self::EndOfLife => "eol",
            Self::Compatibility => "compatibility",
        }
    }
}

impl FromStr for MetafieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown metafield key: {s}"))
    }
}

/// First value recorded for `key`, in list order
fn first_value<'a, I>(fields: I, key: MetafieldKey) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a Metafield>,
{
    fields
        .into_iter()
        .find(|field| field.key == key.as_str())
        .and_then(|field| field.value.as_deref())
}

// `is_registerable` matches "true" exactly; every other flag ignores case.
fn is_exact_true(value: Option<&str>) -> bool {
    value == Some("true")
}

fn is_true_ignore_case(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Warranty eligibility flags for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarrantyFlags {
    /// Product can be registered under warranty
    pub is_registerable: bool,
    /// Product must not be offered
    pub hide_from_warranty: bool,
}

impl WarrantyFlags {
    /// Flags for a candidate with no metadata at all
    pub const MISSING: WarrantyFlags = WarrantyFlags {
        is_registerable: false,
        hide_from_warranty: false,
    };

    /// Derive flags from a metafield list
    pub fn from_metafields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a Metafield> + Clone,
    {
        Self {
            is_registerable: is_exact_true(first_value(fields.clone(), MetafieldKey::IsRegisterable)),
            hide_from_warranty: is_true_ignore_case(first_value(
                fields,
                MetafieldKey::HideFromWarranty,
            )),
        }
    }

    /// Check if the flags allow offering the product
    #[inline]
    #[must_use]
    pub fn is_offerable(&self) -> bool {
        self.is_registerable && !self.hide_from_warranty
    }
}

/// Typed view of the product metafields used for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductMetafields {
    /// SKU of the product that supersedes this one
    pub rpl_sku: Option<String>,
    /// Promoted as most popular
    pub most_popular: bool,
    /// End of life
    pub eol: bool,
    /// Compatible devices
    pub compatibility: Option<String>,
}

impl ProductMetafields {
    /// Parse the known keys out of a metafield list
    pub fn from_metafields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a Metafield> + Clone,
    {
        Self {
            rpl_sku: non_empty(first_value(fields.clone(), MetafieldKey::ReplacementSku)),
            most_popular: is_true_ignore_case(first_value(fields.clone(), MetafieldKey::MostPopular)),
            eol: is_true_ignore_case(first_value(fields.clone(), MetafieldKey::EndOfLife)),
            compatibility: non_empty(first_value(fields, MetafieldKey::Compatibility)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(fields: &[Metafield]) -> WarrantyFlags {
        WarrantyFlags::from_metafields(fields.iter())
    }

    #[test]
    fn key_round_trips_through_wire_name() {
        for key in MetafieldKey::ALL {
            assert_eq!(key.as_str().parse::<MetafieldKey>(), Ok(key));
        }
        assert!("color".parse::<MetafieldKey>().is_err());
    }

    #[test]
    fn registerable_requires_exact_lowercase_true() {
        assert!(flags(&[Metafield::new("is_registerable", "true")]).is_registerable);
        assert!(!flags(&[Metafield::new("is_registerable", "TRUE")]).is_registerable);
        assert!(!flags(&[Metafield::new("is_registerable", "True")]).is_registerable);
        assert!(!flags(&[]).is_registerable);
    }

    #[test]
    fn hidden_flag_ignores_case() {
        assert!(flags(&[Metafield::new("hide_from_warranty", "TRUE")]).hide_from_warranty);
        assert!(flags(&[Metafield::new("hide_from_warranty", "True")]).hide_from_warranty);
        assert!(!flags(&[Metafield::new("hide_from_warranty", "yes")]).hide_from_warranty);
        assert!(!flags(&[]).hide_from_warranty);
    }

    #[test]
    fn first_matching_key_wins() {
        let fields = [
            Metafield::new("is_registerable", "false"),
            Metafield::new("is_registerable", "true"),
        ];
        assert!(!flags(&fields).is_registerable);
    }

    #[test]
    fn null_value_is_not_true() {
        let fields = [Metafield {
            key: "is_registerable".to_string(),
            value: None,
        }];
        assert!(!flags(&fields).is_registerable);
    }

    #[test]
    fn connection_and_list_agree() {
        let list = vec![
            Metafield::new("is_registerable", "true"),
            Metafield::new("hide_from_warranty", "false"),
        ];
        let connection: MetafieldConnection = list.clone().into_iter().collect();

        assert_eq!(
            WarrantyFlags::from_metafields(connection.iter()),
            WarrantyFlags::from_metafields(list.iter())
        );
        assert!(flags(&list).is_offerable());
    }

    #[test]
    fn product_metafields_parse() {
        let fields = [
            Metafield::new("rpl_sku", " B-200 "),
            Metafield::new("most_popular", "True"),
            Metafield::new("eol", "false"),
            Metafield::new("compatibility", ""),
            Metafield::new("unrelated", "x"),
        ];
        let parsed = ProductMetafields::from_metafields(fields.iter());

        assert_eq!(parsed.rpl_sku.as_deref(), Some("B-200"));
        assert!(parsed.most_popular);
        assert!(!parsed.eol);
        assert_eq!(parsed.compatibility, None);
    }
}
