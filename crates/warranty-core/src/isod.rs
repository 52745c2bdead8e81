//! Device modifiers carried by storefront links
//!
//! Links from the device configurator carry
//! `isod_product=[type,brand,model,coverage,material]`. The material is
//! percent-encoded twice by the configurator.

use crate::error::IsodError;
use serde::{Deserialize, Serialize};

const PARAM: &str = "isod_product=[";

/// Device selection attached to a replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceModifiers {
    /// Device type
    #[serde(rename = "Device Type")]
    pub device_type: String,
    /// Device brand
    #[serde(rename = "Device Brand")]
    pub device_brand: String,
    /// Device model
    #[serde(rename = "Device Model")]
    pub device_model: String,
    /// Coverage
    #[serde(rename = "Coverage")]
    pub coverage: String,
    /// Material
    #[serde(rename = "Material")]
    pub material: String,
}

impl DeviceModifiers {
    /// Check if `url` carries a device parameter
    #[inline]
    #[must_use]
    pub fn is_present(url: &str) -> bool {
        url.contains("isod_product=")
    }

    /// Parse the device parameter out of `url`
    ///
    /// Returns `Ok(None)` when the parameter is absent.
    pub fn from_url(url: &str) -> Result<Option<Self>, IsodError> {
        if !Self::is_present(url) {
            return Ok(None);
        }

        let decoded = decode(url)?;
        let Some((_, rest)) = decoded.split_once(PARAM) else {
            return Ok(None);
        };
        let list = rest.split_once("]&").map_or(rest, |(list, _)| list);
        let mut fields = list.split(',');

        let mut next = |name: &'static str| {
            fields
                .next()
                .map(ToString::to_string)
                .ok_or(IsodError::MissingField(name))
        };
        let device_type = next("device type")?;
        let device_brand = next("device brand")?;
        let device_model = next("device model")?;
        let coverage = next("coverage")?;
        let raw_material = next("material")?;

        let material = raw_material
            .split_once(']')
            .map_or(raw_material.as_str(), |(m, _)| m);

        Ok(Some(Self {
            device_type,
            device_brand,
            device_model,
            coverage,
            material: decode(material)?,
        }))
    }
}

fn decode(input: &str) -> Result<String, IsodError> {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .map_err(|e| IsodError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_parameter() {
        assert_eq!(
            DeviceModifiers::from_url("https://shop.example/warranty?claim=1"),
            Ok(None)
        );
    }

    #[test]
    fn parses_all_fields() {
        let url = "https://shop.example/warranty?isod_product=[Phone,Acme,X%2012,Full,Tempered%2520Glass]&claim=1";
        let modifiers = DeviceModifiers::from_url(url).unwrap().unwrap();

        assert_eq!(modifiers.device_type, "Phone");
        assert_eq!(modifiers.device_brand, "Acme");
        assert_eq!(modifiers.device_model, "X 12");
        assert_eq!(modifiers.coverage, "Full");
        assert_eq!(modifiers.material, "Tempered Glass");
    }

    #[test]
    fn parameter_at_end_of_url() {
        let url = "https://shop.example/warranty?claim=1&isod_product=[Tablet,Acme,T1,Screen,Matte]";
        let modifiers = DeviceModifiers::from_url(url).unwrap().unwrap();
        assert_eq!(modifiers.material, "Matte");
    }

    #[test]
    fn missing_fields_are_reported() {
        let url = "https://shop.example/?isod_product=[Phone,Acme]&x=1";
        assert_eq!(
            DeviceModifiers::from_url(url),
            Err(IsodError::MissingField("device model"))
        );
    }

    #[test]
    fn serializes_with_display_names() {
        let modifiers = DeviceModifiers {
            device_type: "Phone".into(),
            device_brand: "Acme".into(),
            device_model: "X".into(),
            coverage: "Full".into(),
            material: "Glass".into(),
        };
        let json = serde_json::to_value(&modifiers).unwrap();
        assert_eq!(json["Device Type"], "Phone");
        assert_eq!(json["Material"], "Glass");
    }
}
