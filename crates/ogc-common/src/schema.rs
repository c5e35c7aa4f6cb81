//! Service and feature type descriptions shared by query and transaction code.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::{OgcError, OgcResult};

/// OGC service protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Wms,
    Wfs,
}

impl Protocol {
    /// Version used for GetCapabilities when none is given.
    pub fn default_version(&self) -> &'static str {
        match self {
            Protocol::Wms => "1.3.0",
            Protocol::Wfs => "1.1.0",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Wms => write!(f, "WMS"),
            Protocol::Wfs => write!(f, "WFS"),
        }
    }
}

/// An OGC endpoint. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    base_url: Url,
    protocol: Protocol,
    version: String,
}

impl ServiceDescriptor {
    /// Validate `base_url` and build a descriptor.
    pub fn new(base_url: &str, protocol: Protocol, version: impl Into<String>) -> OgcResult<Self> {
        Ok(Self {
            base_url: parse_endpoint(base_url)?,
            protocol,
            version: version.into(),
        })
    }

    /// Descriptor using the protocol's default version.
    pub fn with_default_version(base_url: &str, protocol: Protocol) -> OgcResult<Self> {
        Self::new(base_url, protocol, protocol.default_version())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Parse a base URL, rejecting anything that cannot carry a query string.
pub fn parse_endpoint(base_url: &str) -> OgcResult<Url> {
    let url = Url::parse(base_url.trim()).map_err(|e| OgcError::invalid_endpoint(base_url, e))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(OgcError::invalid_endpoint(
            base_url,
            "expected an http(s) URL",
        ));
    }
    Ok(url)
}

/// Attribute layout of a WFS feature type, from DescribeFeatureType.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTypeSchema {
    /// Target namespace of the feature type
    pub feature_namespace: String,
    /// Prefix bound to `feature_namespace` in payloads
    pub feature_prefix: String,
    /// Local name of the feature type
    pub feature_type: String,
    pub geometry_name: String,
    /// Geometry kind such as `Point` or `MultiSurface`
    pub geometry_type: String,
    /// Non-geometry attribute names, sorted case-insensitively
    pub attributes: Vec<String>,
    /// WFS endpoint the schema was described from
    pub source_url: String,
    /// Value kind of each non-geometry attribute, from its XSD type
    #[serde(default)]
    pub attribute_kinds: BTreeMap<String, AttributeKind>,
}

/// How the text of an attribute element decodes into a property value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Integer,
    Decimal,
    Boolean,
    #[default]
    Text,
}

impl AttributeKind {
    /// Kind for an XSD built-in type's local name, e.g. `int` or `double`.
    pub fn from_xsd(local_type: &str) -> Self {
        match local_type {
            "int" | "integer" | "long" | "short" | "byte" | "nonNegativeInteger"
            | "positiveInteger" | "negativeInteger" | "nonPositiveInteger" | "unsignedLong"
            | "unsignedInt" | "unsignedShort" | "unsignedByte" => AttributeKind::Integer,
            "decimal" | "double" | "float" => AttributeKind::Decimal,
            "boolean" => AttributeKind::Boolean,
            _ => AttributeKind::Text,
        }
    }

    /// Decode element text. Text that does not parse stays a string.
    pub fn decode(&self, text: &str) -> Value {
        let trimmed = text.trim();
        let decoded = match self {
            AttributeKind::Integer | AttributeKind::Decimal => trimmed
                .parse::<i64>()
                .map(Value::from)
                .ok()
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                }),
            AttributeKind::Boolean => match trimmed {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            AttributeKind::Text => None,
        };
        decoded.unwrap_or_else(|| Value::String(text.to_string()))
    }
}

impl FeatureTypeSchema {
    /// `prefix:type` as used in `typeName` attributes.
    pub fn qualified_type_name(&self) -> String {
        if self.feature_prefix.is_empty() {
            self.feature_type.clone()
        } else {
            format!("{}:{}", self.feature_prefix, self.feature_type)
        }
    }

    pub fn source_url(&self) -> OgcResult<Url> {
        parse_endpoint(&self.source_url)
    }

    /// Kind of an attribute; undeclared attributes are text.
    pub fn attribute_kind(&self, name: &str) -> AttributeKind {
        self.attribute_kinds.get(name).copied().unwrap_or_default()
    }
}

/// Sort attribute names case-insensitively, keeping a stable order for
/// names that differ only in case.
pub fn sort_attributes(attributes: &mut [String]) {
    attributes.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;

    #[test]
    fn test_descriptor_rejects_malformed_url() {
        let err = ServiceDescriptor::new("not a url", Protocol::Wfs, "1.1.0").unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidEndpoint);

        let err = ServiceDescriptor::new("mailto:someone@example.com", Protocol::Wms, "1.3.0")
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidEndpoint);
    }

    #[test]
    fn test_descriptor_defaults() {
        let service =
            ServiceDescriptor::with_default_version("http://localhost/geoserver/wms", Protocol::Wms)
                .unwrap();
        assert_eq!(service.version(), "1.3.0");
        assert_eq!(service.base_url().path(), "/geoserver/wms");
    }

    #[test]
    fn test_attribute_kind_decoding() {
        assert_eq!(AttributeKind::from_xsd("int"), AttributeKind::Integer);
        assert_eq!(AttributeKind::from_xsd("double"), AttributeKind::Decimal);
        assert_eq!(AttributeKind::from_xsd("string"), AttributeKind::Text);

        assert_eq!(AttributeKind::Integer.decode("42"), Value::from(42));
        assert_eq!(AttributeKind::Decimal.decode("42"), Value::from(42));
        assert_eq!(AttributeKind::Decimal.decode("2.5"), Value::from(2.5));
        assert_eq!(AttributeKind::Boolean.decode("true"), Value::Bool(true));
        assert_eq!(AttributeKind::Integer.decode("n/a"), Value::from("n/a"));
        assert_eq!(AttributeKind::Text.decode("007"), Value::from("007"));
    }

    #[test]
    fn test_sort_attributes_case_insensitive() {
        let mut attributes = vec!["Zipcode".to_string(), "Name".to_string(), "age".to_string()];
        sort_attributes(&mut attributes);
        assert_eq!(attributes, vec!["age", "Name", "Zipcode"]);
    }
}
