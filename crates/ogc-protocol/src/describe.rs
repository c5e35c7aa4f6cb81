//! WFS DescribeFeatureType schema parsing.

use ogc_common::schema::sort_attributes;
use std::collections::BTreeMap;

use ogc_common::{AttributeKind, FeatureTypeSchema, OgcError, OgcResult};
use tracing::debug;

use crate::exceptions::{inspect, Classified};
use crate::xml::{parse_document, XmlElement, GML_NS, XSD_NS};

/// Synthetic GML envelope attribute, never a real feature attribute.
const BOUNDED_BY: &str = "boundedBy";

/// Parse a DescribeFeatureType response body.
///
/// Exception reports and anything that is not an XML schema fail with
/// `DescribeFeatureTypeFailed`.
pub fn describe_feature_type(
    body: &str,
    layer_name: &str,
    source_url: &str,
) -> OgcResult<FeatureTypeSchema> {
    let root = parse_document(body)
        .map_err(|e| OgcError::DescribeFeatureTypeFailed(format!("Unparseable schema: {}", e)))?;
    let root = match inspect(root) {
        Classified::Success(root) => root,
        Classified::Exception { text, .. } => return Err(OgcError::DescribeFeatureTypeFailed(text)),
    };
    parse_schema(&root, layer_name, source_url)
}

/// Build a [`FeatureTypeSchema`] from a parsed `xsd:schema` root.
pub fn parse_schema(
    root: &XmlElement,
    layer_name: &str,
    source_url: &str,
) -> OgcResult<FeatureTypeSchema> {
    if !(root.is("schema") && root.in_namespace(XSD_NS)) {
        return Err(OgcError::DescribeFeatureTypeFailed(format!(
            "Expected an XML schema, got <{}>",
            root.local_name()
        )));
    }

    let sequence = root
        .child("complexType")
        .and_then(|ct| ct.find(|e| e.is("sequence")))
        .ok_or_else(|| {
            OgcError::DescribeFeatureTypeFailed("Schema has no complex type sequence".to_string())
        })?;

    let mut geometry: Option<(String, String)> = None;
    let mut attributes = Vec::new();
    let mut attribute_kinds = BTreeMap::new();

    for element in sequence.children_named("element") {
        let Some(name) = element.attr("name").filter(|n| *n != BOUNDED_BY) else {
            continue;
        };
        let (namespace, local_type) = element
            .attr("type")
            .or_else(|| restriction_base(element))
            .map(|t| element.resolve_qname(t))
            .unwrap_or((None, ""));

        if namespace == Some(GML_NS) {
            // Later geometry attributes replace earlier ones.
            if let Some((previous, _)) = &geometry {
                debug!(previous = %previous, attribute = name, "Replacing geometry attribute");
            }
            let kind = local_type.replace("PropertyType", "");
            geometry = Some((name.to_string(), kind));
        } else {
            let kind = if namespace == Some(XSD_NS) {
                AttributeKind::from_xsd(local_type)
            } else {
                AttributeKind::Text
            };
            attribute_kinds.insert(name.to_string(), kind);
            attributes.push(name.to_string());
        }
    }
    sort_attributes(&mut attributes);

    let feature_type = root
        .child("element")
        .and_then(|e| e.attr("name"))
        .ok_or_else(|| {
            OgcError::DescribeFeatureTypeFailed("Schema declares no feature element".to_string())
        })?
        .to_string();

    let (geometry_name, geometry_type) = geometry.unwrap_or_default();

    Ok(FeatureTypeSchema {
        feature_namespace: root.attr("targetNamespace").unwrap_or_default().to_string(),
        feature_prefix: layer_name.split(':').next().unwrap_or_default().to_string(),
        feature_type,
        geometry_name,
        geometry_type,
        attributes,
        source_url: source_url.to_string(),
        attribute_kinds,
    })
}

/// `base` of an inline `simpleType/restriction`, used for length-limited strings.
fn restriction_base(element: &XmlElement) -> Option<&str> {
    element
        .child("simpleType")?
        .child("restriction")?
        .attr("base")
}
