//! WMS and WFS GetCapabilities parsing.
//!
//! Produces a normalized layer tree: WFS feature types are always leaves,
//! WMS layers with nested `Layer` children become groups.

use serde::{Deserialize, Serialize};

use ogc_common::{
    BoundingBox, LayerDescriptor, LayerNode, OgcError, OgcResult, StyleRef, TimeInfo,
};

use crate::xml::XmlElement;

/// Normalized capabilities document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub title: String,
    pub layers: Vec<LayerNode>,
}

impl Capabilities {
    /// All named layers, depth first.
    pub fn named_layers(&self) -> Vec<&LayerDescriptor> {
        let mut out = Vec::new();
        for node in &self.layers {
            node.visit(&mut |n| {
                if !n.layer().name.is_empty() {
                    out.push(n.layer());
                }
            });
        }
        out
    }
}

/// Parse a capabilities document of either protocol.
pub fn parse_capabilities(root: &XmlElement) -> OgcResult<Capabilities> {
    match root.local_name() {
        "WFS_Capabilities" => Ok(parse_wfs(root)),
        "WMS_Capabilities" | "WMT_MS_Capabilities" => parse_wms(root),
        other => Err(OgcError::invalid_document(format!(
            "Not a capabilities document: <{}>",
            other
        ))),
    }
}

fn service_title(root: &XmlElement) -> String {
    root.child("ServiceIdentification")
        .or_else(|| root.child("Service"))
        .and_then(|s| s.child_text("Title"))
        .unwrap_or_default()
        .to_string()
}

fn optional_text(element: &XmlElement, name: &str) -> Option<String> {
    element
        .child_text(name)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

// ============================================================================
// WFS
// ============================================================================

fn parse_wfs(root: &XmlElement) -> Capabilities {
    let layers = root
        .child("FeatureTypeList")
        .map(|list| {
            list.children_named("FeatureType")
                .map(|ft| LayerNode::Leaf(parse_feature_type(ft)))
                .collect()
        })
        .unwrap_or_default();

    Capabilities {
        title: service_title(root),
        layers,
    }
}

fn parse_feature_type(ft: &XmlElement) -> LayerDescriptor {
    let mut layer = LayerDescriptor::untitled(ft.child_text("Name").unwrap_or_default());
    layer.title = ft.child_text("Title").map(str::to_string);
    layer.abstract_text = optional_text(ft, "Abstract");
    layer.keywords = ft.child("Keywords").map(parse_keywords).unwrap_or_default();
    layer.geographic_bbox = ft
        .child("WGS84BoundingBox")
        .and_then(parse_corner_bbox)
        .or_else(|| ft.child("LatLongBoundingBox").and_then(parse_attribute_bbox));
    layer.queryable = true;
    layer
}

/// `ows:Keywords` holds `ows:Keyword` children; WFS 1.0 uses a comma list.
fn parse_keywords(keywords: &XmlElement) -> Vec<String> {
    let nested: Vec<String> = keywords
        .children_named("Keyword")
        .map(|k| k.text().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if !nested.is_empty() {
        return nested;
    }
    keywords
        .text()
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn parse_corner_bbox(bbox: &XmlElement) -> Option<BoundingBox> {
    let lower = parse_pair(bbox.child_text("LowerCorner")?)?;
    let upper = parse_pair(bbox.child_text("UpperCorner")?)?;
    Some(BoundingBox::from_corners(lower, upper))
}

fn parse_pair(text: &str) -> Option<[f64; 2]> {
    let mut parts = text.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b))) => Some([a, b]),
        _ => None,
    }
}

fn parse_attribute_bbox(bbox: &XmlElement) -> Option<BoundingBox> {
    let value = |name: &str| bbox.attr(name).and_then(|v| v.trim().parse::<f64>().ok());
    Some(BoundingBox::new(
        value("minx")?,
        value("miny")?,
        value("maxx")?,
        value("maxy")?,
    ))
}

// ============================================================================
// WMS
// ============================================================================

fn parse_wms(root: &XmlElement) -> OgcResult<Capabilities> {
    let capability = root
        .child("Capability")
        .ok_or_else(|| OgcError::invalid_document("WMS capabilities without <Capability>"))?;

    let layers = capability
        .children_named("Layer")
        .map(|layer| parse_wms_layer(layer, None))
        .collect();

    Ok(Capabilities {
        title: service_title(root),
        layers,
    })
}

fn parse_wms_layer(element: &XmlElement, parent_bbox: Option<BoundingBox>) -> LayerNode {
    let mut layer = LayerDescriptor::untitled(element.child_text("Name").unwrap_or_default());
    layer.title = element.child_text("Title").map(str::to_string);
    layer.abstract_text = optional_text(element, "Abstract");
    layer.keywords = element
        .child("KeywordList")
        .map(parse_keywords)
        .unwrap_or_default();
    layer.geographic_bbox = element
        .child("EX_GeographicBoundingBox")
        .and_then(parse_geographic_bbox)
        .or_else(|| {
            element
                .child("LatLonBoundingBox")
                .and_then(parse_attribute_bbox)
        })
        .or(parent_bbox);
    layer.queryable = matches!(element.attr("queryable"), Some("1") | Some("true"));
    layer.styles = element.children_named("Style").map(parse_style).collect();
    layer.legend_url = LayerDescriptor::single_style_legend(&layer.styles);
    layer.time_info = parse_time(element);

    let children: Vec<LayerNode> = element
        .children_named("Layer")
        .map(|child| parse_wms_layer(child, layer.geographic_bbox))
        .collect();

    if children.is_empty() {
        LayerNode::Leaf(layer)
    } else {
        LayerNode::Group { layer, children }
    }
}

fn parse_geographic_bbox(bbox: &XmlElement) -> Option<BoundingBox> {
    let value = |name: &str| {
        bbox.child_text(name)
            .and_then(|v| v.parse::<f64>().ok())
    };
    Some(BoundingBox::new(
        value("westBoundLongitude")?,
        value("southBoundLatitude")?,
        value("eastBoundLongitude")?,
        value("northBoundLatitude")?,
    ))
}

fn parse_style(style: &XmlElement) -> StyleRef {
    StyleRef {
        name: style.child_text("Name").unwrap_or_default().to_string(),
        title: optional_text(style, "Title"),
        legend_urls: style
            .children_named("LegendURL")
            .filter_map(|legend| legend.child("OnlineResource"))
            .filter_map(|resource| resource.attr("href"))
            .map(str::to_string)
            .collect(),
    }
}

/// WMS 1.3.0 puts values in `Dimension`, 1.1.1 in a sibling `Extent`.
fn parse_time(layer: &XmlElement) -> Option<TimeInfo> {
    let is_time = |e: &&XmlElement| e.attr("name").is_some_and(|n| n.eq_ignore_ascii_case("time"));
    let dimension = layer.children_named("Dimension").find(is_time);
    let extent = layer.children_named("Extent").find(is_time);

    let source = match (dimension, extent) {
        (Some(d), _) if !d.text().is_empty() => d,
        (_, Some(e)) => e,
        _ => return None,
    };
    let default = source
        .attr("default")
        .or_else(|| dimension.and_then(|d| d.attr("default")))
        .map(str::to_string);
    TimeInfo::parse(source.text(), default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    #[test]
    fn test_wfs_keywords_comma_list() {
        let xml = r#"<WFS_Capabilities version="1.0.0">
            <Service><Title>Legacy</Title></Service>
            <FeatureTypeList>
              <FeatureType>
                <Name>topp:roads</Name><Title>Roads</Title>
                <Keywords>roads, transport</Keywords>
                <LatLongBoundingBox minx="-1" miny="-2" maxx="3" maxy="4"/>
              </FeatureType>
            </FeatureTypeList>
        </WFS_Capabilities>"#;
        let caps = parse_capabilities(&parse_document(xml).unwrap()).unwrap();
        assert_eq!(caps.title, "Legacy");
        let layer = caps.layers[0].layer();
        assert_eq!(layer.keywords, vec!["roads", "transport"]);
        assert_eq!(
            layer.geographic_bbox.unwrap().to_extent(),
            [-1.0, -2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_wms_bbox_inherited_from_parent() {
        let xml = r#"<WMT_MS_Capabilities version="1.1.1">
            <Service><Title>Old WMS</Title></Service>
            <Capability>
              <Layer>
                <Title>Root</Title>
                <LatLonBoundingBox minx="-180" miny="-90" maxx="180" maxy="90"/>
                <Layer queryable="1"><Name>a</Name><Title>A</Title></Layer>
              </Layer>
            </Capability>
        </WMT_MS_Capabilities>"#;
        let caps = parse_capabilities(&parse_document(xml).unwrap()).unwrap();
        let child = &caps.layers[0].children()[0];
        assert!(child.layer().queryable);
        assert_eq!(
            child.layer().geographic_bbox.unwrap().to_extent(),
            [-180.0, -90.0, 180.0, 90.0]
        );
    }

    #[test]
    fn test_time_from_extent() {
        let xml = r#"<WMT_MS_Capabilities><Capability>
            <Layer><Name>t</Name><Title>T</Title>
              <Dimension name="time" units="ISO8601"/>
              <Extent name="time" default="2020-01-02">2020-01-01,2020-01-02</Extent>
            </Layer>
        </Capability></WMT_MS_Capabilities>"#;
        let caps = parse_capabilities(&parse_document(xml).unwrap()).unwrap();
        let time = caps.layers[0].layer().time_info.clone().unwrap();
        assert_eq!(time.values, vec!["2020-01-01", "2020-01-02"]);
        assert_eq!(time.default.as_deref(), Some("2020-01-02"));
    }

    #[test]
    fn test_unknown_root_rejected() {
        let root = parse_document("<html/>").unwrap();
        assert!(parse_capabilities(&root).is_err());
    }
}
