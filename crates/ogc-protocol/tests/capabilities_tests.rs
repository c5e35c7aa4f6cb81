//! Tests for capabilities, schema parsing and response classification.

use ogc_common::{AttributeKind, FailureKind, LayerNode, OgcError};
use ogc_protocol::describe::describe_feature_type;
use ogc_protocol::{classify, parse_capabilities};
use test_utils::fixtures::{self, endpoints};

// ============================================================================
// WFS capabilities
// ============================================================================

#[test]
fn test_wfs_capabilities_layers() {
    let root = classify(fixtures::WFS_CAPABILITIES, Some(200)).unwrap();
    let caps = parse_capabilities(&root).unwrap();

    assert_eq!(caps.title, "GeoServer Web Feature Service");
    assert_eq!(caps.layers.len(), 2);
    assert!(caps.layers.iter().all(|l| matches!(l, LayerNode::Leaf(_))));

    let states = caps.layers[0].layer();
    assert_eq!(states.name, "topp:states");
    assert_eq!(states.title.as_deref(), Some("USA Population"));
    assert_eq!(
        states.abstract_text.as_deref(),
        Some("This is some census data on the states.")
    );
    assert_eq!(states.keywords, vec!["census", "united", "boundaries"]);
    assert_eq!(
        states.geographic_bbox.unwrap().to_extent(),
        [-124.731422, 24.955967, -66.969849, 49.371735]
    );

    let poi = caps.layers[1].layer();
    assert_eq!(poi.name, "tiger:poi");
    assert!(poi.keywords.is_empty());
    assert!(poi.abstract_text.is_none());
}

// ============================================================================
// WMS capabilities
// ============================================================================

#[test]
fn test_wms_capabilities_tree() {
    let root = classify(fixtures::WMS_CAPABILITIES, Some(200)).unwrap();
    let caps = parse_capabilities(&root).unwrap();

    assert_eq!(caps.title, "GeoServer Web Map Service");
    assert_eq!(caps.layers.len(), 1);

    let root_group = &caps.layers[0];
    assert!(root_group.is_base_group());
    assert_eq!(root_group.layer().name, "");
    assert_eq!(root_group.children().len(), 3);

    let names: Vec<&str> = root_group
        .flatten()
        .iter()
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(names, vec!["topp:states", "nurc:Arc_Sample", "ne:countries"]);

    let base = root_group.find("base").unwrap();
    assert!(base.is_base_group());
    assert_eq!(caps.named_layers().len(), 4);
}

#[test]
fn test_wms_legend_only_for_single_style() {
    let root = classify(fixtures::WMS_CAPABILITIES, None).unwrap();
    let caps = parse_capabilities(&root).unwrap();
    let root_group = &caps.layers[0];

    let states = root_group.find("topp:states").unwrap().layer();
    assert!(states.queryable);
    assert_eq!(states.styles.len(), 1);
    assert_eq!(
        states.legend_url.as_deref(),
        Some("http://localhost:8080/geoserver/wms?request=GetLegendGraphic&format=image%2Fpng&layer=topp%3Astates")
    );

    let arc = root_group.find("nurc:Arc_Sample").unwrap().layer();
    assert!(!arc.queryable);
    assert_eq!(arc.styles.len(), 2);
    assert!(arc.legend_url.is_none());

    let time = arc.time_info.as_ref().unwrap();
    assert_eq!(time.values.len(), 2);
    assert_eq!(time.default.as_deref(), Some("2020-01-02T00:00:00Z"));
}

#[test]
fn test_wms_child_inherits_bbox() {
    let root = classify(fixtures::WMS_CAPABILITIES, None).unwrap();
    let caps = parse_capabilities(&root).unwrap();
    let countries = caps.layers[0].find("ne:countries").unwrap().layer();
    assert_eq!(
        countries.geographic_bbox.unwrap().to_extent(),
        [-180.0, -90.0, 180.0, 90.0]
    );
}

#[test]
fn test_exception_report_is_never_capabilities() {
    let err = classify(fixtures::OWS_EXCEPTION_REPORT, Some(200)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ServiceException);
    let text = err.exception_text().unwrap();
    assert!(!text.is_empty());
    assert!(text.starts_with("Error performing insert"));

    let err = classify(fixtures::SERVICE_EXCEPTION_REPORT, Some(200)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ServiceException);
    assert!(err
        .exception_text()
        .unwrap()
        .starts_with("Could not find type"));
}

// ============================================================================
// DescribeFeatureType
// ============================================================================

#[test]
fn test_describe_feature_type_schema() {
    let schema =
        describe_feature_type(fixtures::DESCRIBE_FEATURE_TYPE, "topp:states", endpoints::WFS)
            .unwrap();

    assert_eq!(schema.feature_namespace, endpoints::TOPP_NS);
    assert_eq!(schema.feature_prefix, "topp");
    assert_eq!(schema.feature_type, "states");
    assert_eq!(schema.geometry_name, "the_geom");
    assert_eq!(schema.geometry_type, "Point");
    assert_eq!(schema.attributes, vec!["age", "Name", "Zipcode"]);
    assert!(!schema.attributes.iter().any(|a| a == "boundedBy"));
    assert!(!schema.attributes.contains(&schema.geometry_name));
    assert_eq!(schema.qualified_type_name(), "topp:states");
    assert_eq!(schema.source_url, endpoints::WFS);
}

#[test]
fn test_describe_feature_type_last_geometry_wins() {
    let body = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:gml="http://www.opengis.net/gml" targetNamespace="urn:x">
      <xsd:complexType name="roadsType"><xsd:complexContent><xsd:extension base="gml:AbstractFeatureType">
        <xsd:sequence>
          <xsd:element name="centerline" type="gml:MultiLineStringPropertyType"/>
          <xsd:element name="label_point" type="gml:PointPropertyType"/>
          <xsd:element name="NAME" type="xsd:string"/>
        </xsd:sequence>
      </xsd:extension></xsd:complexContent></xsd:complexType>
      <xsd:element name="roads" type="x:roadsType"/>
    </xsd:schema>"#;
    let schema = describe_feature_type(body, "x:roads", endpoints::WFS).unwrap();
    assert_eq!(schema.geometry_name, "label_point");
    assert_eq!(schema.geometry_type, "Point");
    assert_eq!(schema.attributes, vec!["NAME"]);
}

#[test]
fn test_describe_feature_type_attribute_kinds() {
    let schema = describe_feature_type(fixtures::DESCRIBE_FEATURE_TYPE, "topp:states", endpoints::WFS)
        .unwrap();
    assert_eq!(schema.attribute_kind("age"), AttributeKind::Integer);
    assert_eq!(schema.attribute_kind("Name"), AttributeKind::Text);
    assert_eq!(schema.attribute_kind("the_geom"), AttributeKind::Text);
    assert!(!schema.attribute_kinds.contains_key("the_geom"));

    let body = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:gml="http://www.opengis.net/gml" targetNamespace="urn:x">
      <xsd:complexType name="parcelsType"><xsd:complexContent><xsd:extension base="gml:AbstractFeatureType">
        <xsd:sequence>
          <xsd:element name="AREA" type="xsd:double"/>
          <xsd:element name="VACANT" type="xsd:boolean"/>
          <xsd:element name="CODE">
            <xsd:simpleType><xsd:restriction base="xsd:string"><xsd:maxLength value="8"/></xsd:restriction></xsd:simpleType>
          </xsd:element>
          <xsd:element name="geom" type="gml:MultiSurfacePropertyType"/>
        </xsd:sequence>
      </xsd:extension></xsd:complexContent></xsd:complexType>
      <xsd:element name="parcels" type="x:parcelsType"/>
    </xsd:schema>"#;
    let schema = describe_feature_type(body, "x:parcels", endpoints::WFS).unwrap();
    assert_eq!(schema.attribute_kind("AREA"), AttributeKind::Decimal);
    assert_eq!(schema.attribute_kind("VACANT"), AttributeKind::Boolean);
    assert_eq!(schema.attribute_kind("CODE"), AttributeKind::Text);
    assert_eq!(schema.attributes, vec!["AREA", "CODE", "VACANT"]);
}

#[test]
fn test_describe_feature_type_exception() {
    let err = describe_feature_type(fixtures::SERVICE_EXCEPTION_REPORT, "topp:nope", endpoints::WFS)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::DescribeFeatureTypeFailed);
    match err {
        OgcError::DescribeFeatureTypeFailed(message) => {
            assert!(message.contains("Could not find type"))
        }
        other => panic!("unexpected {:?}", other),
    }

    let err = describe_feature_type(fixtures::WFS_CAPABILITIES, "topp:states", endpoints::WFS)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::DescribeFeatureTypeFailed);
}
