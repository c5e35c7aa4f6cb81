//! Tests for the GML and GeoJSON feature codecs.

use std::collections::BTreeMap;

use serde_json::Value;

use ogc_common::{AttributeKind, Feature, FeatureTypeSchema, Geometry, SpatialReference};
use ogc_protocol::{classify, geojson, gml, ReadOptions};
use test_utils::assert_approx_eq;
use test_utils::fixtures::{self, endpoints};

fn sample_features() -> Vec<Feature> {
    vec![
        Feature::new()
            .with_id("states.1")
            .with_geometry("the_geom", Geometry::point(-89.5, 40.0))
            .with_property("STATE_NAME", "Illinois")
            .with_property("STATE_ABBR", "IL")
            .with_property("PERSONS", 12830632)
            .with_property("LAND_KM", 143986.61)
            .with_property("COASTAL", false)
            .with_property("NOTE", Value::Null),
        Feature::new()
            .with_id("states.2")
            .with_geometry(
                "the_geom",
                Geometry::MultiPolygon {
                    coordinates: vec![vec![
                        vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
                        vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
                    ]],
                },
            )
            .with_property("STATE_NAME", "Somewhere & Else")
            .with_property("STATE_FIPS", "07")
            .with_property("PERSONS", 42),
        Feature::new()
            .with_id("states.3")
            .with_geometry(
                "the_geom",
                Geometry::MultiLineString {
                    coordinates: vec![vec![[1.0, 2.0], [3.0, 4.5]], vec![[5.0, 6.0], [7.0, 8.0]]],
                },
            ),
    ]
}

fn sample_schema() -> FeatureTypeSchema {
    let kinds = [
        ("COASTAL", AttributeKind::Boolean),
        ("LAND_KM", AttributeKind::Decimal),
        ("NOTE", AttributeKind::Text),
        ("PERSONS", AttributeKind::Integer),
        ("STATE_ABBR", AttributeKind::Text),
        ("STATE_FIPS", AttributeKind::Text),
        ("STATE_NAME", AttributeKind::Text),
    ];
    FeatureTypeSchema {
        feature_prefix: "topp".to_string(),
        feature_type: "states".to_string(),
        geometry_name: "the_geom".to_string(),
        attributes: kinds.iter().map(|(name, _)| name.to_string()).collect(),
        attribute_kinds: kinds
            .iter()
            .map(|(name, kind)| (name.to_string(), *kind))
            .collect::<BTreeMap<_, _>>(),
        ..Default::default()
    }
}

// ============================================================================
// GML
// ============================================================================

#[test]
fn test_gml_round_trip_preserves_features() {
    let srs = SpatialReference::web_mercator();
    let features = sample_features();
    let xml = gml::write_feature_collection(&features, "topp", endpoints::TOPP_NS, "states", Some(&srs));

    assert!(xml.contains("<topp:NOTE xsi:nil=\"true\"/>"));

    let root = classify(&xml, None).unwrap();
    let schema = sample_schema();
    let read = gml::read_features(&root, &ReadOptions::new(&srs).with_schema(&schema)).unwrap();

    assert_eq!(read, features);
}

#[test]
fn test_gml_read_without_schema_keeps_text() {
    let srs = SpatialReference::web_mercator();
    let xml = gml::write_feature_collection(&sample_features(), "topp", endpoints::TOPP_NS, "states", Some(&srs));

    let root = classify(&xml, None).unwrap();
    let read = gml::read_features(&root, &ReadOptions::new(&srs)).unwrap();
    assert_eq!(read[0].property("PERSONS"), Some(&Value::from("12830632")));
    assert_eq!(read[0].property("NOTE"), Some(&Value::Null));
    assert_eq!(read[1].property("STATE_FIPS"), Some(&Value::from("07")));
}

#[test]
fn test_gml_round_trip_in_lat_lon_reference() {
    let srs = SpatialReference::wgs84();
    let features = sample_features();
    let xml = gml::write_feature_collection(&features, "topp", endpoints::TOPP_NS, "states", Some(&srs));
    assert!(xml.contains("<gml:pos srsDimension=\"2\">40 -89.5</gml:pos>"));

    let root = classify(&xml, None).unwrap();
    let schema = sample_schema();
    let read = gml::read_features(&root, &ReadOptions::new(&srs).with_schema(&schema)).unwrap();
    assert_eq!(read, features);
}

#[test]
fn test_read_geoserver_feature_collection() {
    let root = classify(fixtures::GML_FEATURE_COLLECTION, Some(200)).unwrap();
    let wire = SpatialReference::gml_wgs84();
    let features = gml::read_features(&root, &ReadOptions::new(&wire)).unwrap();

    assert_eq!(features.len(), 2);
    let illinois = &features[0];
    assert_eq!(illinois.id.as_deref(), Some("states.1"));
    assert_eq!(illinois.geometry_name, "the_geom");
    assert_eq!(illinois.geometry, Some(Geometry::point(-89.5, 40.0)));
    assert_eq!(
        illinois.property("STATE_NAME"),
        Some(&Value::from("Illinois"))
    );
    assert_eq!(illinois.property("PERSONS"), Some(&Value::from("11430602")));
    assert_eq!(illinois.property("NOTE"), Some(&Value::Null));
    assert_eq!(
        illinois.property("boundedBy"),
        Some(&serde_json::json!([-91.5, 36.9, -87.5, 42.5]))
    );

    match &features[1].geometry {
        Some(Geometry::MultiPolygon { coordinates }) => {
            assert_eq!(coordinates.len(), 1);
            assert_eq!(coordinates[0][0][0], [-77.0, 38.8]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_read_reprojects_into_view() {
    let root = classify(fixtures::GML_FEATURE_COLLECTION, Some(200)).unwrap();
    let wire = SpatialReference::gml_wgs84();
    let view = SpatialReference::web_mercator();
    let features = gml::read_features(&root, &ReadOptions::new(&wire).reproject_to(&view)).unwrap();

    let [x, y] = features[0].geometry.as_ref().unwrap().points()[0];
    assert_approx_eq!(x, -9963094.426, 0.01);
    assert_approx_eq!(y, 4865942.280, 0.01);
}

#[test]
fn test_hits_metadata() {
    let root = classify(fixtures::HITS_RESPONSE, Some(200)).unwrap();
    assert_eq!(gml::read_feature_collection_metadata(&root).unwrap(), 49);
}

// ============================================================================
// GeoJSON
// ============================================================================

#[test]
fn test_geojson_round_trip() {
    let srs = SpatialReference::web_mercator();
    let features = vec![Feature::new()
        .with_id("states.9")
        .with_geometry("the_geom", Geometry::line_string(vec![[1.0, 2.0], [3.0, 4.0]]))
        .with_property("PERSONS", 42)
        .with_property("ACTIVE", true)
        .with_property("NAME", "Kansas")];

    let body = geojson::write_features(&features, None, None).unwrap();
    let read = geojson::read_features(&body, &ReadOptions::new(&srs)).unwrap();
    assert_eq!(read, features);
}

#[test]
fn test_geojson_fixture() {
    let srs = SpatialReference::wgs84();
    let features =
        geojson::read_features(fixtures::GEOJSON_FEATURE_COLLECTION, &ReadOptions::new(&srs)).unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].id.as_deref(), Some("states.1"));
    assert_eq!(features[0].geometry_name, "the_geom");
    assert_eq!(features[0].property("PERSONS"), Some(&Value::from(11430602)));
}
