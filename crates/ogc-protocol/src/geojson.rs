//! GeoJSON feature encoding, as served by WFS `outputFormat=application/json`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ogc_common::{Feature, Geometry, OgcResult, Properties, SpatialReference, DEFAULT_GEOMETRY_NAME};

use crate::codec::ReadOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeatureCollectionDoc {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<FeatureDoc>,
    #[serde(rename = "totalFeatures", skip_serializing_if = "Option::is_none")]
    total_features: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeatureDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<FeatureId>,
    #[serde(default)]
    geometry: Option<Geometry>,
    /// GeoServer names the geometry attribute here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    geometry_name: Option<String>,
    #[serde(default)]
    properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bbox: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FeatureId {
    Text(String),
    Number(serde_json::Number),
}

impl FeatureId {
    fn into_string(self) -> String {
        match self {
            FeatureId::Text(s) => s,
            FeatureId::Number(n) => n.to_string(),
        }
    }
}

/// Read a GeoJSON `FeatureCollection` (or a single `Feature`).
pub fn read_features(body: &str, options: &ReadOptions<'_>) -> OgcResult<Vec<Feature>> {
    let value: Value = serde_json::from_str(body)?;
    read_features_value(value, options)
}

/// Like [`read_features`], from an already parsed value.
pub fn read_features_value(value: Value, options: &ReadOptions<'_>) -> OgcResult<Vec<Feature>> {
    let docs = if value.get("type").and_then(Value::as_str) == Some("Feature") {
        vec![serde_json::from_value::<FeatureDoc>(value)?]
    } else {
        serde_json::from_value::<FeatureCollectionDoc>(value)?.features
    };

    docs.into_iter()
        .map(|doc| options.transform_feature(from_doc(doc)))
        .collect()
}

fn from_doc(doc: FeatureDoc) -> Feature {
    let mut feature = Feature::from_properties(doc.properties.unwrap_or_default());
    feature.id = doc.id.map(FeatureId::into_string);
    feature.geometry = doc.geometry;
    feature.geometry_name = doc
        .geometry_name
        .unwrap_or_else(|| DEFAULT_GEOMETRY_NAME.to_string());
    if let Some(bbox) = doc.bbox {
        feature.properties.insert("bbox".to_string(), Value::from(bbox));
    }
    feature
}

/// Write features as a GeoJSON `FeatureCollection`.
///
/// Geometries are reprojected from `from` to `to` when both are given.
pub fn write_features(
    features: &[Feature],
    from: Option<&SpatialReference>,
    to: Option<&SpatialReference>,
) -> OgcResult<String> {
    let reproject = match (from, to) {
        (Some(from), Some(to)) => Some(ReadOptions::new(from).reproject_to(to)),
        _ => None,
    };

    let mut docs = Vec::with_capacity(features.len());
    for feature in features {
        let mut properties = feature.properties.clone();
        let bbox = properties
            .remove("bbox")
            .and_then(|b| serde_json::from_value::<Vec<f64>>(b).ok());
        let geometry = match (&feature.geometry, &reproject) {
            (Some(g), Some(options)) => Some(options.transform(g.clone())?),
            (g, _) => g.clone(),
        };
        docs.push(FeatureDoc {
            kind: "Feature".to_string(),
            id: feature.id.clone().map(FeatureId::Text),
            geometry,
            geometry_name: (feature.geometry_name != DEFAULT_GEOMETRY_NAME)
                .then(|| feature.geometry_name.clone()),
            properties: Some(properties),
            bbox,
        });
    }

    Ok(serde_json::to_string(&FeatureCollectionDoc {
        kind: "FeatureCollection".to_string(),
        features: docs,
        total_features: None,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_geoserver_collection() {
        let body = r#"{
            "type": "FeatureCollection",
            "totalFeatures": 1,
            "features": [{
                "type": "Feature",
                "id": "states.1",
                "geometry": {"type": "Point", "coordinates": [-100.0, 40.0]},
                "geometry_name": "the_geom",
                "properties": {"STATE_NAME": "Kansas", "PERSONS": 2477574}
            }]
        }"#;
        let srs = SpatialReference::wgs84();
        let features = read_features(body, &ReadOptions::new(&srs)).unwrap();
        assert_eq!(features.len(), 1);
        let feature = &features[0];
        assert_eq!(feature.id.as_deref(), Some("states.1"));
        assert_eq!(feature.geometry_name, "the_geom");
        assert_eq!(feature.property("PERSONS"), Some(&Value::from(2477574)));
    }

    #[test]
    fn test_numeric_id_and_null_geometry() {
        let body = r#"{"type":"Feature","id":7,"geometry":null,"properties":{}}"#;
        let srs = SpatialReference::wgs84();
        let features = read_features(body, &ReadOptions::new(&srs)).unwrap();
        assert_eq!(features[0].id.as_deref(), Some("7"));
        assert!(features[0].geometry.is_none());
        assert_eq!(features[0].geometry_name, DEFAULT_GEOMETRY_NAME);
    }

    #[test]
    fn test_reprojects_into_feature_projection() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0.0,0.0]},"properties":{}}
        ]}"#;
        let wgs84 = SpatialReference::gml_wgs84();
        let mercator = SpatialReference::web_mercator();
        let features =
            read_features(body, &ReadOptions::new(&wgs84).reproject_to(&mercator)).unwrap();
        let [x, y] = features[0].geometry.as_ref().unwrap().points()[0];
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn test_invalid_json() {
        let srs = SpatialReference::wgs84();
        assert!(read_features("{", &ReadOptions::new(&srs)).is_err());
    }
}
