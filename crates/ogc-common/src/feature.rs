//! In-memory vector features.
//!
//! A [`Feature`] is a caller-owned value: the service layer never keeps one
//! across calls. Geometry coordinates are `[x, y]` in whatever reference the
//! caller works in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::BoundingBox;

/// Geometry property name used when a feature has none of its own.
pub const DEFAULT_GEOMETRY_NAME: &str = "geometry";

/// Property keys that carry envelope metadata rather than attribute values.
pub const NON_SEMANTIC_PROPERTIES: [&str; 2] = ["boundedBy", "bbox"];

/// Property map, ordered by key.
pub type Properties = BTreeMap<String, Value>;

/// Geometry types exchanged with WFS servers.
///
/// Serializes as a GeoJSON geometry object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    /// Linear rings; the first is the exterior, the rest are holes.
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point {
            coordinates: [x, y],
        }
    }

    pub fn line_string(coordinates: Vec<[f64; 2]>) -> Self {
        Geometry::LineString { coordinates }
    }

    pub fn polygon(coordinates: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates }
    }

    /// Type name as used in GeoJSON and GML (`Point`, `MultiPolygon`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    /// All vertices, in document order.
    pub fn points(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point { coordinates } => vec![*coordinates],
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                coordinates.clone()
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                coordinates.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().copied().collect()
            }
        }
    }

    /// Envelope of the geometry.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::covering(self.points())
    }

    /// Rebuild the geometry with every vertex passed through `f`.
    pub fn try_map_points<E, F>(&self, mut f: F) -> Result<Geometry, E>
    where
        F: FnMut([f64; 2]) -> Result<[f64; 2], E>,
    {
        fn ring<E>(
            points: &[[f64; 2]],
            f: &mut dyn FnMut([f64; 2]) -> Result<[f64; 2], E>,
        ) -> Result<Vec<[f64; 2]>, E> {
            points.iter().map(|p| f(*p)).collect()
        }

        Ok(match self {
            Geometry::Point { coordinates } => Geometry::Point {
                coordinates: f(*coordinates)?,
            },
            Geometry::LineString { coordinates } => Geometry::LineString {
                coordinates: ring(coordinates, &mut f)?,
            },
            Geometry::MultiPoint { coordinates } => Geometry::MultiPoint {
                coordinates: ring(coordinates, &mut f)?,
            },
            Geometry::Polygon { coordinates } => Geometry::Polygon {
                coordinates: coordinates
                    .iter()
                    .map(|r| ring(r, &mut f))
                    .collect::<Result<_, E>>()?,
            },
            Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
                coordinates: coordinates
                    .iter()
                    .map(|r| ring(r, &mut f))
                    .collect::<Result<_, E>>()?,
            },
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .iter()
                    .map(|polygon| {
                        polygon
                            .iter()
                            .map(|r| ring(r, &mut f))
                            .collect::<Result<Vec<_>, E>>()
                    })
                    .collect::<Result<_, E>>()?,
            },
        })
    }
}

/// A vector feature: identity, one geometry attribute and plain properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Server-assigned identity; `None` for features not yet inserted.
    pub id: Option<String>,
    /// Name of the attribute holding `geometry`.
    pub geometry_name: String,
    pub geometry: Option<Geometry>,
    pub properties: Properties,
}

impl Default for Feature {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature {
    /// An empty feature with the default geometry name.
    pub fn new() -> Self {
        Self {
            id: None,
            geometry_name: DEFAULT_GEOMETRY_NAME.to_string(),
            geometry: None,
            properties: Properties::new(),
        }
    }

    /// A new feature with no identity built from plain property values.
    pub fn from_properties(properties: Properties) -> Self {
        Self {
            properties,
            ..Self::new()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_geometry(mut self, name: impl Into<String>, geometry: Geometry) -> Self {
        self.geometry_name = name.into();
        self.geometry = Some(geometry);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Drop `boundedBy` and `bbox`.
    pub fn strip_non_semantic(&mut self) {
        for key in NON_SEMANTIC_PROPERTIES {
            self.properties.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geometry_serializes_as_geojson() {
        let geometry = Geometry::point(1.5, -2.0);
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(value, json!({"type": "Point", "coordinates": [1.5, -2.0]}));
    }

    #[test]
    fn test_try_map_points_polygon() {
        let polygon = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]]);
        let shifted = polygon
            .try_map_points(|[x, y]| Ok::<_, ()>([x + 10.0, y]))
            .unwrap();
        assert_eq!(shifted.points()[2], [11.0, 1.0]);
        assert_eq!(shifted.kind(), "Polygon");
    }

    #[test]
    fn test_strip_non_semantic() {
        let mut feature = Feature::new()
            .with_property("boundedBy", json!([0, 0, 1, 1]))
            .with_property("bbox", json!([0, 0, 1, 1]))
            .with_property("name", "a");
        feature.strip_non_semantic();
        assert_eq!(feature.properties.len(), 1);
        assert!(feature.property("name").is_some());
    }
}
