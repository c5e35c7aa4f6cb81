//! Spatial reference types, axis handling and the reprojection registry.
//!
//! In-memory coordinates are always `[x, y]` = `[east, north]` (lon/lat for
//! geographic references). Axis order only matters on the wire, where GML
//! encodes `EPSG:4326` as lat/lon but the `epsg.xml#4326` form as lon/lat.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spherical mercator radius in meters.
const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude limit of the Web Mercator square.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Well-known reference systems understood by the default registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (degrees)
    Epsg4326,
    /// NAD83 Geographic, treated as WGS84-equivalent
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse a reference identifier (SRS or CRS parameter format).
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "urn:ogc:def:crs:EPSG::4326"
    /// - "http://www.opengis.net/gml/srs/epsg.xml#4326"
    /// - "CRS:84" (EPSG:4326 with lon/lat axis order)
    pub fn from_wms_string(s: &str) -> Result<Self, CrsParseError> {
        parse_identifier(s)
            .map(|(code, _)| code)
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// Axis order for this reference in WMS 1.3.0 / WFS 1.1.0.
    ///
    /// These versions use the "natural" axis order:
    /// - Geographic: lat, lon (y, x)
    /// - Projected: easting, northing (x, y)
    pub fn axis_order_wms_1_3(&self) -> AxisOrder {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => AxisOrder::LatLon,
            CrsCode::Epsg3857 => AxisOrder::XY,
        }
    }

    /// Check if this is a geographic (lat/lon) reference.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg4269 => "EPSG:4269",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}

/// A resolved spatial reference: the identifier as the caller spelled it,
/// the underlying system and the wire axis order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    identifier: String,
    code: CrsCode,
    axis_order: AxisOrder,
}

impl SpatialReference {
    /// Resolve an identifier, keeping its spelling for use in `srsName`.
    pub fn parse(identifier: &str) -> Result<Self, CrsParseError> {
        let (code, axis_order) = parse_identifier(identifier)
            .ok_or_else(|| CrsParseError::UnsupportedCrs(identifier.to_string()))?;
        Ok(Self {
            identifier: identifier.trim().to_string(),
            code,
            axis_order,
        })
    }

    /// `EPSG:3857`.
    pub fn web_mercator() -> Self {
        Self {
            identifier: "EPSG:3857".to_string(),
            code: CrsCode::Epsg3857,
            axis_order: AxisOrder::XY,
        }
    }

    /// `EPSG:4326` with lat/lon wire order.
    pub fn wgs84() -> Self {
        Self {
            identifier: "EPSG:4326".to_string(),
            code: CrsCode::Epsg4326,
            axis_order: AxisOrder::LatLon,
        }
    }

    /// The WGS84 form GeoServer declares on WFS 1.1.0 responses when asked
    /// for `EPSG:4326`: coordinates are lon/lat.
    pub fn gml_wgs84() -> Self {
        Self {
            identifier: GML_EPSG_4326.to_string(),
            code: CrsCode::Epsg4326,
            axis_order: AxisOrder::XY,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn code(&self) -> CrsCode {
        self.code
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    /// Two references describe the same system (axis order aside).
    pub fn is_equivalent(&self, other: &SpatialReference) -> bool {
        self.code == other.code
            || (self.code.is_geographic() && other.code.is_geographic())
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)
    }
}

/// Identifier of the lon/lat-ordered WGS84 reference used on WFS reads.
pub const GML_EPSG_4326: &str = "http://www.opengis.net/gml/srs/epsg.xml#4326";

fn parse_identifier(s: &str) -> Option<(CrsCode, AxisOrder)> {
    let upper = s.trim().to_uppercase();

    if upper == "CRS:84" || upper.ends_with(":CRS84") {
        return Some((CrsCode::Epsg4326, AxisOrder::XY));
    }

    let (code, lon_lat) = if let Some(rest) =
        upper.strip_prefix("HTTP://WWW.OPENGIS.NET/GML/SRS/EPSG.XML#")
    {
        (rest, true)
    } else if let Some(rest) = upper.strip_prefix("EPSG:") {
        (rest, false)
    } else if upper.starts_with("URN:") {
        (upper.rsplit(':').next()?, false)
    } else if upper.starts_with("HTTP://WWW.OPENGIS.NET/DEF/CRS/EPSG/") {
        (upper.rsplit('/').next()?, false)
    } else {
        return None;
    };

    let crs = match code {
        "4326" => CrsCode::Epsg4326,
        "4269" => CrsCode::Epsg4269,
        "3857" | "900913" | "3785" | "102100" | "102113" => CrsCode::Epsg3857,
        _ => return None,
    };

    let axis = if lon_lat {
        AxisOrder::XY
    } else {
        crs.axis_order_wms_1_3()
    };
    Some((crs, axis))
}

/// Resolves reference identifiers and reprojects points between them.
///
/// The service layer only ever talks to this trait; the default
/// [`StandardRegistry`] covers WGS84 and Web Mercator.
pub trait SpatialReferenceRegistry: Send + Sync {
    /// Resolve an identifier such as `EPSG:3857`.
    fn resolve(&self, identifier: &str) -> Result<SpatialReference, CrsParseError>;

    /// Reproject an `[x, y]` point.
    fn reproject(
        &self,
        point: [f64; 2],
        from: &SpatialReference,
        to: &SpatialReference,
    ) -> Result<[f64; 2], CrsParseError>;

    /// Identifier to put on the wire for a reference.
    fn code(&self, reference: &SpatialReference) -> String {
        reference.identifier().to_string()
    }
}

/// Registry for WGS84-family and spherical mercator references.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRegistry;

impl SpatialReferenceRegistry for StandardRegistry {
    fn resolve(&self, identifier: &str) -> Result<SpatialReference, CrsParseError> {
        SpatialReference::parse(identifier)
    }

    fn reproject(
        &self,
        point: [f64; 2],
        from: &SpatialReference,
        to: &SpatialReference,
    ) -> Result<[f64; 2], CrsParseError> {
        if from.is_equivalent(to) {
            return Ok(point);
        }
        match (from.code().is_geographic(), to.code()) {
            (true, CrsCode::Epsg3857) => Ok(lon_lat_to_mercator(point)),
            (false, code) if code.is_geographic() => Ok(mercator_to_lon_lat(point)),
            _ => Err(CrsParseError::NoTransform {
                from: from.identifier().to_string(),
                to: to.identifier().to_string(),
            }),
        }
    }
}

/// Project lon/lat degrees to Web Mercator meters.
pub fn lon_lat_to_mercator([lon, lat]: [f64; 2]) -> [f64; 2] {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * lat.to_radians().tan().asinh();
    [x, y]
}

/// Unproject Web Mercator meters to lon/lat degrees.
pub fn mercator_to_lon_lat([x, y]: [f64; 2]) -> [f64; 2] {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (y / EARTH_RADIUS).sinh().atan().to_degrees();
    [lon, lat]
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("No transform from {from} to {to}")]
    NoTransform { from: String, to: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            CrsCode::from_wms_string("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_wms_string("epsg:3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert_eq!(
            CrsCode::from_wms_string("CRS:84").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_wms_string("urn:ogc:def:crs:EPSG::900913").unwrap(),
            CrsCode::Epsg3857
        );
        assert!(CrsCode::from_wms_string("EPSG:99999").is_err());
    }

    #[test]
    fn test_axis_order() {
        assert_eq!(CrsCode::Epsg4326.axis_order_wms_1_3(), AxisOrder::LatLon);
        assert_eq!(CrsCode::Epsg3857.axis_order_wms_1_3(), AxisOrder::XY);
        assert_eq!(
            SpatialReference::parse("CRS:84").unwrap().axis_order(),
            AxisOrder::XY
        );
    }

    #[test]
    fn test_gml_form_is_lon_lat() {
        let srs = SpatialReference::parse(GML_EPSG_4326).unwrap();
        assert_eq!(srs.code(), CrsCode::Epsg4326);
        assert_eq!(srs.axis_order(), AxisOrder::XY);
        assert_eq!(srs.identifier(), GML_EPSG_4326);
        assert!(srs.is_equivalent(&SpatialReference::wgs84()));
    }

    #[test]
    fn test_mercator_round_trip() {
        let registry = StandardRegistry;
        let wgs84 = SpatialReference::wgs84();
        let mercator = SpatialReference::web_mercator();

        let projected = registry.reproject([10.0, 45.0], &wgs84, &mercator).unwrap();
        assert!((projected[0] - 1113194.9079).abs() < 0.01);
        assert!((projected[1] - 5621521.4862).abs() < 0.01);

        let back = registry.reproject(projected, &mercator, &wgs84).unwrap();
        assert!((back[0] - 10.0).abs() < 1e-9);
        assert!((back[1] - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_reprojection() {
        let registry = StandardRegistry;
        let a = SpatialReference::wgs84();
        let b = SpatialReference::gml_wgs84();
        assert_eq!(registry.reproject([1.0, 2.0], &a, &b).unwrap(), [1.0, 2.0]);
    }
}
