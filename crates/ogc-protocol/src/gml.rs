//! GML 3.1.1 feature encoding.
//!
//! The writer emits the GML 3 forms WFS 1.1.0 transactions expect
//! (`pos`/`posList`, `MultiCurve`, `MultiSurface`). The reader also accepts
//! GML 2 forms (`coordinates`, `outerBoundaryIs`, `MultiPolygon`) since
//! WFS 1.0 servers and many GetFeatureInfo responses still produce them.

use serde_json::Value;

use ogc_common::{
    AxisOrder, BoundingBox, Feature, Geometry, OgcError, OgcResult, SpatialReference,
};

use crate::codec::ReadOptions;
use crate::xml::{escape, XmlElement, GML_NS, XSI_NS};

const GEOMETRY_ELEMENTS: [&str; 12] = [
    "Point",
    "LineString",
    "LinearRing",
    "Polygon",
    "MultiPoint",
    "MultiLineString",
    "MultiCurve",
    "MultiPolygon",
    "MultiSurface",
    "Curve",
    "Surface",
    "MultiGeometry",
];

// ============================================================================
// Writing
// ============================================================================

/// Append a geometry as GML 3.1.1.
///
/// `srs`, when given, is declared on the outermost element and decides
/// the axis order of the written coordinates.
pub fn write_geometry(out: &mut String, geometry: &Geometry, srs: Option<&SpatialReference>) {
    let axis = srs.map(SpatialReference::axis_order).unwrap_or(AxisOrder::XY);
    let srs_attr = srs
        .map(|s| format!(" srsName=\"{}\"", escape(s.identifier())))
        .unwrap_or_default();

    match geometry {
        Geometry::Point { coordinates } => {
            out.push_str(&format!("<gml:Point{}>", srs_attr));
            out.push_str(&format!(
                "<gml:pos srsDimension=\"2\">{}</gml:pos>",
                format_positions(&[*coordinates], axis)
            ));
            out.push_str("</gml:Point>");
        }
        Geometry::LineString { coordinates } => {
            out.push_str(&format!("<gml:LineString{}>", srs_attr));
            write_pos_list(out, coordinates, axis);
            out.push_str("</gml:LineString>");
        }
        Geometry::Polygon { coordinates } => {
            out.push_str(&format!("<gml:Polygon{}>", srs_attr));
            write_rings(out, coordinates, axis);
            out.push_str("</gml:Polygon>");
        }
        Geometry::MultiPoint { coordinates } => {
            out.push_str(&format!("<gml:MultiPoint{}>", srs_attr));
            for point in coordinates {
                out.push_str("<gml:pointMember><gml:Point>");
                out.push_str(&format!(
                    "<gml:pos srsDimension=\"2\">{}</gml:pos>",
                    format_positions(&[*point], axis)
                ));
                out.push_str("</gml:Point></gml:pointMember>");
            }
            out.push_str("</gml:MultiPoint>");
        }
        Geometry::MultiLineString { coordinates } => {
            out.push_str(&format!("<gml:MultiCurve{}>", srs_attr));
            for line in coordinates {
                out.push_str("<gml:curveMember><gml:LineString>");
                write_pos_list(out, line, axis);
                out.push_str("</gml:LineString></gml:curveMember>");
            }
            out.push_str("</gml:MultiCurve>");
        }
        Geometry::MultiPolygon { coordinates } => {
            out.push_str(&format!("<gml:MultiSurface{}>", srs_attr));
            for polygon in coordinates {
                out.push_str("<gml:surfaceMember><gml:Polygon>");
                write_rings(out, polygon, axis);
                out.push_str("</gml:Polygon></gml:surfaceMember>");
            }
            out.push_str("</gml:MultiSurface>");
        }
    }
}

fn write_pos_list(out: &mut String, points: &[[f64; 2]], axis: AxisOrder) {
    out.push_str(&format!(
        "<gml:posList srsDimension=\"2\">{}</gml:posList>",
        format_positions(points, axis)
    ));
}

fn write_rings(out: &mut String, rings: &[Vec<[f64; 2]>], axis: AxisOrder) {
    for (i, ring) in rings.iter().enumerate() {
        let wrapper = if i == 0 { "exterior" } else { "interior" };
        out.push_str(&format!("<gml:{}><gml:LinearRing>", wrapper));
        write_pos_list(out, ring, axis);
        out.push_str(&format!("</gml:LinearRing></gml:{}>", wrapper));
    }
}

fn format_positions(points: &[[f64; 2]], axis: AxisOrder) -> String {
    points
        .iter()
        .map(|[x, y]| match axis {
            AxisOrder::XY => format!("{} {}", x, y),
            AxisOrder::LatLon => format!("{} {}", y, x),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text form of a property value, or `None` for null.
pub fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Append a feature element `<prefix:type>` with its geometry and properties.
///
/// Geometry comes first, then properties in key order. Null properties
/// are written as `xsi:nil` elements, so the enclosing document must bind
/// the `xsi` prefix. `namespace`, when given, is bound to `prefix` on the
/// feature element.
pub fn write_feature(
    out: &mut String,
    prefix: &str,
    namespace: Option<&str>,
    feature_type: &str,
    feature: &Feature,
    srs: Option<&SpatialReference>,
) {
    let qualify = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", prefix, name)
        }
    };

    let element = qualify(feature_type);
    out.push_str(&format!("<{}", element));
    if let (Some(ns), false) = (namespace, prefix.is_empty()) {
        out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(ns)));
    }
    if let Some(id) = &feature.id {
        out.push_str(&format!(" gml:id=\"{}\"", escape(id)));
    }
    out.push('>');

    if let Some(geometry) = &feature.geometry {
        let name = qualify(&feature.geometry_name);
        out.push_str(&format!("<{}>", name));
        write_geometry(out, geometry, srs);
        out.push_str(&format!("</{}>", name));
    }

    for (key, value) in &feature.properties {
        if key == &feature.geometry_name && feature.geometry.is_some() {
            continue;
        }
        let name = qualify(key);
        match property_text(value) {
            Some(text) => out.push_str(&format!("<{}>{}</{}>", name, escape(&text), name)),
            None => out.push_str(&format!("<{} xsi:nil=\"true\"/>", name)),
        }
    }

    out.push_str(&format!("</{}>", element));
}

/// A `wfs:FeatureCollection` of features of one type.
pub fn write_feature_collection(
    features: &[Feature],
    prefix: &str,
    namespace: &str,
    feature_type: &str,
    srs: Option<&SpatialReference>,
) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    xml.push_str(&format!(
        "<wfs:FeatureCollection xmlns:wfs=\"{}\" xmlns:gml=\"{}\" xmlns:xsi=\"{}\" xmlns:{}=\"{}\" numberOfFeatures=\"{}\">",
        crate::xml::WFS_NS,
        GML_NS,
        XSI_NS,
        prefix,
        escape(namespace),
        features.len()
    ));
    for feature in features {
        xml.push_str("<gml:featureMember>");
        write_feature(&mut xml, prefix, None, feature_type, feature, srs);
        xml.push_str("</gml:featureMember>");
    }
    xml.push_str("</wfs:FeatureCollection>");
    xml
}

// ============================================================================
// Reading
// ============================================================================

/// Coordinate context while walking a geometry.
#[derive(Debug, Clone, Copy)]
struct Coords {
    axis: AxisOrder,
    dimension: usize,
}

impl Coords {
    fn for_element(element: &XmlElement, fallback: AxisOrder) -> Self {
        let axis = element
            .attr("srsName")
            .and_then(|s| SpatialReference::parse(s).ok())
            .map(|s| s.axis_order())
            .unwrap_or(fallback);
        Self {
            axis,
            dimension: 2,
        }
        .with_dimension(element)
    }

    fn with_dimension(mut self, element: &XmlElement) -> Self {
        if let Some(d) = element
            .attr("srsDimension")
            .or_else(|| element.attr("dimension"))
            .and_then(|d| d.parse::<usize>().ok())
            .filter(|d| *d >= 2)
        {
            self.dimension = d;
        }
        self
    }

    fn point(&self, a: f64, b: f64) -> [f64; 2] {
        match self.axis {
            AxisOrder::XY => [a, b],
            AxisOrder::LatLon => [b, a],
        }
    }
}

/// Read all features of a GML feature collection.
///
/// Property values are text unless `options` carries a schema.
pub fn read_features(root: &XmlElement, options: &ReadOptions<'_>) -> OgcResult<Vec<Feature>> {
    let fallback = Coords::for_element(root, options.data_projection.axis_order()).axis;
    let mut features = Vec::new();

    for member in root.children() {
        let elements: Vec<&XmlElement> = match member.local_name() {
            "featureMember" | "member" => member.children().iter().take(1).collect(),
            "featureMembers" => member.children().iter().collect(),
            _ => continue,
        };
        for element in elements {
            let feature = options.type_properties(read_feature(element, fallback)?);
            features.push(options.transform_feature(feature)?);
        }
    }
    Ok(features)
}

/// Read one feature element.
pub fn read_feature(element: &XmlElement, axis: AxisOrder) -> OgcResult<Feature> {
    let mut feature = Feature::new();
    feature.id = element
        .attr_ns(GML_NS, "id")
        .or_else(|| element.attr("fid"))
        .map(str::to_string);

    for child in element.children() {
        let name = child.local_name();

        if name == "boundedBy" {
            if let Some(extent) = child.children().first().and_then(|e| read_envelope(e, axis)) {
                feature
                    .properties
                    .insert(name.to_string(), Value::from(extent.to_extent().to_vec()));
            }
            continue;
        }

        if let Some(geometry_element) = child
            .children()
            .iter()
            .find(|e| e.in_namespace(GML_NS) && GEOMETRY_ELEMENTS.contains(&e.local_name()))
        {
            let geometry = read_geometry(geometry_element, axis)?;
            if feature.geometry.is_none() {
                feature.geometry_name = name.to_string();
                feature.geometry = Some(geometry);
            } else {
                let value = serde_json::to_value(&geometry)?;
                feature.properties.insert(name.to_string(), value);
            }
            continue;
        }

        let value = if child.attr_ns(XSI_NS, "nil") == Some("true") {
            Value::Null
        } else if child.children().is_empty() {
            Value::String(child.text().to_string())
        } else {
            Value::String(child.deep_text())
        };
        feature.properties.insert(name.to_string(), value);
    }
    Ok(feature)
}

fn read_envelope(element: &XmlElement, axis: AxisOrder) -> Option<BoundingBox> {
    let coords = Coords::for_element(element, axis);
    match element.local_name() {
        "Envelope" => {
            let lower = read_positions(element.child("lowerCorner")?.text(), coords).ok()?;
            let upper = read_positions(element.child("upperCorner")?.text(), coords).ok()?;
            Some(BoundingBox::from_corners(*lower.first()?, *upper.first()?))
        }
        "Box" => BoundingBox::covering(read_coordinates(element.child("coordinates")?, coords).ok()?),
        _ => None,
    }
}

/// Read a geometry element in either GML 2 or GML 3 form.
pub fn read_geometry(element: &XmlElement, axis: AxisOrder) -> OgcResult<Geometry> {
    read_geometry_with(element, Coords::for_element(element, axis))
}

fn read_geometry_with(element: &XmlElement, parent: Coords) -> OgcResult<Geometry> {
    let coords = parent.with_dimension(element);
    match element.local_name() {
        "Point" => {
            let points = read_path(element, coords)?;
            let point = points
                .first()
                .copied()
                .ok_or_else(|| OgcError::invalid_document("Point without coordinates"))?;
            Ok(Geometry::Point { coordinates: point })
        }
        "LineString" | "LinearRing" => Ok(Geometry::LineString {
            coordinates: read_path(element, coords)?,
        }),
        "Curve" => {
            let mut coordinates = Vec::new();
            if let Some(segments) = element.child("segments") {
                for segment in segments.children() {
                    coordinates.extend(read_path(segment, coords)?);
                }
            }
            Ok(Geometry::LineString { coordinates })
        }
        "Polygon" => Ok(Geometry::Polygon {
            coordinates: read_rings(element, coords)?,
        }),
        "Surface" => {
            let patch = element
                .find(|e| e.is("PolygonPatch"))
                .ok_or_else(|| OgcError::invalid_document("Surface without PolygonPatch"))?;
            Ok(Geometry::Polygon {
                coordinates: read_rings(patch, coords)?,
            })
        }
        "MultiPoint" => {
            let mut points = Vec::new();
            for member in members(element) {
                if let Geometry::Point { coordinates } = read_geometry_with(member, coords)? {
                    points.push(coordinates);
                }
            }
            Ok(Geometry::MultiPoint {
                coordinates: points,
            })
        }
        "MultiLineString" | "MultiCurve" => {
            let mut lines = Vec::new();
            for member in members(element) {
                if let Geometry::LineString { coordinates } = read_geometry_with(member, coords)? {
                    lines.push(coordinates);
                }
            }
            Ok(Geometry::MultiLineString { coordinates: lines })
        }
        "MultiPolygon" | "MultiSurface" => {
            let mut polygons = Vec::new();
            for member in members(element) {
                if let Geometry::Polygon { coordinates } = read_geometry_with(member, coords)? {
                    polygons.push(coordinates);
                }
            }
            Ok(Geometry::MultiPolygon {
                coordinates: polygons,
            })
        }
        other => Err(OgcError::invalid_document(format!(
            "Unsupported GML geometry: {}",
            other
        ))),
    }
}

/// Geometries inside `*Member` / `*Members` wrappers.
fn members(element: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    element
        .children()
        .iter()
        .filter(|c| c.local_name().ends_with("Member") || c.local_name().ends_with("Members"))
        .flat_map(|c| c.children().iter())
}

fn read_rings(element: &XmlElement, coords: Coords) -> OgcResult<Vec<Vec<[f64; 2]>>> {
    let mut rings = Vec::new();
    let exterior = element
        .child("exterior")
        .or_else(|| element.child("outerBoundaryIs"))
        .and_then(|e| e.child("LinearRing"))
        .ok_or_else(|| OgcError::invalid_document("Polygon without exterior ring"))?;
    rings.push(read_path(exterior, coords.with_dimension(exterior))?);

    for interior in element
        .children()
        .iter()
        .filter(|c| c.is("interior") || c.is("innerBoundaryIs"))
        .filter_map(|c| c.child("LinearRing"))
    {
        rings.push(read_path(interior, coords.with_dimension(interior))?);
    }
    Ok(rings)
}

/// Coordinates of a point, line or ring in any of the GML encodings.
fn read_path(element: &XmlElement, coords: Coords) -> OgcResult<Vec<[f64; 2]>> {
    if let Some(list) = element.child("posList") {
        return read_positions(list.text(), coords.with_dimension(list));
    }
    if let Some(coordinates) = element.child("coordinates") {
        return read_coordinates(coordinates, coords);
    }
    let mut points = Vec::new();
    for pos in element.children_named("pos") {
        points.extend(read_positions(pos.text(), coords.with_dimension(pos))?);
    }
    if points.is_empty() {
        for coord in element.children_named("coord") {
            let value = |name: &str| coord.child_text(name).and_then(|v| v.parse::<f64>().ok());
            if let (Some(x), Some(y)) = (value("X"), value("Y")) {
                points.push(coords.point(x, y));
            }
        }
    }
    Ok(points)
}

fn read_positions(text: &str, coords: Coords) -> OgcResult<Vec<[f64; 2]>> {
    let values = text
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| OgcError::invalid_document(format!("Invalid coordinate '{}'", v)))
        })
        .collect::<OgcResult<Vec<f64>>>()?;

    if values.len() % coords.dimension != 0 {
        return Err(OgcError::invalid_document(format!(
            "{} ordinates do not fit dimension {}",
            values.len(),
            coords.dimension
        )));
    }
    Ok(values
        .chunks(coords.dimension)
        .map(|c| coords.point(c[0], c[1]))
        .collect())
}

/// GML 2 `<coordinates>` with optional `cs`/`ts`/`decimal` separators.
fn read_coordinates(element: &XmlElement, coords: Coords) -> OgcResult<Vec<[f64; 2]>> {
    let cs = element.attr("cs").unwrap_or(",");
    let ts = element.attr("ts").unwrap_or(" ");
    let decimal = element.attr("decimal").unwrap_or(".");

    let tuples: Vec<&str> = if ts.trim().is_empty() {
        element.text().split_whitespace().collect()
    } else {
        element.text().split(ts).map(str::trim).filter(|t| !t.is_empty()).collect()
    };

    tuples
        .into_iter()
        .map(|tuple| {
            let mut parts = tuple.split(cs).map(|v| {
                let v = if decimal == "." {
                    v.trim().to_string()
                } else {
                    v.trim().replace(decimal, ".")
                };
                v.parse::<f64>()
                    .map_err(|_| OgcError::invalid_document(format!("Invalid coordinate '{}'", v)))
            });
            match (parts.next(), parts.next()) {
                (Some(a), Some(b)) => Ok(coords.point(a?, b?)),
                _ => Err(OgcError::invalid_document(format!(
                    "Incomplete coordinate tuple '{}'",
                    tuple
                ))),
            }
        })
        .collect()
}

/// Feature count from a `resultType=hits` response.
pub fn read_feature_collection_metadata(root: &XmlElement) -> OgcResult<u64> {
    root.attr("numberOfFeatures")
        .or_else(|| root.attr("numberMatched"))
        .ok_or_else(|| OgcError::invalid_document("Feature collection without a feature count"))?
        .trim()
        .parse::<u64>()
        .map_err(|e| OgcError::invalid_document(format!("Invalid feature count: {}", e)))
}
