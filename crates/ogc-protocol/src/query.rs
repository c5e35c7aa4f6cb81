//! Request URL and payload construction.
//!
//! Builders here are pure: they take an already validated endpoint and
//! produce a URL or XML body. Query parameters replace any query already on
//! the base URL; scheme, host and path are preserved.

use url::Url;

use ogc_common::{BoundingBox, FeatureTypeSchema, OgcResult, Protocol, ServiceDescriptor};

use crate::xml::{escape, WFS_NS};

/// Legend rendering options sent with every GetLegendGraphic request.
pub const LEGEND_OPTIONS: &str =
    "fontColor:0x000000;forceLabels:on;fontAntiAliasing:true;fontSize:11;fontName:Arial";

/// Radius, in meters, of the distance-within identify filter.
pub const DWITHIN_DISTANCE_METERS: f64 = 0.1;

pub const WFS_VERSION: &str = "1.1.0";
pub const DESCRIBE_FEATURE_TYPE_VERSION: &str = "1.0.0";
pub const GET_STYLES_VERSION: &str = "1.1.1";

/// Replace the query string of `base` with `params`, in order.
///
/// Values are kept readable: only characters that would break the
/// key/value structure are percent-encoded, so `/`, `:`, `;` and `,` stay
/// verbatim.
pub fn with_query(base: &Url, params: &[(&str, &str)]) -> Url {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut url = base.clone();
    url.set_query(Some(&query));
    url
}

fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '+' => out.push_str("%2B"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
    out
}

/// GetCapabilities for either protocol.
pub fn capabilities_url(service: &ServiceDescriptor) -> Url {
    let name = match service.protocol() {
        Protocol::Wms => "WMS",
        Protocol::Wfs => "WFS",
    };
    with_query(
        service.base_url(),
        &[
            ("service", name),
            ("version", service.version()),
            ("request", "GetCapabilities"),
        ],
    )
}

/// WFS endpoint paired with a WMS URL: the first `wms` in the path becomes `wfs`.
pub fn wfs_endpoint(base: &Url) -> Url {
    let mut url = base.clone();
    let path = url.path().replacen("wms", "wfs", 1);
    url.set_path(&path);
    url
}

/// WFS 1.0.0 DescribeFeatureType for one type name.
pub fn describe_feature_type_url(base: &Url, type_name: &str) -> Url {
    with_query(
        &wfs_endpoint(base),
        &[
            ("service", "WFS"),
            ("request", "DescribeFeatureType"),
            ("version", DESCRIBE_FEATURE_TYPE_VERSION),
            ("typename", type_name),
        ],
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultType {
    #[default]
    Results,
    Hits,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Results => "results",
            ResultType::Hits => "hits",
        }
    }
}

/// Parameters of a KVP GetFeature request.
#[derive(Debug, Clone, Default)]
pub struct GetFeatureQuery {
    pub type_name: String,
    pub srs_name: Option<String>,
    /// Extent and the SRS it is expressed in.
    pub bbox: Option<(BoundingBox, String)>,
    pub output_format: Option<String>,
    pub cql_filter: Option<String>,
    pub result_type: ResultType,
    pub max_features: Option<u32>,
}

impl GetFeatureQuery {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_srs_name(mut self, srs_name: impl Into<String>) -> Self {
        self.srs_name = Some(srs_name.into());
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox, srs: impl Into<String>) -> Self {
        self.bbox = Some((bbox, srs.into()));
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    pub fn with_cql_filter(mut self, filter: impl Into<String>) -> Self {
        self.cql_filter = Some(filter.into());
        self
    }

    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    pub fn with_max_features(mut self, max_features: u32) -> Self {
        self.max_features = Some(max_features);
        self
    }
}

/// WFS 1.1.0 KVP GetFeature.
pub fn get_feature_url(base: &Url, query: &GetFeatureQuery) -> Url {
    let bbox = query
        .bbox
        .as_ref()
        .map(|(extent, srs)| extent.to_query_value(srs));
    let max_features = query.max_features.map(|n| n.to_string());

    let mut params: Vec<(&str, &str)> = vec![
        ("service", "WFS"),
        ("request", "GetFeature"),
        ("version", WFS_VERSION),
    ];
    if let Some(srs) = &query.srs_name {
        params.push(("srsName", srs.as_str()));
    }
    params.push(("typename", query.type_name.as_str()));
    if let Some(format) = &query.output_format {
        params.push(("outputFormat", format.as_str()));
    }
    if query.result_type == ResultType::Hits {
        params.push(("resultType", query.result_type.as_str()));
    }
    if let Some(n) = &max_features {
        params.push(("maxFeatures", n.as_str()));
    }
    if let Some(bbox) = &bbox {
        params.push(("bbox", bbox.as_str()));
    }
    if let Some(filter) = &query.cql_filter {
        params.push(("cql_filter", filter.as_str()));
    }
    with_query(base, &params)
}

/// URL used by a bbox loading strategy: GeoJSON in `srs`, limited to `extent`.
pub fn bbox_strategy_url(base: &Url, type_name: &str, extent: &BoundingBox, srs: &str) -> Url {
    with_query(
        base,
        &[
            ("service", "WFS"),
            ("request", "GetFeature"),
            ("version", WFS_VERSION),
            ("typename", type_name),
            ("outputFormat", "application/json"),
            ("srsname", srs),
            ("bbox", &extent.to_query_value(srs)),
        ],
    )
}

/// GML GetFeature restricted to the view extent, in the view SRS.
pub fn bbox_filter_url(base: &Url, type_name: &str, extent: &BoundingBox, srs: &str) -> Url {
    get_feature_url(
        base,
        &GetFeatureQuery::new(type_name)
            .with_srs_name(srs)
            .with_bbox(*extent, srs),
    )
}

/// CQL `DWITHIN` filter around a lon/lat point.
///
/// The point is written latitude first and the radius is fixed at
/// [`DWITHIN_DISTANCE_METERS`]; GeoServer deployments this talks to expect
/// exactly this form.
pub fn dwithin_filter(geometry_name: &str, [lon, lat]: [f64; 2]) -> String {
    format!(
        "DWITHIN({}, Point({} {}), {}, meters)",
        geometry_name, lat, lon, DWITHIN_DISTANCE_METERS
    )
}

/// GetFeature for features near a lon/lat point, returned in `srs`.
pub fn distance_within_url(
    base: &Url,
    schema: &FeatureTypeSchema,
    lon_lat: [f64; 2],
    srs: &str,
) -> Url {
    get_feature_url(
        base,
        &GetFeatureQuery::new(&schema.feature_type)
            .with_srs_name(srs)
            .with_cql_filter(dwithin_filter(&schema.geometry_name, lon_lat)),
    )
}

/// GetLegendGraphic with fixed size, format and label styling.
pub fn legend_graphic_url(base: &Url, layer: &str) -> Url {
    with_query(
        base,
        &[
            ("request", "GetLegendGraphic"),
            ("transparent", "true"),
            ("width", "20"),
            ("height", "20"),
            ("layer", layer),
            ("format", "image/png"),
            ("legend_options", LEGEND_OPTIONS),
        ],
    )
}

/// WMS 1.1.1 GetStyles for one layer.
pub fn get_styles_url(base: &Url, layer: &str) -> Url {
    with_query(
        base,
        &[
            ("service", "WMS"),
            ("request", "GetStyles"),
            ("layers", layer),
            ("version", GET_STYLES_VERSION),
        ],
    )
}

/// Options of a POST GetFeature.
#[derive(Debug, Clone, Default)]
pub struct GetFeatureOptions {
    pub max_features: Option<u32>,
    pub start_index: Option<u32>,
    pub srs_name: Option<String>,
    pub result_type: ResultType,
}

/// WFS 1.1.0 GetFeature payload for one feature type.
pub fn get_feature_payload(schema: &FeatureTypeSchema, options: &GetFeatureOptions) -> String {
    let mut xml = String::new();
    xml.push_str(&format!(
        "<wfs:GetFeature xmlns:wfs=\"{}\" service=\"WFS\" version=\"{}\"",
        WFS_NS, WFS_VERSION
    ));
    if options.result_type == ResultType::Hits {
        xml.push_str(" resultType=\"hits\"");
    }
    if let Some(n) = options.max_features {
        xml.push_str(&format!(" maxFeatures=\"{}\"", n));
    }
    if let Some(n) = options.start_index {
        xml.push_str(&format!(" startIndex=\"{}\"", n));
    }
    xml.push('>');

    xml.push_str(&format!(
        "<wfs:Query typeName=\"{}\"",
        escape(&schema.qualified_type_name())
    ));
    if let Some(srs) = &options.srs_name {
        xml.push_str(&format!(" srsName=\"{}\"", escape(srs)));
    }
    if !schema.feature_prefix.is_empty() {
        xml.push_str(&format!(
            " xmlns:{}=\"{}\"",
            schema.feature_prefix,
            escape(&schema.feature_namespace)
        ));
    }
    xml.push_str("/></wfs:GetFeature>");
    xml
}

/// Parse and validate an endpoint, for callers holding a raw string.
pub fn endpoint(base_url: &str) -> OgcResult<Url> {
    ogc_common::schema::parse_endpoint(base_url)
}
