//! WMS GetFeatureInfo handling
//!
//! Builds GetFeatureInfo requests for a point on the map and interprets
//! the responses in the supported info formats.

use serde::{Deserialize, Serialize};
use url::Url;

use ogc_common::{AxisOrder, BoundingBox, Feature, OgcResult, SpatialReference};

use crate::codec::ReadOptions;
use crate::exceptions::{classify, classify_json};
use crate::query::with_query;
use crate::{geojson, gml};

/// Body GeoServer returns for text/html and text/plain when nothing was hit.
pub const NO_FEATURES_SENTINEL: &str = "no features were found";

/// Width and height of the query window, in pixels.
const QUERY_WINDOW: u32 = 101;

/// Supported GetFeatureInfo response formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum InfoFormat {
    /// application/json - GeoJSON features
    #[serde(rename = "application/json")]
    Json,
    /// application/vnd.ogc.gml - GML features
    #[serde(rename = "application/vnd.ogc.gml")]
    Gml,
    /// text/html - Human-readable HTML for popups
    #[serde(rename = "text/html")]
    #[default]
    Html,
    /// text/plain - Simple text format
    #[serde(rename = "text/plain")]
    Text,
}

impl InfoFormat {
    /// Parse from MIME type string
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "application/json" => Some(InfoFormat::Json),
            "application/vnd.ogc.gml" => Some(InfoFormat::Gml),
            "text/html" => Some(InfoFormat::Html),
            "text/plain" => Some(InfoFormat::Text),
            _ => None,
        }
    }

    /// Get MIME type string
    pub fn to_mime(&self) -> &'static str {
        match self {
            InfoFormat::Json => "application/json",
            InfoFormat::Gml => "application/vnd.ogc.gml",
            InfoFormat::Html => "text/html",
            InfoFormat::Text => "text/plain",
        }
    }

    /// Text formats are returned verbatim rather than parsed into features.
    pub fn is_text(&self) -> bool {
        matches!(self, InfoFormat::Html | InfoFormat::Text)
    }
}

/// GetFeatureInfo request parameters
#[derive(Debug, Clone)]
pub struct GetFeatureInfoRequest {
    /// Layers to display (same as GetMap)
    pub layers: Vec<String>,
    /// Layers to query for information
    pub query_layers: Vec<String>,
    /// Reference of `bbox`
    pub crs: SpatialReference,
    /// Map extent in `crs` units, always x/y ordered
    pub bbox: BoundingBox,
    /// Map width in pixels
    pub width: u32,
    /// Map height in pixels
    pub height: u32,
    /// Pixel column (X coordinate, 0-based from left)
    pub i: u32,
    /// Pixel row (Y coordinate, 0-based from top)
    pub j: u32,
    /// Response format
    pub info_format: InfoFormat,
    /// Maximum number of features to return
    pub feature_count: Option<u32>,
}

impl GetFeatureInfoRequest {
    /// A query window of [`QUERY_WINDOW`] pixels centred on `coordinate`.
    pub fn centred_on(
        layers: Vec<String>,
        coordinate: [f64; 2],
        resolution: f64,
        crs: SpatialReference,
        info_format: InfoFormat,
    ) -> Self {
        let half = QUERY_WINDOW as f64 / 2.0 * resolution;
        let [x, y] = coordinate;
        let bbox = BoundingBox::new(x - half, y - half, x + half, y + half);
        let i = ((x - bbox.min_x) / resolution).floor() as u32;
        let j = ((bbox.max_y - y) / resolution).floor() as u32;
        Self {
            query_layers: layers.clone(),
            layers,
            crs,
            bbox,
            width: QUERY_WINDOW,
            height: QUERY_WINDOW,
            i,
            j,
            info_format,
            feature_count: None,
        }
    }

    /// KVP parameters for the given WMS version.
    ///
    /// 1.3.0 uses `CRS`/`I`/`J` and honours the reference's axis order in
    /// `BBOX`; 1.1.1 uses `SRS`/`X`/`Y` with x/y order.
    pub fn to_query_pairs(&self, version: &str) -> Vec<(String, String)> {
        let wms_1_3 = version.starts_with("1.3");
        let [min_x, min_y, max_x, max_y] = self.bbox.to_extent();
        let bbox = if wms_1_3 && self.crs.axis_order() == AxisOrder::LatLon {
            format!("{},{},{},{}", min_y, min_x, max_y, max_x)
        } else {
            format!("{},{},{},{}", min_x, min_y, max_x, max_y)
        };
        let (crs_key, i_key, j_key) = if wms_1_3 {
            ("CRS", "I", "J")
        } else {
            ("SRS", "X", "Y")
        };

        let mut pairs = vec![
            ("SERVICE".to_string(), "WMS".to_string()),
            ("VERSION".to_string(), version.to_string()),
            ("REQUEST".to_string(), "GetFeatureInfo".to_string()),
            ("FORMAT".to_string(), "image/png".to_string()),
            ("TRANSPARENT".to_string(), "true".to_string()),
            ("QUERY_LAYERS".to_string(), self.query_layers.join(",")),
            ("LAYERS".to_string(), self.layers.join(",")),
            ("STYLES".to_string(), String::new()),
            ("INFO_FORMAT".to_string(), self.info_format.to_mime().to_string()),
            (i_key.to_string(), self.i.to_string()),
            (j_key.to_string(), self.j.to_string()),
            ("WIDTH".to_string(), self.width.to_string()),
            ("HEIGHT".to_string(), self.height.to_string()),
            (crs_key.to_string(), self.crs.identifier().to_string()),
            ("BBOX".to_string(), bbox),
        ];
        if let Some(count) = self.feature_count {
            pairs.push(("FEATURE_COUNT".to_string(), count.to_string()));
        }
        pairs
    }
}

/// Anything that can produce a GetFeatureInfo URL for a map coordinate.
///
/// The map's image or tile source decides window size, version and layer
/// parameters; callers only add format-like extras.
pub trait FeatureInfoSource: Send + Sync {
    fn feature_info_url(
        &self,
        coordinate: [f64; 2],
        resolution: f64,
        projection: &SpatialReference,
        info_format: InfoFormat,
    ) -> OgcResult<Url>;
}

/// Single-image WMS source for one layer list.
#[derive(Debug, Clone)]
pub struct WmsImageSource {
    url: Url,
    layers: Vec<String>,
    version: String,
    feature_count: Option<u32>,
}

impl WmsImageSource {
    pub fn new(url: Url, layers: Vec<String>) -> Self {
        Self {
            url,
            layers,
            version: "1.3.0".to_string(),
            feature_count: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_feature_count(mut self, count: u32) -> Self {
        self.feature_count = Some(count);
        self
    }
}

impl FeatureInfoSource for WmsImageSource {
    fn feature_info_url(
        &self,
        coordinate: [f64; 2],
        resolution: f64,
        projection: &SpatialReference,
        info_format: InfoFormat,
    ) -> OgcResult<Url> {
        let mut request = GetFeatureInfoRequest::centred_on(
            self.layers.clone(),
            coordinate,
            resolution,
            projection.clone(),
            info_format,
        );
        request.feature_count = self.feature_count;
        let pairs = request.to_query_pairs(&self.version);
        let params: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        Ok(with_query(&self.url, &params))
    }
}

/// Interpreted GetFeatureInfo response.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureInfoResult {
    /// HTML or plain text to show as-is.
    Text(String),
    Features(Vec<Feature>),
    /// The server found nothing at the point.
    Empty,
}

/// Interpret a GetFeatureInfo body according to the requested format.
pub fn parse_feature_info(
    body: &str,
    format: InfoFormat,
    options: &ReadOptions<'_>,
) -> OgcResult<FeatureInfoResult> {
    match format {
        InfoFormat::Html | InfoFormat::Text => {
            if body.trim() == NO_FEATURES_SENTINEL {
                Ok(FeatureInfoResult::Empty)
            } else {
                Ok(FeatureInfoResult::Text(body.to_string()))
            }
        }
        InfoFormat::Json => {
            let value = classify_json(body, None)?;
            Ok(FeatureInfoResult::Features(geojson::read_features_value(
                value, options,
            )?))
        }
        InfoFormat::Gml => {
            let root = classify(body, None)?;
            let has_members = root
                .children()
                .iter()
                .any(|c| c.is("featureMember") || c.is("featureMembers"));
            let features = if has_members {
                gml::read_features(&root, options)?
            } else {
                // MapServer style: <layer_layer><layer_feature>...
                let axis = options.data_projection.axis_order();
                let mut features = Vec::new();
                for layer in root.children().iter().filter(|c| c.local_name().ends_with("_layer")) {
                    for element in layer
                        .children()
                        .iter()
                        .filter(|c| c.local_name().ends_with("_feature"))
                    {
                        features.push(options.transform_feature(gml::read_feature(element, axis)?)?);
                    }
                }
                features
            };
            Ok(FeatureInfoResult::Features(features))
        }
    }
}
