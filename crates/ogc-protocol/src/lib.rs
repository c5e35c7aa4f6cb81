//! OGC WMS and WFS client protocol implementation.
//!
//! Supports:
//! - WMS 1.3.0 / 1.1.1 GetCapabilities, GetFeatureInfo, GetLegendGraphic and GetStyles
//! - WFS 1.1.0 GetCapabilities, GetFeature and Transaction, WFS 1.0.0 DescribeFeatureType
//! - GML 3.1.1 (and GML 2 reading) and GeoJSON feature encodings
//!
//! Everything here is pure: no I/O happens in this crate.

pub mod capabilities;
pub mod codec;
pub mod describe;
pub mod exceptions;
pub mod geojson;
pub mod getfeatureinfo;
pub mod gml;
pub mod query;
pub mod transaction;
pub mod xml;

pub use capabilities::{parse_capabilities, Capabilities};
pub use codec::ReadOptions;
pub use describe::describe_feature_type;
pub use exceptions::{classify, classify_json};
pub use getfeatureinfo::{
    FeatureInfoResult, FeatureInfoSource, GetFeatureInfoRequest, InfoFormat, WmsImageSource,
};
pub use query::{GetFeatureOptions, GetFeatureQuery, ResultType};
pub use transaction::TransactionResult;
pub use xml::{parse_document, XmlElement};
