//! Common types shared across the OGC client crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod feature;
pub mod layer;
pub mod schema;
pub mod view;

pub use bbox::BoundingBox;
pub use crs::{
    AxisOrder, CrsCode, CrsParseError, SpatialReference, SpatialReferenceRegistry,
    StandardRegistry, GML_EPSG_4326,
};
pub use error::{FailureKind, OgcError, OgcResult, ServiceFailure};
pub use feature::{Feature, Geometry, Properties, DEFAULT_GEOMETRY_NAME};
pub use layer::{LayerDescriptor, LayerNode, StyleRef, TimeInfo};
pub use schema::{AttributeKind, FeatureTypeSchema, Protocol, ServiceDescriptor};
pub use view::ViewContext;
