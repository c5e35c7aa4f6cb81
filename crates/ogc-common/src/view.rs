//! Map view context supplied by the caller on each call.

use crate::{BoundingBox, SpatialReference};

/// The caller's current view. Never stored by the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContext {
    /// Display reference of the map
    pub projection: SpatialReference,
    /// Map units per pixel
    pub resolution: f64,
    /// Visible extent in `projection`
    pub extent: Option<BoundingBox>,
}

impl ViewContext {
    pub fn new(projection: SpatialReference, resolution: f64) -> Self {
        Self {
            projection,
            resolution,
            extent: None,
        }
    }

    pub fn with_extent(mut self, extent: BoundingBox) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Wire identifier of the view projection.
    pub fn srs_name(&self) -> &str {
        self.projection.identifier()
    }
}
