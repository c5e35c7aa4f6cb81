//! Options shared by the GML and GeoJSON feature codecs.

use serde_json::Value;

use ogc_common::{
    Feature, FeatureTypeSchema, Geometry, OgcResult, SpatialReference, SpatialReferenceRegistry,
    StandardRegistry,
};

/// How to interpret coordinates read from the wire.
#[derive(Clone, Copy)]
pub struct ReadOptions<'a> {
    /// Reference the server encoded coordinates in; its axis order drives
    /// GML coordinate parsing.
    pub data_projection: &'a SpatialReference,
    /// Reference to reproject into, if different from the data.
    pub feature_projection: Option<&'a SpatialReference>,
    pub registry: &'a dyn SpatialReferenceRegistry,
    /// Schema whose attribute kinds type textual property values.
    pub schema: Option<&'a FeatureTypeSchema>,
}

impl<'a> ReadOptions<'a> {
    /// Read coordinates as-is in `data_projection`.
    pub fn new(data_projection: &'a SpatialReference) -> Self {
        Self {
            data_projection,
            feature_projection: None,
            registry: &StandardRegistry,
            schema: None,
        }
    }

    pub fn reproject_to(mut self, feature_projection: &'a SpatialReference) -> Self {
        self.feature_projection = Some(feature_projection);
        self
    }

    pub fn with_registry(mut self, registry: &'a dyn SpatialReferenceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_schema(mut self, schema: &'a FeatureTypeSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Decode string properties by the schema's attribute kinds.
    pub(crate) fn type_properties(&self, mut feature: Feature) -> Feature {
        let Some(schema) = self.schema else {
            return feature;
        };
        for (name, value) in feature.properties.iter_mut() {
            if let Value::String(text) = value {
                *value = schema.attribute_kind(name).decode(text);
            }
        }
        feature
    }

    /// Reproject a geometry from data to feature projection.
    pub fn transform(&self, geometry: Geometry) -> OgcResult<Geometry> {
        match self.feature_projection {
            Some(target) if !self.data_projection.is_equivalent(target) => Ok(geometry
                .try_map_points(|p| self.registry.reproject(p, self.data_projection, target))?),
            _ => Ok(geometry),
        }
    }

    pub(crate) fn transform_feature(&self, mut feature: Feature) -> OgcResult<Feature> {
        if let Some(geometry) = feature.geometry.take() {
            feature.geometry = Some(self.transform(geometry)?);
        }
        Ok(feature)
    }
}

impl std::fmt::Debug for ReadOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOptions")
            .field("data_projection", self.data_projection)
            .field("feature_projection", &self.feature_projection)
            .field("schema", &self.schema.map(FeatureTypeSchema::qualified_type_name))
            .finish()
    }
}
