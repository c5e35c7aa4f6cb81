//! WFS service client.
//!
//! Every method is an independent request/response exchange. Schemas,
//! features and views are borrowed for the duration of the call only.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use url::Url;

use ogc_common::{
    BoundingBox, Feature, FeatureTypeSchema, OgcError, OgcResult, Properties, Protocol,
    ServiceDescriptor, SpatialReference, SpatialReferenceRegistry, StandardRegistry, ViewContext,
};
use ogc_protocol::describe::describe_feature_type;
use ogc_protocol::query::{self, GetFeatureOptions, ResultType};
use ogc_protocol::transaction::{self, TransactionResult};
use ogc_protocol::{gml, parse_capabilities, Capabilities, ReadOptions};

use crate::transport::Transport;

/// SRS declared on paged feature loads; the server answers in lon/lat.
const LOAD_SRS_NAME: &str = "EPSG:4326";

/// Client for WFS 1.1.0 servers.
pub struct WfsClient<T> {
    transport: T,
    registry: Arc<dyn SpatialReferenceRegistry>,
}

impl<T: Transport> WfsClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            registry: Arc::new(StandardRegistry),
        }
    }

    /// Use a different registry for reprojection.
    pub fn with_registry(mut self, registry: Arc<dyn SpatialReferenceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn read_options<'a>(&'a self, data_projection: &'a SpatialReference) -> ReadOptions<'a> {
        ReadOptions::new(data_projection).with_registry(self.registry.as_ref())
    }

    /// Fetch and parse the capabilities document.
    #[instrument(skip(self))]
    pub async fn get_capabilities(&self, url: &str) -> OgcResult<Capabilities> {
        let service = ServiceDescriptor::with_default_version(url, Protocol::Wfs)?;
        let request = query::capabilities_url(&service);
        let root = self.transport.get(&request).await?.into_document()?;
        let capabilities = parse_capabilities(&root)?;
        info!(layers = capabilities.layers.len(), "Loaded WFS capabilities");
        Ok(capabilities)
    }

    /// Describe one feature type. The schema's source URL is the WFS
    /// endpoint derived from `url`.
    #[instrument(skip(self))]
    pub async fn describe_feature_type(
        &self,
        url: &str,
        layer_name: &str,
    ) -> OgcResult<FeatureTypeSchema> {
        let base = query::endpoint(url)?;
        let request = query::describe_feature_type_url(&base, layer_name);
        let response = self
            .transport
            .get(&request)
            .await?
            .error_for_status()
            .map_err(|err| match err {
                OgcError::ServiceException { text, .. } => OgcError::DescribeFeatureTypeFailed(text),
                other => other,
            })?;

        let schema = describe_feature_type(
            &response.text(),
            layer_name,
            query::wfs_endpoint(&base).as_str(),
        )?;
        debug!(
            geometry = %schema.geometry_name,
            attributes = schema.attributes.len(),
            "Described feature type"
        );
        Ok(schema)
    }

    /// Load one page of features, reprojected into `srs`.
    #[instrument(skip(self, schema, srs), fields(type_name = %schema.qualified_type_name()))]
    pub async fn load_features(
        &self,
        schema: &FeatureTypeSchema,
        start_index: u32,
        max_features: u32,
        srs: &SpatialReference,
    ) -> OgcResult<Vec<Feature>> {
        let url = schema.source_url()?;
        let payload = query::get_feature_payload(
            schema,
            &GetFeatureOptions {
                max_features: Some(max_features),
                start_index: Some(start_index),
                srs_name: Some(LOAD_SRS_NAME.to_string()),
                result_type: ResultType::Results,
            },
        );
        let root = self.transport.post(&url, payload).await?.into_document()?;

        let wire = SpatialReference::gml_wgs84();
        let options = self.read_options(&wire).reproject_to(srs).with_schema(schema);
        let features = gml::read_features(&root, &options)?;
        debug!(count = features.len(), "Loaded features");
        Ok(features)
    }

    /// Total number of features of a type, without transferring any.
    #[instrument(skip(self, schema), fields(type_name = %schema.qualified_type_name()))]
    pub async fn number_of_features(&self, schema: &FeatureTypeSchema) -> OgcResult<u64> {
        let url = schema.source_url()?;
        let payload = query::get_feature_payload(
            schema,
            &GetFeatureOptions {
                result_type: ResultType::Hits,
                ..Default::default()
            },
        );
        let root = self.transport.post(&url, payload).await?.into_document()?;
        gml::read_feature_collection_metadata(&root)
    }

    /// Features intersecting `extent`, read in the view projection.
    #[instrument(skip(self, schema, view), fields(type_name = %schema.qualified_type_name()))]
    pub async fn bbox_filter(
        &self,
        schema: &FeatureTypeSchema,
        view: &ViewContext,
        extent: &BoundingBox,
    ) -> OgcResult<Vec<Feature>> {
        let base = schema.source_url()?;
        let request =
            query::bbox_filter_url(&base, &schema.qualified_type_name(), extent, view.srs_name());
        let root = self.transport.get(&request).await?.into_document()?;
        gml::read_features(&root, &self.read_options(&view.projection).with_schema(schema))
    }

    /// First feature within a fixed distance of a map coordinate.
    ///
    /// `coordinate` is in the view projection. `Ok(None)` means the
    /// server matched nothing.
    #[instrument(skip(self, schema, view), fields(type_name = %schema.qualified_type_name()))]
    pub async fn distance_within(
        &self,
        schema: &FeatureTypeSchema,
        view: &ViewContext,
        coordinate: [f64; 2],
    ) -> OgcResult<Option<Feature>> {
        let lon_lat =
            self.registry
                .reproject(coordinate, &view.projection, &SpatialReference::wgs84())?;
        let base = schema.source_url()?;
        let request = query::distance_within_url(&base, schema, lon_lat, view.srs_name());
        let root = self.transport.get(&request).await?.into_document()?;
        let features =
            gml::read_features(&root, &self.read_options(&view.projection).with_schema(schema))?;
        Ok(features.into_iter().next())
    }

    /// Delete a feature by identity. Succeeds only when exactly one
    /// feature was deleted.
    #[instrument(skip(self, schema, feature), fields(type_name = %schema.qualified_type_name(), fid = ?feature.id))]
    pub async fn delete_feature(&self, schema: &FeatureTypeSchema, feature: &Feature) -> OgcResult<()> {
        let url = schema.source_url()?;
        let payload = transaction::delete_payload(schema, feature)?;
        let result = self.transact(&url, payload).await?;
        transaction::interpret_delete(&result)?;
        info!("Deleted feature");
        Ok(())
    }

    /// Update a feature, either from its own properties or from explicit
    /// replacement `values`. The geometry declares the view projection
    /// when a view is given.
    #[instrument(skip(self, schema, view, feature, values), fields(type_name = %schema.qualified_type_name(), fid = ?feature.id))]
    pub async fn update_feature(
        &self,
        schema: &FeatureTypeSchema,
        view: Option<&ViewContext>,
        feature: &Feature,
        values: Option<&Properties>,
    ) -> OgcResult<TransactionResult> {
        let url = schema.source_url()?;
        let payload = transaction::update_payload(schema, view, feature, values)?;
        let result = self.transact(&url, payload).await?;
        info!(updated = result.updated_count, "Updated feature");
        Ok(result)
    }

    /// Insert a new feature and return its server identity.
    #[instrument(skip(self, schema, view, feature), fields(type_name = %schema.qualified_type_name()))]
    pub async fn insert_feature(
        &self,
        schema: &FeatureTypeSchema,
        view: &ViewContext,
        feature: &Feature,
    ) -> OgcResult<String> {
        let url = schema.source_url()?;
        let payload = transaction::insert_payload(schema, view, feature);
        let result = self.transact(&url, payload).await?;
        let id = transaction::interpret_insert(&result)?;
        info!(fid = %id, "Inserted feature");
        Ok(id)
    }

    async fn transact(&self, url: &Url, payload: String) -> OgcResult<TransactionResult> {
        let root = self.transport.post(url, payload).await?.into_document()?;
        transaction::read_transaction_response(&root)
    }

    /// GeoJSON URL a bbox loading strategy requests for `extent`.
    pub fn bbox_strategy_url(
        &self,
        schema: &FeatureTypeSchema,
        extent: &BoundingBox,
        srs: &SpatialReference,
    ) -> OgcResult<Url> {
        Ok(query::bbox_strategy_url(
            &schema.source_url()?,
            &schema.qualified_type_name(),
            extent,
            &self.registry.code(srs),
        ))
    }
}
