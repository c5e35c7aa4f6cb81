//! WMS service client.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use url::Url;

use ogc_common::{
    OgcResult, Protocol, ServiceDescriptor, SpatialReferenceRegistry, StandardRegistry,
    ViewContext,
};
use ogc_protocol::getfeatureinfo::parse_feature_info;
use ogc_protocol::query;
use ogc_protocol::{
    classify, parse_capabilities, Capabilities, FeatureInfoResult, FeatureInfoSource, InfoFormat,
    ReadOptions,
};

use crate::transport::Transport;

/// Client for WMS 1.3.0 servers (GetStyles is 1.1.1).
pub struct WmsClient<T> {
    transport: T,
    registry: Arc<dyn SpatialReferenceRegistry>,
}

impl<T: Transport> WmsClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            registry: Arc::new(StandardRegistry),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn SpatialReferenceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the capabilities layer tree.
    #[instrument(skip(self))]
    pub async fn get_capabilities(&self, url: &str) -> OgcResult<Capabilities> {
        let service = ServiceDescriptor::with_default_version(url, Protocol::Wms)?;
        let request = query::capabilities_url(&service);
        let root = self.transport.get(&request).await?.into_document()?;
        let capabilities = parse_capabilities(&root)?;
        info!(
            named_layers = capabilities.named_layers().len(),
            "Loaded WMS capabilities"
        );
        Ok(capabilities)
    }

    /// Raw SLD document of a layer's styles.
    #[instrument(skip(self))]
    pub async fn get_styles(&self, url: &str, layer: &str) -> OgcResult<String> {
        let request = query::get_styles_url(&query::endpoint(url)?, layer);
        let response = self.transport.get(&request).await?;
        let body = response.text();
        classify(&body, Some(response.status))?;
        Ok(body)
    }

    /// Query the features under a map coordinate.
    ///
    /// `source` builds the request for the view's resolution and
    /// projection; features are read in the view projection.
    #[instrument(skip(self, source, view))]
    pub async fn get_feature_info(
        &self,
        source: &dyn FeatureInfoSource,
        coordinate: [f64; 2],
        view: &ViewContext,
        info_format: InfoFormat,
    ) -> OgcResult<FeatureInfoResult> {
        let request =
            source.feature_info_url(coordinate, view.resolution, &view.projection, info_format)?;
        let response = self.transport.get(&request).await?.error_for_status()?;
        let options = ReadOptions::new(&view.projection).with_registry(self.registry.as_ref());
        let result = parse_feature_info(&response.text(), info_format, &options)?;
        debug!(empty = matches!(result, FeatureInfoResult::Empty), "GetFeatureInfo answered");
        Ok(result)
    }

    /// GetLegendGraphic URL for a layer.
    pub fn legend_url(&self, url: &str, layer: &str) -> OgcResult<Url> {
        Ok(query::legend_graphic_url(&query::endpoint(url)?, layer))
    }
}
