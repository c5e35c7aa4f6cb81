//! In-memory transport shared by the client tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use ogc_client::{RawResponse, Transport};
use ogc_common::{AttributeKind, FeatureTypeSchema, OgcError, OgcResult};
use test_utils::fixtures::endpoints;

/// A request the transport received.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Get(Url),
    Post(Url, String),
}

impl Recorded {
    pub fn url(&self) -> &Url {
        match self {
            Recorded::Get(url) | Recorded::Post(url, _) => url,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Recorded::Get(_) => None,
            Recorded::Post(_, body) => Some(body),
        }
    }

    /// Decoded value of a query parameter.
    pub fn param(&self, key: &str) -> Option<String> {
        self.url()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// Answers requests from a queue and records them.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<Recorded>>,
    responses: Mutex<VecDeque<OgcResult<RawResponse>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body.into())));
        self
    }

    pub fn fail(self, err: OgcError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }

    fn answer(&self, request: Recorded) -> OgcResult<RawResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OgcError::transport("no response queued")))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, url: &Url) -> OgcResult<RawResponse> {
        self.answer(Recorded::Get(url.clone()))
    }

    async fn post(&self, url: &Url, body: String) -> OgcResult<RawResponse> {
        self.answer(Recorded::Post(url.clone(), body))
    }
}

/// Schema of the `topp:states` fixture type.
pub fn states_schema() -> FeatureTypeSchema {
    FeatureTypeSchema {
        feature_namespace: endpoints::TOPP_NS.to_string(),
        feature_prefix: "topp".to_string(),
        feature_type: "states".to_string(),
        geometry_name: "the_geom".to_string(),
        geometry_type: "MultiPolygon".to_string(),
        attributes: vec!["PERSONS".to_string(), "STATE_NAME".to_string()],
        source_url: endpoints::WFS.to_string(),
        attribute_kinds: [
            ("PERSONS".to_string(), AttributeKind::Integer),
            ("STATE_NAME".to_string(), AttributeKind::Text),
        ]
        .into_iter()
        .collect(),
    }
}
