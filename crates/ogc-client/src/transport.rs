//! HTTP transport abstraction.
//!
//! Transports only move bytes. They never interpret bodies, so an HTTP 500
//! carrying an exception report is still an `Ok` response here and the
//! classifier decides what it means.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use url::Url;

use ogc_common::{OgcError, OgcResult};
use ogc_protocol::{classify, XmlElement};

use crate::config::ClientConfig;

/// A response as received from the wire.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse and classify the body as an XML document.
    pub fn into_document(self) -> OgcResult<XmlElement> {
        classify(&self.text(), Some(self.status))
    }

    /// Pass 2xx responses through; otherwise fail with the exception
    /// report the body carries, or a transport failure.
    pub fn error_for_status(self) -> OgcResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let body = self.text();
        Err(match classify(&body, Some(self.status)) {
            Err(err) => err,
            Ok(_) => OgcError::TransportFailure {
                status: Some(self.status),
                message: "Unexpected HTTP status".to_string(),
                body: Some(body),
            },
        })
    }
}

/// GET/POST over some network stack.
///
/// Implementations return `Err` only for transport-level failures (DNS,
/// connection, timeout). Retries are left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> OgcResult<RawResponse>;

    /// POST an XML payload.
    async fn post(&self, url: &Url, body: String) -> OgcResult<RawResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> OgcResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OgcError::transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn read(url: &Url, response: reqwest::Response) -> OgcResult<RawResponse> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| request_failed(url, e).with_status(status))?;

        debug!(url = %url, status, content_type = ?content_type, bytes = body.len(), "Received response");
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

fn request_failed(url: &Url, err: reqwest::Error) -> OgcError {
    OgcError::TransportFailure {
        status: err.status().map(|s| s.as_u16()),
        message: format!("Request to {} failed: {}", url, err),
        body: None,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> OgcResult<RawResponse> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| request_failed(url, e))?;
        Self::read(url, response).await
    }

    async fn post(&self, url: &Url, body: String) -> OgcResult<RawResponse> {
        debug!(url = %url, bytes = body.len(), "POST");
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| request_failed(url, e))?;
        Self::read(url, response).await
    }
}
