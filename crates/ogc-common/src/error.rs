//! Error types for the OGC client service layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bbox::BboxParseError;
use crate::crs::CrsParseError;

/// Result type alias using OgcError.
pub type OgcResult<T> = Result<T, OgcError>;

/// Primary error type for WMS/WFS operations.
///
/// Every failure is scoped to the call that produced it.
#[derive(Debug, Clone, Error)]
pub enum OgcError {
    // === Request construction ===
    #[error("Invalid service endpoint '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("Invalid spatial reference: {0}")]
    InvalidSpatialReference(#[from] CrsParseError),

    // === Transport ===
    #[error("Transport failure{}: {message}", fmt_status(.status))]
    TransportFailure {
        status: Option<u16>,
        message: String,
        /// Raw response body, when one was received.
        body: Option<String>,
    },

    // === Service responses ===
    #[error("Service exception: {text}")]
    ServiceException {
        status: Option<u16>,
        code: Option<String>,
        text: String,
    },

    #[error("DescribeFeatureType failed: {0}")]
    DescribeFeatureTypeFailed(String),

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" (HTTP {})", s))
        .unwrap_or_default()
}

/// Coarse failure classification, independent of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    InvalidEndpoint,
    InvalidSpatialReference,
    TransportFailure,
    ServiceException,
    DescribeFeatureTypeFailed,
    TransactionRejected,
    InvalidDocument,
}

impl OgcError {
    pub fn invalid_endpoint(url: impl Into<String>, message: impl ToString) -> Self {
        OgcError::InvalidEndpoint {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        OgcError::TransportFailure {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    pub fn invalid_document(message: impl Into<String>) -> Self {
        OgcError::InvalidDocument(message.into())
    }

    /// Get the failure kind for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            OgcError::InvalidEndpoint { .. } => FailureKind::InvalidEndpoint,
            OgcError::InvalidSpatialReference(_) => FailureKind::InvalidSpatialReference,
            OgcError::TransportFailure { .. } => FailureKind::TransportFailure,
            OgcError::ServiceException { .. } => FailureKind::ServiceException,
            OgcError::DescribeFeatureTypeFailed(_) => FailureKind::DescribeFeatureTypeFailed,
            OgcError::TransactionRejected(_) => FailureKind::TransactionRejected,
            OgcError::InvalidDocument(_) => FailureKind::InvalidDocument,
        }
    }

    /// HTTP status of the response that produced this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            OgcError::TransportFailure { status, .. } | OgcError::ServiceException { status, .. } => {
                *status
            }
            _ => None,
        }
    }

    /// Server-supplied exception text, if any.
    pub fn exception_text(&self) -> Option<&str> {
        match self {
            OgcError::ServiceException { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Attach an HTTP status to transport and service failures.
    pub fn with_status(self, http_status: u16) -> Self {
        match self {
            OgcError::TransportFailure { message, body, .. } => OgcError::TransportFailure {
                status: Some(http_status),
                message,
                body,
            },
            OgcError::ServiceException { code, text, .. } => OgcError::ServiceException {
                status: Some(http_status),
                code,
                text,
            },
            other => other,
        }
    }
}

impl From<BboxParseError> for OgcError {
    fn from(err: BboxParseError) -> Self {
        OgcError::InvalidDocument(err.to_string())
    }
}

impl From<serde_json::Error> for OgcError {
    fn from(err: serde_json::Error) -> Self {
        OgcError::InvalidDocument(format!("JSON error: {}", err))
    }
}

/// Plain-data view of a failure, handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFailure {
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_text: Option<String>,
    pub message: String,
}

impl From<&OgcError> for ServiceFailure {
    fn from(err: &OgcError) -> Self {
        ServiceFailure {
            kind: err.kind(),
            http_status: err.http_status(),
            exception_text: err.exception_text().map(str::to_string),
            message: err.to_string(),
        }
    }
}
