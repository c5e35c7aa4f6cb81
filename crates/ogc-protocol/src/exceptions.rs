//! Response classification.
//!
//! Every flow that reads an XML response (capabilities, describe, hits,
//! transactions) goes through [`classify`], so exception reports are
//! detected the same way everywhere.

use ogc_common::{OgcError, OgcResult};
use tracing::debug;

use crate::xml::{parse_document, XmlElement, OWS_NS};

/// Text reported when an exception report carries no readable message.
const UNKNOWN_EXCEPTION: &str = "Unknown service exception";

/// Outcome of inspecting a response body.
#[derive(Debug)]
pub enum Classified {
    /// A parseable payload that is not an exception report.
    Success(XmlElement),
    /// The server returned an exception report.
    Exception { code: Option<String>, text: String },
}

/// Parse `body` and classify it.
///
/// `status` is the HTTP status, if the body came from a transport. A
/// non-2xx status with a body that is not an exception report is a
/// transport failure.
pub fn classify(body: &str, status: Option<u16>) -> OgcResult<XmlElement> {
    let root = match parse_document(body) {
        Ok(root) => root,
        Err(e) => {
            debug!(error = %e, "Response body is not XML");
            return Err(OgcError::TransportFailure {
                status,
                message: format!("Unparseable response: {}", e),
                body: Some(body.to_string()),
            });
        }
    };

    match inspect(root) {
        Classified::Exception { code, text } => Err(OgcError::ServiceException { status, code, text }),
        Classified::Success(_) if status.is_some_and(|s| !(200..300).contains(&s)) => {
            Err(OgcError::TransportFailure {
                status,
                message: "Unexpected HTTP status".to_string(),
                body: Some(body.to_string()),
            })
        }
        Classified::Success(root) => Ok(root),
    }
}

/// Classify a body expected to be JSON.
///
/// Servers answer JSON requests with an XML exception report on failure,
/// so a body starting with `<` is run through [`classify`] first.
pub fn classify_json(body: &str, status: Option<u16>) -> OgcResult<serde_json::Value> {
    if body.trim_start().starts_with('<') {
        classify(body, status)?;
        return Err(OgcError::invalid_document("Expected JSON, received XML"));
    }
    if let Some(s) = status.filter(|s| !(200..300).contains(s)) {
        return Err(OgcError::TransportFailure {
            status: Some(s),
            message: "Unexpected HTTP status".to_string(),
            body: Some(body.to_string()),
        });
    }
    serde_json::from_str(body).map_err(|e| OgcError::TransportFailure {
        status,
        message: format!("Unparseable response: {}", e),
        body: Some(body.to_string()),
    })
}

/// Decide whether a parsed root element is an exception report.
pub fn inspect(root: XmlElement) -> Classified {
    if root.is("ExceptionReport") {
        let exception = root.child("Exception");
        let text = root
            .find(|e| e.is("ExceptionText") && e.in_namespace(OWS_NS))
            .or_else(|| root.find(|e| e.is("ExceptionText")))
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_EXCEPTION)
            .to_string();
        let code = exception
            .and_then(|e| e.attr("exceptionCode"))
            .map(str::to_string);
        return Classified::Exception { code, text };
    }

    if root.is("ServiceExceptionReport") {
        let exception = root.child("ServiceException");
        let text = exception
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_EXCEPTION)
            .to_string();
        let code = exception.and_then(|e| e.attr("code")).map(str::to_string);
        return Classified::Exception { code, text };
    }

    Classified::Success(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogc_common::FailureKind;

    const OWS_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows" version="1.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="typeName">
    <ows:ExceptionText>Feature type topp:nope unknown</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;

    #[test]
    fn test_ows_exception_report() {
        let err = classify(OWS_REPORT, Some(200)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ServiceException);
        assert_eq!(err.exception_text(), Some("Feature type topp:nope unknown"));
        assert_eq!(err.http_status(), Some(200));
        match err {
            OgcError::ServiceException { code, .. } => {
                assert_eq!(code.as_deref(), Some("InvalidParameterValue"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_service_exception_report() {
        let body = r#"<ServiceExceptionReport version="1.1.1">
            <ServiceException code="LayerNotDefined">Could not find layer foo</ServiceException>
        </ServiceExceptionReport>"#;
        let err = classify(body, None).unwrap_err();
        assert_eq!(err.exception_text(), Some("Could not find layer foo"));
    }

    #[test]
    fn test_empty_exception_text_is_never_empty() {
        let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1">
            <ows:Exception exceptionCode="NoApplicableCode"/>
        </ows:ExceptionReport>"#;
        let err = classify(body, None).unwrap_err();
        assert!(!err.exception_text().unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_body_is_transport_failure() {
        let err = classify("<html><body>Bad gateway", Some(502)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::TransportFailure);
        assert_eq!(err.http_status(), Some(502));
        match err {
            OgcError::TransportFailure { body, .. } => assert!(body.is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_status_with_payload_is_transport_failure() {
        let err = classify("<ok/>", Some(500)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::TransportFailure);
    }

    #[test]
    fn test_success_passes_root_through() {
        let root = classify("<wfs:WFS_Capabilities xmlns:wfs=\"http://www.opengis.net/wfs\"/>", Some(200))
            .unwrap();
        assert!(root.is("WFS_Capabilities"));
    }

    #[test]
    fn test_classify_json() {
        let value = classify_json(r#"{"type":"FeatureCollection","features":[]}"#, Some(200)).unwrap();
        assert_eq!(value["type"], "FeatureCollection");

        let err = classify_json(OWS_REPORT, Some(200)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ServiceException);

        let err = classify_json("{not json", Some(200)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::TransportFailure);
    }
}
