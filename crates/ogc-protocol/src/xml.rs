//! Namespace-aware element tree built from quick-xml events.
//!
//! OGC documents are small enough to hold in memory, and the parsers need
//! random access (first style, nested layers, qualified type names), so the
//! reader materializes a light tree instead of streaming.

use std::collections::BTreeMap;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use ogc_common::OgcError;

pub const GML_NS: &str = "http://www.opengis.net/gml";
pub const OWS_NS: &str = "http://www.opengis.net/ows";
pub const OGC_NS: &str = "http://www.opengis.net/ogc";
pub const WFS_NS: &str = "http://www.opengis.net/wfs";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

type Scope = Arc<BTreeMap<String, String>>;

/// A parsed element with its resolved namespace and in-scope prefixes.
#[derive(Debug, Clone)]
pub struct XmlElement {
    local_name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    scope: Scope,
    children: Vec<XmlElement>,
    text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML parsing error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Document has no root element")]
    Empty,

    #[error("Document ended inside <{0}>")]
    Unterminated(String),
}

impl From<XmlError> for OgcError {
    fn from(err: XmlError) -> Self {
        OgcError::transport(format!("Unparseable response: {}", err))
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(xml: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let syntax = |reader: &Reader<&[u8]>, e: quick_xml::Error| XmlError::Syntax {
            position: reader.buffer_position(),
            message: e.to_string(),
        };

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let element = open_element(&e, stack.last().map(|p| &p.scope))
                    .map_err(|err| syntax(&reader, err))?;
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = open_element(&e, stack.last().map(|p| &p.scope))
                    .map_err(|err| syntax(&reader, err))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    let text = t.unescape().map_err(|err| syntax(&reader, err))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(syntax(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unterminated(open.local_name));
    }
    root.ok_or(XmlError::Empty)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn open_element(e: &BytesStart<'_>, parent: Option<&Scope>) -> Result<XmlElement, quick_xml::Error> {
    let mut attributes = Vec::new();
    let mut declared = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            declared.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_string(), value));
        } else {
            attributes.push((key, value));
        }
    }

    let scope = match (parent, declared.is_empty()) {
        (Some(scope), true) => Arc::clone(scope),
        (parent, _) => {
            let mut map = parent.map(|s| (**s).clone()).unwrap_or_default();
            map.extend(declared);
            Arc::new(map)
        }
    };

    let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let (prefix, local_name) = split_qname(&qname);
    let namespace = scope.get(prefix.unwrap_or("")).cloned();

    Ok(XmlElement {
        local_name: local_name.to_string(),
        namespace,
        attributes,
        scope,
        children: Vec::new(),
        text: String::new(),
    })
}

fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

impl XmlElement {
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespace starts with `ns` (so `OWS_NS` also matches OWS 1.1).
    pub fn in_namespace(&self, ns: &str) -> bool {
        self.namespace.as_deref().is_some_and(|n| n.starts_with(ns))
    }

    pub fn is(&self, local_name: &str) -> bool {
        self.local_name == local_name
    }

    /// Trimmed direct text content.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Text of this element and all descendants, in document order.
    pub fn deep_text(&self) -> String {
        let mut out = self.text().to_string();
        for child in &self.children {
            let text = child.deep_text();
            if !text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&text);
            }
        }
        out
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(local_name))
    }

    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.is(local_name))
    }

    /// Trimmed text of the first child with the given local name.
    pub fn child_text(&self, local_name: &str) -> Option<&str> {
        self.child(local_name).map(XmlElement::text)
    }

    /// First descendant (depth-first, excluding self) matching the predicate.
    pub fn find<P>(&self, predicate: P) -> Option<&XmlElement>
    where
        P: Fn(&XmlElement) -> bool + Copy,
    {
        for child in &self.children {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find(predicate) {
                return Some(found);
            }
        }
        None
    }

    /// Attribute by local name, ignoring any prefix (`href` matches `xlink:href`).
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| split_qname(key).1 == local_name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute whose prefix resolves to `ns`.
    pub fn attr_ns(&self, ns: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| match split_qname(key) {
                (Some(prefix), local) => {
                    local == local_name && self.scope.get(prefix).is_some_and(|n| n == ns)
                }
                _ => false,
            })
            .map(|(_, value)| value.as_str())
    }

    /// Resolve a qualified name such as `gml:PointPropertyType` against
    /// the prefixes in scope on this element.
    pub fn resolve_qname<'a>(&'a self, qname: &'a str) -> (Option<&'a str>, &'a str) {
        let (prefix, local) = split_qname(qname);
        let namespace = self.scope.get(prefix.unwrap_or("")).map(String::as_str);
        (namespace, local)
    }
}

/// Escape text for element content and attribute values.
pub fn escape(text: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_resolve_through_scope() {
        let xml = r#"<root xmlns="urn:default" xmlns:gml="http://www.opengis.net/gml">
            <gml:Point srsName="EPSG:4326"><gml:pos>1 2</gml:pos></gml:Point>
            <plain type="gml:PointPropertyType"/>
        </root>"#;
        let root = parse_document(xml).unwrap();
        assert_eq!(root.namespace(), Some("urn:default"));

        let point = root.child("Point").unwrap();
        assert!(point.in_namespace(GML_NS));
        assert_eq!(point.attr("srsName"), Some("EPSG:4326"));
        assert_eq!(point.child_text("pos"), Some("1 2"));

        let plain = root.child("plain").unwrap();
        let (ns, local) = plain.resolve_qname(plain.attr("type").unwrap());
        assert_eq!(ns, Some(GML_NS));
        assert_eq!(local, "PointPropertyType");
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = parse_document("<a><b>x &amp; y</b><c><![CDATA[<raw>]]></c></a>").unwrap();
        assert_eq!(root.child_text("b"), Some("x & y"));
        assert_eq!(root.child_text("c"), Some("<raw>"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_document("not xml at all").is_err());
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a><b>").is_err());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
