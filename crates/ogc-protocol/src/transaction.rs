//! WFS-T payloads and transaction response interpretation.
//!
//! Each payload carries exactly one operation kind against one feature
//! type. Response checks are strict for deletes (exactly one feature) and
//! inserts (at least one identity); updates accept any summary.

use serde::{Deserialize, Serialize};

use ogc_common::{Feature, FeatureTypeSchema, Geometry, OgcError, OgcResult, Properties, ViewContext};

use crate::gml::{property_text, write_feature, write_geometry};
use crate::query::WFS_VERSION;
use crate::xml::{escape, XmlElement, GML_NS, OGC_NS, WFS_NS, XSI_NS};

const WFS_SCHEMA_LOCATION: &str =
    "http://www.opengis.net/wfs http://schemas.opengis.net/wfs/1.1.0/wfs.xsd";

/// Summary of a transaction response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub inserted_ids: Vec<String>,
    pub inserted_count: u64,
    pub updated_count: u64,
    pub deleted_count: u64,
}

fn open_transaction() -> String {
    format!(
        "<wfs:Transaction xmlns:wfs=\"{}\" xmlns:gml=\"{}\" xmlns:ogc=\"{}\" xmlns:xsi=\"{}\" \
         service=\"WFS\" version=\"{}\" xsi:schemaLocation=\"{}\">",
        WFS_NS, GML_NS, OGC_NS, XSI_NS, WFS_VERSION, WFS_SCHEMA_LOCATION
    )
}

const CLOSE_TRANSACTION: &str = "</wfs:Transaction>";

/// `typeName="prefix:type" xmlns:prefix="ns"` for an operation element.
fn type_name_attributes(schema: &FeatureTypeSchema) -> String {
    let mut attrs = format!(" typeName=\"{}\"", escape(&schema.qualified_type_name()));
    if !schema.feature_prefix.is_empty() {
        attrs.push_str(&format!(
            " xmlns:{}=\"{}\"",
            schema.feature_prefix,
            escape(&schema.feature_namespace)
        ));
    }
    attrs
}

fn id_filter(out: &mut String, id: &str) {
    out.push_str(&format!(
        "<ogc:Filter><ogc:FeatureId fid=\"{}\"/></ogc:Filter>",
        escape(id)
    ));
}

fn require_id(feature: &Feature) -> OgcResult<&str> {
    feature
        .id
        .as_deref()
        .ok_or_else(|| OgcError::TransactionRejected("Feature has no server identity".to_string()))
}

/// Delete one feature by identity. No properties are sent.
pub fn delete_payload(schema: &FeatureTypeSchema, feature: &Feature) -> OgcResult<String> {
    let id = require_id(feature)?;
    let mut xml = open_transaction();
    xml.push_str(&format!("<wfs:Delete{}>", type_name_attributes(schema)));
    id_filter(&mut xml, id);
    xml.push_str("</wfs:Delete>");
    xml.push_str(CLOSE_TRANSACTION);
    Ok(xml)
}

/// The feature an update sends.
///
/// With explicit `values` a fresh feature is built from them. Otherwise
/// the existing feature is cloned without `boundedBy`/`bbox`, and its
/// geometry moves to the schema's geometry attribute. The identity is
/// always kept.
pub fn update_feature_clone(
    schema: &FeatureTypeSchema,
    feature: &Feature,
    values: Option<&Properties>,
) -> Feature {
    let mut clone = match values {
        Some(values) => {
            let mut fresh = Feature::from_properties(values.clone());
            if let Some(geometry) = fresh
                .properties
                .get(&schema.geometry_name)
                .and_then(|v| serde_json::from_value::<Geometry>(v.clone()).ok())
            {
                fresh.properties.remove(&schema.geometry_name);
                fresh.geometry_name = schema.geometry_name.clone();
                fresh.geometry = Some(geometry);
            }
            fresh
        }
        None => {
            let mut clone = feature.clone();
            clone.strip_non_semantic();
            if !schema.geometry_name.is_empty() && schema.geometry_name != clone.geometry_name {
                clone.properties.remove(&clone.geometry_name);
                clone.geometry_name = schema.geometry_name.clone();
            }
            clone
        }
    };
    clone.id = feature.id.clone();
    clone
}

/// Update one feature. The geometry carries `srsName` only when a view is given.
pub fn update_payload(
    schema: &FeatureTypeSchema,
    view: Option<&ViewContext>,
    feature: &Feature,
    values: Option<&Properties>,
) -> OgcResult<String> {
    let clone = update_feature_clone(schema, feature, values);
    let id = require_id(&clone)?;
    let srs = view.map(|v| &v.projection);

    let mut xml = open_transaction();
    xml.push_str(&format!("<wfs:Update{}>", type_name_attributes(schema)));

    if let Some(geometry) = &clone.geometry {
        xml.push_str(&format!(
            "<wfs:Property><wfs:Name>{}</wfs:Name><wfs:Value>",
            escape(&clone.geometry_name)
        ));
        write_geometry(&mut xml, geometry, srs);
        xml.push_str("</wfs:Value></wfs:Property>");
    }

    for (name, value) in &clone.properties {
        xml.push_str(&format!("<wfs:Property><wfs:Name>{}</wfs:Name>", escape(name)));
        if let Some(text) = property_text(value) {
            xml.push_str(&format!("<wfs:Value>{}</wfs:Value>", escape(&text)));
        }
        xml.push_str("</wfs:Property>");
    }

    id_filter(&mut xml, id);
    xml.push_str("</wfs:Update>");
    xml.push_str(CLOSE_TRANSACTION);
    Ok(xml)
}

/// Insert one feature, declaring the view projection on its geometry.
pub fn insert_payload(schema: &FeatureTypeSchema, view: &ViewContext, feature: &Feature) -> String {
    let mut xml = open_transaction();
    xml.push_str("<wfs:Insert>");

    write_feature(
        &mut xml,
        &schema.feature_prefix,
        Some(schema.feature_namespace.as_str()).filter(|ns| !ns.is_empty()),
        &schema.feature_type,
        feature,
        Some(&view.projection),
    );

    xml.push_str("</wfs:Insert>");
    xml.push_str(CLOSE_TRANSACTION);
    xml
}

/// Read a WFS 1.1.0 `TransactionResponse` or WFS 1.0.0 `WFS_TransactionResponse`.
pub fn read_transaction_response(root: &XmlElement) -> OgcResult<TransactionResult> {
    match root.local_name() {
        "TransactionResponse" => Ok(read_wfs_1_1(root)),
        "WFS_TransactionResponse" => read_wfs_1_0(root),
        other => Err(OgcError::invalid_document(format!(
            "Not a transaction response: <{}>",
            other
        ))),
    }
}

fn count(summary: Option<&XmlElement>, name: &str) -> Option<u64> {
    summary?.child_text(name)?.parse().ok()
}

fn feature_ids<'a>(elements: impl Iterator<Item = &'a XmlElement>) -> Vec<String> {
    elements
        .flat_map(|e| {
            let mut ids = Vec::new();
            if e.is("FeatureId") {
                ids.extend(e.attr("fid").map(str::to_string));
            }
            if let Some(found) = e.find(|c| c.is("FeatureId")) {
                ids.extend(found.attr("fid").map(str::to_string));
            }
            ids
        })
        .collect()
}

fn read_wfs_1_1(root: &XmlElement) -> TransactionResult {
    let summary = root.child("TransactionSummary");
    let inserted_ids = root
        .child("InsertResults")
        .map(|results| feature_ids(results.children_named("Feature")))
        .unwrap_or_default();

    TransactionResult {
        inserted_count: count(summary, "totalInserted").unwrap_or(inserted_ids.len() as u64),
        updated_count: count(summary, "totalUpdated").unwrap_or(0),
        deleted_count: count(summary, "totalDeleted").unwrap_or(0),
        inserted_ids,
    }
}

fn read_wfs_1_0(root: &XmlElement) -> OgcResult<TransactionResult> {
    if let Some(result) = root.child("TransactionResult") {
        let failed = result
            .child("Status")
            .is_some_and(|status| status.child("FAILED").is_some());
        if failed {
            let message = result
                .child_text("Message")
                .filter(|m| !m.is_empty())
                .unwrap_or("Transaction failed");
            return Err(OgcError::TransactionRejected(message.to_string()));
        }
    }

    let mut inserted_ids = Vec::new();
    for insert in root.children_named("InsertResult") {
        inserted_ids.extend(feature_ids(insert.children().iter()));
    }
    Ok(TransactionResult {
        inserted_count: inserted_ids.len() as u64,
        inserted_ids,
        ..Default::default()
    })
}

/// A delete succeeds only when exactly one feature was deleted.
pub fn interpret_delete(result: &TransactionResult) -> OgcResult<()> {
    if result.deleted_count == 1 {
        Ok(())
    } else {
        Err(OgcError::TransactionRejected(format!(
            "Expected 1 deleted feature, server reported {}",
            result.deleted_count
        )))
    }
}

/// An insert succeeds with the first returned identity.
pub fn interpret_insert(result: &TransactionResult) -> OgcResult<String> {
    result
        .inserted_ids
        .first()
        .cloned()
        .ok_or_else(|| OgcError::TransactionRejected("No inserted feature identity returned".to_string()))
}
