//! Console and JSON rendering of probe results.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;
use serde_json::Value;

use ogc_common::{Feature, FeatureTypeSchema, LayerNode};
use ogc_protocol::{Capabilities, FeatureInfoResult};

/// Formats probe results for output.
pub struct Report;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl Report {
    /// One row per layer, indented by depth in the layer tree.
    pub fn capabilities_table(capabilities: &Capabilities) -> String {
        let mut table = table(vec!["Layer", "Title", "Kind", "Queryable", "BBox", "Legend"]);

        fn add_rows(table: &mut Table, node: &LayerNode, depth: usize) {
            let layer = node.layer();
            let kind = if node.is_base_group() { "group" } else { "layer" };
            let bbox = layer
                .geographic_bbox
                .map(|b| {
                    let [w, s, e, n] = b.to_extent();
                    format!("{:.2}, {:.2}, {:.2}, {:.2}", w, s, e, n)
                })
                .unwrap_or_default();
            table.add_row(vec![
                format!("{}{}", "  ".repeat(depth), layer.name),
                layer.title.clone().unwrap_or_default(),
                kind.to_string(),
                if layer.queryable { "yes" } else { "no" }.to_string(),
                bbox,
                if layer.legend_url.is_some() { "yes" } else { "" }.to_string(),
            ]);
            for child in node.children() {
                add_rows(table, child, depth + 1);
            }
        }

        for node in &capabilities.layers {
            add_rows(&mut table, node, 0);
        }
        format!("{}\n{}", capabilities.title, table)
    }

    pub fn schema_table(schema: &FeatureTypeSchema) -> String {
        let mut table = table(vec!["Property", "Value"]);
        table.add_row(vec!["Type name", &schema.qualified_type_name()]);
        table.add_row(vec!["Namespace", &schema.feature_namespace]);
        table.add_row(vec![
            "Geometry",
            &format!("{} ({})", schema.geometry_name, schema.geometry_type),
        ]);
        table.add_row(vec!["Attributes", &schema.attributes.join(", ")]);
        table.add_row(vec!["Endpoint", &schema.source_url]);
        table.to_string()
    }

    /// Features as rows, with `attributes` as columns after the id and
    /// geometry kind.
    pub fn features_table(features: &[Feature], attributes: &[String]) -> String {
        let mut header = vec!["id", "geometry"];
        header.extend(attributes.iter().map(String::as_str));
        let mut table = table(header);

        for feature in features {
            let mut row = vec![
                feature.id.clone().unwrap_or_default(),
                feature
                    .geometry
                    .as_ref()
                    .map(|g| g.kind().to_string())
                    .unwrap_or_default(),
            ];
            row.extend(attributes.iter().map(|a| cell(feature.property(a))));
            table.add_row(row);
        }
        table.to_string()
    }

    pub fn feature_info(result: &FeatureInfoResult) -> String {
        match result {
            FeatureInfoResult::Empty => "No features found".to_string(),
            FeatureInfoResult::Text(text) => text.clone(),
            FeatureInfoResult::Features(features) => {
                let mut attributes: Vec<String> = features
                    .iter()
                    .flat_map(|f| f.properties.keys().cloned())
                    .collect();
                attributes.sort();
                attributes.dedup();
                Self::features_table(features, &attributes)
            }
        }
    }

    /// Format any result as pretty JSON.
    pub fn format_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}
