//! Layer descriptors and the capability layer tree.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// A layer as advertised in a capabilities document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Layer name; namespace-qualified (`prefix:local`) for WFS.
    /// Unnamed WMS group layers have an empty name.
    pub name: String,

    /// Human-readable title. `None` marks an untitled helper layer; an
    /// empty title still counts as a title.
    pub title: Option<String>,

    /// Optional description/abstract
    pub abstract_text: Option<String>,

    pub keywords: Vec<String>,

    /// Geographic bounding box in WGS84 `[west, south, east, north]`
    pub geographic_bbox: Option<BoundingBox>,

    /// Styles declared on the layer
    pub styles: Vec<StyleRef>,

    /// Legend graphic, present only when the layer declares exactly one style
    pub legend_url: Option<String>,

    /// Time dimension values (if applicable)
    pub time_info: Option<TimeInfo>,

    pub queryable: bool,
}

impl LayerDescriptor {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// A layer without a title, such as a sketch or highlight overlay.
    pub fn untitled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    /// Split a qualified name like "topp:states" into prefix and local part.
    pub fn split_name(&self) -> (Option<&str>, &str) {
        match self.name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, &self.name),
        }
    }

    /// Legend URL of the only style, if the layer has exactly one.
    pub fn single_style_legend(styles: &[StyleRef]) -> Option<String> {
        match styles {
            [style] => style.legend_urls.first().cloned(),
            _ => None,
        }
    }
}

/// Reference to a named style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRef {
    /// Style name (used in GetMap requests)
    pub name: String,

    /// Human-readable title
    pub title: Option<String>,

    /// LegendURL online resources, in document order
    pub legend_urls: Vec<String>,
}

/// Values of a layer's time dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeInfo {
    /// Individual instants or `start/end/period` intervals, as advertised.
    pub values: Vec<String>,
    pub default: Option<String>,
}

impl TimeInfo {
    /// Parse a comma-separated dimension value list.
    pub fn parse(values: &str, default: Option<String>) -> Option<Self> {
        let values: Vec<String> = values
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(Self { values, default })
    }
}

/// Node of a capability layer tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerNode {
    Leaf(LayerDescriptor),
    Group {
        layer: LayerDescriptor,
        children: Vec<LayerNode>,
    },
}

impl LayerNode {
    /// The descriptor of this node, leaf or group.
    pub fn layer(&self) -> &LayerDescriptor {
        match self {
            LayerNode::Leaf(layer) | LayerNode::Group { layer, .. } => layer,
        }
    }

    /// Group layers are offered as base layers.
    pub fn is_base_group(&self) -> bool {
        matches!(self, LayerNode::Group { .. })
    }

    pub fn children(&self) -> &[LayerNode] {
        match self {
            LayerNode::Leaf(_) => &[],
            LayerNode::Group { children, .. } => children,
        }
    }

    /// Depth-first pre-order walk over every node.
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a LayerNode),
    {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// All leaf layers below (or at) this node, in document order.
    pub fn flatten(&self) -> Vec<&LayerDescriptor> {
        let mut leaves = Vec::new();
        self.visit(&mut |node| {
            if let LayerNode::Leaf(layer) = node {
                leaves.push(layer);
            }
        });
        leaves
    }

    /// Find the unique node whose layer name equals `name`.
    ///
    /// Returns `None` when the name is missing or ambiguous.
    pub fn find(&self, name: &str) -> Option<&LayerNode> {
        find_unique(std::slice::from_ref(self), name)
    }
}

/// The only node named `name` anywhere in a forest, or `None` when the
/// name is missing or appears more than once.
pub fn find_unique<'a>(nodes: &'a [LayerNode], name: &str) -> Option<&'a LayerNode> {
    let mut found = Vec::new();
    for node in nodes {
        node.visit(&mut |node| {
            if node.layer().name == name {
                found.push(node);
            }
        });
    }
    match found.as_slice() {
        [node] => Some(*node),
        _ => None,
    }
}

/// Walk a forest of nodes.
pub fn flatten_all(nodes: &[LayerNode]) -> Vec<&LayerDescriptor> {
    nodes.iter().flat_map(|node| node.flatten()).collect()
}
