//! Observable layer list.
//!
//! Layers are kept bottom to top: index 0 is drawn first. Groups hold
//! their own ordered children and moves never cross a group boundary.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use ogc_common::{LayerDescriptor, LayerNode};

const EVENT_CAPACITY: usize = 64;

/// Notification sent to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The layer list or one of its layers changed.
    Changed,
    /// A layer source failed to load, e.g. a tile load error.
    Error(String),
}

/// Ordered layer tree with change notifications.
#[derive(Debug)]
pub struct LayerStore {
    layers: Vec<LayerNode>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            layers: Vec::new(),
            events,
        }
    }

    /// Replace the whole layer list.
    pub fn with_layers(mut self, layers: Vec<LayerNode>) -> Self {
        self.layers = layers;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Top-level nodes, bottom to top.
    pub fn layers(&self) -> &[LayerNode] {
        &self.layers
    }

    /// Every leaf layer in drawing order.
    pub fn flatten(&self) -> Vec<&LayerDescriptor> {
        ogc_common::layer::flatten_all(&self.layers)
    }

    /// The unique node named `id`, at any depth.
    pub fn find(&self, id: &str) -> Option<&LayerNode> {
        ogc_common::layer::find_unique(&self.layers, id)
    }

    /// Add a layer on top of the map.
    pub fn add(&mut self, node: LayerNode) {
        debug!(layer = %node.layer().name, "Adding layer");
        self.layers.push(node);
        self.emit(StoreEvent::Changed);
    }

    /// Remove the node named `id` from wherever it lives.
    pub fn remove(&mut self, id: &str) -> Option<LayerNode> {
        let (siblings, index) = containing_list(&mut self.layers, id)?;
        let removed = siblings.remove(index);
        self.emit(StoreEvent::Changed);
        Some(removed)
    }

    /// Swap a layer with the one above it, if any titled layer is above it
    /// in its group. Returns whether the layer moved.
    pub fn move_up(&mut self, id: &str) -> bool {
        let Some((siblings, index)) = containing_list(&mut self.layers, id) else {
            return false;
        };
        let top_most = !siblings[index + 1..]
            .iter()
            .any(|node| node.layer().has_title());
        if top_most {
            return false;
        }
        siblings.swap(index, index + 1);
        self.emit(StoreEvent::Changed);
        true
    }

    /// Swap a layer with the one below it, if any titled layer that is not
    /// a base group is below it in its group. Returns whether the layer moved.
    pub fn move_down(&mut self, id: &str) -> bool {
        let Some((siblings, index)) = containing_list(&mut self.layers, id) else {
            return false;
        };
        let bottom_most = !siblings[..index]
            .iter()
            .any(|node| node.layer().has_title() && !node.is_base_group());
        if bottom_most {
            return false;
        }
        siblings.swap(index, index - 1);
        self.emit(StoreEvent::Changed);
        true
    }

    /// Publish a layer load failure to subscribers.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "Layer source error");
        self.emit(StoreEvent::Error(message));
    }

    fn emit(&self, event: StoreEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

/// The sibling list holding the node named `id`, and its index there.
fn containing_list<'a>(
    nodes: &'a mut Vec<LayerNode>,
    id: &str,
) -> Option<(&'a mut Vec<LayerNode>, usize)> {
    if let Some(index) = nodes.iter().position(|node| node.layer().name == id) {
        return Some((nodes, index));
    }
    for node in nodes.iter_mut() {
        if let LayerNode::Group { children, .. } = node {
            if let Some(found) = containing_list(children, id) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, title: &str) -> LayerNode {
        LayerNode::Leaf(LayerDescriptor::new(name, title))
    }

    fn untitled(name: &str) -> LayerNode {
        LayerNode::Leaf(LayerDescriptor::untitled(name))
    }

    fn names(store: &LayerStore) -> Vec<&str> {
        store.layers().iter().map(|n| n.layer().name.as_str()).collect()
    }

    #[test]
    fn test_containing_list_descends_into_groups() {
        let mut nodes = vec![
            leaf("a", "A"),
            LayerNode::Group {
                layer: LayerDescriptor::new("g", "G"),
                children: vec![leaf("b", "B"), leaf("c", "C")],
            },
        ];
        let (siblings, index) = containing_list(&mut nodes, "c").unwrap();
        assert_eq!(index, 1);
        assert_eq!(siblings.len(), 2);
        assert!(containing_list(&mut nodes, "zzz").is_none());
    }

    #[test]
    fn test_move_up_skips_when_only_untitled_above() {
        let mut store = LayerStore::new().with_layers(vec![
            leaf("a", "A"),
            leaf("b", "B"),
            untitled("overlay"),
        ]);
        assert!(store.move_up("a"));
        assert_eq!(names(&store), vec!["b", "a", "overlay"]);
        assert!(!store.move_up("a"));
        assert_eq!(names(&store), vec!["b", "a", "overlay"]);
    }

    #[test]
    fn test_empty_title_counts_as_titled() {
        let mut store = LayerStore::new().with_layers(vec![leaf("a", "A"), leaf("blank", "")]);
        assert!(store.move_up("a"));
        assert_eq!(names(&store), vec!["blank", "a"]);
        assert!(store.move_down("a"));
        assert_eq!(names(&store), vec!["a", "blank"]);
    }
}
