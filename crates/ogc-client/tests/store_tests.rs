//! Layer store ordering and notifications.

use ogc_client::{LayerStore, StoreEvent};
use ogc_common::{LayerDescriptor, LayerNode};
use tokio::sync::broadcast::error::TryRecvError;

fn leaf(name: &str, title: &str) -> LayerNode {
    LayerNode::Leaf(LayerDescriptor::new(name, title))
}

fn untitled(name: &str) -> LayerNode {
    LayerNode::Leaf(LayerDescriptor::untitled(name))
}

fn group(name: &str, children: Vec<LayerNode>) -> LayerNode {
    LayerNode::Group {
        layer: LayerDescriptor::new(name, name),
        children,
    }
}

fn top_level(store: &LayerStore) -> Vec<&str> {
    store
        .layers()
        .iter()
        .map(|n| n.layer().name.as_str())
        .collect()
}

fn sample_store() -> LayerStore {
    LayerStore::new().with_layers(vec![
        group("base", vec![leaf("osm", "OSM"), leaf("aerial", "Aerial")]),
        leaf("topp:states", "States"),
        leaf("tiger:poi", "Points of interest"),
        untitled("sketch"),
    ])
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_flatten_and_find() {
    let store = sample_store();
    let names: Vec<&str> = store.flatten().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["osm", "aerial", "topp:states", "tiger:poi", "sketch"]);

    assert!(store.find("base").unwrap().is_base_group());
    assert_eq!(store.find("aerial").unwrap().layer().title.as_deref(), Some("Aerial"));
    assert!(store.find("missing").is_none());
}

#[test]
fn test_find_rejects_duplicates_across_subtrees() {
    let store = LayerStore::new().with_layers(vec![
        group("g", vec![leaf("dup", "One"), leaf("dup", "Two")]),
        leaf("dup", "Three"),
        leaf("other", "Other"),
    ]);
    assert!(store.find("dup").is_none());

    let store = LayerStore::new().with_layers(vec![
        group("g", vec![leaf("dup", "One")]),
        leaf("dup", "Two"),
    ]);
    assert!(store.find("dup").is_none());
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_move_up_requires_titled_layer_above() {
    let mut store = sample_store();

    assert!(store.move_up("topp:states"));
    assert_eq!(top_level(&store), vec!["base", "tiger:poi", "topp:states", "sketch"]);

    // only the untitled sketch layer is above
    assert!(!store.move_up("topp:states"));
    assert!(!store.move_up("sketch"));
}

#[test]
fn test_move_down_stops_at_base_groups() {
    let mut store = sample_store();

    assert!(store.move_down("tiger:poi"));
    assert_eq!(top_level(&store), vec!["base", "tiger:poi", "topp:states", "sketch"]);

    // below is only the base group
    assert!(!store.move_down("tiger:poi"));
    assert_eq!(top_level(&store), vec!["base", "tiger:poi", "topp:states", "sketch"]);
}

#[test]
fn test_moves_stay_within_group() {
    let mut store = sample_store();

    assert!(store.move_up("osm"));
    let base = store.find("base").unwrap();
    let children: Vec<&str> = base.children().iter().map(|c| c.layer().name.as_str()).collect();
    assert_eq!(children, vec!["aerial", "osm"]);
    assert!(!store.move_up("osm"));
    assert_eq!(top_level(&store)[0], "base");
}

#[test]
fn test_unknown_layer_does_not_move() {
    let mut store = sample_store();
    assert!(!store.move_up("missing"));
    assert!(!store.move_down("missing"));
    assert!(store.remove("missing").is_none());
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn test_mutations_emit_changed() {
    let mut store = sample_store();
    let mut events = store.subscribe();

    store.add(leaf("ne:countries", "Countries"));
    assert_eq!(events.recv().await.unwrap(), StoreEvent::Changed);

    let removed = store.remove("aerial").unwrap();
    assert_eq!(removed.layer().name, "aerial");
    assert_eq!(events.recv().await.unwrap(), StoreEvent::Changed);
    assert_eq!(store.find("base").unwrap().children().len(), 1);

    assert!(store.move_up("topp:states"));
    assert_eq!(events.recv().await.unwrap(), StoreEvent::Changed);

    // rejected moves are silent
    assert!(!store.move_down("base"));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_report_error_reaches_subscribers() {
    let store = sample_store();
    let mut events = store.subscribe();

    store.report_error("tile load error for topp:states");
    assert_eq!(
        events.recv().await.unwrap(),
        StoreEvent::Error("tile load error for topp:states".to_string())
    );
}

#[test]
fn test_events_without_subscribers() {
    let mut store = LayerStore::default();
    store.add(leaf("a", "A"));
    store.report_error("ignored");
    assert_eq!(store.layers().len(), 1);
}
