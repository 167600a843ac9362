//! Editor facade
//!
//! `Composer` owns everything one editor instance needs: the graph, the
//! drag controller, the slot geometry registry, the clipboard and the undo
//! history. The rendering layer calls it for every user gesture and reads
//! the graph back for display.
//!
//! All operations are synchronous and total. Invalid requests are no-ops
//! reported through return values; only snapshot and JSON surfaces return
//! errors, and even those are logged rather than propagated when they occur
//! as a side effect of an edit.

use crate::clipboard::Clipboard;
use crate::clone::{clone_subgraph, generate_edge_id, CloneOptions, ClonedSubgraph};
use crate::config::EditorConfig;
use crate::drag::{CaptureChange, DragController, DragOutcome, DragState, SlotHighlight};
use crate::error::Result;
use crate::events::{EditorEvent, EventSink, NullEventSink};
use crate::geometry::{Point, Rect};
use crate::graph::ComposerGraph;
use crate::registry::{SlotKey, SlotRegistry};
use crate::shortcuts::{shortcut_for, KeyInput, ShortcutAction};
use crate::types::{Connection, Edge, EdgeId, Node, NodeId};
use crate::undo::UndoStack;

/// One editor instance
pub struct Composer {
    graph: ComposerGraph,
    drag: DragController,
    registry: SlotRegistry,
    clipboard: Clipboard,
    history: UndoStack,
    config: EditorConfig,
    events: Box<dyn EventSink>,
}

impl Composer {
    /// Create an editor with an empty graph
    pub fn new(config: EditorConfig) -> Self {
        let mut composer = Self {
            graph: ComposerGraph::new(),
            drag: DragController::new(config.magnetic_release_distance),
            registry: SlotRegistry::new(),
            clipboard: Clipboard::new(),
            history: UndoStack::new(config.undo_limit),
            config,
            events: Box::new(NullEventSink),
        };
        composer.commit();
        composer
    }

    /// Start from an existing graph, resetting the undo history
    pub fn with_graph(mut self, graph: ComposerGraph) -> Self {
        self.graph = graph;
        self.drag.cancel();
        self.history.clear();
        self.commit();
        self
    }

    /// Send editor events to the given sink
    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Box::new(sink);
        self
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn graph(&self) -> &ComposerGraph {
        &self.graph
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Nodes rendered directly on the canvas
    pub fn visible_nodes(&self) -> Vec<&Node> {
        self.graph.visible_nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph.find_node(id)
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    /// How a slot should be highlighted given the current drag
    pub fn slot_highlight(&self, parent_id: &str, slot_id: &str) -> SlotHighlight {
        self.drag.slot_highlight(parent_id, slot_id)
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Serialize the current graph
    pub fn to_json(&self) -> Result<String> {
        self.graph.to_json()
    }

    // ------------------------------------------------------------------
    // Slot geometry
    // ------------------------------------------------------------------

    /// Record a slot's current screen rectangle
    pub fn register_slot_rect(&mut self, key: SlotKey, rect: Rect) {
        self.registry.register(key, rect);
    }

    /// Forget a slot's rectangle, e.g. when it unmounts
    pub fn unregister_slot_rect(&mut self, key: &SlotKey) {
        self.registry.unregister(key);
    }

    // ------------------------------------------------------------------
    // Graph edits
    // ------------------------------------------------------------------

    /// Load a serialized graph, replacing the current one
    ///
    /// The load is one undoable step. A graph that fails validation leaves
    /// the editor untouched.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let loaded = ComposerGraph::from_json(json)?;
        self.drag.cancel();
        self.graph = loaded;
        self.commit();
        Ok(())
    }

    /// Replace all nodes and edges
    ///
    /// Returns false and changes nothing if the replacement fails
    /// structural validation.
    pub fn replace_all(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> bool {
        if !self.graph.replace_all(nodes, edges) {
            return false;
        }
        self.drag.cancel();
        self.commit();
        true
    }

    /// Plug a node into a slot; see [`ComposerGraph::fill_slot`]
    pub fn fill_slot(&mut self, parent_id: &str, slot_id: &str, node_id: &str) -> bool {
        if !self.graph.fill_slot(parent_id, slot_id, node_id) {
            return false;
        }
        self.emit(EditorEvent::slot_filled(parent_id, slot_id, node_id));
        self.commit();
        true
    }

    /// Eject the node in a slot and select it
    pub fn clear_slot(&mut self, parent_id: &str, slot_id: &str) -> Option<NodeId> {
        let ejected = self.graph.clear_slot(parent_id, slot_id)?;
        self.emit(EditorEvent::slot_cleared(parent_id, slot_id, &ejected));
        self.commit();
        Some(ejected)
    }

    /// Connect two ports
    ///
    /// Returns the new edge's id, or `None` if the connection is invalid.
    pub fn add_edge(&mut self, connection: Connection) -> Option<EdgeId> {
        let edge_id = generate_edge_id();
        if !self.graph.add_edge(connection.into_edge(edge_id.clone())) {
            return None;
        }
        self.emit(EditorEvent::EdgeAdded {
            edge_id: edge_id.clone(),
        });
        self.commit();
        Some(edge_id)
    }

    /// Delete the selected nodes
    ///
    /// Edges touching a deleted node go too. Nodes nested in a deleted node
    /// are kept: the slot reference to them disappears with its owner, so
    /// they return to the canvas. Returns the deleted ids.
    pub fn delete_selected(&mut self) -> Vec<NodeId> {
        let selected = self.graph.selected_ids();
        if selected.is_empty() {
            return Vec::new();
        }

        let dragging_deleted = self
            .drag
            .session()
            .is_some_and(|s| selected.contains(&s.dragged_node_id));
        if dragging_deleted {
            log::debug!("Cancelled drag of a deleted node");
            self.drag.cancel();
        }

        self.graph.remove_nodes(&selected);
        for id in &selected {
            self.registry.unregister_node(id);
        }

        log::info!("Deleted {} nodes", selected.len());
        self.emit(EditorEvent::NodesRemoved {
            node_ids: selected.clone(),
        });
        self.commit();
        selected
    }

    /// Copy the selection and its nested nodes, without edges
    pub fn copy_selected(&mut self) -> usize {
        self.copy(false)
    }

    /// Copy the selection and its nested nodes with the edges between them
    pub fn copy_with_connections(&mut self) -> usize {
        self.copy(true)
    }

    fn copy(&mut self, with_connections: bool) -> usize {
        let selected = self.graph.selected_ids();
        let count = self.clipboard.capture(&selected, &self.graph, with_connections);
        if count > 0 {
            self.emit(EditorEvent::ClipboardUpdated {
                node_count: count,
                edge_count: self.clipboard.edges().len(),
            });
        }
        count
    }

    /// Paste a fresh copy of the clipboard
    ///
    /// Existing nodes are deselected and the pasted top-level nodes become
    /// the selection. Returns the ids of every pasted node.
    pub fn paste(&mut self) -> Vec<NodeId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let cloned = self.clipboard.instantiate(self.config.paste_offset);
        self.insert_clone(cloned)
    }

    /// Clone the selection in place, leaving the clipboard alone
    pub fn duplicate_selected(&mut self) -> Vec<NodeId> {
        let selected = self.graph.selected_ids();
        if selected.is_empty() {
            return Vec::new();
        }
        let cloned = clone_subgraph(
            &selected,
            self.graph.nodes(),
            self.graph.edges(),
            CloneOptions::nodes_only(self.config.paste_offset),
        );
        self.insert_clone(cloned)
    }

    fn insert_clone(&mut self, cloned: ClonedSubgraph) -> Vec<NodeId> {
        if cloned.nodes.is_empty() {
            return Vec::new();
        }
        let node_ids: Vec<NodeId> = cloned.nodes.iter().map(|n| n.id.clone()).collect();
        let edge_count = cloned.edges.len();

        self.graph.clear_selection();
        self.graph.add_nodes(cloned.nodes, cloned.edges);

        log::info!("Inserted {} nodes and {} edges", node_ids.len(), edge_count);
        self.emit(EditorEvent::NodesAdded {
            node_ids: node_ids.clone(),
            edge_count,
        });
        self.commit();
        node_ids
    }

    // ------------------------------------------------------------------
    // Selection and movement
    // ------------------------------------------------------------------

    pub fn select_node(&mut self, id: &str, additive: bool) -> bool {
        self.graph.select_node(id, additive)
    }

    pub fn clear_selection(&mut self) {
        self.graph.clear_selection();
    }

    /// Move a node, snapping to the grid
    pub fn move_node(&mut self, id: &str, position: (f64, f64)) -> bool {
        self.graph.move_node(id, self.config.snap(position))
    }

    // ------------------------------------------------------------------
    // Drag lifecycle
    // ------------------------------------------------------------------

    /// Start dragging a node
    pub fn begin_drag(&mut self, node_id: &str) -> bool {
        if !self.drag.start(&self.graph, node_id) {
            return false;
        }
        let compatible_slots = self
            .drag
            .session()
            .map(|s| s.compatible_slots.iter().map(|c| c.key().to_string()).collect())
            .unwrap_or_default();
        self.emit(EditorEvent::DragStarted {
            node_id: node_id.to_string(),
            compatible_slots,
        });
        true
    }

    /// Feed a cursor position to the active drag
    pub fn drag_move(&mut self, cursor: Point) -> CaptureChange {
        let change = self.drag.update(cursor, &self.registry);
        match &change {
            CaptureChange::Captured(key) => self.emit(EditorEvent::SlotCaptured {
                slot_key: key.to_string(),
            }),
            CaptureChange::Released(key) => self.emit(EditorEvent::SlotReleased {
                slot_key: key.to_string(),
            }),
            CaptureChange::Unchanged => {}
        }
        change
    }

    /// Release the pointer, filling the captured slot if still valid
    pub fn end_drag(&mut self) -> DragOutcome {
        let Some(node_id) = self.drag.session().map(|s| s.dragged_node_id.clone()) else {
            return DragOutcome::NotDragging;
        };

        let outcome = self.drag.finish(&mut self.graph);
        if let DragOutcome::Filled {
            parent_id,
            slot_id,
            node_id,
        } = &outcome
        {
            self.emit(EditorEvent::slot_filled(parent_id, slot_id, node_id));
            self.commit();
        }
        self.emit(EditorEvent::DragEnded {
            node_id,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Abandon the active drag without changing the graph
    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    // ------------------------------------------------------------------
    // Keyboard and history
    // ------------------------------------------------------------------

    /// Run the action bound to a key press
    ///
    /// Returns whether the action had an effect: something was deleted,
    /// copied, pasted or duplicated. Use [`shortcut_for`] to learn whether a
    /// key is bound at all.
    pub fn handle_key(&mut self, input: &KeyInput) -> bool {
        let Some(action) = shortcut_for(input) else {
            return false;
        };
        log::debug!("Shortcut {:?}", action);
        match action {
            ShortcutAction::Delete => !self.delete_selected().is_empty(),
            ShortcutAction::CopyWithConnections => self.copy_with_connections() > 0,
            ShortcutAction::Copy => self.copy_selected() > 0,
            ShortcutAction::Paste => !self.paste().is_empty(),
            ShortcutAction::Duplicate => !self.duplicate_selected().is_empty(),
        }
    }

    /// Restore the previous snapshot
    pub fn undo(&mut self) -> bool {
        let restored = self.history.undo();
        self.restore(restored, false)
    }

    /// Re-apply the next snapshot
    pub fn redo(&mut self) -> bool {
        let restored = self.history.redo();
        self.restore(restored, true)
    }

    fn restore(&mut self, restored: Option<Result<ComposerGraph>>, redo: bool) -> bool {
        match restored {
            Some(Ok(graph)) => {
                self.drag.cancel();
                self.graph = graph;
                self.emit(EditorEvent::HistoryRestored { redo });
                true
            }
            Some(Err(e)) => {
                log::warn!("Failed to restore snapshot: {}", e);
                false
            }
            None => false,
        }
    }

    fn commit(&mut self) {
        if let Err(e) = self.history.push(&self.graph) {
            log::warn!("Failed to record undo snapshot: {}", e);
        }
    }

    fn emit(&self, event: EditorEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to send editor event: {}", e);
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::GraphBuilder;
    use crate::events::{EventError, VecEventSink};
    use crate::types::{NodeSignature, PortType};
    use crate::validation::validate_graph;

    fn object_sig() -> NodeSignature {
        NodeSignature::unary(PortType::Object, PortType::Object)
    }

    fn graph() -> ComposerGraph {
        GraphBuilder::new()
            .add_node("map", "Map", (0.0, 0.0))
            .with_input("in", PortType::Array)
            .with_output("out", PortType::Array)
            .with_slot("fn", "Function", object_sig())
            .add_node("filter", "Filter", (300.0, 0.0))
            .with_input("in", PortType::Object)
            .with_output("out", PortType::Object)
            .add_node("source", "Source", (0.0, 200.0))
            .with_output("out", PortType::Array)
            .build()
    }

    fn composer() -> (Composer, Arc<VecEventSink>) {
        let sink = Arc::new(VecEventSink::new());
        let composer = Composer::default()
            .with_graph(graph())
            .with_event_sink(sink.clone());
        (composer, sink)
    }

    #[test]
    fn test_fill_emits_and_is_undoable() {
        let (mut composer, sink) = composer();
        assert!(!composer.can_undo());

        assert!(composer.fill_slot("map", "fn", "filter"));
        assert_eq!(composer.visible_nodes().len(), 2);
        assert!(matches!(sink.events()[0], EditorEvent::SlotFilled { .. }));

        assert!(composer.undo());
        assert_eq!(composer.visible_nodes().len(), 3);
        assert!(composer.redo());
        assert_eq!(composer.visible_nodes().len(), 2);
        assert!(!composer.redo());
    }

    #[test]
    fn test_rejected_fill_records_nothing() {
        let (mut composer, sink) = composer();
        assert!(!composer.fill_slot("map", "fn", "source"));
        assert!(sink.events().is_empty());
        assert!(!composer.can_undo());
    }

    #[test]
    fn test_add_edge_generates_id() {
        let (mut composer, _) = composer();
        let id = composer
            .add_edge(Connection::new("source", "out", "map", "in"))
            .unwrap();
        assert!(id.starts_with("edge-"));
        assert_eq!(composer.edges().len(), 1);

        assert_eq!(composer.add_edge(Connection::new("source", "out", "filter", "in")), None);
    }

    #[test]
    fn test_delete_selected_keeps_nested_and_drops_edges() {
        let (mut composer, _) = composer();
        composer.fill_slot("map", "fn", "filter");
        composer.add_edge(Connection::new("source", "out", "map", "in"));
        composer.select_node("map", false);

        let deleted = composer.delete_selected();
        assert_eq!(deleted, vec!["map".to_string()]);
        assert!(composer.node("map").is_none());
        assert!(composer.edges().is_empty());

        // The nested filter survives and is back on the canvas
        assert!(composer.visible_nodes().iter().any(|n| n.id == "filter"));
        assert_eq!(composer.graph().parent_of("filter"), None);
        assert!(validate_graph(composer.graph()).is_empty());

        // Nothing selected: no-op
        assert!(composer.delete_selected().is_empty());
    }

    #[test]
    fn test_replace_all_validates() {
        let (mut composer, _) = composer();
        let before = composer.graph().clone();

        let applied = composer.replace_all(
            vec![Node::new("a", "A", (0.0, 0.0))],
            vec![Edge::new("e", "a", "out", "ghost", "in")],
        );
        assert!(!applied);
        assert_eq!(composer.graph(), &before);
        assert!(!composer.can_undo());

        assert!(composer.replace_all(vec![Node::new("a", "A", (0.0, 0.0))], vec![]));
        assert_eq!(composer.graph().nodes().len(), 1);
        assert!(composer.undo());
        assert_eq!(composer.graph(), &before);
    }

    #[test]
    fn test_paste_twice_gives_fresh_ids() {
        let (mut composer, _) = composer();
        composer.select_node("filter", false);
        assert_eq!(composer.copy_selected(), 1);

        let first = composer.paste();
        let second = composer.paste();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
        assert_eq!(composer.graph().nodes().len(), 5);

        // Only the latest paste is selected
        assert_eq!(composer.graph().selected_ids(), second);
        let pasted = composer.node(&second[0]).unwrap();
        assert_eq!(pasted.position, (350.0, 50.0));
    }

    #[test]
    fn test_paste_with_empty_clipboard() {
        let (mut composer, _) = composer();
        assert!(composer.paste().is_empty());
        assert!(!composer.can_undo());
    }

    #[test]
    fn test_duplicate_leaves_clipboard_alone() {
        let (mut composer, _) = composer();
        composer.fill_slot("map", "fn", "filter");
        composer.select_node("map", false);

        let ids = composer.duplicate_selected();
        assert_eq!(ids.len(), 2);
        assert!(composer.clipboard().is_empty());
        assert_eq!(composer.visible_nodes().len(), 3);
        assert!(validate_graph(composer.graph()).is_empty());
    }

    #[test]
    fn test_move_node_snaps() {
        let (mut composer, _) = composer();
        composer.move_node("source", (13.0, 21.0));
        assert_eq!(composer.node("source").unwrap().position, (16.0, 24.0));
    }

    #[test]
    fn test_drag_lifecycle_events() {
        let (mut composer, sink) = composer();
        composer.register_slot_rect(SlotKey::new("map", "fn"), Rect::new(0.0, 0.0, 120.0, 40.0));

        assert!(composer.begin_drag("filter"));
        assert_eq!(composer.slot_highlight("map", "fn"), SlotHighlight::Compatible);
        assert!(matches!(
            composer.drag_move(Point::new(10.0, 10.0)),
            CaptureChange::Captured(_)
        ));
        assert!(matches!(composer.end_drag(), DragOutcome::Filled { .. }));
        assert_eq!(composer.drag_state(), &DragState::Idle);

        let kinds: Vec<&str> = sink
            .events()
            .iter()
            .map(|e| match e {
                EditorEvent::DragStarted { .. } => "started",
                EditorEvent::SlotCaptured { .. } => "captured",
                EditorEvent::SlotFilled { .. } => "filled",
                EditorEvent::DragEnded { .. } => "ended",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["started", "captured", "filled", "ended"]);
        assert_eq!(composer.end_drag(), DragOutcome::NotDragging);
    }

    #[test]
    fn test_undo_resets_drag() {
        let (mut composer, _) = composer();
        composer.fill_slot("map", "fn", "filter");
        composer.begin_drag("source");
        assert!(composer.undo());
        assert_eq!(composer.drag_state(), &DragState::Idle);
    }

    #[test]
    fn test_handle_key() {
        let (mut composer, _) = composer();

        // Bound keys with nothing to act on report no effect
        assert!(!composer.handle_key(&KeyInput::new("v").with_mod()));
        assert!(!composer.handle_key(&KeyInput::new("Delete")));
        assert!(!composer.handle_key(&KeyInput::new("c").with_mod()));

        composer.select_node("source", false);
        assert!(composer.handle_key(&KeyInput::new("c").with_mod()));
        assert!(!composer.clipboard().is_empty());
        assert!(composer.handle_key(&KeyInput::new("v").with_mod()));
        assert_eq!(composer.graph().nodes().len(), 4);

        // Typing into a field never edits the graph
        assert!(!composer.handle_key(&KeyInput::new("Delete").in_text_input()));
        assert_eq!(composer.graph().nodes().len(), 4);

        assert!(composer.handle_key(&KeyInput::new("Delete")));
        assert_eq!(composer.graph().nodes().len(), 3);
        assert!(!composer.handle_key(&KeyInput::new("q")));
    }

    #[test]
    fn test_load_json_rejects_broken_graph() {
        let (mut composer, _) = composer();
        let before = composer.graph().clone();
        let broken = r#"{"nodes":[{"id":"a","position":[0,0],"label":"A"},
            {"id":"a","position":[0,0],"label":"A"}],"edges":[]}"#;
        assert!(composer.load_json(broken).is_err());
        assert_eq!(composer.graph(), &before);

        let json = composer.to_json().unwrap();
        composer.load_json(&json).unwrap();
        assert_eq!(composer.graph(), &before);
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn send(&self, _event: EditorEvent) -> std::result::Result<(), EventError> {
            Err(EventError::channel_closed())
        }
    }

    #[test]
    fn test_failing_sink_does_not_block_edits() {
        let mut composer = Composer::default()
            .with_graph(graph())
            .with_event_sink(FailingSink);
        assert!(composer.fill_slot("map", "fn", "filter"));
        assert_eq!(composer.visible_nodes().len(), 2);
    }
}
