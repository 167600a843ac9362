//! Drag interaction state machine with magnetic slot capture
//!
//! While a node is dragged, the controller tracks which slots the cursor
//! overlaps and which single slot has "captured" the node. Capture is
//! asymmetric:
//!
//! - a compatible slot captures the instant the cursor enters its rectangle,
//!   provided nothing was captured when the tick began
//! - a captured slot holds on after the cursor leaves, until the cursor is at
//!   least `release_distance` away from the rectangle's nearest edge
//!
//! On release of the pointer the captured slot, if still valid, is filled
//! with the dragged node. The set of compatible slots is computed once at
//! drag start; per-move work is one containment/distance check per
//! registered rectangle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::graph::ComposerGraph;
use crate::registry::{SlotKey, SlotRegistry};
use crate::signature::node_fits;
use crate::types::{NodeId, Slot, SlotId};

/// A slot the dragged node could fill, snapshotted at drag start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibleSlot {
    pub parent_id: NodeId,
    pub slot: Slot,
}

impl CompatibleSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.parent_id.clone(), self.slot.id.clone())
    }
}

/// State of an active drag
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Node being dragged
    pub dragged_node_id: NodeId,
    /// Empty slots on other nodes the dragged node can fill
    pub compatible_slots: Vec<CompatibleSlot>,
    /// Slots currently under (or magnetically holding) the cursor
    pub overlapping_slot_keys: HashSet<SlotKey>,
    /// Slot that will receive the node on drop
    pub captured_by_slot: Option<SlotKey>,
    compatible_keys: HashSet<SlotKey>,
}

impl DragSession {
    fn new(dragged_node_id: NodeId, compatible_slots: Vec<CompatibleSlot>) -> Self {
        let compatible_keys = compatible_slots.iter().map(CompatibleSlot::key).collect();
        Self {
            dragged_node_id,
            compatible_slots,
            overlapping_slot_keys: HashSet::new(),
            captured_by_slot: None,
            compatible_keys,
        }
    }

    /// Whether the slot was compatible when the drag began
    pub fn is_compatible(&self, key: &SlotKey) -> bool {
        self.compatible_keys.contains(key)
    }

    /// Whether the slot is currently overlapped
    pub fn is_overlapping(&self, key: &SlotKey) -> bool {
        self.overlapping_slot_keys.contains(key)
    }
}

/// Drag interaction state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// How the rendering layer should draw an empty slot during a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotHighlight {
    /// No drag, or the slot is neither compatible nor overlapped
    Neutral,
    /// The dragged node fits, but the cursor is elsewhere
    Compatible,
    /// The dragged node fits and the cursor is on the slot
    Targeted,
    /// The cursor is on the slot but the dragged node does not fit
    Incompatible,
}

/// Change in capture produced by one drag move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureChange {
    Unchanged,
    Captured(SlotKey),
    Released(SlotKey),
}

/// Result of releasing the pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DragOutcome {
    /// The dragged node was plugged into a slot
    #[serde(rename_all = "camelCase")]
    Filled {
        parent_id: NodeId,
        slot_id: SlotId,
        node_id: NodeId,
    },
    /// The drag ended without a graph mutation
    Discarded,
    /// There was no active drag
    NotDragging,
}

/// Inputs for evaluating one slot against one cursor sample
#[derive(Debug, Clone, Copy)]
pub struct SlotCheck<'a> {
    pub key: &'a SlotKey,
    pub rect: Rect,
    pub cursor: Point,
    /// Whether this slot may take a fresh capture on this tick
    pub can_capture: bool,
    pub current_capture: Option<&'a SlotKey>,
    pub release_distance: f64,
}

/// Overlap and capture after evaluating one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCheckResult {
    pub overlapping: bool,
    pub capture: Option<SlotKey>,
}

/// Evaluate one slot's overlap and capture for a cursor sample
pub fn check_slot_overlap(check: &SlotCheck<'_>) -> SlotCheckResult {
    if check.rect.contains(check.cursor) {
        let capture = match check.current_capture {
            None if check.can_capture => Some(check.key.clone()),
            current => current.cloned(),
        };
        return SlotCheckResult {
            overlapping: true,
            capture,
        };
    }

    if check.current_capture == Some(check.key) {
        let release = check.rect.distance_to(check.cursor) >= check.release_distance;
        return SlotCheckResult {
            overlapping: !release,
            capture: if release { None } else { Some(check.key.clone()) },
        };
    }

    SlotCheckResult {
        overlapping: false,
        capture: check.current_capture.cloned(),
    }
}

/// Single-drag interaction controller
///
/// Callers must serialize pointer events for one drag at a time.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    release_distance: f64,
}

impl DragController {
    pub fn new(release_distance: f64) -> Self {
        Self {
            state: DragState::Idle,
            release_distance,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// The active session, if dragging
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn release_distance(&self) -> f64 {
        self.release_distance
    }

    pub fn set_release_distance(&mut self, distance: f64) {
        self.release_distance = distance;
    }

    /// Begin dragging a node
    ///
    /// Enumerates every empty slot on every other node that the dragged
    /// node's signature covers. Returns false (and stays idle) if the node
    /// does not exist.
    pub fn start(&mut self, graph: &ComposerGraph, node_id: &str) -> bool {
        let Some(dragged) = graph.find_node(node_id) else {
            log::debug!("Drag start ignored: node '{}' not found", node_id);
            return false;
        };

        if self.is_dragging() {
            log::warn!("Drag of '{}' started while another drag was active", node_id);
        }

        let mut compatible_slots = Vec::new();
        for parent in graph.nodes().iter().filter(|n| n.id != dragged.id) {
            for slot in &parent.slots {
                if !slot.is_filled() && node_fits(&slot.accepts, dragged) {
                    compatible_slots.push(CompatibleSlot {
                        parent_id: parent.id.clone(),
                        slot: slot.clone(),
                    });
                }
            }
        }

        log::debug!(
            "Drag started for '{}' with {} compatible slots",
            node_id,
            compatible_slots.len()
        );
        self.state = DragState::Dragging(DragSession::new(dragged.id.clone(), compatible_slots));
        true
    }

    /// Process one cursor sample against the registered slot rectangles
    ///
    /// Slots owned by the dragged node are skipped so a node never captures
    /// itself. A new capture is only taken when nothing was captured at the
    /// start of this tick, so capture never jumps straight from one slot to
    /// another.
    ///
    /// After a `Released` change the slot under the cursor is only captured
    /// on a later sample. If the pointer goes up before that sample arrives,
    /// `finish` discards the drop, so hosts should keep feeding move samples
    /// after a release even when the cursor has not moved.
    pub fn update(&mut self, cursor: Point, registry: &SlotRegistry) -> CaptureChange {
        let release_distance = self.release_distance;
        let DragState::Dragging(session) = &mut self.state else {
            return CaptureChange::Unchanged;
        };

        let held = session.captured_by_slot.clone();
        let mut capture = held.clone();
        let mut overlapping = HashSet::new();
        let mut held_rect_seen = false;

        for (key, rect) in registry.iter() {
            if key.belongs_to(&session.dragged_node_id) {
                continue;
            }
            if held.as_ref() == Some(key) {
                held_rect_seen = true;
            }

            let result = check_slot_overlap(&SlotCheck {
                key,
                rect: *rect,
                cursor,
                can_capture: held.is_none() && session.compatible_keys.contains(key),
                current_capture: capture.as_ref(),
                release_distance,
            });

            if result.overlapping {
                overlapping.insert(key.clone());
            }
            capture = result.capture;
        }

        // A captured slot whose rectangle was unregistered cannot hold on
        if held.is_some() && !held_rect_seen {
            capture = None;
        }

        session.overlapping_slot_keys = overlapping;
        session.captured_by_slot = capture.clone();

        match (held, capture) {
            (None, Some(key)) => {
                log::debug!("Slot '{}' captured '{}'", key, session.dragged_node_id);
                CaptureChange::Captured(key)
            }
            (Some(key), None) => {
                log::debug!("Slot '{}' released '{}'", key, session.dragged_node_id);
                CaptureChange::Released(key)
            }
            _ => CaptureChange::Unchanged,
        }
    }

    /// Release the pointer and end the drag
    ///
    /// Fills the captured slot if it is still empty and still compatible
    /// with the dragged node. Always returns to idle.
    pub fn finish(&mut self, graph: &mut ComposerGraph) -> DragOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return DragOutcome::NotDragging;
        };

        let Some(key) = session.captured_by_slot else {
            log::debug!("Drag of '{}' ended without capture", session.dragged_node_id);
            return DragOutcome::Discarded;
        };

        let still_valid = match (
            graph.find_node(&session.dragged_node_id),
            graph
                .find_node(&key.parent_id)
                .and_then(|p| p.find_slot(&key.slot_id)),
        ) {
            (Some(dragged), Some(slot)) => !slot.is_filled() && node_fits(&slot.accepts, dragged),
            _ => false,
        };

        if still_valid && graph.fill_slot(&key.parent_id, &key.slot_id, &session.dragged_node_id) {
            DragOutcome::Filled {
                parent_id: key.parent_id,
                slot_id: key.slot_id,
                node_id: session.dragged_node_id,
            }
        } else {
            log::debug!(
                "Drag of '{}' discarded: slot '{}' no longer accepts it",
                session.dragged_node_id,
                key
            );
            DragOutcome::Discarded
        }
    }

    /// Abandon the drag without touching the graph
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Highlight state for one slot
    pub fn slot_highlight(&self, parent_id: &str, slot_id: &str) -> SlotHighlight {
        let Some(session) = self.session() else {
            return SlotHighlight::Neutral;
        };
        let key = SlotKey::new(parent_id, slot_id);
        match (session.is_compatible(&key), session.is_overlapping(&key)) {
            (true, true) => SlotHighlight::Targeted,
            (true, false) => SlotHighlight::Compatible,
            (false, true) => SlotHighlight::Incompatible,
            (false, false) => SlotHighlight::Neutral,
        }
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(crate::constants::defaults::MAGNETIC_RELEASE_DISTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::{NodeSignature, PortType};

    fn object_sig() -> NodeSignature {
        NodeSignature::unary(PortType::Object, PortType::Object)
    }

    /// Two object slots on separate hosts, an object filter and a number node
    fn fixture() -> (ComposerGraph, SlotRegistry) {
        let graph = GraphBuilder::new()
            .add_node("host-a", "Host A", (0.0, 0.0))
            .with_slot("fn", "Function", object_sig())
            .add_node("host-b", "Host B", (0.0, 300.0))
            .with_slot("fn", "Function", object_sig())
            .add_node("filter", "Filter", (500.0, 0.0))
            .with_input("in", PortType::Object)
            .with_output("out", PortType::Object)
            .with_slot("own", "Own", object_sig())
            .add_node("num", "Number", (500.0, 300.0))
            .with_input("in", PortType::Number)
            .with_output("out", PortType::Number)
            .build();

        let mut registry = SlotRegistry::new();
        registry.register(SlotKey::new("host-a", "fn"), Rect::new(0.0, 0.0, 100.0, 40.0));
        registry.register(SlotKey::new("host-b", "fn"), Rect::new(0.0, 100.0, 100.0, 40.0));
        registry.register(SlotKey::new("filter", "own"), Rect::new(500.0, 0.0, 100.0, 40.0));
        (graph, registry)
    }

    fn captured(controller: &DragController) -> Option<String> {
        controller
            .session()
            .and_then(|s| s.captured_by_slot.as_ref())
            .map(|k| k.to_string())
    }

    #[test]
    fn test_start_enumerates_compatible_slots() {
        let (graph, _) = fixture();
        let mut controller = DragController::new(20.0);

        assert!(controller.start(&graph, "filter"));
        let session = controller.session().unwrap();
        let keys: Vec<String> = session.compatible_slots.iter().map(|c| c.key().to_string()).collect();
        // Its own slot is excluded
        assert_eq!(keys, vec!["host-a:fn", "host-b:fn"]);
        assert!(session.overlapping_slot_keys.is_empty());
        assert!(session.captured_by_slot.is_none());
    }

    #[test]
    fn test_start_unknown_node_stays_idle() {
        let (graph, _) = fixture();
        let mut controller = DragController::new(20.0);
        assert!(!controller.start(&graph, "ghost"));
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_capture_on_enter_and_hysteresis_release() {
        let (graph, registry) = fixture();
        let mut controller = DragController::new(20.0);
        controller.start(&graph, "filter");

        assert_eq!(
            controller.update(Point::new(50.0, 20.0), &registry),
            CaptureChange::Captured(SlotKey::new("host-a", "fn"))
        );

        // Just outside, within release distance: still captured and overlapping
        assert_eq!(controller.update(Point::new(115.0, 20.0), &registry), CaptureChange::Unchanged);
        assert_eq!(captured(&controller).as_deref(), Some("host-a:fn"));
        assert_eq!(
            controller.slot_highlight("host-a", "fn"),
            SlotHighlight::Targeted
        );

        // 19.9 px away: held
        controller.update(Point::new(119.9, 20.0), &registry);
        assert_eq!(captured(&controller).as_deref(), Some("host-a:fn"));

        // Exactly the release distance: released
        assert_eq!(
            controller.update(Point::new(120.0, 20.0), &registry),
            CaptureChange::Released(SlotKey::new("host-a", "fn"))
        );
        assert_eq!(captured(&controller), None);
        assert_eq!(
            controller.slot_highlight("host-a", "fn"),
            SlotHighlight::Compatible
        );
    }

    #[test]
    fn test_no_direct_transfer_between_slots() {
        let (graph, registry) = fixture();
        // host-b's rect starts 60px below host-a's
        let mut controller = DragController::new(80.0);
        controller.start(&graph, "filter");

        controller.update(Point::new(50.0, 20.0), &registry);
        assert_eq!(captured(&controller).as_deref(), Some("host-a:fn"));

        // Inside host-b but within 80px of host-a: host-a keeps the capture
        controller.update(Point::new(50.0, 105.0), &registry);
        assert_eq!(captured(&controller).as_deref(), Some("host-a:fn"));
        assert_eq!(
            controller.slot_highlight("host-b", "fn"),
            SlotHighlight::Targeted
        );

        // Far enough from host-a: released this tick, not transferred
        let change = controller.update(Point::new(50.0, 130.0), &registry);
        assert_eq!(change, CaptureChange::Released(SlotKey::new("host-a", "fn")));
        assert_eq!(captured(&controller), None);

        // Next tick host-b captures
        let change = controller.update(Point::new(50.0, 130.0), &registry);
        assert_eq!(change, CaptureChange::Captured(SlotKey::new("host-b", "fn")));
    }

    #[test]
    fn test_drop_right_after_release_is_discarded() {
        let (mut graph, registry) = fixture();
        let mut controller = DragController::new(80.0);
        controller.start(&graph, "filter");
        controller.update(Point::new(50.0, 20.0), &registry);

        // Released from host-a while the cursor is already over host-b
        let change = controller.update(Point::new(50.0, 130.0), &registry);
        assert_eq!(change, CaptureChange::Released(SlotKey::new("host-a", "fn")));

        // Pointer up before another sample: nothing is filled
        assert_eq!(controller.finish(&mut graph), DragOutcome::Discarded);
        assert_eq!(graph.parent_of("filter"), None);
    }

    #[test]
    fn test_sample_after_release_allows_drop() {
        let (mut graph, registry) = fixture();
        let mut controller = DragController::new(80.0);
        controller.start(&graph, "filter");
        controller.update(Point::new(50.0, 20.0), &registry);
        controller.update(Point::new(50.0, 130.0), &registry);

        // Same position again, as a host would send on pointer up
        controller.update(Point::new(50.0, 130.0), &registry);
        assert_eq!(
            controller.finish(&mut graph),
            DragOutcome::Filled {
                parent_id: "host-b".to_string(),
                slot_id: "fn".to_string(),
                node_id: "filter".to_string(),
            }
        );
    }

    #[test]
    fn test_incompatible_slot_overlaps_without_capture() {
        let (graph, registry) = fixture();
        let mut controller = DragController::new(20.0);
        controller.start(&graph, "num");
        assert!(controller.session().unwrap().compatible_slots.is_empty());

        assert_eq!(controller.update(Point::new(50.0, 20.0), &registry), CaptureChange::Unchanged);
        assert_eq!(
            controller.slot_highlight("host-a", "fn"),
            SlotHighlight::Incompatible
        );
        assert_eq!(controller.slot_highlight("host-b", "fn"), SlotHighlight::Neutral);
    }

    #[test]
    fn test_own_slots_are_ignored() {
        let (graph, registry) = fixture();
        let mut controller = DragController::new(20.0);
        controller.start(&graph, "filter");

        controller.update(Point::new(550.0, 20.0), &registry);
        let session = controller.session().unwrap();
        assert!(session.overlapping_slot_keys.is_empty());
        assert!(session.captured_by_slot.is_none());
    }

    #[test]
    fn test_unregistered_capture_is_released() {
        let (graph, mut registry) = fixture();
        let mut controller = DragController::new(20.0);
        controller.start(&graph, "filter");
        controller.update(Point::new(50.0, 20.0), &registry);

        registry.unregister(&SlotKey::new("host-a", "fn"));
        assert_eq!(
            controller.update(Point::new(50.0, 20.0), &registry),
            CaptureChange::Released(SlotKey::new("host-a", "fn"))
        );
    }

    #[test]
    fn test_finish_fills_captured_slot() {
        let (mut graph, registry) = fixture();
        let mut controller = DragController::new(20.0);
        controller.start(&graph, "filter");
        controller.update(Point::new(50.0, 20.0), &registry);

        let outcome = controller.finish(&mut graph);
        assert_eq!(
            outcome,
            DragOutcome::Filled {
                parent_id: "host-a".to_string(),
                slot_id: "fn".to_string(),
                node_id: "filter".to_string(),
            }
        );
        assert_eq!(controller.state(), &DragState::Idle);
        assert_eq!(graph.parent_of("filter"), Some(("host-a", "fn")));
    }

    #[test]
    fn test_finish_rechecks_slot() {
        let (mut graph, registry) = fixture();
        let mut controller = DragController::new(20.0);
        controller.start(&graph, "filter");
        controller.update(Point::new(50.0, 20.0), &registry);

        // Another event fills the captured slot mid-drag
        let other = GraphBuilder::new()
            .add_node("other", "Other", (0.0, 0.0))
            .with_input("in", PortType::Any)
            .with_output("out", PortType::Any)
            .build();
        graph.add_nodes(other.nodes().to_vec(), vec![]);
        assert!(graph.fill_slot("host-a", "fn", "other"));

        assert_eq!(controller.finish(&mut graph), DragOutcome::Discarded);
        assert_eq!(controller.state(), &DragState::Idle);
        assert_eq!(graph.parent_of("filter"), None);
    }

    #[test]
    fn test_finish_without_capture_or_drag() {
        let (mut graph, _) = fixture();
        let mut controller = DragController::new(20.0);
        assert_eq!(controller.finish(&mut graph), DragOutcome::NotDragging);

        controller.start(&graph, "filter");
        assert_eq!(controller.finish(&mut graph), DragOutcome::Discarded);
        assert_eq!(graph.visible_nodes().len(), 4);
    }

    #[test]
    fn test_check_slot_overlap_pure() {
        let key = SlotKey::new("p", "s");
        let other = SlotKey::new("q", "s");
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

        // Inside, compatible, nothing captured
        let result = check_slot_overlap(&SlotCheck {
            key: &key,
            rect,
            cursor: Point::new(5.0, 5.0),
            can_capture: true,
            current_capture: None,
            release_distance: 20.0,
        });
        assert_eq!(result, SlotCheckResult { overlapping: true, capture: Some(key.clone()) });

        // Inside, but another slot holds the capture
        let result = check_slot_overlap(&SlotCheck {
            key: &key,
            rect,
            cursor: Point::new(5.0, 5.0),
            can_capture: true,
            current_capture: Some(&other),
            release_distance: 20.0,
        });
        assert_eq!(result, SlotCheckResult { overlapping: true, capture: Some(other.clone()) });

        // Outside, not the capture
        let result = check_slot_overlap(&SlotCheck {
            key: &key,
            rect,
            cursor: Point::new(50.0, 5.0),
            can_capture: true,
            current_capture: Some(&other),
            release_distance: 20.0,
        });
        assert_eq!(result, SlotCheckResult { overlapping: false, capture: Some(other) });
    }
}
