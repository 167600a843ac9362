//! Editor events
//!
//! Events are sent from the composer to the rendering layer (or any other
//! consumer) to report graph mutations and drag progress, so a host can
//! update its view without diffing the whole graph.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::drag::DragOutcome;
use crate::types::{EdgeId, NodeId, SlotId};

/// Trait for sending editor events
///
/// This abstracts over the transport mechanism (UI channel, mpsc, etc.)
/// allowing the composer to be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel
    /// closed). The composer logs such errors and carries on.
    fn send(&self, event: EditorEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted while editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// A node was plugged into a slot
    #[serde(rename_all = "camelCase")]
    SlotFilled {
        parent_id: NodeId,
        slot_id: SlotId,
        node_id: NodeId,
    },

    /// A node was ejected from a slot
    #[serde(rename_all = "camelCase")]
    SlotCleared {
        parent_id: NodeId,
        slot_id: SlotId,
        node_id: NodeId,
    },

    /// Nodes were added by paste or duplicate
    #[serde(rename_all = "camelCase")]
    NodesAdded { node_ids: Vec<NodeId>, edge_count: usize },

    /// Nodes were deleted
    #[serde(rename_all = "camelCase")]
    NodesRemoved { node_ids: Vec<NodeId> },

    /// An edge was connected
    #[serde(rename_all = "camelCase")]
    EdgeAdded { edge_id: EdgeId },

    /// A drag began
    #[serde(rename_all = "camelCase")]
    DragStarted {
        node_id: NodeId,
        /// Keys (`parent:slot`) of the slots the node could fill
        compatible_slots: Vec<String>,
    },

    /// A slot captured the dragged node
    #[serde(rename_all = "camelCase")]
    SlotCaptured { slot_key: String },

    /// A slot released the dragged node
    #[serde(rename_all = "camelCase")]
    SlotReleased { slot_key: String },

    /// The pointer was released
    #[serde(rename_all = "camelCase")]
    DragEnded { node_id: NodeId, outcome: DragOutcome },

    /// The clipboard content changed
    #[serde(rename_all = "camelCase")]
    ClipboardUpdated { node_count: usize, edge_count: usize },

    /// Undo or redo replaced the graph
    #[serde(rename_all = "camelCase")]
    HistoryRestored { redo: bool },
}

impl EditorEvent {
    /// Create a slot filled event
    pub fn slot_filled(parent_id: &str, slot_id: &str, node_id: &str) -> Self {
        Self::SlotFilled {
            parent_id: parent_id.to_string(),
            slot_id: slot_id.to_string(),
            node_id: node_id.to_string(),
        }
    }

    /// Create a slot cleared event
    pub fn slot_cleared(parent_id: &str, slot_id: &str, node_id: &str) -> Self {
        Self::SlotCleared {
            parent_id: parent_id.to_string(),
            slot_id: slot_id.to_string(),
            node_id: node_id.to_string(),
        }
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EditorEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<EditorEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EditorEvent> {
        self.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EditorEvent>> {
        // A panic while pushing cannot leave the Vec half-written
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        self.lock().push(event);
        Ok(())
    }
}

/// Sharing one sink between a composer and the test that inspects it
impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        (**self).send(event)
    }
}
