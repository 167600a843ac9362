//! Node Composer - composition and interaction engine for pipeline editors
//!
//! This crate holds the editing model behind a visual pipeline editor where
//! nodes can be plugged into *slots* of other nodes as higher-order
//! sub-behaviors (e.g. a filter plugged into a map's function slot). It
//! supports:
//!
//! - Typed ports with an `Any` wildcard and signature-based slot matching
//! - Slot filling and ejection with derived canvas visibility
//! - Magnetic drag capture with hysteresis
//! - Subgraph cloning for copy, paste and duplicate
//! - Compressed snapshot-based undo/redo
//!
//! # Architecture
//!
//! - `ComposerGraph`: the single node/edge store, invariant-preserving
//! - `DragController`: drag state machine over a `SlotRegistry` of slot rects
//! - `Composer`: facade that owns one editor instance
//! - `EventSink`: generic event streaming to the rendering layer
//!
//! # Example
//!
//! ```
//! use node_composer::{Composer, EditorConfig, GraphBuilder, NodeSignature, PortType};
//!
//! let graph = GraphBuilder::new()
//!     .add_node("map", "Map", (0.0, 0.0))
//!     .with_slot("fn", "Function", NodeSignature::unary(PortType::Object, PortType::Object))
//!     .add_node("filter", "Filter", (200.0, 0.0))
//!     .with_input("in", PortType::Object)
//!     .with_output("out", PortType::Object)
//!     .build();
//!
//! let mut composer = Composer::new(EditorConfig::default()).with_graph(graph);
//! assert!(composer.fill_slot("map", "fn", "filter"));
//! assert_eq!(composer.visible_nodes().len(), 1);
//! ```

pub mod builder;
pub mod clipboard;
pub mod clone;
pub mod composer;
pub mod config;
pub mod constants;
pub mod drag;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod registry;
pub mod shortcuts;
pub mod signature;
pub mod types;
pub mod undo;
pub mod validation;
pub mod visibility;

// Re-export key types
pub use builder::GraphBuilder;
pub use clipboard::Clipboard;
pub use clone::{clone_subgraph, collect_with_nested, CloneOptions, ClonedSubgraph};
pub use composer::Composer;
pub use config::EditorConfig;
pub use drag::{
    check_slot_overlap, CaptureChange, CompatibleSlot, DragController, DragOutcome, DragSession,
    DragState, SlotCheck, SlotCheckResult, SlotHighlight,
};
pub use error::{ComposerError, Result};
pub use events::{EditorEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use geometry::{Point, Rect};
pub use graph::ComposerGraph;
pub use registry::{SlotKey, SlotRegistry};
pub use shortcuts::{shortcut_for, KeyInput, ShortcutAction};
pub use signature::{can_fill_slot, node_fits};
pub use types::{
    Connection, Edge, EdgeId, Node, NodeId, NodeSignature, Port, PortId, PortType, Slot, SlotId,
};
pub use undo::UndoStack;
pub use validation::{is_valid_connection, validate_graph, ValidationError};
pub use visibility::{nested_node_ids, visible_nodes};
