//! Core types for composable node graphs
//!
//! These types define nodes, their typed ports, the slots that accept whole
//! nodes as plugged-in sub-behaviors, and the data edges between ports.
//! Nesting is expressed only through `Slot::filled_by`, an id reference into
//! the single node collection; no node embeds another.

use serde::{Deserialize, Serialize};

use crate::constants::port_colors;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a port (unique within one side of its node)
pub type PortId = String;

/// Unique identifier for a slot (unique within its node)
pub type SlotId = String;

/// The data type carried by a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    /// Text string
    String,
    /// Numeric value
    Number,
    /// Boolean value
    Boolean,
    /// Structured object
    Object,
    /// Ordered collection
    Array,
    /// Wildcard, matches every type on either side
    Any,
}

impl PortType {
    /// Check if this type can meet another type
    ///
    /// Types match exactly, or when either side is `Any`. There are no
    /// coercions (`String` never meets `Number`).
    pub fn is_compatible_with(&self, other: &PortType) -> bool {
        matches!(self, PortType::Any) || matches!(other, PortType::Any) || self == other
    }

    /// Color the rendering layer uses for handles of this type
    pub fn color(&self) -> &'static str {
        match self {
            PortType::String => port_colors::STRING,
            PortType::Number => port_colors::NUMBER,
            PortType::Boolean => port_colors::BOOLEAN,
            PortType::Object => port_colors::OBJECT,
            PortType::Array => port_colors::ARRAY,
            PortType::Any => port_colors::ANY,
        }
    }

    /// Lowercase name as it appears in serialized graphs
    pub fn as_str(&self) -> &'static str {
        match self {
            PortType::String => "string",
            PortType::Number => "number",
            PortType::Boolean => "boolean",
            PortType::Object => "object",
            PortType::Array => "array",
            PortType::Any => "any",
        }
    }
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed connection point on a node's input or output side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Identifier, unique within its side of the owning node
    pub id: PortId,
    /// Human-readable label
    pub label: String,
    /// Data type of the port
    #[serde(rename = "type")]
    pub port_type: PortType,
    /// For array ports, the type of the items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<PortType>,
}

impl Port {
    /// Create a port
    pub fn new(id: impl Into<String>, label: impl Into<String>, port_type: PortType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            port_type,
            item_type: None,
        }
    }

    /// Create an array port with the given item type
    pub fn array_of(id: impl Into<String>, label: impl Into<String>, item_type: PortType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            port_type: PortType::Array,
            item_type: Some(item_type),
        }
    }
}

/// The `{inputs, outputs}` shape a node has or a slot requires
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSignature {
    /// What the node consumes
    #[serde(default)]
    pub inputs: Vec<Port>,
    /// What the node produces
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl NodeSignature {
    /// Create a signature from input and output ports
    pub fn new(inputs: Vec<Port>, outputs: Vec<Port>) -> Self {
        Self { inputs, outputs }
    }

    /// Shorthand for a signature with one input and one output of the given types
    pub fn unary(input: PortType, output: PortType) -> Self {
        Self {
            inputs: vec![Port::new("in", "In", input)],
            outputs: vec![Port::new("out", "Out", output)],
        }
    }
}

/// A hole on a node that accepts a whole other node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Identifier, unique within the owning node
    pub id: SlotId,
    /// Human-readable label
    pub label: String,
    /// Signature any filling node must cover
    pub accepts: NodeSignature,
    /// Node currently plugged into this slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_by: Option<NodeId>,
}

impl Slot {
    /// Create an empty slot
    pub fn new(id: impl Into<String>, label: impl Into<String>, accepts: NodeSignature) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            accepts,
            filled_by: None,
        }
    }

    /// Mark the slot as filled by a node
    pub fn filled_with(mut self, node_id: impl Into<String>) -> Self {
        self.filled_by = Some(node_id.into());
        self
    }

    /// Whether a node is plugged into this slot
    pub fn is_filled(&self) -> bool {
        self.filled_by.is_some()
    }
}

/// A node on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Process-unique identifier
    pub id: NodeId,
    /// Position on the canvas (x, y)
    pub position: (f64, f64),
    /// Human-readable label
    pub label: String,
    /// Input ports
    #[serde(default)]
    pub inputs: Vec<Port>,
    /// Output ports
    #[serde(default)]
    pub outputs: Vec<Port>,
    /// Slots that accept other nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Slot>,
    /// Whether the node is part of the current selection
    #[serde(default)]
    pub selected: bool,
}

impl Node {
    /// Create a node without ports or slots
    pub fn new(id: impl Into<String>, label: impl Into<String>, position: (f64, f64)) -> Self {
        Self {
            id: id.into(),
            position,
            label: label.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            slots: Vec::new(),
            selected: false,
        }
    }

    /// Add an input port
    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    /// Add an output port
    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// Add a slot
    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    /// The node's actual signature
    pub fn signature(&self) -> NodeSignature {
        NodeSignature::new(self.inputs.clone(), self.outputs.clone())
    }

    /// Find a slot by ID
    pub fn find_slot(&self, slot_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }

    /// Find a slot by ID (mutable)
    pub fn find_slot_mut(&mut self, slot_id: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id == slot_id)
    }

    /// Find an input port by ID
    pub fn find_input(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    /// Find an output port by ID
    pub fn find_output(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    /// IDs of the nodes plugged into this node's slots
    pub fn nested_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.slots.iter().filter_map(|s| s.filled_by.as_ref())
    }
}

/// A data connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Source (output) port ID
    pub source_handle: PortId,
    /// Target node ID
    pub target: NodeId,
    /// Target (input) port ID
    pub target_handle: PortId,
}

impl Edge {
    /// Create an edge
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
        }
    }

    /// Whether either endpoint is the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A proposed edge, before it has an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source node ID
    pub source: NodeId,
    /// Source (output) port ID
    pub source_handle: PortId,
    /// Target node ID
    pub target: NodeId,
    /// Target (input) port ID
    pub target_handle: PortId,
}

impl Connection {
    /// Create a connection candidate
    pub fn new(
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
        }
    }

    /// Turn the candidate into an edge with the given id
    pub fn into_edge(self, id: impl Into<String>) -> Edge {
        Edge {
            id: id.into(),
            source: self.source,
            source_handle: self.source_handle,
            target: self.target,
            target_handle: self.target_handle,
        }
    }
}
