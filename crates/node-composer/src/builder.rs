//! Fluent builder for composer graphs
//!
//! Provides a fluent API for constructing graphs programmatically, mostly
//! for tests and host-side fixtures.

use crate::graph::ComposerGraph;
use crate::types::{Edge, Node, NodeSignature, Port, PortType, Slot};

/// Fluent builder for constructing composer graphs
///
/// Port and slot methods apply to the most recently added node.
///
/// # Example
///
/// ```
/// use node_composer::{GraphBuilder, NodeSignature, PortType};
///
/// let graph = GraphBuilder::new()
///     .add_node("map", "Map", (0.0, 0.0))
///     .with_slot("fn", "Function", NodeSignature::unary(PortType::Object, PortType::Object))
///     .add_node("filter", "Filter", (200.0, 0.0))
///     .with_input("in", PortType::Object)
///     .with_output("out", PortType::Object)
///     .build();
///
/// assert_eq!(graph.nodes().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    edge_counter: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        self.nodes.push(Node::new(id, label, position));
        self
    }

    /// Add an input port labelled with its id
    pub fn with_input(self, id: impl Into<String>, port_type: PortType) -> Self {
        let id = id.into();
        self.with_input_port(Port::new(id.clone(), id, port_type))
    }

    /// Add an output port labelled with its id
    pub fn with_output(self, id: impl Into<String>, port_type: PortType) -> Self {
        let id = id.into();
        self.with_output_port(Port::new(id.clone(), id, port_type))
    }

    pub fn with_input_port(mut self, port: Port) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.inputs.push(port);
        }
        self
    }

    pub fn with_output_port(mut self, port: Port) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.outputs.push(port);
        }
        self
    }

    /// Add an empty slot
    pub fn with_slot(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        accepts: NodeSignature,
    ) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.slots.push(Slot::new(id, label, accepts));
        }
        self
    }

    /// Add a slot already filled by another node
    ///
    /// The fill is not checked; `build` produces whatever was described.
    pub fn with_filled_slot(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        accepts: NodeSignature,
        filled_by: impl Into<String>,
    ) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.slots.push(Slot::new(id, label, accepts).filled_with(filled_by));
        }
        self
    }

    /// Mark the most recently added node as selected
    pub fn selected(mut self) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.selected = true;
        }
        self
    }

    /// Add an edge between two nodes (auto-generates edge ID)
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        self.edges.push(Edge::new(
            format!("edge-{}", self.edge_counter),
            source,
            source_port,
            target,
            target_port,
        ));
        self
    }

    /// Add an edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.edges
            .push(Edge::new(edge_id, source, source_port, target, target_port));
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> ComposerGraph {
        ComposerGraph::from_parts(self.nodes, self.edges)
    }
}
