//! In-memory clipboard for copy and paste
//!
//! The clipboard holds an independent snapshot of the copied nodes (and
//! optionally their internal edges). Pasting never hands out the stored
//! nodes directly: each paste goes through the subgraph cloner so repeated
//! pastes produce distinct ids.

use serde::{Deserialize, Serialize};

use crate::clone::{clone_subgraph, collect_with_nested, CloneOptions, ClonedSubgraph};
use crate::graph::ComposerGraph;
use crate::types::{Edge, Node, NodeId};

/// Copied nodes and edges awaiting a paste
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clipboard {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clipboard with the given roots and their nested nodes
    ///
    /// With `with_connections`, edges whose endpoints both lie in the copied
    /// set are kept as well. Returns the number of nodes captured; copying
    /// nothing leaves the previous content untouched.
    pub fn capture(&mut self, root_ids: &[NodeId], graph: &ComposerGraph, with_connections: bool) -> usize {
        let collected = collect_with_nested(root_ids, graph.nodes());
        if collected.is_empty() {
            return 0;
        }

        let nodes: Vec<Node> = collected
            .iter()
            .filter_map(|id| graph.find_node(id))
            .cloned()
            .collect();

        let edges: Vec<Edge> = if with_connections {
            graph
                .edges()
                .iter()
                .filter(|e| collected.contains(&e.source) && collected.contains(&e.target))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        log::debug!(
            "Copied {} nodes and {} edges to clipboard",
            nodes.len(),
            edges.len()
        );
        self.nodes = nodes;
        self.edges = edges;
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Produce a fresh copy of the clipboard content, shifted by `offset`
    ///
    /// The clipboard itself is left as is, so it can be pasted again.
    pub fn instantiate(&self, offset: f64) -> ClonedSubgraph {
        let nested: Vec<&NodeId> = self.nodes.iter().flat_map(|n| n.nested_ids()).collect();
        let roots: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| !nested.contains(&&n.id))
            .map(|n| n.id.clone())
            .collect();

        clone_subgraph(&roots, &self.nodes, &self.edges, CloneOptions::with_edges(offset))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::{NodeSignature, PortType};

    fn graph() -> ComposerGraph {
        GraphBuilder::new()
            .add_node("host", "Host", (0.0, 0.0))
            .with_output("out", PortType::Any)
            .with_filled_slot("s", "S", NodeSignature::default(), "inner")
            .add_node("inner", "Inner", (0.0, 0.0))
            .with_input("in", PortType::Any)
            .add_node("sink", "Sink", (200.0, 0.0))
            .with_input("in", PortType::Any)
            .add_node("other", "Other", (400.0, 0.0))
            .with_input("in", PortType::Any)
            .add_edge_with_id("e-internal", "host", "out", "sink", "in")
            .add_edge_with_id("e-out", "host", "out", "other", "in")
            .build()
    }

    #[test]
    fn test_capture_includes_nested() {
        let graph = graph();
        let mut clipboard = Clipboard::new();
        assert_eq!(clipboard.capture(&["host".to_string()], &graph, false), 2);
        assert!(clipboard.edges().is_empty());
        let ids: Vec<&str> = clipboard.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["host", "inner"]);
    }

    #[test]
    fn test_capture_with_connections_keeps_internal_edges() {
        let graph = graph();
        let mut clipboard = Clipboard::new();
        clipboard.capture(&["host".to_string(), "sink".to_string()], &graph, true);
        let edge_ids: Vec<&str> = clipboard.edges().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(edge_ids, vec!["e-internal"]);
    }

    #[test]
    fn test_empty_capture_keeps_previous_content() {
        let graph = graph();
        let mut clipboard = Clipboard::new();
        clipboard.capture(&["sink".to_string()], &graph, false);
        assert_eq!(clipboard.capture(&[], &graph, false), 0);
        assert_eq!(clipboard.nodes().len(), 1);
    }

    #[test]
    fn test_instantiate_twice_gives_distinct_ids() {
        let graph = graph();
        let mut clipboard = Clipboard::new();
        clipboard.capture(&["host".to_string()], &graph, false);

        let first = clipboard.instantiate(50.0);
        let second = clipboard.instantiate(50.0);
        assert_eq!(first.nodes.len(), 2);
        assert_ne!(first.id_map["host"], second.id_map["host"]);
        assert_eq!(first.top_level_ids(), vec![first.id_map["host"].clone()]);

        // The stored snapshot is untouched
        assert_eq!(clipboard.nodes()[0].id, "host");
    }
}
