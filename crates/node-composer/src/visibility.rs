//! Canvas visibility
//!
//! A node is visible on the canvas unless some slot anywhere names it in
//! `filled_by`. The set is always derived from the current nodes and never
//! stored, so an ejected node reappears on the very next read.

use std::collections::HashSet;

use crate::types::Node;

/// IDs of every node currently plugged into some slot
pub fn nested_node_ids(nodes: &[Node]) -> HashSet<&str> {
    nodes
        .iter()
        .flat_map(|n| n.nested_ids())
        .map(|id| id.as_str())
        .collect()
}

/// Nodes that render directly on the canvas
pub fn visible_nodes(nodes: &[Node]) -> Vec<&Node> {
    let nested = nested_node_ids(nodes);
    nodes
        .iter()
        .filter(|n| !nested.contains(n.id.as_str()))
        .collect()
}
