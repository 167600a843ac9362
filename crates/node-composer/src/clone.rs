//! Subgraph cloning for copy, duplicate and paste
//!
//! Cloning a set of root nodes also clones everything plugged into their
//! slots, recursively. Every clone gets a fresh id, and all references
//! inside the cloned set (`filled_by`, edge endpoints) are rewritten
//! through one old-to-new id map, so the result never points back into the
//! original graph.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::constants::id_prefixes;
use crate::types::{Edge, EdgeId, Node, NodeId};

/// Options controlling a subgraph clone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloneOptions {
    /// Also clone edges whose endpoints are both inside the cloned set
    pub include_edges: bool,
    /// Offset added to both coordinates of every cloned node
    pub offset: f64,
}

impl CloneOptions {
    /// Clone nodes only, shifted by `offset`
    pub fn nodes_only(offset: f64) -> Self {
        Self {
            include_edges: false,
            offset,
        }
    }

    /// Clone nodes and their internal edges, shifted by `offset`
    pub fn with_edges(offset: f64) -> Self {
        Self {
            include_edges: true,
            offset,
        }
    }
}

/// Result of cloning a subgraph
#[derive(Debug, Clone, Default)]
pub struct ClonedSubgraph {
    /// Cloned nodes, each root followed by its nested dependents
    pub nodes: Vec<Node>,
    /// Cloned edges, internal to the cloned set
    pub edges: Vec<Edge>,
    /// Mapping from original node id to cloned node id
    pub id_map: HashMap<NodeId, NodeId>,
}

impl ClonedSubgraph {
    /// IDs of the cloned nodes that are not nested in another clone
    pub fn top_level_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect()
    }
}

/// Generate a fresh node id
pub fn generate_node_id() -> NodeId {
    format!("{}-{}", id_prefixes::NODE, Uuid::new_v4())
}

/// Generate a fresh edge id
pub fn generate_edge_id() -> EdgeId {
    format!("{}-{}", id_prefixes::EDGE, Uuid::new_v4())
}

/// Collect root nodes and everything nested in them, depth-first
///
/// Each id appears once. Missing roots are skipped, and a visited set stops
/// malformed `filled_by` cycles from recursing forever.
pub fn collect_with_nested(root_ids: &[NodeId], nodes: &[Node]) -> Vec<NodeId> {
    let index: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut visited = HashSet::new();
    let mut collected = Vec::new();

    for root in root_ids {
        visit(root, &index, &mut visited, &mut collected);
    }
    collected
}

fn visit<'a>(
    id: &'a str,
    index: &HashMap<&str, &'a Node>,
    visited: &mut HashSet<&'a str>,
    collected: &mut Vec<NodeId>,
) {
    if !visited.insert(id) {
        return;
    }
    let Some(&node) = index.get(id) else {
        return;
    };
    collected.push(node.id.clone());
    for child in node.nested_ids() {
        visit(child, index, visited, collected);
    }
}

/// Clone root nodes with their nested dependents under fresh ids
///
/// Only clones that are not nested inside another clone are marked
/// selected. A `filled_by` that points outside the collected set is
/// cleared. With `include_edges`, edges fully inside the set are cloned
/// with fresh ids; edges crossing the boundary are always dropped.
pub fn clone_subgraph(
    root_ids: &[NodeId],
    nodes: &[Node],
    edges: &[Edge],
    options: CloneOptions,
) -> ClonedSubgraph {
    let collected = collect_with_nested(root_ids, nodes);
    if collected.is_empty() {
        return ClonedSubgraph::default();
    }

    let taken: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut id_map: HashMap<NodeId, NodeId> = HashMap::with_capacity(collected.len());
    for old_id in &collected {
        let mut new_id = generate_node_id();
        while taken.contains(new_id.as_str()) || id_map.values().any(|v| *v == new_id) {
            new_id = generate_node_id();
        }
        id_map.insert(old_id.clone(), new_id);
    }

    let index: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    // Nodes plugged into a slot of another collected node
    let nested: HashSet<&str> = collected
        .iter()
        .filter_map(|id| index.get(id.as_str()).copied())
        .flat_map(|n| n.nested_ids())
        .map(|id| id.as_str())
        .filter(|id| id_map.contains_key(*id))
        .collect();

    let cloned_nodes: Vec<Node> = collected
        .iter()
        .filter_map(|old_id| index.get(old_id.as_str()).copied())
        .map(|original| {
            let mut node = original.clone();
            node.id = id_map[&original.id].clone();
            node.position = (
                original.position.0 + options.offset,
                original.position.1 + options.offset,
            );
            node.selected = !nested.contains(original.id.as_str());
            for slot in &mut node.slots {
                slot.filled_by = slot
                    .filled_by
                    .as_ref()
                    .and_then(|old| id_map.get(old))
                    .cloned();
            }
            node
        })
        .collect();

    let cloned_edges: Vec<Edge> = if options.include_edges {
        edges
            .iter()
            .filter_map(|edge| {
                let source = id_map.get(&edge.source)?;
                let target = id_map.get(&edge.target)?;
                Some(Edge {
                    id: generate_edge_id(),
                    source: source.clone(),
                    source_handle: edge.source_handle.clone(),
                    target: target.clone(),
                    target_handle: edge.target_handle.clone(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    log::debug!(
        "Cloned {} nodes and {} edges from {} roots",
        cloned_nodes.len(),
        cloned_edges.len(),
        root_ids.len()
    );

    ClonedSubgraph {
        nodes: cloned_nodes,
        edges: cloned_edges,
        id_map,
    }
}
