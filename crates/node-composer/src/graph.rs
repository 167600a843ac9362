//! Graph store
//!
//! `ComposerGraph` exclusively owns the node and edge collections. Every
//! mutation keeps the structural invariants by construction:
//!
//! - a slot's `filled_by` always names an existing node
//! - a node fills at most one slot, never its own, and never an ancestor's
//! - every edge joins an existing output port to an existing input port
//!
//! Mutations that would break one of these are silently ignored and
//! reported through their return value.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::clone::collect_with_nested;
use crate::error::{ComposerError, Result};
use crate::signature::node_fits;
use crate::types::{Connection, Edge, Node, NodeId};
use crate::validation::{is_valid_connection, validate_graph, ValidationError};
use crate::visibility;

/// The canonical node/edge store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposerGraph {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl ComposerGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph from raw collections without checking them
    ///
    /// Use `from_json` or `validate_graph` when the input is untrusted.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Load a graph from JSON, rejecting structurally broken graphs
    pub fn from_json(json: &str) -> Result<Self> {
        let graph: ComposerGraph = serde_json::from_str(json)?;
        let errors = validate_graph(&graph);
        if !errors.is_empty() {
            log_rejection(&errors);
            let summary: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(ComposerError::invalid_graph(summary.join("; ")));
        }
        log::debug!(
            "Loaded graph with {} nodes and {} edges",
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    /// Serialize the graph to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// All nodes, nested ones included
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Check whether a node exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.find_node(id).is_some()
    }

    /// Nodes rendered directly on the canvas
    pub fn visible_nodes(&self) -> Vec<&Node> {
        visibility::visible_nodes(&self.nodes)
    }

    /// Find the slot a node is plugged into, as `(parent_id, slot_id)`
    pub fn parent_of(&self, node_id: &str) -> Option<(&str, &str)> {
        self.nodes.iter().find_map(|n| {
            n.slots
                .iter()
                .find(|s| s.filled_by.as_deref() == Some(node_id))
                .map(|s| (n.id.as_str(), s.id.as_str()))
        })
    }

    /// Plug a node into an empty, compatible slot
    ///
    /// Returns whether the fill was applied. It is a no-op when the parent,
    /// slot or node is missing, the slot is already filled, the node's
    /// signature does not cover the slot, the node already fills another
    /// slot, or the fill would make the node nest inside itself.
    pub fn fill_slot(&mut self, parent_id: &str, slot_id: &str, node_id: &str) -> bool {
        if let Err(reason) = self.check_fill(parent_id, slot_id, node_id) {
            log::debug!(
                "Ignored fill of slot '{}:{}' with '{}': {}",
                parent_id,
                slot_id,
                node_id,
                reason
            );
            return false;
        }

        let Some(slot) = self
            .find_node_mut(parent_id)
            .and_then(|parent| parent.find_slot_mut(slot_id))
        else {
            return false;
        };
        slot.filled_by = Some(node_id.to_string());
        log::debug!("Filled slot '{}:{}' with '{}'", parent_id, slot_id, node_id);
        true
    }

    fn check_fill(&self, parent_id: &str, slot_id: &str, node_id: &str) -> std::result::Result<(), &'static str> {
        let parent = self.find_node(parent_id).ok_or("parent not found")?;
        let slot = parent.find_slot(slot_id).ok_or("slot not found")?;
        let node = self.find_node(node_id).ok_or("node not found")?;

        if slot.is_filled() {
            return Err("slot already filled");
        }
        if !node_fits(&slot.accepts, node) {
            return Err("signature mismatch");
        }
        if self.parent_of(node_id).is_some() {
            return Err("node already fills a slot");
        }
        // The parent must not live inside the candidate's own subtree
        let subtree = collect_with_nested(&[node_id.to_string()], &self.nodes);
        if subtree.iter().any(|id| id == parent_id) {
            return Err("fill would create a nesting cycle");
        }
        Ok(())
    }

    /// Eject the node plugged into a slot
    ///
    /// The ejected node becomes the only selected node so it can be dragged
    /// right away; the parent and every other node are deselected. Returns
    /// the ejected node's id, or `None` if the slot was empty or missing.
    pub fn clear_slot(&mut self, parent_id: &str, slot_id: &str) -> Option<NodeId> {
        let ejected = self
            .find_node_mut(parent_id)?
            .find_slot_mut(slot_id)?
            .filled_by
            .take()?;

        for node in &mut self.nodes {
            node.selected = node.id == ejected;
        }
        log::debug!("Ejected '{}' from slot '{}:{}'", ejected, parent_id, slot_id);
        Some(ejected)
    }

    /// Add an edge if the connection is valid
    ///
    /// Returns whether the edge was added.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let candidate = Connection::new(
            edge.source.clone(),
            edge.source_handle.clone(),
            edge.target.clone(),
            edge.target_handle.clone(),
        );
        if !is_valid_connection(&candidate, &self.nodes) {
            log::debug!("Rejected edge '{}': invalid connection", edge.id);
            return false;
        }
        if self.edges.iter().any(|e| e.id == edge.id) {
            log::debug!("Rejected edge '{}': duplicate id", edge.id);
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Remove every edge whose source or target is one of the given nodes
    ///
    /// Returns the number of edges removed.
    pub fn remove_edges_touching(&mut self, node_ids: &HashSet<&str>) -> usize {
        let before = self.edges.len();
        self.edges
            .retain(|e| !(node_ids.contains(e.source.as_str()) || node_ids.contains(e.target.as_str())));
        before - self.edges.len()
    }

    /// Remove nodes, their edges, and any slot fills pointing at them
    ///
    /// Returns the removed nodes.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Vec<Node> {
        let doomed: HashSet<&str> = ids.iter().map(|id| id.as_str()).collect();
        if doomed.is_empty() {
            return Vec::new();
        }

        let edges_removed = self.remove_edges_touching(&doomed);

        let (removed, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| doomed.contains(n.id.as_str()));
        self.nodes = kept;

        for slot in self.nodes.iter_mut().flat_map(|n| n.slots.iter_mut()) {
            if slot
                .filled_by
                .as_deref()
                .is_some_and(|id| doomed.contains(id))
            {
                slot.filled_by = None;
            }
        }

        log::debug!(
            "Removed {} nodes and {} edges",
            removed.len(),
            edges_removed
        );
        removed
    }

    /// Bulk-insert nodes and edges, e.g. a paste or duplicate result
    ///
    /// Nodes whose id is already taken are skipped. Incoming slot fills are
    /// re-applied one by one under the same rules as `fill_slot`; a fill that
    /// dangles, points at its own node, reuses an already nested node or
    /// would close a nesting cycle is cleared. Edges that do not form a
    /// valid connection after the nodes are in place are dropped.
    pub fn add_nodes(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> usize {
        let mut added = 0;
        let mut pending_fills = Vec::new();
        for mut node in nodes {
            if self.contains_node(&node.id) {
                log::warn!("Skipped node '{}': id already in use", node.id);
                continue;
            }
            for slot in &mut node.slots {
                if let Some(child) = slot.filled_by.take() {
                    pending_fills.push((node.id.clone(), slot.id.clone(), child));
                }
            }
            self.nodes.push(node);
            added += 1;
        }

        for (parent_id, slot_id, child) in pending_fills {
            if let Err(reason) = self.check_fill(&parent_id, &slot_id, &child) {
                log::warn!(
                    "Cleared fill of slot '{}:{}' with '{}': {}",
                    parent_id,
                    slot_id,
                    child,
                    reason
                );
                continue;
            }
            if let Some(slot) = self
                .find_node_mut(&parent_id)
                .and_then(|parent| parent.find_slot_mut(&slot_id))
            {
                slot.filled_by = Some(child);
            }
        }

        for edge in edges {
            self.add_edge(edge);
        }
        added
    }

    /// Replace the whole graph content
    ///
    /// The replacement is checked with `validate_graph` first. Returns false
    /// and leaves the graph untouched if it has any structural problem.
    pub fn replace_all(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> bool {
        let candidate = ComposerGraph::from_parts(nodes, edges);
        let errors = validate_graph(&candidate);
        if !errors.is_empty() {
            log_rejection(&errors);
            return false;
        }
        *self = candidate;
        true
    }

    /// Select a node, optionally keeping the existing selection
    ///
    /// Returns false if the node does not exist.
    pub fn select_node(&mut self, id: &str, additive: bool) -> bool {
        if !self.contains_node(id) {
            return false;
        }
        for node in &mut self.nodes {
            if node.id == id {
                node.selected = true;
            } else if !additive {
                node.selected = false;
            }
        }
        true
    }

    /// Deselect every node
    pub fn clear_selection(&mut self) {
        for node in &mut self.nodes {
            node.selected = false;
        }
    }

    /// IDs of the selected nodes, in collection order
    pub fn selected_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Move a node to a new canvas position
    pub fn move_node(&mut self, id: &str, position: (f64, f64)) -> bool {
        match self.find_node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }
}

fn log_rejection(errors: &[ValidationError]) {
    for error in errors {
        log::warn!("Rejected graph: {}", error);
    }
}
