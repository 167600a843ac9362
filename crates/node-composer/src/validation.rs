//! Connection and graph validation
//!
//! `is_valid_connection` is the gate for new data edges. `validate_graph`
//! audits a whole graph (typically one loaded from outside) for broken
//! references, shared nested nodes and `filled_by` cycles.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::ComposerGraph;
use crate::types::{Connection, Node, PortType};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two nodes share an id
    DuplicateNodeId { node_id: String },
    /// A slot is filled by a node that does not exist
    DanglingSlotFill {
        node_id: String,
        slot_id: String,
        filled_by: String,
    },
    /// A node is plugged into more than one slot
    SharedNestedNode { node_id: String, slot_count: usize },
    /// A node is plugged into one of its own slots
    SelfFill { node_id: String, slot_id: String },
    /// `filled_by` links form a cycle through these nodes
    NestingCycle { node_ids: Vec<String> },
    /// An edge references a non-existent node
    UnknownNode { edge_id: String, node_id: String },
    /// An edge references a non-existent port
    UnknownPort {
        edge_id: String,
        node_id: String,
        port_id: String,
    },
    /// An edge connects incompatible port types
    IncompatiblePortTypes {
        edge_id: String,
        source_type: PortType,
        target_type: PortType,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => write!(f, "Duplicate node id '{}'", node_id),
            Self::DanglingSlotFill {
                node_id,
                slot_id,
                filled_by,
            } => write!(
                f,
                "Slot '{}' on node '{}' is filled by unknown node '{}'",
                slot_id, node_id, filled_by
            ),
            Self::SharedNestedNode {
                node_id,
                slot_count,
            } => write!(f, "Node '{}' fills {} slots", node_id, slot_count),
            Self::SelfFill { node_id, slot_id } => {
                write!(f, "Node '{}' fills its own slot '{}'", node_id, slot_id)
            }
            Self::NestingCycle { node_ids } => {
                write!(f, "Slot nesting cycle through: {}", node_ids.join(", "))
            }
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge_id, node_id)
            }
            Self::UnknownPort {
                edge_id,
                node_id,
                port_id,
            } => write!(
                f,
                "Edge '{}' references unknown port '{}' on node '{}'",
                edge_id, port_id, node_id
            ),
            Self::IncompatiblePortTypes {
                edge_id,
                source_type,
                target_type,
            } => write!(
                f,
                "Edge '{}' connects incompatible types: {} -> {}",
                edge_id, source_type, target_type
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Decide whether a proposed data connection is legal
///
/// Both endpoints must resolve: the source to an output port and the target
/// to an input port. The types must match exactly or either must be `Any`.
pub fn is_valid_connection(candidate: &Connection, nodes: &[Node]) -> bool {
    resolve_types(candidate, nodes)
        .map(|(source, target)| source.is_compatible_with(&target))
        .unwrap_or(false)
}

/// Resolve the port types at both ends of a connection
fn resolve_types(candidate: &Connection, nodes: &[Node]) -> Option<(PortType, PortType)> {
    let source = nodes.iter().find(|n| n.id == candidate.source)?;
    let target = nodes.iter().find(|n| n.id == candidate.target)?;
    let source_port = source.find_output(&candidate.source_handle)?;
    let target_port = target.find_input(&candidate.target_handle)?;
    Some((source_port.port_type, target_port.port_type))
}

/// Validate a composer graph
///
/// Returns all validation errors found (not just the first).
pub fn validate_graph(graph: &ComposerGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_unique_ids(graph, &mut errors);
    validate_slot_fills(graph, &mut errors);
    detect_nesting_cycles(graph, &mut errors);
    validate_edges(graph, &mut errors);

    errors
}

fn validate_unique_ids(graph: &ComposerGraph, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for node in graph.nodes() {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }
}

/// Check that every fill resolves, is not a self-fill and is not shared
fn validate_slot_fills(graph: &ComposerGraph, errors: &mut Vec<ValidationError>) {
    let mut fill_counts: HashMap<&str, usize> = HashMap::new();

    for node in graph.nodes() {
        for slot in &node.slots {
            let Some(filled_by) = slot.filled_by.as_deref() else {
                continue;
            };
            if filled_by == node.id {
                errors.push(ValidationError::SelfFill {
                    node_id: node.id.clone(),
                    slot_id: slot.id.clone(),
                });
            } else if graph.find_node(filled_by).is_none() {
                errors.push(ValidationError::DanglingSlotFill {
                    node_id: node.id.clone(),
                    slot_id: slot.id.clone(),
                    filled_by: filled_by.to_string(),
                });
            }
            *fill_counts.entry(filled_by).or_insert(0) += 1;
        }
    }

    let mut shared: Vec<(&str, usize)> = fill_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();
    shared.sort();
    for (node_id, slot_count) in shared {
        errors.push(ValidationError::SharedNestedNode {
            node_id: node_id.to_string(),
            slot_count,
        });
    }
}

/// Detect `filled_by` cycles using Kahn's algorithm
///
/// Self-fills are reported separately and skipped here.
fn detect_nesting_cycles(graph: &ComposerGraph, errors: &mut Vec<ValidationError>) {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in graph.nodes() {
        in_degree.insert(&node.id, 0);
    }
    for node in graph.nodes() {
        for child in node.nested_ids().filter(|c| **c != node.id) {
            if let Some(deg) = in_degree.get_mut(child.as_str()) {
                *deg += 1;
            }
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    while let Some(node_id) = queue.pop_front() {
        let Some(node) = graph.find_node(node_id) else {
            continue;
        };
        for child in node.nested_ids().filter(|c| **c != node.id) {
            if let Some(deg) = in_degree.get_mut(child.as_str()) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(child.as_str());
                }
            }
        }
    }

    let mut remaining: Vec<String> = in_degree
        .into_iter()
        .filter(|(_, deg)| *deg > 0)
        .map(|(id, _)| id.to_string())
        .collect();

    if !remaining.is_empty() {
        remaining.sort();
        errors.push(ValidationError::NestingCycle {
            node_ids: remaining,
        });
    }
}

/// Check that edge endpoints resolve and their port types agree
fn validate_edges(graph: &ComposerGraph, errors: &mut Vec<ValidationError>) {
    for edge in graph.edges() {
        let source = graph.find_node(&edge.source);
        let target = graph.find_node(&edge.target);

        if source.is_none() {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }
        if target.is_none() {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            });
        }
        let (Some(source), Some(target)) = (source, target) else {
            continue;
        };

        let source_port = source.find_output(&edge.source_handle);
        let target_port = target.find_input(&edge.target_handle);

        if source_port.is_none() {
            errors.push(ValidationError::UnknownPort {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
                port_id: edge.source_handle.clone(),
            });
        }
        if target_port.is_none() {
            errors.push(ValidationError::UnknownPort {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
                port_id: edge.target_handle.clone(),
            });
        }
        if let (Some(sp), Some(tp)) = (source_port, target_port) {
            if !sp.port_type.is_compatible_with(&tp.port_type) {
                errors.push(ValidationError::IncompatiblePortTypes {
                    edge_id: edge.id.clone(),
                    source_type: sp.port_type,
                    target_type: tp.port_type,
                });
            }
        }
    }
}
