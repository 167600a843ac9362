//! Slot signature compatibility
//!
//! A candidate node can fill a slot when its ports *cover* the slot's
//! required signature: every required input has some candidate input of a
//! compatible type, and every required output has some candidate output of a
//! compatible type. Extra candidate ports are fine and order is irrelevant.

use crate::types::{Node, NodeSignature, Port};

/// Check whether a candidate's ports satisfy a slot's required signature
pub fn can_fill_slot(
    required: &NodeSignature,
    candidate_inputs: &[Port],
    candidate_outputs: &[Port],
) -> bool {
    covers(&required.inputs, candidate_inputs) && covers(&required.outputs, candidate_outputs)
}

/// Check whether a node's actual signature satisfies a slot's requirement
pub fn node_fits(required: &NodeSignature, node: &Node) -> bool {
    can_fill_slot(required, &node.inputs, &node.outputs)
}

fn covers(required: &[Port], available: &[Port]) -> bool {
    required.iter().all(|r| {
        available
            .iter()
            .any(|c| c.port_type.is_compatible_with(&r.port_type))
    })
}
