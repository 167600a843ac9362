//! Slot rectangle registry
//!
//! The rendering layer owns slot geometry. It registers each slot's current
//! screen rectangle as the slot mounts or moves and unregisters it on
//! unmount. The drag controller reads the latest rectangles on every move.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::types::{NodeId, SlotId};

/// Identifies one slot system-wide; renders as `"{parent_id}:{slot_id}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    /// Node owning the slot
    pub parent_id: NodeId,
    /// Slot id within the parent
    pub slot_id: SlotId,
}

impl SlotKey {
    pub fn new(parent_id: impl Into<String>, slot_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            slot_id: slot_id.into(),
        }
    }

    /// Parse the `"{parent_id}:{slot_id}"` form, splitting on the first `:`
    pub fn parse(key: &str) -> Option<Self> {
        let (parent_id, slot_id) = key.split_once(':')?;
        Some(Self::new(parent_id, slot_id))
    }

    /// Whether the slot belongs to the given node
    pub fn belongs_to(&self, node_id: &str) -> bool {
        self.parent_id == node_id
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.parent_id, self.slot_id)
    }
}

/// Latest known screen rectangle of every mounted slot
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    rects: BTreeMap<SlotKey, Rect>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or update a slot's rectangle
    pub fn register(&mut self, key: SlotKey, rect: Rect) {
        self.rects.insert(key, rect);
    }

    /// Forget a slot's rectangle
    pub fn unregister(&mut self, key: &SlotKey) -> Option<Rect> {
        self.rects.remove(key)
    }

    /// Forget every slot rectangle owned by a node
    pub fn unregister_node(&mut self, node_id: &str) -> usize {
        let before = self.rects.len();
        self.rects.retain(|key, _| !key.belongs_to(node_id));
        before - self.rects.len()
    }

    pub fn get(&self, key: &SlotKey) -> Option<&Rect> {
        self.rects.get(key)
    }

    /// Iterate registered slots in key order
    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &Rect)> {
        self.rects.iter()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_key_format_and_parse() {
        let key = SlotKey::new("map", "fn");
        assert_eq!(key.to_string(), "map:fn");
        assert_eq!(SlotKey::parse("map:fn"), Some(key));

        // Only the first colon separates parent from slot
        let nested = SlotKey::parse("a:b:c").unwrap();
        assert_eq!(nested.parent_id, "a");
        assert_eq!(nested.slot_id, "b:c");

        assert_eq!(SlotKey::parse("no-colon"), None);
    }

    #[test]
    fn test_register_update_unregister() {
        let mut registry = SlotRegistry::new();
        let key = SlotKey::new("a", "s");
        registry.register(key.clone(), Rect::new(0.0, 0.0, 10.0, 10.0));
        registry.register(key.clone(), Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&key).unwrap().left, 5.0);

        assert!(registry.unregister(&key).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_node() {
        let mut registry = SlotRegistry::new();
        registry.register(SlotKey::new("a", "s1"), Rect::default());
        registry.register(SlotKey::new("a", "s2"), Rect::default());
        registry.register(SlotKey::new("b", "s1"), Rect::default());

        assert_eq!(registry.unregister_node("a"), 2);
        assert_eq!(registry.len(), 1);
    }
}
