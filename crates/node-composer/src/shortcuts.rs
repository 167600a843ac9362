//! Keyboard shortcut mapping
//!
//! Maps raw key events to editor actions. "mod" is Ctrl or Cmd. Every
//! shortcut is suppressed while a text input has focus so typing in node
//! fields never edits the graph.

use serde::{Deserialize, Serialize};

/// A key press as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInput {
    /// Key value, e.g. `"c"`, `"C"`, `"Delete"`
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
    /// Focus is inside an editable text field
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Hold Ctrl (or Cmd)
    pub fn with_mod(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }

    fn has_mod(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Editor action triggered by a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    /// Delete the selected nodes
    Delete,
    /// Copy the selection with the edges between selected nodes
    CopyWithConnections,
    /// Copy the selection without edges
    Copy,
    /// Paste the clipboard
    Paste,
    /// Copy and paste the selection in one step
    Duplicate,
}

/// Resolve a key press to an action
///
/// Keys are compared case-sensitively, the way browsers report them with
/// Shift applied: copy is `c`, paste is `v`, duplicate is `D`. Only the
/// shifted copy accepts either case, and it is checked before plain copy.
pub fn shortcut_for(input: &KeyInput) -> Option<ShortcutAction> {
    if input.in_text_input {
        return None;
    }

    match input.key.as_str() {
        "Delete" | "Backspace" => Some(ShortcutAction::Delete),
        "c" | "C" if input.has_mod() && input.shift => Some(ShortcutAction::CopyWithConnections),
        "c" if input.has_mod() => Some(ShortcutAction::Copy),
        "v" if input.has_mod() => Some(ShortcutAction::Paste),
        "D" if input.shift => Some(ShortcutAction::Duplicate),
        _ => None,
    }
}
