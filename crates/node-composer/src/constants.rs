//! Editor-wide constants
//!
//! Single source of truth for interaction thresholds and editor defaults.

/// Default values for editor configuration
pub mod defaults {
    /// Snap grid cell size in pixels (x, y)
    pub const SNAP_GRID: (f64, f64) = (8.0, 8.0);
    /// Distance in pixels the cursor must travel away from a capturing slot's edge to release it
    pub const MAGNETIC_RELEASE_DISTANCE: f64 = 20.0;
    /// Default zoom level
    pub const DEFAULT_ZOOM: f64 = 1.0;
    /// Offset applied to both axes of pasted and duplicated nodes
    pub const PASTE_OFFSET: f64 = 50.0;
    /// Maximum number of undo snapshots kept
    pub const UNDO_LIMIT: usize = 100;
}

/// Prefixes for generated identifiers
pub mod id_prefixes {
    /// Prefix for generated node ids
    pub const NODE: &str = "node";
    /// Prefix for generated edge ids
    pub const EDGE: &str = "edge";
}

/// Render colors for port types
pub mod port_colors {
    pub const STRING: &str = "#22c55e";
    pub const NUMBER: &str = "#3b82f6";
    pub const BOOLEAN: &str = "#f59e0b";
    pub const OBJECT: &str = "#8b5cf6";
    pub const ARRAY: &str = "#ec4899";
    pub const ANY: &str = "#6b7280";
}
