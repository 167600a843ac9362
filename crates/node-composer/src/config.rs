//! Editor configuration
//!
//! Tunables the host application may override: snapping, the magnetic
//! release threshold, paste offset and history depth.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::Result;

/// Configuration for a composer instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Snap grid cell size in pixels (x, y); 0 disables snapping on that axis
    pub snap_grid: (f64, f64),
    /// Distance in pixels the cursor must travel from a slot edge to release a capture
    pub magnetic_release_distance: f64,
    /// Zoom level the rendering layer should start with
    pub default_zoom: f64,
    /// Offset applied to pasted and duplicated nodes
    pub paste_offset: f64,
    /// Maximum number of undo snapshots
    pub undo_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_grid: defaults::SNAP_GRID,
            magnetic_release_distance: defaults::MAGNETIC_RELEASE_DISTANCE,
            default_zoom: defaults::DEFAULT_ZOOM,
            paste_offset: defaults::PASTE_OFFSET,
            undo_limit: defaults::UNDO_LIMIT,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON configuration document
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Set the magnetic release distance
    pub fn with_release_distance(mut self, distance: f64) -> Self {
        self.magnetic_release_distance = distance;
        self
    }

    /// Set the snap grid
    pub fn with_snap_grid(mut self, x: f64, y: f64) -> Self {
        self.snap_grid = (x, y);
        self
    }

    /// Round a position to the nearest snap grid point
    pub fn snap(&self, position: (f64, f64)) -> (f64, f64) {
        (
            snap_axis(position.0, self.snap_grid.0),
            snap_axis(position.1, self.snap_grid.1),
        )
    }
}

fn snap_axis(value: f64, cell: f64) -> f64 {
    if cell > 0.0 {
        (value / cell).round() * cell
    } else {
        value
    }
}
