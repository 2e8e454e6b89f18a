//! Tunable behavior of the canvas engine.

use crate::camera::ZoomLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration. Every field has a default, so partial JSON is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Allowed zoom range.
    pub zoom_limits: ZoomLimits,
    /// Ctrl+wheel changes zoom by `delta_y / wheel_zoom_divisor`.
    pub wheel_zoom_divisor: f64,
    /// Multiplier applied to wheel deltas when panning.
    pub wheel_pan_speed: f64,
    /// Screen pixels the pointer must travel before a press becomes a drag.
    pub drag_threshold: f64,
    /// Handle hit radius in screen pixels.
    pub handle_hit_tolerance: f64,
    /// Extra hit slop around connectors, in screen pixels.
    pub connector_hit_tolerance: f64,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Quiet period before a pending change is written to storage.
    pub autosave_quiet_period_ms: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom_limits: ZoomLimits::default(),
            wheel_zoom_divisor: 1000.0,
            wheel_pan_speed: 0.3,
            drag_threshold: 3.0,
            handle_hit_tolerance: 8.0,
            connector_hit_tolerance: 4.0,
            history_limit: 50,
            autosave_quiet_period_ms: 1000,
        }
    }
}

impl CanvasConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn autosave_quiet_period(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_period_ms)
    }
}
