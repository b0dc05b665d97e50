//! Runtime configuration for the placement core.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! [hit_test]
//! infinite_planes = true
//!
//! [gesture]
//! drag_threshold_px = 20.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub hit_test: HitTestConfig,
    pub focus: FocusConfig,
    pub gesture: GestureConfig,
    pub guidance: GuidanceConfig,
    pub snapping: SnappingConfig,
}

/// Parameters of the world-position resolution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    /// Allow hits on the unbounded plane of detected surfaces
    pub infinite_planes: bool,
    /// Rays with |dot(direction, normal)| below this are treated as parallel
    pub parallel_epsilon: f32,
    /// Full opening angle of the feature-point search cone, in degrees
    pub feature_cone_degrees: f32,
    /// Nearest feature distance along the ray accepted by the cone search
    pub feature_min_distance: f32,
    /// Farthest feature distance along the ray accepted by the cone search
    pub feature_max_distance: f32,
    /// Estimated-plane hits farther than this from the camera are ignored
    pub estimate_max_distance: f32,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            infinite_planes: false,
            parallel_epsilon: 1e-6,
            feature_cone_degrees: 18.0,
            feature_min_distance: 0.2,
            feature_max_distance: 3.0,
            estimate_max_distance: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Number of recent hit positions averaged into the shown position
    pub smoothing_window: usize,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Touches within this many pixels of an object's projection grab it
    pub pick_radius_px: f32,
    /// Finger travel required before a drag starts moving the object
    pub drag_threshold_px: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pick_radius_px: 60.0,
            drag_threshold_px: 30.0,
        }
    }
}

/// Delays, in seconds, before timed hints are delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    pub plane_estimation_secs: f32,
    pub content_placement_secs: f32,
    pub focus_hint_secs: f32,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            plane_estimation_secs: 7.5,
            content_placement_secs: 7.5,
            focus_hint_secs: 5.0,
        }
    }
}

fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or_default()
}

impl GuidanceConfig {
    pub fn plane_estimation(&self) -> Duration {
        secs(self.plane_estimation_secs)
    }

    pub fn content_placement(&self) -> Duration {
        secs(self.content_placement_secs)
    }

    pub fn focus_hint(&self) -> Duration {
        secs(self.focus_hint_secs)
    }
}

/// Rules for moving resting objects onto newly detected planes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnappingConfig {
    /// Objects closer than this vertically are pulled onto the plane
    pub vertical_allowance: f32,
    /// Objects closer than this are considered already resting on it
    pub epsilon: f32,
}

impl Default for SnappingConfig {
    fn default() -> Self {
        Self {
            vertical_allowance: 0.05,
            epsilon: 0.001,
        }
    }
}

impl PlacementConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| PlacementError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlacementError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let hit = &self.hit_test;
        if !(hit.parallel_epsilon > 0.0) {
            return Err(PlacementError::Config(
                "hit_test.parallel_epsilon must be positive".into(),
            ));
        }
        if !(hit.feature_cone_degrees > 0.0 && hit.feature_cone_degrees < 180.0) {
            return Err(PlacementError::Config(
                "hit_test.feature_cone_degrees must be in (0, 180)".into(),
            ));
        }
        if hit.feature_min_distance < 0.0 || hit.feature_max_distance <= hit.feature_min_distance
        {
            return Err(PlacementError::Config(
                "hit_test feature distances must satisfy 0 <= min < max".into(),
            ));
        }
        if self.focus.smoothing_window == 0 {
            return Err(PlacementError::Config(
                "focus.smoothing_window must be at least 1".into(),
            ));
        }
        let g = &self.guidance;
        for (name, secs) in [
            ("plane_estimation_secs", g.plane_estimation_secs),
            ("content_placement_secs", g.content_placement_secs),
            ("focus_hint_secs", g.focus_hint_secs),
        ] {
            if !(secs >= 0.0 && secs.is_finite()) {
                return Err(PlacementError::Config(format!(
                    "guidance.{name} must be a non-negative number of seconds"
                )));
            }
        }
        if self.gesture.pick_radius_px < 0.0 || self.gesture.drag_threshold_px < 0.0 {
            return Err(PlacementError::Config(
                "gesture distances must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
