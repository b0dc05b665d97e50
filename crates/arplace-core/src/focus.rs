//! Focus indicator: the cursor showing where a new object would land

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anchor::{AnchorId, AnchorRegistry};
use crate::camera::Camera;
use crate::config::FocusConfig;
use crate::frame::TrackingQuery;
use crate::hit_test::{HitTestEngine, HitTestResult};
use crate::spatial::{Point3D, Pose, Quaternion};

/// Pose of a shown indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPose {
    pub position: Point3D,
    pub orientation: Quaternion,
    /// Detected plane under the indicator, if any
    pub plane: Option<AnchorId>,
    /// Whether the last hit came from a surface rather than a feature point
    pub on_plane: bool,
}

impl FocusPose {
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FocusState {
    #[default]
    Hidden,
    Shown(FocusPose),
}

/// Outcome of one tracking tick, decided off the executor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusUpdate {
    /// A placed object is in view
    Hide,
    Show {
        hit: HitTestResult,
        orientation: Quaternion,
    },
    /// Nothing resolved this tick; keep whatever is shown
    Retain,
}

/// What the renderer draws; a hidden indicator carries no pose
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FocusView {
    pub visible: bool,
    pub pose: Option<Pose>,
    pub on_plane: bool,
}

#[derive(Debug, Clone)]
pub struct FocusIndicator {
    state: FocusState,
    last_good: Option<FocusPose>,
    recent: VecDeque<Point3D>,
    window: usize,
    acquired: bool,
}

impl FocusIndicator {
    pub fn new(config: &FocusConfig) -> Self {
        let window = config.smoothing_window.max(1);
        Self {
            state: FocusState::Hidden,
            last_good: None,
            recent: VecDeque::with_capacity(window),
            window,
            acquired: false,
        }
    }

    /// Decide this tick's transition from a scene snapshot.
    ///
    /// Any object inside the frustum hides the indicator regardless of what
    /// the viewport center would hit.
    pub fn evaluate(
        engine: &HitTestEngine,
        camera: &Camera,
        registry: &AnchorRegistry,
        object_positions: impl IntoIterator<Item = Point3D>,
        frame: &dyn TrackingQuery,
    ) -> FocusUpdate {
        if object_positions.into_iter().any(|p| camera.is_visible(p)) {
            return FocusUpdate::Hide;
        }
        match engine.resolve(camera.viewport_center(), camera, registry, frame) {
            Some(hit) => FocusUpdate::Show {
                hit,
                orientation: Quaternion::from_yaw(camera.pose.yaw()),
            },
            None => FocusUpdate::Retain,
        }
    }

    /// Apply a transition. Returns `true` the first time a position is
    /// resolved since creation or the last reset.
    pub fn apply(&mut self, update: FocusUpdate) -> bool {
        match update {
            FocusUpdate::Hide => {
                self.state = FocusState::Hidden;
                false
            }
            FocusUpdate::Retain => false,
            FocusUpdate::Show { hit, orientation } => {
                if self.recent.len() == self.window {
                    self.recent.pop_front();
                }
                self.recent.push_back(hit.position);
                let position = Point3D::centroid(self.recent.iter()).unwrap_or(hit.position);
                let pose = FocusPose {
                    position,
                    orientation,
                    plane: hit.plane,
                    on_plane: hit.kind.is_plane(),
                };
                self.state = FocusState::Shown(pose);
                self.last_good = Some(pose);

                let first = !self.acquired;
                if first {
                    debug!(x = position.x, y = position.y, z = position.z, "Focus acquired");
                    self.acquired = true;
                }
                first
            }
        }
    }

    /// Drop references to a plane that no longer exists
    pub fn release_plane(&mut self, anchor: AnchorId) {
        if let FocusState::Shown(pose) = &mut self.state {
            if pose.plane == Some(anchor) {
                pose.plane = None;
            }
        }
        if let Some(pose) = &mut self.last_good {
            if pose.plane == Some(anchor) {
                pose.plane = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = FocusState::Hidden;
        self.last_good = None;
        self.recent.clear();
        self.acquired = false;
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn last_known_good(&self) -> Option<FocusPose> {
        self.last_good
    }

    pub fn view(&self) -> FocusView {
        match self.state {
            FocusState::Hidden => FocusView::default(),
            FocusState::Shown(pose) => FocusView {
                visible: true,
                pose: Some(pose.pose()),
                on_plane: pose.on_plane,
            },
        }
    }
}

impl Default for FocusIndicator {
    fn default() -> Self {
        Self::new(&FocusConfig::default())
    }
}
