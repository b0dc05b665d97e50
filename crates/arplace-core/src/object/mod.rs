//! Placed virtual objects

mod gesture;
mod manager;
mod set;

pub use manager::VirtualObjectManager;
pub use set::VirtualObjectSet;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::anchor::AnchorId;
use crate::spatial::Pose;

/// Unique handle of a placed object. Handles increase monotonically, so
/// ordering by handle is placement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStatus {
    /// Model assets still loading; not pickable by touch
    #[default]
    Loading,
    Ready,
}

/// A user-placed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualObject {
    pub handle: ObjectHandle,
    pub pose: Pose,
    /// Plane the object rests on. Looked up in the registry, never owned;
    /// cleared when the plane is removed.
    pub plane: Option<AnchorId>,
    pub status: ObjectStatus,
    pub dragging: bool,
}

impl VirtualObject {
    pub fn new(handle: ObjectHandle, pose: Pose, plane: Option<AnchorId>) -> Self {
        Self {
            handle,
            pose,
            plane,
            status: ObjectStatus::Loading,
            dragging: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ObjectStatus::Ready
    }
}
