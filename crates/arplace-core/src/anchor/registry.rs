//! Registry of detected planes

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::{AnchorId, Extent, Plane};
use crate::error::{PlacementError, Result};
use crate::spatial::Pose;

/// Lifecycle notifications emitted by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    PlaneAdded(AnchorId),
    PlaneRemoved(AnchorId),
}

/// Planes keyed by anchor identifier, at most one per anchor
#[derive(Debug, Clone, Default)]
pub struct AnchorRegistry {
    planes: BTreeMap<AnchorId, Plane>,
    events: Vec<RegistryEvent>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a plane for a newly reported anchor
    pub fn add_plane(&mut self, anchor: AnchorId, pose: Pose, extent: Extent) -> Result<()> {
        if self.planes.contains_key(&anchor) {
            warn!(%anchor, "Ignoring add for an anchor that is already registered");
            return Err(PlacementError::DuplicateAnchor(anchor));
        }
        info!(%anchor, x = extent.x, z = extent.z, "Surface detected");
        self.planes.insert(anchor, Plane::new(anchor, pose, extent));
        self.events.push(RegistryEvent::PlaneAdded(anchor));
        Ok(())
    }

    /// Update a plane in place. Unknown anchors are ignored, returning `false`.
    pub fn update_plane(&mut self, anchor: AnchorId, pose: Pose, extent: Extent) -> bool {
        match self.planes.get_mut(&anchor) {
            Some(plane) => {
                plane.update(pose, extent);
                true
            }
            None => {
                debug!(%anchor, "Update for unknown anchor ignored");
                false
            }
        }
    }

    /// Remove a plane, returning whether one was present
    pub fn remove_plane(&mut self, anchor: AnchorId) -> bool {
        if self.planes.remove(&anchor).is_some() {
            info!(%anchor, "Surface lost");
            self.events.push(RegistryEvent::PlaneRemoved(anchor));
            true
        } else {
            false
        }
    }

    pub fn get(&self, anchor: &AnchorId) -> Option<&Plane> {
        self.planes.get(anchor)
    }

    pub fn contains(&self, anchor: &AnchorId) -> bool {
        self.planes.contains_key(anchor)
    }

    /// Planes ordered by anchor identifier
    pub fn planes(&self) -> impl Iterator<Item = &Plane> {
        self.planes.values()
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Drain the notifications accumulated since the last call
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forget every plane without emitting notifications
    pub fn clear(&mut self) {
        self.planes.clear();
        self.events.clear();
    }
}
