//! Executor-owned collection of placed objects

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{ObjectHandle, ObjectStatus, VirtualObject};
use crate::anchor::{AnchorId, Plane};
use crate::config::SnappingConfig;
use crate::error::{PlacementError, Result};
use crate::spatial::Pose;

#[derive(Debug, Clone, Default)]
pub struct VirtualObjectSet {
    objects: BTreeMap<ObjectHandle, VirtualObject>,
}

impl VirtualObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new object. A handle that is already present is left alone.
    pub fn insert(&mut self, object: VirtualObject) -> bool {
        if self.objects.contains_key(&object.handle) {
            warn!(handle = %object.handle, "Ignoring insert for an existing handle");
            return false;
        }
        self.objects.insert(object.handle, object);
        true
    }

    pub fn remove(&mut self, handle: ObjectHandle) -> Result<VirtualObject> {
        self.objects
            .remove(&handle)
            .ok_or(PlacementError::UnknownHandle(handle))
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&VirtualObject> {
        self.objects.get(&handle)
    }

    fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut VirtualObject> {
        self.objects
            .get_mut(&handle)
            .ok_or(PlacementError::UnknownHandle(handle))
    }

    pub fn move_to(
        &mut self,
        handle: ObjectHandle,
        pose: Pose,
        plane: Option<AnchorId>,
    ) -> Result<()> {
        let object = self.get_mut(handle)?;
        object.pose = pose;
        object.plane = plane;
        Ok(())
    }

    pub fn set_dragging(&mut self, handle: ObjectHandle, dragging: bool) -> Result<()> {
        self.get_mut(handle)?.dragging = dragging;
        Ok(())
    }

    pub fn mark_ready(&mut self, handle: ObjectHandle) -> Result<()> {
        self.get_mut(handle)?.status = ObjectStatus::Ready;
        Ok(())
    }

    /// Clear back-references to a removed plane; returns how many were cleared
    pub fn release_plane(&mut self, anchor: AnchorId) -> usize {
        let mut released = 0;
        for object in self.objects.values_mut() {
            if object.plane == Some(anchor) {
                object.plane = None;
                released += 1;
            }
        }
        released
    }

    /// Pull resting objects that hover just above or below `plane` onto it
    /// and anchor them there. Objects being dragged are skipped. Returns the
    /// handles that moved.
    pub fn snap_onto(&mut self, plane: &Plane, rules: &SnappingConfig) -> Vec<ObjectHandle> {
        let normal = plane.normal().normalize();
        let mut moved = Vec::new();
        for object in self.objects.values_mut() {
            if object.dragging || !plane.contains(object.pose.position) {
                continue;
            }
            let height = plane.height_of(object.pose.position);
            if height.abs() >= rules.vertical_allowance {
                continue;
            }
            object.plane = Some(plane.anchor);
            if height.abs() > rules.epsilon {
                object.pose.position = object.pose.position + normal * -height;
                debug!(handle = %object.handle, anchor = %plane.anchor, height, "Snapped onto plane");
                moved.push(object.handle);
            }
        }
        moved
    }

    /// Objects in placement order
    pub fn iter(&self) -> impl Iterator<Item = &VirtualObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
