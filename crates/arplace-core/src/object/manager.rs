//! Input-side object operations
//!
//! The manager resolves hits against the latest scene snapshot and submits
//! the resulting mutations; it never writes shared state itself. Handles it
//! hands out are usable immediately, before the executor has applied the
//! insert.

use std::collections::HashMap;

use tracing::{debug, info};

use super::{ObjectHandle, VirtualObject};
use crate::anchor::AnchorId;
use crate::camera::{Camera, ScreenPoint};
use crate::config::GestureConfig;
use crate::error::{PlacementError, Result};
use crate::executor::{Mutation, MutationQueue, SceneReader, SceneSnapshot};
use crate::frame::TrackingQuery;
use crate::hit_test::{DragConstraint, HitTestEngine, HitTestResult};
use crate::spatial::{Pose, Quaternion};

/// Per-handle drag bookkeeping
#[derive(Debug, Clone, Copy)]
struct DragState {
    /// Plane the object is anchored to, preferred when re-intersecting
    plane: Option<AnchorId>,
    height: f32,
    rotation: Quaternion,
}

/// Single-finger touch being tracked by the gesture layer
#[derive(Debug, Clone, Copy)]
pub(super) struct ActiveTouch {
    pub(super) handle: Option<ObjectHandle>,
    pub(super) start: ScreenPoint,
    pub(super) moving: bool,
}

#[derive(Debug)]
pub struct VirtualObjectManager {
    queue: MutationQueue,
    reader: SceneReader,
    engine: HitTestEngine,
    pub(super) gesture: GestureConfig,
    next_handle: u64,
    /// Last pose and plane this manager submitted, per live handle
    submitted: HashMap<ObjectHandle, (Pose, Option<AnchorId>)>,
    drags: HashMap<ObjectHandle, DragState>,
    pub(super) touch: Option<ActiveTouch>,
}

impl VirtualObjectManager {
    pub fn new(
        queue: MutationQueue,
        reader: SceneReader,
        engine: HitTestEngine,
        gesture: GestureConfig,
    ) -> Self {
        Self {
            queue,
            reader,
            engine,
            gesture,
            next_handle: 1,
            submitted: HashMap::new(),
            drags: HashMap::new(),
            touch: None,
        }
    }

    pub fn snapshot(&self) -> std::sync::Arc<SceneSnapshot> {
        self.reader.snapshot()
    }

    /// Place a new object where `point` resolves, facing the camera's yaw
    pub fn place(
        &mut self,
        point: ScreenPoint,
        camera: &Camera,
        frame: &dyn TrackingQuery,
    ) -> Result<ObjectHandle> {
        let snapshot = self.reader.snapshot();
        let hit = self
            .engine
            .resolve(point, camera, snapshot.registry(), frame)
            .ok_or(PlacementError::NoPlacementSurface)?;

        let handle = ObjectHandle::new(self.next_handle);
        self.next_handle += 1;
        let pose = Pose::new(hit.position, Quaternion::from_yaw(camera.pose.yaw()));
        info!(%handle, kind = ?hit.kind, "Placing object");

        self.submitted.insert(handle, (pose, hit.plane));
        self.queue
            .submit(Mutation::InsertObject(VirtualObject::new(handle, pose, hit.plane)));
        Ok(handle)
    }

    /// Pose and plane of a handle, preferring what the executor has applied
    fn locate(&self, snapshot: &SceneSnapshot, handle: ObjectHandle) -> Option<(Pose, Option<AnchorId>)> {
        snapshot
            .object(handle)
            .map(|o| (o.pose, o.plane))
            .or_else(|| self.submitted.get(&handle).copied())
    }

    /// Start dragging an object. Returns `false` for unknown handles.
    pub fn begin_drag(&mut self, handle: ObjectHandle) -> bool {
        let snapshot = self.reader.snapshot();
        let Some((pose, plane)) = self.locate(&snapshot, handle) else {
            debug!(%handle, "Drag requested for unknown object");
            return false;
        };
        self.drags.insert(
            handle,
            DragState {
                plane: plane.filter(|anchor| snapshot.registry().contains(anchor)),
                height: pose.position.y,
                rotation: pose.rotation,
            },
        );
        debug!(%handle, "Drag started");
        self.queue.submit(Mutation::SetDragging {
            handle,
            dragging: true,
        });
        true
    }

    /// Move a dragged object to where `point` resolves. A miss leaves the
    /// object where it is and returns `None`.
    pub fn continue_drag(
        &mut self,
        handle: ObjectHandle,
        point: ScreenPoint,
        camera: &Camera,
        frame: &dyn TrackingQuery,
    ) -> Option<HitTestResult> {
        let snapshot = self.reader.snapshot();
        let Some(drag) = self.drags.get_mut(&handle) else {
            debug!(%handle, "continue_drag without begin_drag");
            return None;
        };

        if let Some(anchor) = drag.plane {
            if !snapshot.registry().contains(&anchor) {
                debug!(%handle, %anchor, "Anchored plane removed mid-drag");
                drag.plane = None;
            }
        }
        let constraint = DragConstraint {
            plane: drag.plane,
            object_height: Some(drag.height),
        };
        let hit =
            self.engine
                .resolve_for_drag(point, camera, snapshot.registry(), frame, &constraint)?;

        drag.plane = hit.plane;
        drag.height = hit.position.y;
        let pose = Pose::new(hit.position, drag.rotation);
        self.submitted.insert(handle, (pose, hit.plane));
        self.queue.submit(Mutation::MoveObject {
            handle,
            pose,
            plane: hit.plane,
        });
        Some(hit)
    }

    /// Finish a drag. Safe to call for handles that are not being dragged.
    pub fn end_drag(&mut self, handle: ObjectHandle) {
        if self.drags.remove(&handle).is_some() {
            debug!(%handle, "Drag ended");
            self.queue.submit(Mutation::SetDragging {
                handle,
                dragging: false,
            });
        }
    }

    pub fn is_dragging(&self, handle: ObjectHandle) -> bool {
        self.drags.contains_key(&handle)
    }

    /// Remove an object. Removing an unknown or already removed handle is a
    /// no-op.
    pub fn remove(&mut self, handle: ObjectHandle) {
        self.drags.remove(&handle);
        self.submitted.remove(&handle);
        if self.touch.is_some_and(|t| t.handle == Some(handle)) {
            self.touch = None;
        }
        self.queue.submit(Mutation::RemoveObject(handle));
    }

    /// Flag an object's assets as loaded, making it pickable by touch
    pub fn mark_ready(&self, handle: ObjectHandle) {
        self.queue.submit(Mutation::MarkReady(handle));
    }

    /// Objects as of the latest snapshot, in placement order
    pub fn objects(&self) -> Vec<VirtualObject> {
        self.reader.snapshot().objects().to_vec()
    }

    /// Objects known to exist, counting inserts not yet applied
    pub fn object_count(&self) -> usize {
        let snapshot = self.reader.snapshot();
        let pending = self
            .submitted
            .keys()
            .filter(|h| snapshot.object(**h).is_none())
            .count();
        snapshot.objects().len() + pending
    }

    /// Forget all drag and touch state. Scene contents are cleared by the
    /// executor's reset.
    pub fn reset(&mut self) {
        self.submitted.clear();
        self.drags.clear();
        self.touch = None;
    }

    /// Nearest ready object whose projection lies within the pick radius
    pub fn pick(&self, point: ScreenPoint, camera: &Camera) -> Option<ObjectHandle> {
        let snapshot = self.reader.snapshot();
        snapshot
            .objects()
            .iter()
            .filter(|o| o.is_ready())
            .filter_map(|o| {
                let screen = camera.project(o.pose.position)?;
                let distance = screen.distance(&point);
                (distance <= self.gesture.pick_radius_px).then_some((distance, o.handle))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, handle)| handle)
    }
}
