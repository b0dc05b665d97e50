//! Single-finger touch sequences mapped onto object operations

use tracing::{debug, warn};

use super::manager::ActiveTouch;
use super::{ObjectHandle, VirtualObjectManager};
use crate::camera::Camera;
use crate::frame::TrackingQuery;
use crate::input::{TouchEvent, TouchOutcome};

impl VirtualObjectManager {
    /// Feed one touch phase.
    ///
    /// A touch that begins on a ready object drags it once the finger has
    /// travelled past the drag threshold. A touch that ends while the scene
    /// has no objects places one at the viewport center.
    pub fn handle_touch(
        &mut self,
        event: TouchEvent,
        camera: &Camera,
        frame: &dyn TrackingQuery,
    ) -> TouchOutcome {
        match event {
            TouchEvent::Began { point } => {
                self.abandon_touch();
                let handle = self.pick(point, camera);
                if let Some(handle) = handle {
                    self.begin_drag(handle);
                }
                self.touch = Some(ActiveTouch {
                    handle,
                    start: point,
                    moving: false,
                });
                handle.map_or(TouchOutcome::Ignored, TouchOutcome::DragStarted)
            }
            TouchEvent::Moved { point } => {
                let Some(touch) = self.touch.as_mut() else {
                    return TouchOutcome::Ignored;
                };
                let Some(handle) = touch.handle else {
                    return TouchOutcome::Ignored;
                };
                if !touch.moving {
                    if touch.start.distance(&point) < self.gesture.drag_threshold_px {
                        return TouchOutcome::Ignored;
                    }
                    touch.moving = true;
                }
                match self.continue_drag(handle, point, camera, frame) {
                    Some(_) => TouchOutcome::Dragged(handle),
                    None => TouchOutcome::Ignored,
                }
            }
            TouchEvent::Ended { .. } => {
                let dragged = self.touch.take().and_then(|t| t.handle);
                if let Some(handle) = dragged {
                    self.end_drag(handle);
                    return TouchOutcome::DragEnded(handle);
                }
                if self.object_count() > 0 {
                    return TouchOutcome::Ignored;
                }
                match self.place(camera.viewport_center(), camera, frame) {
                    Ok(handle) => TouchOutcome::Placed(handle),
                    Err(e) => {
                        warn!(error = %e, "Tap-to-place failed");
                        TouchOutcome::PlacementFailed
                    }
                }
            }
            TouchEvent::Cancelled => match self.abandon_touch() {
                Some(handle) => TouchOutcome::DragEnded(handle),
                None => TouchOutcome::Ignored,
            },
        }
    }

    fn abandon_touch(&mut self) -> Option<ObjectHandle> {
        let handle = self.touch.take()?.handle?;
        debug!(%handle, "Touch abandoned");
        self.end_drag(handle);
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{AnchorId, Extent};
    use crate::camera::{ScreenPoint, Viewport};
    use crate::config::{GestureConfig, PlacementConfig};
    use crate::executor::{Mutation, SceneExecutor};
    use crate::frame::TrackingFrame;
    use crate::hit_test::HitTestEngine;
    use crate::message::MessageSink;
    use crate::spatial::{Point3D, Pose, Quaternion, Vector3D};
    use std::f32::consts::FRAC_PI_4;
    use std::time::Duration;

    fn camera() -> Camera {
        Camera::perspective(
            Pose::new(
                Point3D::new(0.0, 1.0, -1.0),
                Quaternion::from_axis_angle(Vector3D::RIGHT, FRAC_PI_4),
            ),
            Viewport::new(800.0, 600.0),
            60.0,
        )
    }

    fn setup_with_plane() -> (SceneExecutor, VirtualObjectManager) {
        let (sink, _messages) = MessageSink::channel();
        let (mut executor, queue, reader) = SceneExecutor::new(PlacementConfig::default(), sink);
        queue.submit(Mutation::AddPlane {
            anchor: AnchorId::new(),
            pose: Pose::identity(),
            extent: Extent::new(2.0, 2.0),
        });
        executor.drain();
        let manager = VirtualObjectManager::new(
            queue,
            reader,
            HitTestEngine::default(),
            GestureConfig::default(),
        );
        (executor, manager)
    }

    #[test]
    fn test_tap_on_empty_scene_places_object() {
        let (mut executor, mut manager) = setup_with_plane();
        let cam = camera();
        let frame = TrackingFrame::new(Duration::ZERO, cam);
        let point = ScreenPoint::new(100.0, 100.0);

        assert_eq!(
            manager.handle_touch(TouchEvent::Began { point }, &cam, &frame),
            TouchOutcome::Ignored
        );
        let outcome = manager.handle_touch(TouchEvent::Ended { point }, &cam, &frame);
        assert!(matches!(outcome, TouchOutcome::Placed(_)));

        // A second tap does not place another object
        manager.handle_touch(TouchEvent::Began { point }, &cam, &frame);
        assert_eq!(
            manager.handle_touch(TouchEvent::Ended { point }, &cam, &frame),
            TouchOutcome::Ignored
        );
        executor.drain();
        assert_eq!(manager.objects().len(), 1);
    }

    #[test]
    fn test_drag_respects_threshold() {
        let (mut executor, mut manager) = setup_with_plane();
        let cam = camera();
        let frame = TrackingFrame::new(Duration::ZERO, cam);
        let center = cam.viewport_center();
        let handle = manager.place(center, &cam, &frame).unwrap();
        manager.mark_ready(handle);
        executor.drain();

        assert_eq!(
            manager.handle_touch(TouchEvent::Began { point: center }, &cam, &frame),
            TouchOutcome::DragStarted(handle)
        );
        let small = ScreenPoint::new(center.x + 10.0, center.y);
        assert_eq!(
            manager.handle_touch(TouchEvent::Moved { point: small }, &cam, &frame),
            TouchOutcome::Ignored
        );
        let far = ScreenPoint::new(center.x + 100.0, center.y);
        assert_eq!(
            manager.handle_touch(TouchEvent::Moved { point: far }, &cam, &frame),
            TouchOutcome::Dragged(handle)
        );
        // Once moving, small steps are followed
        let nudge = ScreenPoint::new(far.x + 5.0, far.y);
        assert_eq!(
            manager.handle_touch(TouchEvent::Moved { point: nudge }, &cam, &frame),
            TouchOutcome::Dragged(handle)
        );
        assert_eq!(
            manager.handle_touch(TouchEvent::Ended { point: nudge }, &cam, &frame),
            TouchOutcome::DragEnded(handle)
        );
        executor.drain();

        let object = &manager.objects()[0];
        assert!(!object.dragging);
        assert!(object.pose.position.x > 0.0);
    }

    #[test]
    fn test_cancel_ends_drag() {
        let (mut executor, mut manager) = setup_with_plane();
        let cam = camera();
        let frame = TrackingFrame::new(Duration::ZERO, cam);
        let center = cam.viewport_center();
        let handle = manager.place(center, &cam, &frame).unwrap();
        manager.mark_ready(handle);
        executor.drain();

        manager.handle_touch(TouchEvent::Began { point: center }, &cam, &frame);
        assert!(manager.is_dragging(handle));
        assert_eq!(
            manager.handle_touch(TouchEvent::Cancelled, &cam, &frame),
            TouchOutcome::DragEnded(handle)
        );
        assert!(!manager.is_dragging(handle));
        assert_eq!(
            manager.handle_touch(TouchEvent::Cancelled, &cam, &frame),
            TouchOutcome::Ignored
        );
    }
}
