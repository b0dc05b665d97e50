//! Wiring of the executor with the tracking and input paths

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::anchor::{AnchorId, Extent};
use crate::camera::ScreenPoint;
use crate::config::PlacementConfig;
use crate::error::{PlacementError, Result};
use crate::executor::{Mutation, MutationQueue, SceneExecutor, SceneReader};
use crate::focus::{FocusIndicator, FocusUpdate};
use crate::frame::TrackingFrame;
use crate::hit_test::HitTestEngine;
use crate::input::{TouchEvent, TouchOutcome};
use crate::message::{MessageSink, PlacementMessage};
use crate::object::{ObjectHandle, VirtualObject, VirtualObjectManager};
use crate::spatial::Pose;

type FrameSlot = Option<Arc<TrackingFrame>>;

/// All handles of one placement session. Each part is meant to be moved to
/// the task that drives it.
pub struct PlacementSession {
    pub executor: SceneExecutor,
    pub tracking: TrackingHandle,
    pub input: InputHandle,
    pub messages: mpsc::UnboundedReceiver<PlacementMessage>,
}

impl PlacementSession {
    pub fn start(config: PlacementConfig) -> Self {
        let (sink, messages) = MessageSink::channel();
        let engine = HitTestEngine::new(config.hit_test.clone());
        let gesture = config.gesture.clone();
        let (executor, queue, reader) = SceneExecutor::new(config, sink);
        let (frames_tx, frames_rx) = watch::channel(None);

        let tracking = TrackingHandle {
            queue: queue.clone(),
            reader: reader.clone(),
            engine: engine.clone(),
            frames: frames_tx,
        };
        let input = InputHandle {
            manager: VirtualObjectManager::new(queue.clone(), reader, engine, gesture),
            frames: frames_rx,
            queue,
        };
        info!("Placement session started");
        Self {
            executor,
            tracking,
            input,
            messages,
        }
    }
}

/// Entry points for the tracking collaborator
#[derive(Debug)]
pub struct TrackingHandle {
    queue: MutationQueue,
    reader: SceneReader,
    engine: HitTestEngine,
    frames: watch::Sender<FrameSlot>,
}

impl TrackingHandle {
    /// A plane anchor was detected. Anchors without an extent are not
    /// surfaces and are ignored.
    pub fn on_anchor_added(&self, anchor: AnchorId, pose: Pose, extent: Option<Extent>) {
        match extent {
            Some(extent) => self.queue.submit(Mutation::AddPlane {
                anchor,
                pose,
                extent,
            }),
            None => debug!(%anchor, "Ignoring non-plane anchor"),
        }
    }

    pub fn on_anchor_updated(&self, anchor: AnchorId, pose: Pose, extent: Option<Extent>) {
        if let Some(extent) = extent {
            self.queue.submit(Mutation::UpdatePlane {
                anchor,
                pose,
                extent,
            });
        }
    }

    pub fn on_anchor_removed(&self, anchor: AnchorId) {
        self.queue.submit(Mutation::RemovePlane { anchor });
    }

    /// A new tracking frame arrived. Publishes it to the input path and
    /// queues the focus indicator's transition for this frame.
    pub fn on_frame(&self, frame: TrackingFrame) -> FocusUpdate {
        let frame = Arc::new(frame);
        self.queue.submit(Mutation::AdvanceClock(frame.timestamp));

        let snapshot = self.reader.snapshot();
        let update = FocusIndicator::evaluate(
            &self.engine,
            &frame.camera,
            snapshot.registry(),
            snapshot.objects().iter().map(|o| o.pose.position),
            frame.as_ref(),
        );
        self.queue.submit(Mutation::Focus(update));
        self.frames.send_replace(Some(frame));
        update
    }

    pub fn current_camera_pose(&self) -> Option<Pose> {
        self.frames.borrow().as_ref().map(|f| f.camera.pose)
    }

    pub fn current_frame_timestamp(&self) -> Option<Duration> {
        self.frames.borrow().as_ref().map(|f| f.timestamp)
    }
}

/// Entry points for the UI collaborator
#[derive(Debug)]
pub struct InputHandle {
    manager: VirtualObjectManager,
    frames: watch::Receiver<FrameSlot>,
    queue: MutationQueue,
}

impl InputHandle {
    pub fn current_frame(&self) -> Option<Arc<TrackingFrame>> {
        self.frames.borrow().clone()
    }

    /// Wait for the next tracking frame. `None` once tracking has stopped.
    pub async fn next_frame(&mut self) -> Option<Arc<TrackingFrame>> {
        self.frames.changed().await.ok()?;
        self.frames.borrow_and_update().clone()
    }

    pub fn viewport_center(&self) -> Option<ScreenPoint> {
        self.current_frame().map(|f| f.camera.viewport_center())
    }

    pub fn on_touch_began(&mut self, point: ScreenPoint) -> TouchOutcome {
        self.touch(TouchEvent::Began { point })
    }

    pub fn on_touch_moved(&mut self, point: ScreenPoint) -> TouchOutcome {
        self.touch(TouchEvent::Moved { point })
    }

    pub fn on_touch_ended(&mut self, point: ScreenPoint) -> TouchOutcome {
        self.touch(TouchEvent::Ended { point })
    }

    pub fn on_touch_cancelled(&mut self) -> TouchOutcome {
        self.touch(TouchEvent::Cancelled)
    }

    pub fn touch(&mut self, event: TouchEvent) -> TouchOutcome {
        let Some(frame) = self.current_frame() else {
            debug!(?event, "Touch before the first tracking frame");
            return TouchOutcome::Ignored;
        };
        self.manager.handle_touch(event, &frame.camera, frame.as_ref())
    }

    /// Place an object where the viewport center resolves on the current frame
    pub fn place_at_center(&mut self) -> Result<ObjectHandle> {
        let frame = self
            .current_frame()
            .ok_or(PlacementError::NoPlacementSurface)?;
        self.manager
            .place(frame.camera.viewport_center(), &frame.camera, frame.as_ref())
    }

    pub fn place(&mut self, point: ScreenPoint) -> Result<ObjectHandle> {
        let frame = self
            .current_frame()
            .ok_or(PlacementError::NoPlacementSurface)?;
        self.manager.place(point, &frame.camera, frame.as_ref())
    }

    pub fn remove(&mut self, handle: ObjectHandle) {
        self.manager.remove(handle);
    }

    pub fn mark_ready(&self, handle: ObjectHandle) {
        self.manager.mark_ready(handle);
    }

    pub fn objects(&self) -> Vec<VirtualObject> {
        self.manager.objects()
    }

    pub fn manager(&self) -> &VirtualObjectManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut VirtualObjectManager {
        &mut self.manager
    }

    /// Clear the scene and restart guidance
    pub fn reset(&mut self) {
        self.manager.reset();
        self.queue.submit(Mutation::Reset);
    }
}
