//! Single-writer scene executor
//!
//! Every mutation of the anchor registry, the object set and the focus
//! indicator is submitted to one queue and applied by [`SceneExecutor`] in
//! submission order. After each batch the executor publishes an immutable
//! [`SceneSnapshot`]; the tracking and input paths only ever read snapshots.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};

use crate::anchor::{AnchorId, AnchorRegistry, Extent, Plane, RegistryEvent};
use crate::config::PlacementConfig;
use crate::focus::{FocusIndicator, FocusState, FocusUpdate, FocusView};
use crate::message::{GuidanceKind, GuidanceScheduler, MessageSink, PlacementMessage};
use crate::object::{ObjectHandle, ObjectStatus, VirtualObject, VirtualObjectSet};
use crate::spatial::Pose;

/// Shortest period accepted by [`SceneExecutor::run`]
pub const MIN_DRAIN_PERIOD: Duration = Duration::from_millis(1);

/// A requested change to shared scene state
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddPlane {
        anchor: AnchorId,
        pose: Pose,
        extent: Extent,
    },
    UpdatePlane {
        anchor: AnchorId,
        pose: Pose,
        extent: Extent,
    },
    RemovePlane {
        anchor: AnchorId,
    },
    InsertObject(VirtualObject),
    MoveObject {
        handle: ObjectHandle,
        pose: Pose,
        plane: Option<AnchorId>,
    },
    SetDragging {
        handle: ObjectHandle,
        dragging: bool,
    },
    MarkReady(ObjectHandle),
    RemoveObject(ObjectHandle),
    Focus(FocusUpdate),
    /// Latest tracking timestamp, drives guidance hints
    AdvanceClock(Duration),
    Reset,
}

/// Submitting half of the mutation queue
#[derive(Debug, Clone)]
pub struct MutationQueue {
    tx: mpsc::UnboundedSender<Mutation>,
}

impl MutationQueue {
    pub fn submit(&self, mutation: Mutation) {
        if self.tx.send(mutation).is_err() {
            debug!("Executor stopped; mutation dropped");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read-only view of the scene after a batch of mutations
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    frame: u64,
    registry: AnchorRegistry,
    objects: Vec<VirtualObject>,
    focus: FocusState,
    focus_view: FocusView,
}

impl SceneSnapshot {
    /// Number of batches applied before this snapshot
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn registry(&self) -> &AnchorRegistry {
        &self.registry
    }

    /// Objects in placement order
    pub fn objects(&self) -> &[VirtualObject] {
        &self.objects
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&VirtualObject> {
        self.objects.iter().find(|o| o.handle == handle)
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn render_frame(&self) -> RenderFrame {
        RenderFrame {
            frame: self.frame,
            objects: self
                .objects
                .iter()
                .map(|o| RenderedObject {
                    handle: o.handle,
                    pose: o.pose,
                    status: o.status,
                })
                .collect(),
            focus: self.focus_view,
            planes: self.registry.planes().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedObject {
    pub handle: ObjectHandle,
    pub pose: Pose,
    pub status: ObjectStatus,
}

/// Everything the rendering collaborator draws for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub frame: u64,
    pub objects: Vec<RenderedObject>,
    pub focus: FocusView,
    pub planes: Vec<Plane>,
}

/// Read handle for published snapshots
#[derive(Debug, Clone)]
pub struct SceneReader {
    rx: watch::Receiver<Arc<SceneSnapshot>>,
}

impl SceneReader {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<SceneSnapshot> {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the executor is gone.
    pub async fn changed(&mut self) -> Option<Arc<SceneSnapshot>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Shared scene state, owned by the executor
#[derive(Debug)]
pub struct SceneState {
    registry: AnchorRegistry,
    objects: VirtualObjectSet,
    focus: FocusIndicator,
    guidance: GuidanceScheduler,
    config: PlacementConfig,
}

impl SceneState {
    pub fn new(config: PlacementConfig) -> Self {
        let mut state = Self {
            registry: AnchorRegistry::new(),
            objects: VirtualObjectSet::new(),
            focus: FocusIndicator::new(&config.focus),
            guidance: GuidanceScheduler::new(),
            config,
        };
        state.schedule_initial_hints();
        state
    }

    pub fn registry(&self) -> &AnchorRegistry {
        &self.registry
    }

    pub fn objects(&self) -> &VirtualObjectSet {
        &self.objects
    }

    pub fn focus(&self) -> &FocusIndicator {
        &self.focus
    }

    pub fn guidance(&self) -> &GuidanceScheduler {
        &self.guidance
    }

    fn schedule_initial_hints(&mut self) {
        let guidance = &self.config.guidance;
        self.guidance
            .schedule(GuidanceKind::PlaneEstimation, guidance.plane_estimation());
        self.guidance
            .schedule(GuidanceKind::FocusHint, guidance.focus_hint());
    }

    /// Apply one mutation. Recoverable failures are logged and leave the
    /// state unchanged.
    pub fn apply(&mut self, mutation: Mutation, sink: &MessageSink) {
        match mutation {
            Mutation::AddPlane {
                anchor,
                pose,
                extent,
            } => {
                if self.registry.add_plane(anchor, pose, extent).is_ok() {
                    self.snap_objects(anchor);
                }
                self.flush_registry_events(sink);
            }
            Mutation::UpdatePlane {
                anchor,
                pose,
                extent,
            } => {
                if self.registry.update_plane(anchor, pose, extent) {
                    self.snap_objects(anchor);
                }
            }
            Mutation::RemovePlane { anchor } => {
                if self.registry.remove_plane(anchor) {
                    let released = self.objects.release_plane(anchor);
                    self.focus.release_plane(anchor);
                    if released > 0 {
                        debug!(%anchor, released, "Cleared object plane references");
                    }
                }
                self.flush_registry_events(sink);
            }
            Mutation::InsertObject(mut object) => {
                // The plane may have been removed after the hit was resolved
                object.plane = object.plane.filter(|anchor| self.registry.contains(anchor));
                let handle = object.handle;
                if self.objects.insert(object) {
                    info!(%handle, count = self.objects.len(), "Object placed");
                    self.guidance.cancel(GuidanceKind::ContentPlacement);
                }
            }
            Mutation::MoveObject {
                handle,
                pose,
                plane,
            } => {
                // The plane may have been removed after the hit was resolved
                let plane = plane.filter(|anchor| self.registry.contains(anchor));
                if let Err(e) = self.objects.move_to(handle, pose, plane) {
                    debug!(error = %e, "Move ignored");
                }
            }
            Mutation::SetDragging { handle, dragging } => {
                if let Err(e) = self.objects.set_dragging(handle, dragging) {
                    debug!(error = %e, "Drag flag ignored");
                }
            }
            Mutation::MarkReady(handle) => match self.objects.mark_ready(handle) {
                Ok(()) => debug!(%handle, "Object ready"),
                Err(e) => debug!(error = %e, "Ready flag ignored"),
            },
            Mutation::RemoveObject(handle) => match self.objects.remove(handle) {
                Ok(_) => info!(%handle, count = self.objects.len(), "Object removed"),
                Err(e) => debug!(error = %e, "Remove ignored"),
            },
            Mutation::Focus(mut update) => {
                if let FocusUpdate::Show { hit, .. } = &mut update {
                    hit.plane = hit.plane.filter(|anchor| self.registry.contains(anchor));
                }
                if self.focus.apply(update) {
                    self.guidance.cancel(GuidanceKind::FocusHint);
                    sink.emit(PlacementMessage::FocusAcquired);
                }
            }
            Mutation::AdvanceClock(now) => {
                for kind in self.guidance.advance(now) {
                    debug!(?kind, "Guidance hint due");
                    sink.emit(kind.into());
                }
            }
            Mutation::Reset => {
                self.registry.clear();
                self.objects.clear();
                self.focus.reset();
                self.guidance.clear();
                self.schedule_initial_hints();
                info!("Scene reset");
            }
        }
    }

    fn flush_registry_events(&mut self, sink: &MessageSink) {
        for event in self.registry.take_events() {
            match event {
                RegistryEvent::PlaneAdded(anchor) => {
                    self.guidance.cancel(GuidanceKind::PlaneEstimation);
                    if self.objects.is_empty() {
                        self.guidance.schedule(
                            GuidanceKind::ContentPlacement,
                            self.config.guidance.content_placement(),
                        );
                    }
                    sink.emit(PlacementMessage::SurfaceDetected { anchor });
                }
                RegistryEvent::PlaneRemoved(anchor) => {
                    sink.emit(PlacementMessage::SurfaceLost { anchor });
                }
            }
        }
    }

    fn snap_objects(&mut self, anchor: AnchorId) {
        if let Some(plane) = self.registry.get(&anchor) {
            self.objects.snap_onto(plane, &self.config.snapping);
        }
    }

    fn snapshot(&self, frame: u64) -> SceneSnapshot {
        SceneSnapshot {
            frame,
            registry: self.registry.clone(),
            objects: self.objects.iter().cloned().collect(),
            focus: self.focus.state(),
            focus_view: self.focus.view(),
        }
    }
}

/// Owns the scene state and drains the mutation queue
#[derive(Debug)]
pub struct SceneExecutor {
    rx: mpsc::UnboundedReceiver<Mutation>,
    state: SceneState,
    sink: MessageSink,
    snapshots: watch::Sender<Arc<SceneSnapshot>>,
    frame: u64,
    closed: bool,
}

impl SceneExecutor {
    pub fn new(config: PlacementConfig, sink: MessageSink) -> (Self, MutationQueue, SceneReader) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(Arc::new(SceneSnapshot::default()));
        let executor = Self {
            rx,
            state: SceneState::new(config),
            sink,
            snapshots,
            frame: 0,
            closed: false,
        };
        (
            executor,
            MutationQueue { tx },
            SceneReader { rx: snapshot_rx },
        )
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Whether every queue handle has been dropped and the queue is empty
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Apply everything queued so far, then publish a snapshot
    pub fn drain(&mut self) -> Arc<SceneSnapshot> {
        let mut applied = 0usize;
        loop {
            match self.rx.try_recv() {
                Ok(mutation) => {
                    self.state.apply(mutation, &self.sink);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        if applied > 0 {
            self.frame += 1;
            trace!(applied, frame = self.frame, "Drained mutations");
        }
        let snapshot = Arc::new(self.state.snapshot(self.frame));
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    /// Drain on a fixed period until every queue handle is dropped, handing
    /// each render frame to `on_frame`. Periods shorter than
    /// [`MIN_DRAIN_PERIOD`] are raised to it.
    pub async fn run(mut self, period: Duration, mut on_frame: impl FnMut(RenderFrame)) {
        let period = period.max(MIN_DRAIN_PERIOD);
        let mut ticker = tokio::time::interval(period);
        info!(period_ms = period.as_millis() as u64, "Scene executor started");
        loop {
            ticker.tick().await;
            let snapshot = self.drain();
            on_frame(snapshot.render_frame());
            if self.closed {
                break;
            }
        }
        info!(
            planes = self.state.registry.len(),
            objects = self.state.objects.len(),
            "Scene executor stopped"
        );
    }
}
