//! Scripted tracking stream and touch sequence
//!
//! A camera held at eye level looks down at a floor and sweeps slowly from
//! side to side. The floor is detected early and grows; a table top shows up
//! later and is lost again near the end of the run.

use std::f32::consts::FRAC_PI_4;
use std::time::Duration;

use arplace_core::frame::EstimatedPlane;
use arplace_core::{
    AnchorId, Camera, Extent, InputHandle, ObjectHandle, Point3D, Pose, Quaternion, ScreenPoint,
    TouchOutcome, TrackingFrame, TrackingHandle, Vector3D, Viewport,
};
use tracing::{debug, info};
use uuid::Uuid;

pub const FRAME_PERIOD: Duration = Duration::from_millis(33);

const EYE_HEIGHT: f32 = 1.4;
const SWEEP_RADIANS: f32 = 0.25;

fn floor_anchor() -> AnchorId {
    AnchorId::from(Uuid::from_u128(1))
}

fn table_anchor() -> AnchorId {
    AnchorId::from(Uuid::from_u128(2))
}

fn camera_at(tick: u64) -> Camera {
    let yaw = SWEEP_RADIANS * (tick as f32 * 0.05).sin();
    let rotation = Quaternion::from_yaw(yaw) * Quaternion::from_axis_angle(Vector3D::RIGHT, FRAC_PI_4);
    Camera::perspective(
        Pose::new(Point3D::new(0.0, EYE_HEIGHT, 0.0), rotation),
        Viewport::new(1170.0, 2532.0),
        60.0,
    )
}

/// Sparse points scattered on the table top
fn feature_cloud() -> Vec<Point3D> {
    (0..6)
        .map(|i| {
            let offset = i as f32 * 0.08;
            Point3D::new(0.8 + offset, 0.7, 1.9 + offset / 2.0)
        })
        .collect()
}

/// Feed `frames` tracking frames, adding and removing anchors on a script
pub async fn drive_tracking(tracking: TrackingHandle, frames: u64, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    let table_lost_at = frames * 3 / 4;

    for tick in 0..frames {
        ticker.tick().await;
        match tick {
            5 => tracking.on_anchor_added(
                floor_anchor(),
                Pose::from_position(Point3D::new(0.0, 0.0, EYE_HEIGHT)),
                Some(Extent::new(0.5, 0.5)),
            ),
            20 => tracking.on_anchor_updated(
                floor_anchor(),
                Pose::from_position(Point3D::new(0.0, 0.0, EYE_HEIGHT)),
                Some(Extent::new(2.0, 2.0)),
            ),
            40 => tracking.on_anchor_added(
                table_anchor(),
                Pose::from_position(Point3D::new(1.0, 0.7, 2.0)),
                Some(Extent::new(0.6, 0.6)),
            ),
            t if t == table_lost_at && t > 40 => tracking.on_anchor_removed(table_anchor()),
            _ => {}
        }

        let frame = TrackingFrame::new(period * tick as u32, camera_at(tick))
            .with_feature_points(feature_cloud())
            .with_estimated_plane(EstimatedPlane::horizontal(0.0));
        let update = tracking.on_frame(frame);
        debug!(tick, ?update, "Tracking frame");
    }
    info!(frames, "Tracking stream finished");
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Place,
    MarkReady(ObjectHandle),
    Grab(ObjectHandle),
    Drag { handle: ObjectHandle, from: ScreenPoint, moves: u32 },
    Release(ScreenPoint),
    Done,
}

const TAP_AT: u64 = 30;
const GRAB_AT: u64 = 45;
const DRAG_MOVES: u32 = 10;
const DRAG_STEP_PX: f32 = 12.0;

/// Tap to place once a surface is known, then drag the object to the right.
/// Runs until tracking stops and returns every touch outcome.
pub async fn drive_input(mut input: InputHandle, period: Duration) -> Vec<TouchOutcome> {
    let mut outcomes = Vec::new();
    let mut step = Step::Place;

    while let Some(frame) = input.next_frame().await {
        let tick = (frame.timestamp.as_millis() / period.as_millis().max(1)) as u64;
        step = match step {
            Step::Place if tick >= TAP_AT => {
                let center = frame.camera.viewport_center();
                outcomes.push(input.on_touch_began(center));
                let outcome = input.on_touch_ended(center);
                outcomes.push(outcome);
                match outcome {
                    TouchOutcome::Placed(handle) => Step::MarkReady(handle),
                    _ => Step::Place,
                }
            }
            Step::MarkReady(handle) => {
                input.mark_ready(handle);
                Step::Grab(handle)
            }
            Step::Grab(handle) if tick >= GRAB_AT => {
                let on_screen = input
                    .objects()
                    .iter()
                    .find(|o| o.handle == handle && o.is_ready())
                    .and_then(|o| frame.camera.project(o.pose.position));
                match on_screen {
                    Some(point) => {
                        outcomes.push(input.on_touch_began(point));
                        Step::Drag {
                            handle,
                            from: point,
                            moves: 0,
                        }
                    }
                    None => Step::Grab(handle),
                }
            }
            Step::Drag { handle, from, moves } => {
                let point = ScreenPoint::new(from.x + DRAG_STEP_PX * (moves + 1) as f32, from.y);
                outcomes.push(input.on_touch_moved(point));
                if moves + 1 >= DRAG_MOVES {
                    Step::Release(point)
                } else {
                    Step::Drag {
                        handle,
                        from,
                        moves: moves + 1,
                    }
                }
            }
            Step::Release(point) => {
                outcomes.push(input.on_touch_ended(point));
                Step::Done
            }
            other => other,
        };
    }
    info!(touches = outcomes.len(), "Input script finished");
    outcomes
}
