//! arplace-core: surface anchoring and object placement for AR sessions
//!
//! This crate provides:
//! - A registry of detected horizontal planes keyed by anchor id
//! - Screen-point hit-testing against planes, estimates and feature points
//! - A focus indicator tracking where a new object would land
//! - Placement, drag and removal of virtual objects
//! - A single-writer executor that serializes every scene mutation
//!
//! Tracking callbacks and touch input run on their own tasks and talk to
//! the executor through [`session::PlacementSession`].

pub mod anchor;
pub mod camera;
pub mod config;
pub mod error;
pub mod executor;
pub mod focus;
pub mod frame;
pub mod hit_test;
pub mod input;
pub mod message;
pub mod object;
pub mod session;
pub mod spatial;

// Re-export commonly used types
pub use anchor::{AnchorId, AnchorRegistry, Extent, Plane};
pub use camera::{Camera, ScreenPoint, Viewport};
pub use config::PlacementConfig;
pub use error::{PlacementError, Result};
pub use executor::{Mutation, MutationQueue, RenderFrame, SceneExecutor, SceneReader, SceneSnapshot};
pub use focus::{FocusIndicator, FocusState, FocusUpdate, FocusView};
pub use frame::{EstimatedPlane, TrackingFrame, TrackingQuery};
pub use hit_test::{DragConstraint, HitKind, HitTestEngine, HitTestResult};
pub use input::{TouchEvent, TouchOutcome};
pub use message::{GuidanceKind, PlacementMessage};
pub use object::{ObjectHandle, ObjectStatus, VirtualObject, VirtualObjectManager};
pub use session::{InputHandle, PlacementSession, TrackingHandle};
pub use spatial::{Point3D, Pose, Quaternion, Ray, Vector3D};
