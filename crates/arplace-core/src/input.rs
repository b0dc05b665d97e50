//! Touch input delivered by the UI collaborator

use serde::{Deserialize, Serialize};

use crate::camera::ScreenPoint;
use crate::object::ObjectHandle;

/// One phase of a single-finger touch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum TouchEvent {
    Began { point: ScreenPoint },
    Moved { point: ScreenPoint },
    Ended { point: ScreenPoint },
    Cancelled,
}

impl TouchEvent {
    pub fn point(&self) -> Option<ScreenPoint> {
        match self {
            TouchEvent::Began { point }
            | TouchEvent::Moved { point }
            | TouchEvent::Ended { point } => Some(*point),
            TouchEvent::Cancelled => None,
        }
    }
}

/// What a touch event did to the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "handle")]
pub enum TouchOutcome {
    /// Nothing under the finger, below the drag threshold, or no frame yet
    Ignored,
    DragStarted(ObjectHandle),
    Dragged(ObjectHandle),
    DragEnded(ObjectHandle),
    /// A tap with an empty scene placed the first object
    Placed(ObjectHandle),
    /// A tap with an empty scene found nowhere to place
    PlacementFailed,
}
