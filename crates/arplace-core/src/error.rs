//! Error types for placement operations.

use crate::anchor::AnchorId;
use crate::object::ObjectHandle;

/// Failures surfaced by the placement core.
///
/// Only `NoPlacementSurface` and `Config` are meant to reach callers as
/// results they must handle. The rest are recovered where they occur and
/// show up in logs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("Anchor already registered: {0}")]
    DuplicateAnchor(AnchorId),

    #[error("No surface or feature point under the requested screen point")]
    NoPlacementSurface,

    #[error("Unknown object handle: {0}")]
    UnknownHandle(ObjectHandle),

    #[error("Ray is parallel to the target plane")]
    DegenerateRay,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
