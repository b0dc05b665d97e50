//! Spatial primitives for surface placement
//!
//! Uses the right-handed, gravity-aligned frame reported by the tracking
//! collaborator:
//! - X: Right (+) / Left (-)
//! - Y: Up (+) / Down (-)
//! - Z: Forward (+) / Backward (-)

mod point3d;
mod pose;
mod quaternion;
mod ray;
mod vector3d;

pub use point3d::Point3D;
pub use pose::Pose;
pub use quaternion::Quaternion;
pub use ray::Ray;
pub use vector3d::Vector3D;
