//! Rigid pose (position + orientation) in world space

use serde::{Deserialize, Serialize};

use super::{Point3D, Quaternion, Vector3D};

/// Position and orientation of an anchor, camera or placed object
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3D,
    pub rotation: Quaternion,
}

impl Pose {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(position: Point3D, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Point3D) -> Self {
        Self {
            position,
            rotation: Quaternion::IDENTITY,
        }
    }

    pub fn forward(&self) -> Vector3D {
        self.rotation.forward()
    }

    pub fn up(&self) -> Vector3D {
        self.rotation.up()
    }

    /// Heading around the gravity axis, in radians.
    ///
    /// Uses the horizontal component of the forward axis, falling back to the
    /// up axis when the pose looks straight up or down.
    pub fn yaw(&self) -> f32 {
        let mut heading = self.forward().horizontal();
        if heading.magnitude_squared() < 1e-6 {
            heading = self.up().horizontal();
        }
        if heading.magnitude_squared() < 1e-6 {
            return 0.0;
        }
        heading.x.atan2(heading.z)
    }

    /// Transform a point from local space to world space
    pub fn transform_point(&self, local: Point3D) -> Point3D {
        self.position + self.rotation.rotate_vector(local.to_vector())
    }

    /// Transform a point from world space to local space
    pub fn inverse_transform_point(&self, world: Point3D) -> Point3D {
        self.rotation
            .inverse()
            .rotate_vector(world - self.position)
            .to_point()
    }
}
