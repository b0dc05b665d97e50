//! Horizontal surface record derived from a plane anchor

use serde::{Deserialize, Serialize};

use super::AnchorId;
use crate::error::Result;
use crate::spatial::{Point3D, Pose, Quaternion, Ray, Vector3D};

/// Size of a plane along its local X and Z axes, in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extent {
    pub x: f32,
    pub z: f32,
}

impl Extent {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

/// A ray intersection with a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneHit {
    /// Distance along the ray
    pub distance: f32,
    pub position: Point3D,
}

/// One detected surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub anchor: AnchorId,
    pub center: Point3D,
    pub extent: Extent,
    pub orientation: Quaternion,
}

impl Plane {
    pub fn new(anchor: AnchorId, pose: Pose, extent: Extent) -> Self {
        Self {
            anchor,
            center: pose.position,
            extent,
            orientation: pose.rotation,
        }
    }

    /// Apply an anchor update in place
    pub fn update(&mut self, pose: Pose, extent: Extent) {
        self.center = pose.position;
        self.orientation = pose.rotation;
        self.extent = extent;
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.center, self.orientation)
    }

    /// Surface normal (the plane's local up axis)
    pub fn normal(&self) -> Vector3D {
        self.orientation.up()
    }

    /// Whether a world point's projection falls inside the extent rectangle
    pub fn contains(&self, point: Point3D) -> bool {
        let local = self.pose().inverse_transform_point(point);
        local.x.abs() <= self.extent.x / 2.0 && local.z.abs() <= self.extent.z / 2.0
    }

    /// Signed height of a world point above the plane
    pub fn height_of(&self, point: Point3D) -> f32 {
        (point - self.center).dot(&self.normal().normalize())
    }

    /// Intersection with the infinite plane containing this surface
    pub fn intersect_unbounded(&self, ray: &Ray, epsilon: f32) -> Result<Option<PlaneHit>> {
        let hit = ray
            .intersect_plane(self.center, self.normal(), epsilon)?
            .map(|distance| PlaneHit {
                distance,
                position: ray.at(distance),
            });
        Ok(hit)
    }

    /// Intersection restricted to the extent rectangle
    pub fn intersect_bounded(&self, ray: &Ray, epsilon: f32) -> Result<Option<PlaneHit>> {
        Ok(self
            .intersect_unbounded(ray, epsilon)?
            .filter(|hit| self.contains(hit.position)))
    }
}
