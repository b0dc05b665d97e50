//! Rays cast from the camera into the scene

use tracing::trace;

use super::{Point3D, Vector3D};
use crate::error::{PlacementError, Result};

/// A half-line with a unit-length direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3D,
    pub direction: Vector3D,
}

impl Ray {
    /// Create a ray; the direction is normalized
    pub fn new(origin: Point3D, direction: Vector3D) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Point3D {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the plane through `point` with `normal`.
    ///
    /// Returns `Ok(None)` when the plane lies behind the origin and
    /// `Err(DegenerateRay)` when the ray runs parallel to the plane
    /// (|dot(direction, normal)| below `epsilon`).
    pub fn intersect_plane(
        &self,
        point: Point3D,
        normal: Vector3D,
        epsilon: f32,
    ) -> Result<Option<f32>> {
        let normal = normal.normalize();
        let denom = self.direction.dot(&normal);
        if denom.abs() < epsilon {
            trace!(denom, "ray parallel to plane");
            return Err(PlacementError::DegenerateRay);
        }
        let t = (point - self.origin).dot(&normal) / denom;
        Ok((t >= 0.0).then_some(t))
    }

    /// Parameter of the point on the ray closest to `point` (may be negative)
    pub fn project(&self, point: Point3D) -> f32 {
        (point - self.origin).dot(&self.direction)
    }

    /// Perpendicular distance from `point` to the ray's supporting line
    pub fn distance_to(&self, point: Point3D) -> f32 {
        self.at(self.project(point)).distance(&point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_floor_below() {
        let ray = Ray::new(Point3D::new(0.0, 1.0, 0.0), Vector3D::new(0.0, -1.0, 1.0));
        let t = ray
            .intersect_plane(Point3D::ORIGIN, Vector3D::UP, 1e-6)
            .unwrap()
            .unwrap();
        let hit = ray.at(t);
        assert!(hit.y.abs() < 0.0001);
        assert!((hit.z - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_parallel_ray_is_degenerate() {
        let ray = Ray::new(Point3D::new(0.0, 1.0, 0.0), Vector3D::FORWARD);
        let result = ray.intersect_plane(Point3D::ORIGIN, Vector3D::UP, 1e-6);
        assert!(matches!(result, Err(PlacementError::DegenerateRay)));
    }

    #[test]
    fn test_plane_behind_origin() {
        let ray = Ray::new(Point3D::new(0.0, 1.0, 0.0), Vector3D::UP);
        let result = ray.intersect_plane(Point3D::ORIGIN, Vector3D::UP, 1e-6);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_distance_to_point() {
        let ray = Ray::new(Point3D::ORIGIN, Vector3D::FORWARD);
        assert!((ray.distance_to(Point3D::new(0.5, 0.0, 3.0)) - 0.5).abs() < 0.0001);
        assert!((ray.project(Point3D::new(0.5, 0.0, 3.0)) - 3.0).abs() < 0.0001);
    }
}
