//! Per-frame data delivered by the tracking collaborator

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::spatial::{Point3D, Ray, Vector3D};

const ESTIMATE_EPSILON: f32 = 1e-6;

/// Surface guess reported by tracking before it is promoted to an anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedPlane {
    pub point: Point3D,
    pub normal: Vector3D,
}

impl EstimatedPlane {
    /// Gravity-aligned estimate at the given height
    pub fn horizontal(height: f32) -> Self {
        Self {
            point: Point3D::new(0.0, height, 0.0),
            normal: Vector3D::UP,
        }
    }
}

/// Hit queries answered by the tracking collaborator for the current frame
pub trait TrackingQuery {
    /// Intersection with the tracker's plane estimate along a ray
    fn estimated_plane_hit(&self, ray: &Ray) -> Option<Point3D>;

    /// Raw feature points of the current frame, in world space
    fn feature_points(&self) -> &[Point3D];
}

/// Snapshot of one tracking frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    /// Sensor timestamp, monotonic within a session
    pub timestamp: Duration,
    pub camera: Camera,
    #[serde(default)]
    pub feature_points: Vec<Point3D>,
    #[serde(default)]
    pub estimated_planes: Vec<EstimatedPlane>,
}

impl TrackingFrame {
    pub fn new(timestamp: Duration, camera: Camera) -> Self {
        Self {
            timestamp,
            camera,
            feature_points: Vec::new(),
            estimated_planes: Vec::new(),
        }
    }

    pub fn with_feature_points(mut self, points: Vec<Point3D>) -> Self {
        self.feature_points = points;
        self
    }

    pub fn with_estimated_plane(mut self, plane: EstimatedPlane) -> Self {
        self.estimated_planes.push(plane);
        self
    }
}

impl TrackingQuery for TrackingFrame {
    fn estimated_plane_hit(&self, ray: &Ray) -> Option<Point3D> {
        self.estimated_planes
            .iter()
            .filter_map(|plane| {
                ray.intersect_plane(plane.point, plane.normal, ESTIMATE_EPSILON)
                    .ok()
                    .flatten()
            })
            .min_by(|a, b| a.total_cmp(b))
            .map(|t| ray.at(t))
    }

    fn feature_points(&self) -> &[Point3D] {
        &self.feature_points
    }
}
