//! Resolution of screen points to world positions
//!
//! Candidates are tried in a fixed order and the first rule that produces a
//! position wins:
//!
//! 1. a detected plane's extent rectangle
//! 2. the unbounded plane of a detected surface (infinite-plane mode only)
//! 3. the tracker's plane estimate
//! 4. a raw feature point near the ray
//!
//! Precise but sparse sources come first; coarse sources keep placement
//! available while surfaces are still being detected.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::anchor::{AnchorId, AnchorRegistry, Plane, PlaneHit};
use crate::camera::{Camera, ScreenPoint};
use crate::config::HitTestConfig;
use crate::error::PlacementError;
use crate::frame::TrackingQuery;
use crate::spatial::{Point3D, Ray, Vector3D};

/// Which rule produced a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    ExistingPlaneUsingExtent,
    ExistingPlaneUnbounded,
    EstimatedPlane,
    FeaturePoint,
}

impl HitKind {
    /// Hits that landed on a tracked or estimated surface
    pub fn is_plane(&self) -> bool {
        !matches!(self, HitKind::FeaturePoint)
    }
}

/// A resolved world position. A miss is represented by `None` at the call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    pub position: Point3D,
    /// Detected plane the position lies on, if any
    pub plane: Option<AnchorId>,
    pub kind: HitKind,
}

/// Extra context while an object is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragConstraint {
    /// Plane the dragged object is anchored to; tried before anything else
    pub plane: Option<AnchorId>,
    /// Current height of the dragged object, used in infinite-plane mode
    pub object_height: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct HitTestEngine {
    config: HitTestConfig,
}

impl HitTestEngine {
    pub fn new(config: HitTestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HitTestConfig {
        &self.config
    }

    /// Resolve a screen point with the general priority order
    pub fn resolve(
        &self,
        point: ScreenPoint,
        camera: &Camera,
        registry: &AnchorRegistry,
        frame: &dyn TrackingQuery,
    ) -> Option<HitTestResult> {
        self.resolve_ray(&camera.ray_through(point), registry, frame, None)
    }

    /// Resolve a screen point for an object being dragged
    pub fn resolve_for_drag(
        &self,
        point: ScreenPoint,
        camera: &Camera,
        registry: &AnchorRegistry,
        frame: &dyn TrackingQuery,
        drag: &DragConstraint,
    ) -> Option<HitTestResult> {
        self.resolve_ray(&camera.ray_through(point), registry, frame, Some(drag))
    }

    pub fn resolve_ray(
        &self,
        ray: &Ray,
        registry: &AnchorRegistry,
        frame: &dyn TrackingQuery,
        drag: Option<&DragConstraint>,
    ) -> Option<HitTestResult> {
        if let Some(plane) = drag
            .and_then(|d| d.plane)
            .and_then(|anchor| registry.get(&anchor))
        {
            if let Some(hit) = self.checked(plane, plane.intersect_bounded(ray, self.eps())) {
                trace!(anchor = %plane.anchor, "drag stayed on its plane");
                return Some(on_plane(plane, hit, HitKind::ExistingPlaneUsingExtent));
            }
        }

        if let Some(result) = self.nearest_plane_hit(ray, registry, true) {
            return Some(result);
        }

        if self.config.infinite_planes {
            if let Some(result) = self.nearest_plane_hit(ray, registry, false) {
                return Some(result);
            }
            if let Some(height) = drag.and_then(|d| d.object_height) {
                let through = Point3D::new(0.0, height, 0.0);
                if let Ok(Some(t)) = ray.intersect_plane(through, Vector3D::UP, self.eps()) {
                    return Some(HitTestResult {
                        position: ray.at(t),
                        plane: None,
                        kind: HitKind::ExistingPlaneUnbounded,
                    });
                }
            }
        }

        if let Some(position) = frame
            .estimated_plane_hit(ray)
            .filter(|p| p.distance(&ray.origin) <= self.config.estimate_max_distance)
        {
            return Some(HitTestResult {
                position,
                plane: None,
                kind: HitKind::EstimatedPlane,
            });
        }

        if let Some(position) = self.feature_hit(ray, frame.feature_points()) {
            return Some(HitTestResult {
                position,
                plane: None,
                kind: HitKind::FeaturePoint,
            });
        }

        debug!("hit-test found no surface");
        None
    }

    fn eps(&self) -> f32 {
        self.config.parallel_epsilon
    }

    /// Nearest intersection over all registered planes
    fn nearest_plane_hit(
        &self,
        ray: &Ray,
        registry: &AnchorRegistry,
        bounded: bool,
    ) -> Option<HitTestResult> {
        let (plane, hit) = registry
            .planes()
            .filter_map(|plane| {
                let hit = if bounded {
                    plane.intersect_bounded(ray, self.eps())
                } else {
                    plane.intersect_unbounded(ray, self.eps())
                };
                self.checked(plane, hit).map(|hit| (plane, hit))
            })
            .min_by(|(_, a), (_, b)| a.distance.total_cmp(&b.distance))?;

        let kind = if bounded {
            HitKind::ExistingPlaneUsingExtent
        } else {
            HitKind::ExistingPlaneUnbounded
        };
        Some(on_plane(plane, hit, kind))
    }

    /// Unwrap an intersection, falling through on degenerate rays
    fn checked(
        &self,
        plane: &Plane,
        hit: crate::error::Result<Option<PlaneHit>>,
    ) -> Option<PlaneHit> {
        match hit {
            Ok(hit) => hit,
            Err(PlacementError::DegenerateRay) => {
                trace!(anchor = %plane.anchor, "skipping plane parallel to ray");
                None
            }
            Err(_) => None,
        }
    }

    /// Feature point search: a cone around the ray first, then the point
    /// nearest to the ray anywhere in front of the camera.
    fn feature_hit(&self, ray: &Ray, points: &[Point3D]) -> Option<Point3D> {
        let half_cone = (self.config.feature_cone_degrees / 2.0).to_radians();
        let min = self.config.feature_min_distance;
        let max = self.config.feature_max_distance;

        let in_front = points
            .iter()
            .map(|p| (ray.project(*p), *p))
            .filter(|(along, _)| *along > 0.0);

        let coned = in_front
            .clone()
            .filter(|(along, _)| (min..=max).contains(along))
            .map(|(along, p)| (along, (p - ray.origin).angle(&ray.direction)))
            .filter(|(_, angle)| *angle <= half_cone)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(along, _)| along);

        let along = coned.or_else(|| {
            in_front
                .map(|(along, p)| (along, ray.distance_to(p)))
                .min_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(along, _)| along)
        })?;

        Some(ray.at(along))
    }
}

fn on_plane(plane: &Plane, hit: PlaneHit, kind: HitKind) -> HitTestResult {
    HitTestResult {
        position: hit.position,
        plane: Some(plane.anchor),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::Extent;
    use crate::camera::Viewport;
    use crate::frame::{EstimatedPlane, TrackingFrame};
    use crate::spatial::{Pose, Quaternion};
    use std::f32::consts::FRAC_PI_4;
    use std::time::Duration;

    /// Camera one meter up and one meter back, pitched 45° toward the origin
    fn camera() -> Camera {
        Camera::perspective(
            Pose::new(
                Point3D::new(0.0, 1.0, -1.0),
                Quaternion::from_axis_angle(Vector3D::RIGHT, FRAC_PI_4),
            ),
            Viewport::new(800.0, 600.0),
            60.0,
        )
    }

    fn frame() -> TrackingFrame {
        TrackingFrame::new(Duration::ZERO, camera())
    }

    fn registry_with(anchor: AnchorId, center: Point3D, extent: Extent) -> AnchorRegistry {
        let mut registry = AnchorRegistry::new();
        registry
            .add_plane(anchor, Pose::from_position(center), extent)
            .unwrap();
        registry
    }

    fn engine(infinite_planes: bool) -> HitTestEngine {
        HitTestEngine::new(HitTestConfig {
            infinite_planes,
            ..HitTestConfig::default()
        })
    }

    #[test]
    fn test_bounded_plane_at_center() {
        let anchor = AnchorId::new();
        let registry = registry_with(anchor, Point3D::ORIGIN, Extent::new(1.0, 1.0));
        let cam = camera();
        let hit = engine(false)
            .resolve(cam.viewport_center(), &cam, &registry, &frame())
            .unwrap();
        assert_eq!(hit.kind, HitKind::ExistingPlaneUsingExtent);
        assert_eq!(hit.plane, Some(anchor));
        assert!(hit.position.distance(&Point3D::ORIGIN) < 0.001);
    }

    #[test]
    fn test_bounded_plane_beats_feature_point() {
        let anchor = AnchorId::new();
        let registry = registry_with(anchor, Point3D::ORIGIN, Extent::new(1.0, 1.0));
        let cam = camera();
        // A feature point sitting right on the ray, closer than the plane
        let ray = cam.ray_through(cam.viewport_center());
        let frame = frame().with_feature_points(vec![ray.at(0.5)]);
        let hit = engine(false)
            .resolve(cam.viewport_center(), &cam, &registry, &frame)
            .unwrap();
        assert_eq!(hit.kind, HitKind::ExistingPlaneUsingExtent);
    }

    #[test]
    fn test_unbounded_only_in_infinite_mode() {
        let anchor = AnchorId::new();
        // Small plane off to the side: the center ray misses its extent
        let registry = registry_with(anchor, Point3D::new(2.0, 0.0, 0.0), Extent::new(0.2, 0.2));
        let cam = camera();

        assert!(engine(false)
            .resolve(cam.viewport_center(), &cam, &registry, &frame())
            .is_none());

        let hit = engine(true)
            .resolve(cam.viewport_center(), &cam, &registry, &frame())
            .unwrap();
        assert_eq!(hit.kind, HitKind::ExistingPlaneUnbounded);
        assert_eq!(hit.plane, Some(anchor));
        assert!(hit.position.y.abs() < 0.001);
    }

    #[test]
    fn test_estimate_before_feature_point() {
        let cam = camera();
        let ray = cam.ray_through(cam.viewport_center());
        let frame = frame()
            .with_estimated_plane(EstimatedPlane::horizontal(0.0))
            .with_feature_points(vec![ray.at(0.5)]);
        let hit = engine(false)
            .resolve(cam.viewport_center(), &cam, &AnchorRegistry::new(), &frame)
            .unwrap();
        assert_eq!(hit.kind, HitKind::EstimatedPlane);
        assert!(hit.plane.is_none());
    }

    #[test]
    fn test_estimate_beyond_range_is_ignored() {
        let cam = camera();
        let frame = frame().with_estimated_plane(EstimatedPlane::horizontal(-50.0));
        let hit = engine(false).resolve(cam.viewport_center(), &cam, &AnchorRegistry::new(), &frame);
        assert!(hit.is_none());
    }

    #[test]
    fn test_feature_point_cone_prefers_smallest_angle() {
        let cam = camera();
        let ray = cam.ray_through(cam.viewport_center());
        let near_axis = ray.at(1.0) + Vector3D::new(0.01, 0.0, 0.0);
        let off_axis = ray.at(1.0) + Vector3D::new(0.1, 0.0, 0.0);
        let frame = frame().with_feature_points(vec![off_axis, near_axis]);
        let hit = engine(false)
            .resolve(cam.viewport_center(), &cam, &AnchorRegistry::new(), &frame)
            .unwrap();
        assert_eq!(hit.kind, HitKind::FeaturePoint);
        // Result lies on the ray, level with the chosen feature
        assert!(ray.distance_to(hit.position) < 0.0001);
        assert!((ray.project(hit.position) - ray.project(near_axis)).abs() < 0.0001);
    }

    #[test]
    fn test_feature_point_fallback_outside_cone() {
        let cam = camera();
        let ray = cam.ray_through(cam.viewport_center());
        // Far beyond the cone's max distance but still in front of the camera
        let far = ray.at(10.0) + Vector3D::new(0.3, 0.0, 0.0);
        let behind = ray.at(-1.0);
        let frame = frame().with_feature_points(vec![behind, far]);
        let hit = engine(false)
            .resolve(cam.viewport_center(), &cam, &AnchorRegistry::new(), &frame)
            .unwrap();
        assert_eq!(hit.kind, HitKind::FeaturePoint);
        assert!((ray.project(hit.position) - ray.project(far)).abs() < 0.0001);
    }

    #[test]
    fn test_total_miss() {
        let cam = camera();
        let hit = engine(true).resolve(cam.viewport_center(), &cam, &AnchorRegistry::new(), &frame());
        assert!(hit.is_none());
    }

    #[test]
    fn test_parallel_ray_falls_through_to_feature() {
        let anchor = AnchorId::new();
        let registry = registry_with(anchor, Point3D::ORIGIN, Extent::new(10.0, 10.0));
        let ray = Ray::new(Point3D::new(0.0, 0.5, -1.0), Vector3D::FORWARD);
        let feature = Point3D::new(0.0, 0.5, 1.0);
        let frame = frame().with_feature_points(vec![feature]);
        let hit = engine(true)
            .resolve_ray(&ray, &registry, &frame, None)
            .unwrap();
        assert_eq!(hit.kind, HitKind::FeaturePoint);
        assert!(hit.position.distance(&feature) < 0.0001);
    }

    #[test]
    fn test_drag_prefers_anchored_plane() {
        // Two stacked planes; the upper one is nearer along the ray
        let upper = AnchorId::new();
        let lower = AnchorId::new();
        let mut registry = registry_with(upper, Point3D::new(0.0, 0.2, 0.0), Extent::new(4.0, 4.0));
        registry
            .add_plane(lower, Pose::from_position(Point3D::ORIGIN), Extent::new(4.0, 4.0))
            .unwrap();
        let cam = camera();
        let center = cam.viewport_center();

        let free = engine(false)
            .resolve(center, &cam, &registry, &frame())
            .unwrap();
        assert_eq!(free.plane, Some(upper));

        let drag = DragConstraint {
            plane: Some(lower),
            object_height: Some(0.0),
        };
        let constrained = engine(false)
            .resolve_for_drag(center, &cam, &registry, &frame(), &drag)
            .unwrap();
        assert_eq!(constrained.plane, Some(lower));
        assert!(constrained.position.y.abs() < 0.001);
    }

    #[test]
    fn test_drag_height_plane_in_infinite_mode() {
        let cam = camera();
        let drag = DragConstraint {
            plane: None,
            object_height: Some(0.0),
        };
        let hit = engine(true)
            .resolve_for_drag(cam.viewport_center(), &cam, &AnchorRegistry::new(), &frame(), &drag)
            .unwrap();
        assert_eq!(hit.kind, HitKind::ExistingPlaneUnbounded);
        assert!(hit.plane.is_none());
        assert!(hit.position.distance(&Point3D::ORIGIN) < 0.001);

        let without_mode = engine(false).resolve_for_drag(
            cam.viewport_center(),
            &cam,
            &AnchorRegistry::new(),
            &frame(),
            &drag,
        );
        assert!(without_mode.is_none());
    }
}
