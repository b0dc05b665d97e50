//! Pinhole camera model: screen points to rays, world points to screen

use serde::{Deserialize, Serialize};

use crate::spatial::{Point3D, Pose, Ray, Vector3D};

/// A point on the viewport in pixels, origin at the top-left corner, y down
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &ScreenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Tracked camera: world pose plus perspective intrinsics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pose: Pose,
    pub viewport: Viewport,
    /// Vertical field of view in radians
    pub vertical_fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Perspective camera with a vertical field of view in degrees
    pub fn perspective(pose: Pose, viewport: Viewport, fov_degrees: f32) -> Self {
        Self {
            pose,
            viewport,
            vertical_fov: fov_degrees.to_radians(),
            near: 0.01,
            far: 100.0,
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn viewport_center(&self) -> ScreenPoint {
        self.viewport.center()
    }

    fn tan_half_fov(&self) -> f32 {
        (self.vertical_fov / 2.0).tan()
    }

    /// Ray from the camera center through a screen point
    pub fn ray_through(&self, point: ScreenPoint) -> Ray {
        let x_ndc = 2.0 * point.x / self.viewport.width - 1.0;
        let y_ndc = 1.0 - 2.0 * point.y / self.viewport.height;
        let tan = self.tan_half_fov();
        let local = Vector3D::new(x_ndc * tan * self.viewport.aspect(), y_ndc * tan, 1.0);
        Ray::new(self.pose.position, self.pose.rotation.rotate_vector(local))
    }

    /// Project to normalized device coordinates plus camera-space depth.
    /// `None` for points outside the near/far range.
    fn project_ndc(&self, point: Point3D) -> Option<(f32, f32, f32)> {
        let local = self.pose.inverse_transform_point(point);
        if local.z <= self.near || local.z >= self.far {
            return None;
        }
        let tan = self.tan_half_fov();
        let x_ndc = local.x / (local.z * tan * self.viewport.aspect());
        let y_ndc = local.y / (local.z * tan);
        Some((x_ndc, y_ndc, local.z))
    }

    /// Screen position of a world point, `None` if it falls outside the frustum
    pub fn project(&self, point: Point3D) -> Option<ScreenPoint> {
        let (x_ndc, y_ndc, _) = self.project_ndc(point)?;
        if x_ndc.abs() > 1.0 || y_ndc.abs() > 1.0 {
            return None;
        }
        Some(ScreenPoint::new(
            (x_ndc + 1.0) / 2.0 * self.viewport.width,
            (1.0 - y_ndc) / 2.0 * self.viewport.height,
        ))
    }

    /// Whether a world point lies inside the viewing frustum
    pub fn is_visible(&self, point: Point3D) -> bool {
        self.project(point).is_some()
    }
}
