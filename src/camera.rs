//! Pinhole camera with optional thin aperture for depth of field (spec.md §4.8).
//!
//! Grounded on the original renderer's `Camera::generateRay` minus the
//! polynomial-optics lens system (`m_useLens`, `m_lens`, `get_system_from_file`
//! in `camera.h`), which is explicitly out of scope.

use std::sync::Arc;

use cgmath::{Deg, InnerSpace, Matrix4, Point2, Point3, Transform, Vector3};

use crate::medium::Medium;
use crate::ray::Ray;
use crate::sampling::concentric_sample_disk;
use crate::{Float, Point2f, Point2i};

pub struct Camera {
    xform: Matrix4<Float>,
    size: Point2<Float>,
    focal_distance: Float,
    resolution: Point2i,
    aperture_radius: Float,
    medium: Option<Arc<Medium>>,
}

impl Camera {
    pub fn new(
        xform: Matrix4<Float>,
        resolution: Point2i,
        vfov_deg: Float,
        focal_distance: Float,
        aperture_radius: Float,
        medium: Option<Arc<Medium>>,
    ) -> Self {
        let vfov = Deg(vfov_deg);
        let size_y = 2.0 * (vfov.0.to_radians() / 2.0).tan() * focal_distance;
        let size_x = (resolution.x as Float) / (resolution.y as Float) * size_y;
        Self {
            xform,
            size: Point2::new(size_x, size_y),
            focal_distance,
            resolution,
            aperture_radius,
            medium,
        }
    }

    pub fn resolution(&self) -> Point2i {
        self.resolution
    }

    /// `(u, v)` range over `[0, resolution.x)` x `[0, resolution.y)`; `lens_sample`
    /// is a fresh `[0,1)^2` sample consumed only when the aperture is non-zero.
    pub fn generate_ray(&self, u: Float, v: Float, lens_sample: Point2f) -> Ray {
        let u = u / self.resolution.x as Float;
        let v = v / self.resolution.y as Float;

        let disk = concentric_sample_disk(lens_sample);
        let origin = Point3::new(
            disk.x * self.aperture_radius,
            disk.y * self.aperture_radius,
            0.0,
        );
        let dir = Vector3::new(
            (u - 0.5) * self.size.x,
            (0.5 - v) * self.size.y,
            -self.focal_distance,
        ) - Vector3::new(origin.x, origin.y, origin.z);

        let o = self.xform.transform_point(origin);
        let d = self.xform.transform_vector(dir.normalize());
        Ray::new(o, d).with_medium(self.medium.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::SquareMatrix;

    #[test]
    fn center_ray_points_down_negative_z() {
        let cam = Camera::new(
            Matrix4::identity(),
            Point2::new(2, 2),
            90.0,
            1.0,
            0.0,
            None,
        );
        let ray = cam.generate_ray(1.0, 1.0, Point2f::new(0.0, 0.0));
        assert_relative_eq!(ray.d.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ray.d.y, 0.0, epsilon = 1e-5);
        assert!(ray.d.z < 0.0);
    }

    #[test]
    fn wider_resolution_widens_horizontal_extent() {
        let cam = Camera::new(
            Matrix4::identity(),
            Point2::new(4, 2),
            90.0,
            1.0,
            0.0,
            None,
        );
        let right = cam.generate_ray(4.0, 1.0, Point2f::new(0.0, 0.0));
        assert!(right.d.x > 0.0);
    }
}
