//! The scene: acceleration-structure root, background, emitter set and
//! camera (spec.md §3, "Scene"). Grounded on the original renderer's
//! `Scene`/`SurfaceGroup` (`surfacegroup.cpp`) for the linear-intersection
//! shape, simplified since a real BVH is out of scope.

use crate::background::Background;
use crate::camera::Camera;
use crate::light::EmitterSet;
use crate::ray::{HitInfo, Ray};
use crate::shapes::{Aggregate, Shape};

pub struct Scene {
    aggregate: Aggregate,
    pub background: Box<dyn Background>,
    pub emitters: EmitterSet,
    pub camera: Camera,
}

impl Scene {
    pub fn new(shapes: Vec<Shape>, background: Box<dyn Background>, camera: Camera) -> Self {
        let emitter_indices = shapes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.material().map_or(false, |m| m.is_emissive()))
            .map(|(i, _)| i)
            .collect();
        Self {
            aggregate: Aggregate::new(shapes),
            background,
            emitters: EmitterSet::new(emitter_indices),
            camera,
        }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
        self.aggregate.intersect(ray)
    }

    pub fn shapes(&self) -> &[Shape] {
        self.aggregate.shapes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::ConstantBackground;
    use crate::color::Color;
    use crate::material::{DiffuseLight, Material};
    use crate::shapes::{Quad, Sphere};
    use crate::{Point2, Point3f, Vec3f};
    use cgmath::{Matrix4, SquareMatrix};
    use std::sync::Arc;

    fn test_camera() -> Camera {
        Camera::new(Matrix4::identity(), Point2::new(4, 4), 90.0, 1.0, 0.0, None)
    }

    #[test]
    fn emitter_set_finds_emissive_quads_only() {
        let light_mat = Arc::new(Material::DiffuseLight(DiffuseLight {
            emit: Arc::new(crate::texture::Constant::new(Color::uniform(5.0))),
        }));
        let quad = Shape::Quad(Quad::new(
            Point3f::new(0.0, 0.0, -2.0),
            Vec3f::new(1.0, 0.0, 0.0),
            Vec3f::new(0.0, 1.0, 0.0),
            Some(light_mat),
            None,
        ));
        let sphere = Shape::Sphere(Sphere {
            center: Point3f::new(0.0, 0.0, -5.0),
            radius: 1.0,
            material: None,
            medium_interface: None,
        });
        let scene = Scene::new(
            vec![quad, sphere],
            Box::new(ConstantBackground { color: Color::BLACK }),
            test_camera(),
        );
        assert!(!scene.emitters.is_empty());
    }
}
