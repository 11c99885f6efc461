//! Minimal surface primitives: enough geometry to exercise the integrators
//! in tests and the CLI driver, not a general mesh/BVH pipeline (out of
//! scope per spec.md §1). `Quad` intersection is grounded on the original
//! renderer's `quad.cpp`; `Sphere` intersection is the standard closed-form
//! quadratic solution (the original's `sphere.cpp` is left as an unfinished
//! assignment stub with no usable reference).

use std::sync::Arc;

use crate::material::Material;
use crate::medium::MediumInterface;
use crate::ray::{HitInfo, Ray};
use crate::{Float, InnerSpace, Point2f, Point3f, Vec3f};

pub struct Sphere {
    pub center: Point3f,
    pub radius: Float,
    pub material: Option<Arc<Material>>,
    pub medium_interface: Option<MediumInterface>,
}

pub struct Quad {
    pub origin: Point3f,
    pub u: Vec3f,
    pub v: Vec3f,
    normal: Vec3f,
    area: Float,
    pub material: Option<Arc<Material>>,
    pub medium_interface: Option<MediumInterface>,
}

impl Quad {
    pub fn new(
        origin: Point3f,
        u: Vec3f,
        v: Vec3f,
        material: Option<Arc<Material>>,
        medium_interface: Option<MediumInterface>,
    ) -> Self {
        let cross = u.cross(v);
        let area = cross.magnitude();
        let normal = cross / area;
        Self {
            origin,
            u,
            v,
            normal,
            area,
            material,
            medium_interface,
        }
    }
}

pub enum Shape {
    Sphere(Sphere),
    Quad(Quad),
}

impl Shape {
    pub fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
        match self {
            Shape::Sphere(s) => sphere_intersect(s, ray),
            Shape::Quad(q) => quad_intersect(q, ray),
        }
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        match self {
            Shape::Sphere(s) => s.material.as_ref(),
            Shape::Quad(q) => q.material.as_ref(),
        }
    }

    pub fn area(&self) -> Float {
        match self {
            Shape::Sphere(s) => 4.0 * std::f32::consts::PI * s.radius * s.radius,
            Shape::Quad(q) => q.area,
        }
    }

    /// Uniformly sample a world-space point and its outward normal on the
    /// surface, given a `[0,1)^2` sample. Used by the emitter set to build
    /// solid-angle samples toward area lights (§3, "Emitter set").
    pub fn sample_point(&self, u: Point2f) -> (Point3f, Vec3f) {
        match self {
            Shape::Sphere(s) => {
                let d = crate::sampling::uniform_sample_sphere(u);
                (s.center + d * s.radius, d)
            }
            Shape::Quad(q) => {
                let p = q.origin + q.u * (2.0 * u.x - 1.0) + q.v * (2.0 * u.y - 1.0);
                (p, q.normal)
            }
        }
    }
}

fn sphere_intersect(s: &Sphere, ray: &Ray) -> Option<HitInfo> {
    let oc = ray.o - s.center;
    let a = ray.d.dot(ray.d);
    let b = 2.0 * oc.dot(ray.d);
    let c = oc.dot(oc) - s.radius * s.radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let t0 = (-b - sqrt_d) / (2.0 * a);
    let t1 = (-b + sqrt_d) / (2.0 * a);

    let t = if t0 >= ray.mint && t0 <= ray.maxt {
        t0
    } else if t1 >= ray.mint && t1 <= ray.maxt {
        t1
    } else {
        return None;
    };

    let p = ray.at(t);
    let gn = (p - s.center) / s.radius;
    let theta = (gn.z.max(-1.0).min(1.0)).acos();
    let phi = gn.y.atan2(gn.x);
    let uv = Point2f::new(
        (phi + std::f32::consts::PI) / (2.0 * std::f32::consts::PI),
        theta / std::f32::consts::PI,
    );

    Some(HitInfo {
        t,
        p,
        gn,
        sn: gn,
        uv,
        area: 4.0 * std::f32::consts::PI * s.radius * s.radius,
        material: s.material.clone(),
        medium_interface: s.medium_interface.clone(),
    })
}

fn quad_intersect(q: &Quad, ray: &Ray) -> Option<HitInfo> {
    let denom = q.normal.dot(ray.d);
    if denom.abs() < 1e-8 {
        return None;
    }
    let t = q.normal.dot(q.origin - ray.o) / denom;
    if t < ray.mint || t > ray.maxt {
        return None;
    }

    let p = ray.at(t);
    let d = p - q.origin;
    let u_len2 = q.u.dot(q.u);
    let v_len2 = q.v.dot(q.v);
    let a = d.dot(q.u) / u_len2;
    let b = d.dot(q.v) / v_len2;
    if a < -1.0 || a > 1.0 || b < -1.0 || b > 1.0 {
        return None;
    }

    Some(HitInfo {
        t,
        p,
        gn: q.normal,
        sn: q.normal,
        uv: Point2f::new(0.5 * (a + 1.0), 0.5 * (b + 1.0)),
        area: q.area,
        material: q.material.clone(),
        medium_interface: q.medium_interface.clone(),
    })
}

/// A flat, non-accelerated list of primitives, standing in for the original
/// renderer's `SurfaceGroup`/BVH (`surfacegroup.cpp`): intersect every
/// primitive, shrinking `ray.maxt` as closer hits are found. A real BVH is
/// out of scope per spec.md §1.
pub struct Aggregate {
    shapes: Vec<Shape>,
}

impl Aggregate {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
        let mut ray = ray.clone();
        let mut closest: Option<HitInfo> = None;
        for shape in &self.shapes {
            if let Some(hit) = shape.intersect(&ray) {
                ray.maxt = hit.t;
                closest = Some(hit);
            }
        }
        closest
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_hit_from_outside() {
        let s = Sphere {
            center: Point3f::new(0.0, 0.0, -5.0),
            radius: 1.0,
            material: None,
            medium_interface: None,
        };
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 0.0, -1.0));
        let hit = sphere_intersect(&s, &ray).expect("should hit");
        assert!((hit.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn sphere_miss() {
        let s = Sphere {
            center: Point3f::new(5.0, 0.0, 0.0),
            radius: 1.0,
            material: None,
            medium_interface: None,
        };
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 0.0, -1.0));
        assert!(sphere_intersect(&s, &ray).is_none());
    }

    #[test]
    fn quad_hit_center() {
        let q = Quad::new(
            Point3f::new(0.0, 0.0, -2.0),
            Vec3f::new(1.0, 0.0, 0.0),
            Vec3f::new(0.0, 1.0, 0.0),
            None,
            None,
        );
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 0.0, -1.0));
        let hit = quad_intersect(&q, &ray).expect("should hit");
        assert!((hit.t - 2.0).abs() < 1e-4);
    }

    #[test]
    fn aggregate_returns_closest_hit() {
        let near = Sphere { center: Point3f::new(0.0, 0.0, -2.0), radius: 1.0, material: None, medium_interface: None };
        let far = Sphere { center: Point3f::new(0.0, 0.0, -10.0), radius: 1.0, material: None, medium_interface: None };
        let agg = Aggregate::new(vec![Shape::Sphere(far), Shape::Sphere(near)]);
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 0.0, -1.0));
        let hit = agg.intersect(&ray).expect("should hit");
        assert!((hit.t - 1.0).abs() < 1e-4);
    }
}
