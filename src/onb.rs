//! Orthonormal basis construction, used to turn a local-frame direction
//! (phase function samples, cosine-weighted hemisphere samples) into a
//! world-space direction around a given axis.

use cgmath::InnerSpace;

use crate::Vec3f;

pub struct Onb {
    u: Vec3f,
    v: Vec3f,
    w: Vec3f,
}

impl Onb {
    /// Build a basis with `w` aligned to `n` (not required to be normalized).
    pub fn from_w(n: Vec3f) -> Self {
        let w = n.normalize();
        let a = if w.x.abs() > 0.9 {
            Vec3f::new(0.0, 1.0, 0.0)
        } else {
            Vec3f::new(1.0, 0.0, 0.0)
        };
        let v = w.cross(a).normalize();
        let u = w.cross(v);
        Self { u, v, w }
    }

    pub fn to_world(&self, v: Vec3f) -> Vec3f {
        v.x * self.u + v.y * self.v + v.z * self.w
    }
}
