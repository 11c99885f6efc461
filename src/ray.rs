//! Rays and intersection records.
//!
//! `Ray::medium` is morally a borrow into the scene's medium arena: it's
//! cheap to clone and must never participate in ownership. We model "the
//! medium a ray is currently travelling through" as an `Option<Arc<Medium>>`
//! rather than a raw pointer, since `Medium`s are owned by the `Scene` and
//! shared read-only across worker threads.

use std::sync::Arc;

use cgmath::InnerSpace;

use crate::material::Material;
use crate::medium::{Medium, MediumInterface};
use crate::{Float, Point2f, Point3f, Vec3f, EPSILON, INFINITY};

#[derive(Clone)]
pub struct Ray {
    pub o: Point3f,
    pub d: Vec3f,
    pub mint: Float,
    pub maxt: Float,
    /// The medium at `o + mint * d` — the ray is "about to enter" this medium,
    /// not necessarily the medium surrounding `o` itself.
    pub medium: Option<Arc<Medium>>,
}

impl Ray {
    pub fn new(o: Point3f, d: Vec3f) -> Self {
        Self {
            o,
            d,
            mint: EPSILON,
            maxt: INFINITY,
            medium: None,
        }
    }

    pub fn with_medium(mut self, medium: Option<Arc<Medium>>) -> Self {
        self.medium = medium;
        self
    }

    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }

    /// A ray with the same origin/direction/medium but a fresh `[EPSILON, +inf)`
    /// interval, matching the three-part invariant `TrL` and the integrators
    /// maintain across bounces (§4.5 invariant 1).
    pub fn spawn(o: Point3f, d: Vec3f, medium: Option<Arc<Medium>>) -> Self {
        Self::new(o, d).with_medium(medium)
    }

    /// Returns a copy normalized so that `|d| = 1`; `Medium::tr`/`sample`
    /// integrate in units of `t` along a unit direction and must not assume
    /// the caller already normalized the ray (§4.4 precondition).
    pub fn normalized(&self) -> Ray {
        let len = self.d.magnitude();
        Ray {
            o: self.o,
            d: self.d / len,
            mint: self.mint * len,
            maxt: if self.maxt.is_infinite() {
                self.maxt
            } else {
                self.maxt * len
            },
            medium: self.medium.clone(),
        }
    }
}

/// The result of intersecting a ray against the scene.
pub struct HitInfo {
    pub t: Float,
    pub p: Point3f,
    /// Geometric normal, from the underlying surface.
    pub gn: Vec3f,
    /// Shading normal (may differ from `gn` under interpolated/bump-mapped
    /// shading; the two coincide for the flat primitives this crate ships).
    pub sn: Vec3f,
    pub uv: Point2f,
    /// Surface area of the shape that was hit, needed by the emitter set's
    /// `pdf` (area-to-solid-angle conversion) when a BSDF/phase-sampled ray
    /// happens to land on an emitter (§4.7's BSDF-sampled MIS branch).
    pub area: Float,
    /// `None` for a surface that only marks a medium transition (a "null
    /// material" in the source renderer's terminology).
    pub material: Option<Arc<Material>>,
    pub medium_interface: Option<MediumInterface>,
}

impl HitInfo {
    /// The medium a ray entering this hit (with incoming direction `d`)
    /// transitions into, if the hit surface is a medium boundary.
    pub fn next_medium(&self, d: Vec3f) -> Option<Arc<Medium>> {
        self.medium_interface
            .as_ref()
            .and_then(|mi| mi.medium_for(self.sn, d))
    }

    pub fn is_medium_transition(&self) -> bool {
        self.medium_interface
            .as_ref()
            .map_or(false, MediumInterface::is_transition)
    }
}
