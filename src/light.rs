//! The emitter set (spec.md §3/§4.5,§4.7): a sampler over the scene's
//! emissive surfaces, used by the NEE estimator's direct-light connections.
//!
//! The original renderer spreads this across `Light`/`AreaLight` (see the
//! teacher's `light/mod.rs`, which keeps the analogous `LiSample`/
//! `pdf_incident_radiance` shape); we collapse it to the minimum the
//! integrators need: sample a direction from a reference point toward some
//! emitter, and evaluate the solid-angle density of that sampling process.
//! Uniform selection among emitters, each emitter sampled uniformly over its
//! area.
//!
//! `EmitterSet` stores indices into the scene's shape list rather than
//! borrowing shapes directly, so it can live alongside the `Aggregate` in
//! `Scene` without a self-referential lifetime.

use crate::shapes::Shape;
use crate::{abs_dot, Float, InnerSpace, Point2f, Point3f, Vec3f};

pub struct EmitterSample {
    pub wi: Vec3f,
    pub pdf: Float,
    /// Distance from the reference point to the sampled point on the emitter,
    /// used by the caller to build a shadow ray with a finite `maxt`.
    pub distance: Float,
}

pub struct EmitterSet {
    emitter_indices: Vec<usize>,
}

impl EmitterSet {
    pub fn new(emitter_indices: Vec<usize>) -> Self {
        Self { emitter_indices }
    }

    pub fn is_empty(&self) -> bool {
        self.emitter_indices.is_empty()
    }

    /// Sample a direction from `reference` toward a uniformly-chosen emitter,
    /// returning `None` if there are no emitters or the sample is degenerate
    /// (the caller should treat that identically to `pdf = 0`).
    pub fn sample(&self, shapes: &[Shape], reference: Point3f, u_select: Float, u: Point2f) -> Option<EmitterSample> {
        if self.emitter_indices.is_empty() {
            return None;
        }
        let n = self.emitter_indices.len();
        let idx = ((u_select * n as Float) as usize).min(n - 1);
        let shape = &shapes[self.emitter_indices[idx]];
        let (p, n_light) = shape.sample_point(u);
        let to_light = p - reference;
        let distance2 = to_light.dot(to_light);
        let distance = distance2.sqrt();
        if distance < 1e-8 {
            return None;
        }
        let wi = to_light / distance;
        let cos_light = abs_dot(n_light, -wi);
        if cos_light < 1e-8 {
            return None;
        }
        let area_pdf = 1.0 / (n as Float * shape.area());
        let pdf = area_pdf * distance2 / cos_light;
        Some(EmitterSample { wi, pdf, distance })
    }

    /// The solid-angle density of sampling the direction toward `hit_point`
    /// (on `hit_shape`, with normal `hit_normal`) from `reference`, as
    /// `sample` would have produced it. Used as `pdf_L` on the BSDF/phase-
    /// sampled MIS branch (§4.7) when the BSDF-sampled ray happens to land on
    /// an emitter.
    pub fn pdf(&self, hit_shape_area: Float, reference: Point3f, hit_point: Point3f, hit_normal: Vec3f, wi: Vec3f) -> Float {
        if self.emitter_indices.is_empty() {
            return 0.0;
        }
        let to_light = hit_point - reference;
        let distance2 = to_light.dot(to_light);
        let cos_light = abs_dot(hit_normal, -wi);
        if cos_light < 1e-8 {
            return 0.0;
        }
        let area_pdf = 1.0 / (self.emitter_indices.len() as Float * hit_shape_area);
        area_pdf * distance2 / cos_light
    }
}
