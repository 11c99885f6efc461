//! Core light-transport engine for a physically-based volumetric path tracer.
//!
//! This crate implements the rendering loop, the ray/scene intersection
//! abstraction, material (BSDF) and phase-function sampling, and the two
//! volumetric integrators (unidirectional and next-event-estimation with
//! MIS). Geometry, acceleration structures and scene-file parsing are kept
//! deliberately thin: they exist only so the integrators have something
//! concrete to walk during tests and the CLI driver.

pub use cgmath::{InnerSpace, Point2, Point3, Vector2, Vector3};

pub mod background;
pub mod camera;
pub mod color;
pub mod film;
pub mod integrator;
pub mod light;
pub mod material;
pub mod medium;
pub mod onb;
pub mod phase;
pub mod ray;
pub mod sampler;
pub mod sampling;
pub mod scene;
pub mod scene_desc;
pub mod shapes;
pub mod texture;

/// The core crate is built entirely on single-precision floats; there is no
/// need for the double-precision path some renderers keep around.
pub type Float = f32;

pub type Point2f = Point2<Float>;
pub type Point2i = Point2<i32>;
pub type Point3f = Point3<Float>;
pub type Vec2f = Vector2<Float>;
pub type Vec3f = Vector3<Float>;

pub const INFINITY: Float = std::f32::INFINITY;
pub const EPSILON: Float = 1e-4;

/// Absolute value of the dot product between two (not necessarily unit) vectors.
pub fn abs_dot(a: Vec3f, b: Vec3f) -> Float {
    a.dot(b).abs()
}

/// Perceptual luminance of a linear RGB color, used by Russian roulette and
/// by materials/media that need a scalar proxy for a spectral quantity
/// (e.g. `Blend`'s mixing weight, `Metal`'s roughness texture).
pub fn luminance(c: color::Color) -> Float {
    0.212671 * c.r + 0.715160 * c.g + 0.072169 * c.b
}

pub fn lerp(t: Float, a: Float, b: Float) -> Float {
    (1.0 - t) * a + t * b
}
