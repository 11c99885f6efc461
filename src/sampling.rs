//! Shared Monte-Carlo sampling routines used by the camera, materials, phase
//! functions and integrators.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::{Float, Point2f, Vec3f};

pub fn concentric_sample_disk(u: Point2f) -> Point2f {
    let u_offset = Point2f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0);
    if u_offset.x == 0.0 && u_offset.y == 0.0 {
        return Point2f::new(0.0, 0.0);
    }

    let (theta, r) = if u_offset.x.abs() > u_offset.y.abs() {
        (FRAC_PI_4 * (u_offset.y / u_offset.x), u_offset.x)
    } else {
        (FRAC_PI_2 - FRAC_PI_4 * (u_offset.x / u_offset.y), u_offset.y)
    };

    Point2f::new(r * theta.cos(), r * theta.sin())
}

/// Uniform sample on the unit sphere, used by Lambertian/Metal scattering
/// (`normalize(sn + u)` / reflected-direction perturbation in spec.md §4.2).
pub fn uniform_sample_sphere(u: Point2f) -> Vec3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Build a direction from spherical coordinates around the local `z` axis.
pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vec3f {
    Vec3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// The MIS power heuristic (spec.md §4.7): `pdfA^beta / (pdfA^beta + pdfB^beta)`.
pub fn power_heuristic(beta: Float, pdf_a: Float, pdf_b: Float) -> Float {
    let a = pdf_a.powf(beta);
    let b = pdf_b.powf(beta);
    if a + b == 0.0 {
        0.0
    } else {
        a / (a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mis_weights_sum_to_one() {
        for &(a, b) in &[(1.0, 1.0), (2.0, 5.0), (0.1, 30.0)] {
            let wa = power_heuristic(2.0, a, b);
            let wb = power_heuristic(2.0, b, a);
            assert!((wa + wb - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn uniform_sphere_samples_are_unit_length() {
        let u = Point2f::new(0.37, 0.81);
        let d = uniform_sample_sphere(u);
        assert!((d.x * d.x + d.y * d.y + d.z * d.z - 1.0).abs() < 1e-5);
    }
}
