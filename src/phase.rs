//! Phase functions: the angular scattering distribution at a medium
//! interaction (spec.md §4.3). Grounded on `HenyeyGreenstein` in the original
//! renderer's `medium.h`/`medium.cpp`.

use crate::onb::Onb;
use crate::sampling::spherical_direction;
use crate::{Float, InnerSpace, Point2f, Vec3f};

const INV_FOUR_PI: Float = 1.0 / (4.0 * std::f32::consts::PI);

pub struct HenyeyGreenstein {
    pub g: Float,
}

pub enum PhaseFunction {
    HenyeyGreenstein(HenyeyGreenstein),
}

impl PhaseFunction {
    pub fn p(&self, wo: Vec3f, wi: Vec3f) -> Float {
        match self {
            PhaseFunction::HenyeyGreenstein(hg) => hg.p(wo, wi),
        }
    }

    /// Returns the sampled direction and its density (which equals `p(wo,wi)`
    /// for Henyey-Greenstein, since importance sampling is exact; see
    /// spec.md §9's note on the `p/pdf` factor reducing to 1 here).
    pub fn sample(&self, wo: Vec3f, u: Point2f) -> (Vec3f, Float) {
        match self {
            PhaseFunction::HenyeyGreenstein(hg) => hg.sample(wo, u),
        }
    }
}

impl HenyeyGreenstein {
    fn p(&self, wo: Vec3f, wi: Vec3f) -> Float {
        let cos_theta = wo.normalize().dot(wi.normalize());
        let g = self.g;
        let denom = 1.0 + g * g + 2.0 * g * cos_theta;
        if denom <= 0.0 {
            return 0.0;
        }
        INV_FOUR_PI * (1.0 - g * g) / (denom * denom.sqrt())
    }

    fn sample(&self, wo: Vec3f, u: Point2f) -> (Vec3f, Float) {
        let g = self.g;
        let cos_theta = if g.abs() < 1e-3 {
            1.0 - 2.0 * u.x
        } else {
            let sqr_term = (1.0 - g * g) / (1.0 + g - 2.0 * g * u.x);
            -(1.0 + g * g - sqr_term * sqr_term) / (2.0 * g)
        };

        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * std::f32::consts::PI * u.y;

        let onb = Onb::from_w(wo);
        let wi = onb.to_world(spherical_direction(sin_theta, cos_theta, phi)).normalize();
        let pdf = self.p(wo, wi);
        (wi, pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isotropic_pdf_is_constant() {
        let hg = HenyeyGreenstein { g: 0.0 };
        let wo = Vec3f::new(0.0, 0.0, 1.0);
        let wi_a = Vec3f::new(1.0, 0.0, 0.0);
        let wi_b = Vec3f::new(0.0, 1.0, 0.0);
        assert!((hg.p(wo, wi_a) - hg.p(wo, wi_b)).abs() < 1e-6);
        assert!((hg.p(wo, wi_a) - INV_FOUR_PI).abs() < 1e-6);
    }

    #[test]
    fn hg_normalizes_via_monte_carlo() {
        use rand::{Rng, SeedableRng};
        use rand_xoshiro::Xoshiro256Plus;
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        for &g in &[0.0f32, 0.3, 0.8] {
            let hg = HenyeyGreenstein { g };
            let wo = Vec3f::new(0.0, 0.0, 1.0);
            let n = 200_000;
            let mut sum = 0.0;
            for _ in 0..n {
                let u = Point2f::new(rng.gen(), rng.gen());
                let (wi, pdf) = hg.sample(wo, u);
                if pdf > 0.0 {
                    sum += hg.p(wo, wi) / pdf;
                }
            }
            let estimate = sum / n as Float;
            assert!((estimate - 1.0).abs() < 0.05, "g={} estimate={}", g, estimate);
        }
    }
}

