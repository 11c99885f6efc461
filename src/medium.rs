//! Participating media (spec.md §4.4): homogeneous and heterogeneous
//! (Perlin-noise-modulated) volumes, plus the `MediumInterface` that decides
//! which medium a ray enters after crossing a surface.
//!
//! Grounded on `HomogeneousMedium`/`PerlinMedium`/`MediumInterface` in the
//! original renderer's `medium.h`/`medium.cpp`.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::phase::PhaseFunction;
use crate::ray::Ray;
use crate::sampler::Sampler;
use crate::{Float, Point3f, Vec3f, EPSILON};

/// A sampled in-scattering event: the location, the direction back toward
/// the ray origin, and the medium it occurred in (carried by `Arc` since the
/// integrator needs it to look up the phase function for the next bounce).
pub struct MediumInteraction {
    pub p: Point3f,
    pub wo: Vec3f,
    pub medium: Arc<Medium>,
}

pub struct Homogeneous {
    pub sigma_a: Float,
    pub sigma_s: Float,
    sigma_t: Float,
    pub phase: PhaseFunction,
}

impl Homogeneous {
    pub fn new(sigma_a: Float, sigma_s: Float, phase: PhaseFunction) -> Self {
        Self {
            sigma_a,
            sigma_s,
            sigma_t: sigma_a + sigma_s,
            phase,
        }
    }
}

pub struct Heterogeneous {
    pub sigma_a: Float,
    pub sigma_s: Float,
    sigma_t: Float,
    density_scale: Float,
    density_offset: Float,
    spatial_scale: Vec3f,
    inv_max_density: Float,
    pub phase: PhaseFunction,
    perlin: Perlin,
}

impl Heterogeneous {
    pub fn new(
        sigma_a: Float,
        sigma_s: Float,
        density_scale: Float,
        density_offset: Float,
        spatial_scale: Vec3f,
        phase: PhaseFunction,
        seed: u64,
    ) -> Self {
        let sigma_t = sigma_a + sigma_s;
        let density_scale = density_scale.abs();
        debug_assert!(density_scale + density_offset > 0.0);
        let inv_max_density = 1.0 / (sigma_t * (density_scale + density_offset));
        Self {
            sigma_a,
            sigma_s,
            sigma_t,
            density_scale,
            density_offset,
            spatial_scale,
            inv_max_density,
            phase,
            perlin: Perlin::new(seed),
        }
    }

    fn density(&self, p: Point3f) -> Float {
        let scaled = Point3f::new(
            p.x * self.spatial_scale.x,
            p.y * self.spatial_scale.y,
            p.z * self.spatial_scale.z,
        );
        self.sigma_t * (self.density_scale * self.perlin.noise(scaled) + self.density_offset).max(0.0)
    }
}

pub enum Medium {
    Homogeneous(Homogeneous),
    Heterogeneous(Heterogeneous),
}

/// Defensive cap on ratio-/delta-tracking steps (§7: "implementations should
/// cap loop iterations defensively and log a diagnostic"). The exponential
/// stepping has strictly positive expected progress, so hitting this cap
/// means a degenerate `invMaxDensity`, not legitimate work.
const MAX_MEDIUM_STEPS: u32 = 100_000;

impl Medium {
    pub fn phase(&self) -> &PhaseFunction {
        match self {
            Medium::Homogeneous(m) => &m.phase,
            Medium::Heterogeneous(m) => &m.phase,
        }
    }

    pub fn tr(&self, ray: &Ray, sampler: &mut dyn Sampler) -> Float {
        let ray = ray.normalized();
        match self {
            Medium::Homogeneous(m) => (-m.sigma_t * (ray.maxt - ray.mint)).exp(),
            Medium::Heterogeneous(m) => {
                let mut tr = 1.0;
                let mut t = ray.mint;
                for step in 0..MAX_MEDIUM_STEPS {
                    t -= (1.0 - sampler.next_1d()).ln() * m.inv_max_density;
                    if t >= ray.maxt {
                        break;
                    }
                    tr *= 1.0 - (m.density(ray.at(t)) * m.inv_max_density).max(0.0);
                    if tr < EPSILON {
                        return 0.0;
                    }
                    if step == MAX_MEDIUM_STEPS - 1 {
                        tracing::warn!("heterogeneous medium Tr hit step cap, returning partial result");
                    }
                }
                tr
            }
        }
    }

    /// Returns the Monte-Carlo weight (`sigma_s/sigma_t` on a medium event,
    /// `1` otherwise) and, on a medium event, the sampled point and outgoing
    /// direction (`-ray.d`); the caller (the integrator, which already owns
    /// an `Arc<Medium>` for `self`) wraps these into a `MediumInteraction`.
    pub fn sample(&self, ray: &Ray, sampler: &mut dyn Sampler) -> (Float, Option<(Point3f, Vec3f)>) {
        let ray = ray.normalized();
        match self {
            Medium::Homogeneous(m) => {
                let dist = -(1.0 - sampler.next_1d()).ln() / m.sigma_t;
                let t = dist.min(ray.maxt);
                if t < ray.maxt {
                    (m.sigma_s / m.sigma_t, Some((ray.at(t), -ray.d)))
                } else {
                    (1.0, None)
                }
            }
            Medium::Heterogeneous(m) => {
                let mut t = ray.mint;
                for step in 0..MAX_MEDIUM_STEPS {
                    t -= (1.0 - sampler.next_1d()).ln() * m.inv_max_density;
                    if t >= ray.maxt {
                        break;
                    }
                    if sampler.next_1d() < m.density(ray.at(t)) * m.inv_max_density {
                        return (m.sigma_s / m.sigma_t, Some((ray.at(t), -ray.d)));
                    }
                    if step == MAX_MEDIUM_STEPS - 1 {
                        tracing::warn!("heterogeneous medium Sample hit step cap, treating as a miss");
                    }
                }
                (1.0, None)
            }
        }
    }
}

/// A surface's medium boundary: `inside`/`outside` media on either side of
/// the shading normal. `None` means vacuum.
#[derive(Clone)]
pub struct MediumInterface {
    pub inside: Option<Arc<Medium>>,
    pub outside: Option<Arc<Medium>>,
}

impl MediumInterface {
    pub fn new(inside: Option<Arc<Medium>>, outside: Option<Arc<Medium>>) -> Self {
        Self { inside, outside }
    }

    pub fn uniform(medium: Option<Arc<Medium>>) -> Self {
        Self {
            inside: medium.clone(),
            outside: medium,
        }
    }

    pub fn is_transition(&self) -> bool {
        match (&self.inside, &self.outside) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        }
    }

    /// The medium a ray with shading normal `sn` and direction `d` enters.
    pub fn medium_for(&self, sn: Vec3f, d: Vec3f) -> Option<Arc<Medium>> {
        use cgmath::InnerSpace;
        if sn.dot(d) < 0.0 {
            self.inside.clone()
        } else {
            self.outside.clone()
        }
    }
}

/// Minimal gradient (Perlin) noise generator, needed only to modulate the
/// heterogeneous medium's density field. Not a general-purpose texture/noise
/// module (that's out of scope); this is private to the medium it backs.
struct Perlin {
    perm: [u8; 512],
}

impl Perlin {
    fn new(seed: u64) -> Self {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let mut p: [u8; 256] = [0; 256];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i as u8;
        }
        for i in (1..256).rev() {
            let j = rng.gen_range(0, i + 1);
            p.swap(i, j);
        }
        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&p);
        perm[256..].copy_from_slice(&p);
        Self { perm }
    }

    fn noise(&self, p: Point3f) -> Float {
        let xi = p.x.floor();
        let yi = p.y.floor();
        let zi = p.z.floor();
        let x = p.x - xi;
        let y = p.y - yi;
        let z = p.z - zi;

        let xi = xi as i32 & 255;
        let yi = yi as i32 & 255;
        let zi = zi as i32 & 255;

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let a = self.hash(xi, yi, zi);
        let b = self.hash(xi + 1, yi, zi);
        let c = self.hash(xi, yi + 1, zi);
        let d = self.hash(xi + 1, yi + 1, zi);
        let e = self.hash(xi, yi, zi + 1);
        let f = self.hash(xi + 1, yi, zi + 1);
        let g = self.hash(xi, yi + 1, zi + 1);
        let h = self.hash(xi + 1, yi + 1, zi + 1);

        let x1 = lerp(u, grad(a, x, y, z), grad(b, x - 1.0, y, z));
        let x2 = lerp(u, grad(c, x, y - 1.0, z), grad(d, x - 1.0, y - 1.0, z));
        let y1 = lerp(v, x1, x2);

        let x3 = lerp(u, grad(e, x, y, z - 1.0), grad(f, x - 1.0, y, z - 1.0));
        let x4 = lerp(u, grad(g, x, y - 1.0, z - 1.0), grad(h, x - 1.0, y - 1.0, z - 1.0));
        let y2 = lerp(v, x3, x4);

        (lerp(w, y1, y2) + 1.0) * 0.5
    }

    fn hash(&self, x: i32, y: i32, z: i32) -> u8 {
        let x = (x & 255) as usize;
        let y = (y & 255) as usize;
        let z = (z & 255) as usize;
        self.perm[self.perm[self.perm[x] as usize + y] as usize + z]
    }
}

fn fade(t: Float) -> Float {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: Float, a: Float, b: Float) -> Float {
    a + t * (b - a)
}

fn grad(hash: u8, x: Float, y: Float, z: Float) -> Float {
    match hash & 0xF {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x + z,
        5 => -x + z,
        6 => x - z,
        7 => -x - z,
        8 => y + z,
        9 => -y + z,
        10 => y - z,
        11 => -y - z,
        12 => x + y,
        13 => -y + z,
        14 => -x + y,
        _ => -y - z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::IndependentSampler;

    fn straight_ray(maxt: Float) -> Ray {
        let mut ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 0.0, 1.0));
        ray.maxt = maxt;
        ray
    }

    #[test]
    fn homogeneous_tr_is_one_when_non_absorbing() {
        let phase = PhaseFunction::HenyeyGreenstein(crate::phase::HenyeyGreenstein { g: 0.0 });
        let medium = Medium::Homogeneous(Homogeneous::new(0.0, 0.0, phase));
        let mut sampler = IndependentSampler::new(1, 0);
        let tr = medium.tr(&straight_ray(5.0), &mut sampler);
        assert!((tr - 1.0).abs() < 1e-6);
    }

    #[test]
    fn homogeneous_tr_decays_exponentially() {
        let phase = PhaseFunction::HenyeyGreenstein(crate::phase::HenyeyGreenstein { g: 0.0 });
        let medium = Medium::Homogeneous(Homogeneous::new(0.0, 1.0, phase));
        let mut sampler = IndependentSampler::new(1, 0);
        let tr = medium.tr(&straight_ray(2.0), &mut sampler);
        assert!((tr - (-2.0f32).exp()).abs() < 1e-5);
    }

    #[test]
    fn interface_is_transition_only_when_media_differ() {
        let phase = PhaseFunction::HenyeyGreenstein(crate::phase::HenyeyGreenstein { g: 0.0 });
        let a = Arc::new(Medium::Homogeneous(Homogeneous::new(0.0, 1.0, phase)));
        let iface = MediumInterface::uniform(Some(a.clone()));
        assert!(!iface.is_transition());

        let phase2 = PhaseFunction::HenyeyGreenstein(crate::phase::HenyeyGreenstein { g: 0.0 });
        let b = Arc::new(Medium::Homogeneous(Homogeneous::new(0.0, 2.0, phase2)));
        let iface2 = MediumInterface::new(Some(a), Some(b));
        assert!(iface2.is_transition());
    }
}
