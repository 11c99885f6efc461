//! Surface materials (spec.md §4.2).
//!
//! A closed, tagged-variant `Material` replaces the source's virtual
//! `Material` hierarchy (`material.h`/`material.cpp`): the set of surface
//! types is fixed and known at scene-construction time, and dispatch happens
//! in the integrators' innermost loop, so monomorphised variants beat a
//! vtable here.
//!
//! Convention: `eval` returns the BSDF value already multiplied by
//! `|dot(sn, wi)|` (the "BSDF-cosine product"), so that `eval(wo,wi,hit) /
//! pdf(wo,wi,hit)` is exactly the Monte-Carlo weight the integrators
//! multiply into `throughput` (§4.6/§4.7) — no separate cosine factor is
//! applied by the caller.

use std::sync::Arc;

use cgmath::InnerSpace;

use crate::color::Color;
use crate::ray::{HitInfo, Ray};
use crate::sampler::Sampler;
use crate::sampling::uniform_sample_sphere;
use crate::texture::Texture;
use crate::{Float, Point2f, Vec3f};

pub struct ScatterRecord {
    pub attenuation: Color,
    pub scattered_dir: Vec3f,
    pub is_specular: bool,
}

pub struct Lambertian {
    pub albedo: Arc<dyn Texture<Color>>,
}

pub struct Metal {
    pub albedo: Arc<dyn Texture<Color>>,
    pub roughness: Arc<dyn Texture<Float>>,
}

pub struct Dielectric {
    pub ior: Float,
}

pub struct DiffuseLight {
    pub emit: Arc<dyn Texture<Color>>,
}

pub struct Blend {
    pub a: Arc<Material>,
    pub b: Arc<Material>,
    pub amount: Arc<dyn Texture<Color>>,
}

pub enum Material {
    Lambertian(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
    DiffuseLight(DiffuseLight),
    Blend(Blend),
}

impl Material {
    /// The non-MIS recursive form (§4.2): used by a single-sample-strategy
    /// random walk. Our integrators are both MIS-style (`sample`/`eval`/`pdf`),
    /// but this entry point is kept since it's part of the material contract
    /// and is the natural place to express `Blend`'s stochastic forwarding.
    pub fn scatter(&self, ray_in: &Ray, hit: &HitInfo, sampler: &mut dyn Sampler) -> Option<ScatterRecord> {
        match self {
            Material::Lambertian(m) => {
                let u = uniform_sample_sphere(sampler.next_2d());
                let dir = (hit.sn + u).normalize();
                Some(ScatterRecord {
                    attenuation: m.albedo.eval(hit),
                    scattered_dir: dir,
                    is_specular: false,
                })
            }
            Material::Metal(m) => {
                let reflected = reflect(ray_in.d.normalize(), hit.sn);
                let fuzz = crate::luminance(m.roughness_color(hit));
                let u = uniform_sample_sphere(sampler.next_2d());
                let dir = reflected + fuzz * u;
                if dir.dot(hit.sn) > 0.0 {
                    Some(ScatterRecord {
                        attenuation: m.albedo.eval(hit),
                        scattered_dir: dir,
                        is_specular: true,
                    })
                } else {
                    None
                }
            }
            Material::Dielectric(m) => {
                let (dir, _) = m.sample_specular(ray_in.d, hit.sn, sampler.next_1d());
                Some(ScatterRecord {
                    attenuation: Color::WHITE,
                    scattered_dir: dir,
                    is_specular: true,
                })
            }
            Material::DiffuseLight(_) => None,
            Material::Blend(m) => {
                let t = crate::luminance(m.amount.eval(hit));
                if sampler.next_1d() < t {
                    m.b.scatter(ray_in, hit, sampler)
                } else {
                    m.a.scatter(ray_in, hit, sampler)
                }
            }
        }
    }

    /// MIS form: sample a scattered direction given outgoing direction `wo`
    /// (pointing away from the surface, i.e. `-ray.d`).
    pub fn sample(&self, wo: Vec3f, hit: &HitInfo, u2: Point2f) -> Option<ScatterRecord> {
        match self {
            Material::Lambertian(m) => {
                let u = uniform_sample_sphere(u2);
                let dir = (hit.sn + u).normalize();
                Some(ScatterRecord {
                    attenuation: m.albedo.eval(hit),
                    scattered_dir: dir,
                    is_specular: false,
                })
            }
            Material::Metal(m) => {
                let reflected = reflect(-wo, hit.sn);
                let fuzz = crate::luminance(m.roughness_color(hit));
                let u = uniform_sample_sphere(u2);
                let dir = reflected + fuzz * u;
                if dir.dot(hit.sn) > 0.0 {
                    Some(ScatterRecord {
                        attenuation: m.albedo.eval(hit),
                        scattered_dir: dir,
                        is_specular: true,
                    })
                } else {
                    None
                }
            }
            Material::Dielectric(m) => {
                let (dir, _) = m.sample_specular(-wo, hit.sn, u2.x);
                Some(ScatterRecord {
                    attenuation: Color::WHITE,
                    scattered_dir: dir,
                    is_specular: true,
                })
            }
            Material::DiffuseLight(_) => None,
            Material::Blend(m) => {
                let t = crate::luminance(m.amount.eval(hit));
                if u2.x < t {
                    m.b.sample(wo, hit, u2)
                } else {
                    m.a.sample(wo, hit, u2)
                }
            }
        }
    }

    /// BSDF value times `|cos theta|`; only meaningful when the sampled
    /// direction came from a non-specular variant (specular variants return
    /// black, matching the invariant that `eval`/`pdf` are unused when
    /// `is_specular = true`).
    pub fn eval(&self, _wo: Vec3f, wi: Vec3f, hit: &HitInfo) -> Color {
        match self {
            Material::Lambertian(m) => {
                let cos_theta = hit.sn.dot(wi).max(0.0);
                m.albedo.eval(hit) * (std::f32::consts::FRAC_1_PI * cos_theta)
            }
            Material::Blend(m) => {
                let t = crate::luminance(m.amount.eval(hit));
                m.a.eval(_wo, wi, hit) * (1.0 - t) + m.b.eval(_wo, wi, hit) * t
            }
            Material::Metal(_) | Material::Dielectric(_) | Material::DiffuseLight(_) => Color::BLACK,
        }
    }

    pub fn pdf(&self, _wo: Vec3f, wi: Vec3f, hit: &HitInfo) -> Float {
        match self {
            Material::Lambertian(_) => (hit.sn.dot(wi).max(0.0)) * std::f32::consts::FRAC_1_PI,
            Material::Blend(m) => {
                let t = crate::luminance(m.amount.eval(hit));
                m.a.pdf(_wo, wi, hit) * (1.0 - t) + m.b.pdf(_wo, wi, hit) * t
            }
            Material::Metal(_) | Material::Dielectric(_) | Material::DiffuseLight(_) => 0.0,
        }
    }

    pub fn emitted(&self, ray: &Ray, hit: &HitInfo) -> Color {
        match self {
            Material::DiffuseLight(m) => {
                if ray.d.dot(hit.sn) > 0.0 {
                    Color::BLACK
                } else {
                    m.emit.eval(hit)
                }
            }
            Material::Blend(m) => {
                let t = crate::luminance(m.amount.eval(hit));
                m.a.emitted(ray, hit) * (1.0 - t) + m.b.emitted(ray, hit) * t
            }
            _ => Color::BLACK,
        }
    }

    pub fn is_emissive(&self) -> bool {
        match self {
            Material::DiffuseLight(_) => true,
            Material::Blend(m) => m.a.is_emissive() || m.b.is_emissive(),
            _ => false,
        }
    }
}

impl Metal {
    fn roughness_color(&self, hit: &HitInfo) -> Color {
        Color::uniform(self.roughness.eval(hit))
    }
}

impl Dielectric {
    /// Returns the scattered direction (reflected or refracted) and whether
    /// it was a refraction, choosing stochastically by averaged Fresnel
    /// reflectance. `d` is the incoming ray direction (not necessarily unit).
    fn sample_specular(&self, d: Vec3f, sn: Vec3f, u: Float) -> (Vec3f, bool) {
        let (normal, eta1, eta2) = if d.dot(sn) > 0.0 {
            (-sn, self.ior, 1.0)
        } else {
            (sn, 1.0, self.ior)
        };

        let reflected = reflect(d, sn);
        match refract(d, normal, eta1 / eta2) {
            None => (reflected, false),
            Some((refracted, cos_theta2)) => {
                let cos_theta1 = d.dot(-normal) / d.magnitude();
                let rho_parallel = (eta2 * cos_theta1 - eta1 * cos_theta2)
                    / (eta2 * cos_theta1 + eta1 * cos_theta2);
                let rho_perp = (eta1 * cos_theta1 - eta2 * cos_theta2)
                    / (eta1 * cos_theta1 + eta2 * cos_theta2);
                let f_reflected = (rho_parallel * rho_parallel + rho_perp * rho_perp) / 2.0;
                if u < f_reflected {
                    (reflected, false)
                } else {
                    (refracted, true)
                }
            }
        }
    }
}

fn reflect(v: Vec3f, n: Vec3f) -> Vec3f {
    v - 2.0 * v.dot(n) * n
}

/// Returns `(refracted direction, cos(theta_t))`, or `None` on total internal
/// reflection.
fn refract(v: Vec3f, n: Vec3f, eta_i_over_t: Float) -> Option<(Vec3f, Float)> {
    let uv = v.normalize();
    let dt = uv.dot(n);
    let discriminant = 1.0 - eta_i_over_t * eta_i_over_t * (1.0 - dt * dt);
    if discriminant > 0.0 {
        let cos_theta_t = discriminant.sqrt();
        let refracted = eta_i_over_t * (uv - n * dt) - n * cos_theta_t;
        Some((refracted, cos_theta_t))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point3f;
    use crate::Point2f;

    fn flat_hit(sn: Vec3f) -> HitInfo {
        HitInfo {
            t: 1.0,
            p: Point3f::new(0.0, 0.0, 0.0),
            gn: sn,
            sn,
            uv: Point2f::new(0.0, 0.0),
            area: 1.0,
            material: None,
            medium_interface: None,
        }
    }

    #[test]
    fn lambertian_pdf_matches_eval_ratio() {
        let mat = Material::Lambertian(Lambertian {
            albedo: Arc::new(crate::texture::Constant::new(Color::uniform(0.5))),
        });
        let hit = flat_hit(Vec3f::new(0.0, 0.0, 1.0));
        let wi = Vec3f::new(0.0, 0.0, 1.0);
        let wo = Vec3f::new(0.0, 0.0, 1.0);
        let eval = mat.eval(wo, wi, &hit);
        let pdf = mat.pdf(wo, wi, &hit);
        assert!((eval.r / pdf - 0.5).abs() < 1e-5);
    }

    #[test]
    fn diffuse_light_only_emits_from_front() {
        let mat = Material::DiffuseLight(DiffuseLight {
            emit: Arc::new(crate::texture::Constant::new(Color::uniform(3.0))),
        });
        let hit = flat_hit(Vec3f::new(0.0, 0.0, 1.0));
        let front = Ray::new(Point3f::new(0.0, 0.0, 1.0), Vec3f::new(0.0, 0.0, -1.0));
        let back = Ray::new(Point3f::new(0.0, 0.0, -1.0), Vec3f::new(0.0, 0.0, 1.0));
        assert!(!mat.emitted(&front, &hit).is_black());
        assert!(mat.emitted(&back, &hit).is_black());
    }
}
