//! Scene description (spec.md §6): the structured document the core
//! consumes but does not otherwise interpret. Parsing lives here purely so
//! the core has something concrete to be constructed from in the CLI driver
//! and in integration tests; the grammar is deliberately thin — meshes, BVH
//! acceleration, image backgrounds and Halton sampling are all out of scope
//! (spec.md §1) and are rejected with a construction error rather than
//! silently ignored.
//!
//! Grounded on the original renderer's `parser.cpp`/`Scene::parseFromJSON`
//! (each top-level key dispatches on a `"type"` tag, with by-name material
//! references resolved against previously-declared materials) and on the
//! teacher's use of `serde`/`serde_json` plus `anyhow::Context` for
//! construction-time error reporting.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cgmath::Matrix4;
use serde::Deserialize;

use crate::background::{Background, ConstantBackground, GradientBackground};
use crate::camera::Camera;
use crate::color::Color;
use crate::integrator::{Integrator, NeeMis, Unidirectional};
use crate::material::{Blend, Dielectric, DiffuseLight, Lambertian, Material, Metal};
use crate::medium::{Heterogeneous, Homogeneous, Medium, MediumInterface};
use crate::phase::{HenyeyGreenstein, PhaseFunction};
use crate::sampler::{IndependentSampler, Sampler, StratifiedSampler};
use crate::scene::Scene;
use crate::shapes::{Quad, Shape, Sphere};
use crate::texture::Constant;
use crate::{Float, Point2i, Point3f, Vec3f};

/// A `[r, g, b]` triple or bare scalar (broadcast to all three channels),
/// matching the original renderer's json convention of accepting either for
/// color-valued fields.
#[derive(Deserialize, Clone, Copy)]
#[serde(untagged)]
enum ColorOrScalar {
    Scalar(Float),
    Rgb([Float; 3]),
}

impl From<ColorOrScalar> for Color {
    fn from(c: ColorOrScalar) -> Color {
        match c {
            ColorOrScalar::Scalar(v) => Color::uniform(v),
            ColorOrScalar::Rgb([r, g, b]) => Color::new(r, g, b),
        }
    }
}

/// A 4x4 row-major transform matrix, or omitted for identity. The original
/// renderer's `Transform` also accepts an array of chained `"translate"` /
/// `"scale"` / `"o"/"at"/"up"` commands; that richer grammar has no
/// counterpart here and a bare matrix is all scene construction supports
/// (see DESIGN.md's open-question note).
#[derive(Deserialize, Default)]
#[serde(transparent)]
struct TransformDesc(Option<[[Float; 4]; 4]>);

impl TransformDesc {
    fn to_matrix(&self) -> Matrix4<Float> {
        match self.0 {
            None => Matrix4::from_scale(1.0),
            Some(rows) => {
                // cgmath::Matrix4::new takes column-major arguments; the
                // scene file is row-major, so transpose on the way in.
                Matrix4::new(
                    rows[0][0], rows[1][0], rows[2][0], rows[3][0],
                    rows[0][1], rows[1][1], rows[2][1], rows[3][1],
                    rows[0][2], rows[1][2], rows[2][2], rows[3][2],
                    rows[0][3], rows[1][3], rows[2][3], rows[3][3],
                )
            }
        }
    }
}

#[derive(Deserialize)]
struct CameraDesc {
    #[serde(default)]
    transform: TransformDesc,
    resolution: [i32; 2],
    vfov: Float,
    fdist: Float,
    #[serde(default)]
    aperture: Float,
    #[serde(default)]
    medium: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum BackgroundDesc {
    #[serde(rename = "constant")]
    Constant { color: ColorOrScalar },
    #[serde(rename = "gradient")]
    Gradient { horizon: ColorOrScalar, zenith: ColorOrScalar },
}

/// A bare `[r,g,b]`/scalar is also accepted as shorthand for `{"type":
/// "constant", "color": ...}` (matching spec.md §6's "a 3-vector colour or
/// `{type: "image", filename}`" — the image variant is out of scope, so a
/// plain color is the only non-tagged form we accept).
#[derive(Deserialize)]
#[serde(untagged)]
enum BackgroundField {
    Bare(ColorOrScalar),
    Tagged(BackgroundDesc),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MaterialDesc {
    Lambertian {
        #[serde(default = "default_albedo")]
        albedo: ColorOrScalar,
    },
    Metal {
        #[serde(default = "default_albedo")]
        albedo: ColorOrScalar,
        #[serde(default)]
        roughness: Float,
    },
    Dielectric {
        #[serde(default = "default_ior")]
        ior: Float,
    },
    #[serde(rename = "diffuse light")]
    DiffuseLight { emit: ColorOrScalar },
    Blend {
        a: Box<MaterialField>,
        b: Box<MaterialField>,
        amount: ColorOrScalar,
    },
}

fn default_albedo() -> ColorOrScalar {
    ColorOrScalar::Scalar(0.5)
}

fn default_ior() -> Float {
    1.5
}

/// A material field is either a name referencing a previously-declared
/// material, or an inline material object (spec.md §6: `material (name or
/// inline)`), mirroring `Scene::findOrCreateMaterial` in the original
/// renderer.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaterialField {
    Named(String),
    Inline(MaterialDesc),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MediumDesc {
    Homogeneous {
        #[serde(default)]
        sigma_a: Float,
        #[serde(default = "default_sigma_s")]
        sigma_s: Float,
        #[serde(default)]
        phase: PhaseDesc,
    },
    Heterogeneous {
        #[serde(default)]
        sigma_a: Float,
        #[serde(default = "default_sigma_s")]
        sigma_s: Float,
        #[serde(default)]
        phase: PhaseDesc,
        #[serde(default = "default_density_scale")]
        density_scale: Float,
        #[serde(default = "default_density_offset")]
        density_offset: Float,
        #[serde(default = "default_spatial_scale")]
        spatial_scale: [Float; 3],
        #[serde(default)]
        seed: u64,
    },
}

/// The medium's phase function, nested under its own `"phase"` key
/// (`j.at("phase")` in the original renderer's `HomogeneousMedium`/
/// `PerlinMedium` constructors) rather than flattened onto the medium
/// object. Henyey-Greenstein is the only variant spec.md names (§3), so
/// there's no `"type"` tag to dispatch on yet — just its `g` parameter.
#[derive(Deserialize, Default)]
struct PhaseDesc {
    #[serde(default)]
    g: Float,
}

fn default_sigma_s() -> Float {
    1.0
}
fn default_density_scale() -> Float {
    1.0
}
fn default_density_offset() -> Float {
    0.0
}
fn default_spatial_scale() -> [Float; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Deserialize)]
struct MediumInterfaceDesc {
    #[serde(default)]
    inside: Option<String>,
    #[serde(default)]
    outside: Option<String>,
}

/// `medium` on a surface may be either a single name (the interior medium,
/// with vacuum outside) or an explicit `{inside, outside}` pair.
#[derive(Deserialize)]
#[serde(untagged)]
enum MediumField {
    Named(String),
    Interface(MediumInterfaceDesc),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SurfaceDesc {
    Sphere {
        center: [Float; 3],
        radius: Float,
        #[serde(default)]
        material: Option<MaterialField>,
        #[serde(default)]
        medium: Option<MediumField>,
    },
    Quad {
        #[serde(default)]
        transform: TransformDesc,
        #[serde(default = "default_quad_size")]
        size: [Float; 2],
        #[serde(default)]
        material: Option<MaterialField>,
        #[serde(default)]
        medium: Option<MediumField>,
    },
}

fn default_quad_size() -> [Float; 2] {
    [1.0, 1.0]
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AcceleratorDesc {
    Group,
    #[serde(rename = "bbh")]
    Bbh,
}

impl Default for AcceleratorDesc {
    fn default() -> Self {
        AcceleratorDesc::Group
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IntegratorDesc {
    Unidirectional {
        #[serde(default = "default_max_bounces")]
        max_bounces: u32,
    },
    #[serde(rename = "nee")]
    NeeMis {
        #[serde(default = "default_max_bounces")]
        max_bounces: u32,
        #[serde(default = "default_mis_power")]
        mis_power: Float,
    },
}

fn default_max_bounces() -> u32 {
    5
}
fn default_mis_power() -> Float {
    2.0
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SamplerDesc {
    /// `samples_per_pixel` overrides the top-level `image_samples` (spec.md
    /// §6 lists both; when a sampler doesn't specify its own count, the
    /// driver uses the film-wide sample budget instead).
    Independent {
        #[serde(default)]
        samples_per_pixel: Option<usize>,
    },
    Stratified {
        #[serde(default)]
        samples_per_pixel: Option<usize>,
    },
}

#[derive(Deserialize)]
pub struct SceneDesc {
    camera: CameraDesc,
    #[serde(default = "default_image_samples")]
    image_samples: usize,
    background: BackgroundField,
    #[serde(default)]
    materials: Vec<NamedMaterialDesc>,
    #[serde(default)]
    media: Vec<NamedMediumDesc>,
    surfaces: Vec<SurfaceDesc>,
    #[serde(default)]
    accelerator: AcceleratorDesc,
    integrator: IntegratorDesc,
    sampler: SamplerDesc,
}

fn default_image_samples() -> usize {
    16
}

#[derive(Deserialize)]
struct NamedMaterialDesc {
    name: String,
    #[serde(flatten)]
    desc: MaterialDesc,
}

#[derive(Deserialize)]
struct NamedMediumDesc {
    name: String,
    #[serde(flatten)]
    desc: MediumDesc,
}

/// Everything needed to run a render: the scene, the integrator, the
/// sampler prototype (cloned per-tile, §5) and the requested sample count.
pub struct RenderSetup {
    pub scene: Scene,
    pub integrator: Integrator,
    pub sampler: Box<dyn Sampler>,
    pub image_samples: usize,
}

impl SceneDesc {
    pub fn parse(json: &str) -> Result<SceneDesc> {
        serde_json::from_str(json).context("failed to parse scene description")
    }

    /// Build the immutable scene graph and integrator this description
    /// names. Errors here are construction-time (spec.md §7): missing keys
    /// are caught by `serde`'s required-field checking; everything else
    /// (unknown material reference, `accelerator: "bbh"`) is reported with
    /// enough context to find the offending fragment.
    pub fn build(&self) -> Result<RenderSetup> {
        if matches!(self.accelerator, AcceleratorDesc::Bbh) {
            return Err(anyhow!(
                "accelerator type 'bbh' requires a BVH, which is out of scope for this core; use 'group'"
            ));
        }

        let mut materials: HashMap<String, Arc<Material>> = HashMap::new();
        for named in &self.materials {
            let mat = build_material(&named.desc, &materials)
                .with_context(|| format!("building material '{}'", named.name))?;
            materials.insert(named.name.clone(), Arc::new(mat));
        }

        let mut media: HashMap<String, Arc<Medium>> = HashMap::new();
        for named in &self.media {
            let medium = build_medium(&named.desc)
                .with_context(|| format!("building medium '{}'", named.name))?;
            media.insert(named.name.clone(), Arc::new(medium));
        }

        let camera_medium = self
            .camera
            .medium
            .as_ref()
            .map(|name| lookup_medium(&media, name))
            .transpose()?;
        let camera = Camera::new(
            self.camera.transform.to_matrix(),
            Point2i::new(self.camera.resolution[0], self.camera.resolution[1]),
            self.camera.vfov,
            self.camera.fdist,
            self.camera.aperture,
            camera_medium,
        );

        let background: Box<dyn Background> = match &self.background {
            BackgroundField::Bare(c) => Box::new(ConstantBackground { color: (*c).clone().into() }),
            BackgroundField::Tagged(BackgroundDesc::Constant { color }) => {
                Box::new(ConstantBackground { color: (*color).clone().into() })
            }
            BackgroundField::Tagged(BackgroundDesc::Gradient { horizon, zenith }) => Box::new(GradientBackground {
                horizon: (*horizon).clone().into(),
                zenith: (*zenith).clone().into(),
            }),
        };

        let mut shapes = Vec::with_capacity(self.surfaces.len());
        for (i, surface) in self.surfaces.iter().enumerate() {
            let shape = build_surface(surface, &materials, &media)
                .with_context(|| format!("building surface #{}", i))?;
            shapes.push(shape);
        }

        let scene = Scene::new(shapes, background, camera);

        let integrator = match &self.integrator {
            IntegratorDesc::Unidirectional { max_bounces } => {
                Integrator::Unidirectional(Unidirectional::new(*max_bounces))
            }
            IntegratorDesc::NeeMis { max_bounces, mis_power } => {
                Integrator::NeeMis(NeeMis::new(*max_bounces, *mis_power))
            }
        };

        let sampler: Box<dyn Sampler> = match &self.sampler {
            SamplerDesc::Independent { samples_per_pixel } => {
                Box::new(IndependentSampler::new(samples_per_pixel.unwrap_or(self.image_samples), 0))
            }
            SamplerDesc::Stratified { samples_per_pixel } => {
                Box::new(StratifiedSampler::new(samples_per_pixel.unwrap_or(self.image_samples), 0))
            }
        };

        Ok(RenderSetup {
            scene,
            integrator,
            sampler,
            image_samples: self.image_samples,
        })
    }
}

fn lookup_medium(media: &HashMap<String, Arc<Medium>>, name: &str) -> Result<Arc<Medium>> {
    media
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow!("no medium named '{}' was declared", name))
}

fn resolve_medium_field(
    field: &Option<MediumField>,
    media: &HashMap<String, Arc<Medium>>,
) -> Result<Option<MediumInterface>> {
    match field {
        None => Ok(None),
        Some(MediumField::Named(name)) => {
            let m = lookup_medium(media, name)?;
            Ok(Some(MediumInterface::new(Some(m), None)))
        }
        Some(MediumField::Interface(iface)) => {
            let inside = iface.inside.as_deref().map(|n| lookup_medium(media, n)).transpose()?;
            let outside = iface.outside.as_deref().map(|n| lookup_medium(media, n)).transpose()?;
            Ok(Some(MediumInterface::new(inside, outside)))
        }
    }
}

fn resolve_material_field(
    field: &Option<MaterialField>,
    materials: &HashMap<String, Arc<Material>>,
) -> Result<Option<Arc<Material>>> {
    match field {
        None => Ok(None),
        Some(field) => Ok(Some(resolve_material_ref(field, materials)?)),
    }
}

/// Resolves a (non-optional) material reference, used directly by surfaces
/// and recursively by `Blend`'s two children.
fn resolve_material_ref(field: &MaterialField, materials: &HashMap<String, Arc<Material>>) -> Result<Arc<Material>> {
    match field {
        MaterialField::Named(name) => materials
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no material named '{}' was declared", name)),
        MaterialField::Inline(desc) => Ok(Arc::new(build_material(desc, materials)?)),
    }
}

fn build_material(desc: &MaterialDesc, materials: &HashMap<String, Arc<Material>>) -> Result<Material> {
    Ok(match desc {
        MaterialDesc::Lambertian { albedo } => Material::Lambertian(Lambertian {
            albedo: Arc::new(Constant::new(Color::from(albedo.clone()))),
        }),
        MaterialDesc::Metal { albedo, roughness } => Material::Metal(Metal {
            albedo: Arc::new(Constant::new(Color::from(albedo.clone()))),
            roughness: Arc::new(Constant::new(*roughness)),
        }),
        MaterialDesc::Dielectric { ior } => Material::Dielectric(Dielectric { ior: *ior }),
        MaterialDesc::DiffuseLight { emit } => Material::DiffuseLight(DiffuseLight {
            emit: Arc::new(Constant::new(Color::from(emit.clone()))),
        }),
        MaterialDesc::Blend { a, b, amount } => {
            let a = resolve_material_ref(a, materials)?;
            let b = resolve_material_ref(b, materials)?;
            Material::Blend(Blend {
                a,
                b,
                amount: Arc::new(Constant::new(Color::from(amount.clone()))),
            })
        }
    })
}

fn build_medium(desc: &MediumDesc) -> Result<Medium> {
    Ok(match desc {
        MediumDesc::Homogeneous { sigma_a, sigma_s, phase } => {
            let phase = PhaseFunction::HenyeyGreenstein(HenyeyGreenstein { g: phase.g });
            Medium::Homogeneous(Homogeneous::new(*sigma_a, *sigma_s, phase))
        }
        MediumDesc::Heterogeneous {
            sigma_a,
            sigma_s,
            phase,
            density_scale,
            density_offset,
            spatial_scale,
            seed,
        } => {
            let phase = PhaseFunction::HenyeyGreenstein(HenyeyGreenstein { g: phase.g });
            Medium::Heterogeneous(Heterogeneous::new(
                *sigma_a,
                *sigma_s,
                *density_scale,
                *density_offset,
                Vec3f::new(spatial_scale[0], spatial_scale[1], spatial_scale[2]),
                phase,
                *seed,
            ))
        }
    })
}

fn build_surface(
    desc: &SurfaceDesc,
    materials: &HashMap<String, Arc<Material>>,
    media: &HashMap<String, Arc<Medium>>,
) -> Result<Shape> {
    Ok(match desc {
        SurfaceDesc::Sphere { center, radius, material, medium } => Shape::Sphere(Sphere {
            center: Point3f::new(center[0], center[1], center[2]),
            radius: *radius,
            material: resolve_material_field(material, materials)?,
            medium_interface: resolve_medium_field(medium, media)?,
        }),
        SurfaceDesc::Quad { transform, size, material, medium } => {
            use cgmath::Transform as _;
            let xform = transform.to_matrix();
            let origin = xform.transform_point(Point3f::new(0.0, 0.0, 0.0));
            let u = xform.transform_vector(Vec3f::new(size[0] * 0.5, 0.0, 0.0));
            let v = xform.transform_vector(Vec3f::new(0.0, size[1] * 0.5, 0.0));
            Shape::Quad(Quad::new(
                origin,
                u,
                v,
                resolve_material_field(material, materials)?,
                resolve_medium_field(medium, media)?,
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_SCENE: &str = r#"
    {
        "camera": { "resolution": [4, 4], "vfov": 90, "fdist": 1.0 },
        "image_samples": 8,
        "background": [0.1, 0.2, 0.3],
        "materials": [
            { "name": "floor", "type": "lambertian", "albedo": [0.5, 0.5, 0.5] },
            { "name": "light", "type": "diffuse light", "emit": [10, 10, 10] }
        ],
        "surfaces": [
            { "type": "sphere", "center": [0, -100.5, -1], "radius": 100, "material": "floor" },
            { "type": "quad", "material": "light" }
        ],
        "integrator": { "type": "nee", "max_bounces": 4, "mis_power": 2 },
        "sampler": { "type": "independent", "samples_per_pixel": 8 }
    }
    "#;

    #[test]
    fn parses_and_builds_a_minimal_scene() {
        let desc = SceneDesc::parse(MINIMAL_SCENE).expect("should parse");
        let setup = desc.build().expect("should build");
        assert_eq!(setup.image_samples, 8);
        assert_eq!(setup.scene.shapes().len(), 2);
        assert!(!setup.scene.emitters.is_empty());
    }

    #[test]
    fn unknown_material_reference_is_an_error() {
        let json = r#"
        {
            "camera": { "resolution": [2, 2], "vfov": 90, "fdist": 1.0 },
            "background": [0,0,0],
            "surfaces": [{ "type": "sphere", "center": [0,0,0], "radius": 1, "material": "nope" }],
            "integrator": { "type": "unidirectional", "max_bounces": 2 },
            "sampler": { "type": "independent", "samples_per_pixel": 4 }
        }
        "#;
        let desc = SceneDesc::parse(json).expect("should parse");
        assert!(desc.build().is_err());
    }
}
