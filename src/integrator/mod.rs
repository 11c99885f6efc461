//! Shared integrator machinery: the transmittance-aware light walk (`tr_l`,
//! spec §4.5) used both for primary-ray emission and NEE's direct-light
//! connections, and the tile-based parallel render driver (§4.9/§5).
//!
//! Grounded on `TrL` in the original renderer's `medium.cpp`, and on the
//! teacher's `SamplerIntegrator::{iter_tiles, render, render_parallel,
//! render_tile}` for the tiling/progress-bar/rayon pattern (the teacher's
//! ray-differential and `Bump`-arena machinery has no counterpart here).

pub mod nee_mis;
pub mod unidirectional;

use rayon::prelude::*;

pub use nee_mis::NeeMis;
pub use unidirectional::Unidirectional;

use crate::color::Color;
use crate::film::Film;
use crate::ray::Ray;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::{Float, Point2i, EPSILON, INFINITY};

/// Russian-roulette threshold (spec.md §4.6/§9): the mature value found in
/// the NEE estimator, adopted for both integrators.
const RR_THRESHOLD: Float = 1.0;

/// The two volumetric path-tracing estimators (§4.6/§4.7), behind one
/// dispatch point so the render driver and scene loader aren't generic over
/// the choice.
pub enum Integrator {
    Unidirectional(Unidirectional),
    NeeMis(NeeMis),
}

impl Integrator {
    pub fn li(&self, ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> Color {
        match self {
            Integrator::Unidirectional(i) => i.li(ray, scene, sampler),
            Integrator::NeeMis(i) => i.li(ray, scene, sampler),
        }
    }
}

/// Transmittance-aware light walk (§4.5): the radiance reaching `ray.o`
/// along `ray`, passing straight through null-material medium-transition
/// surfaces and accumulating transmittance across the segments crossed.
/// Grounded on `TrL` in the original renderer's `medium.cpp`.
pub fn tr_l(scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray) -> Color {
    let mut ray = ray.clone();
    ray.maxt = INFINITY;
    let mut tr = 1.0;

    loop {
        let hit = scene.intersect(&ray);
        if let Some(h) = &hit {
            ray.maxt = h.t + EPSILON;
        }

        if let Some(medium) = &ray.medium {
            tr *= medium.tr(&ray, sampler);
        }

        if let Some(h) = &hit {
            if let Some(mat) = &h.material {
                return if mat.is_emissive() {
                    mat.emitted(&ray, h) * tr
                } else {
                    Color::BLACK
                };
            }
        }

        if tr < EPSILON {
            return Color::BLACK;
        }

        let h = match &hit {
            Some(h) => h,
            None => return scene.background.value(&ray) * tr,
        };

        let next_medium = if h.is_medium_transition() {
            h.next_medium(ray.d)
        } else {
            ray.medium.clone()
        };
        let o = ray.at(h.t + EPSILON);
        let d = ray.d;
        ray = Ray::spawn(o, d, next_medium);
    }
}

/// Pixels are rendered in square tiles so each worker owns a disjoint film
/// region (§5: "the image accumulator is partitioned so writes never alias
/// between workers").
const TILE_SIZE: i32 = 16;

#[derive(Clone, Copy)]
struct Tile {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

fn tiles(resolution: Point2i) -> Vec<Tile> {
    let mut out = Vec::new();
    let mut y0 = 0;
    while y0 < resolution.y {
        let y1 = (y0 + TILE_SIZE).min(resolution.y);
        let mut x0 = 0;
        while x0 < resolution.x {
            let x1 = (x0 + TILE_SIZE).min(resolution.x);
            out.push(Tile { x0, y0, x1, y1 });
            x0 = x1;
        }
        y0 = y1;
    }
    out
}

/// A tile's position doubles as a stable per-tile seed, so tiles rendered in
/// parallel don't share RNG state (mirroring the teacher's `tile_id`).
fn tile_id(tile: Tile, n_cols: i32) -> u64 {
    (tile.y0 as i64 * n_cols as i64 + tile.x0 as i64) as u64
}

fn make_progress_bar(total: u64) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(total);
    bar.set_draw_delta(127);
    bar
}

fn check_radiance(l: Color, x: i32, y: i32) {
    assert!(!l.has_nans(), "NaN radiance value for pixel ({}, {})", x, y);
    assert!(l.is_finite(), "non-finite radiance value for pixel ({}, {})", x, y);
}

/// Russian roulette (§4.6 step 5): returns `false` when the path should
/// terminate. `q` is the kill probability; surviving paths are reweighted by
/// `1/(1-q)` so the estimator stays unbiased.
pub(crate) fn russian_roulette(throughput: &mut Color, sampler: &mut dyn Sampler) -> bool {
    let lum = crate::luminance(*throughput);
    if lum < RR_THRESHOLD {
        let q: Float = (1.0 - lum).max(0.05);
        if sampler.next_1d() < q {
            return false;
        }
        *throughput /= 1.0 - q;
    }
    true
}

fn render_tile(
    scene: &Scene,
    integrator: &Integrator,
    sampler: &mut dyn Sampler,
    film: &Film,
    tile: Tile,
    progress: &indicatif::ProgressBar,
) {
    let mut film_tile = film.get_film_tile(tile.x0, tile.y0, tile.x1, tile.y1);

    for y in tile.y0..tile.y1 {
        for x in tile.x0..tile.x1 {
            sampler.start_pixel(Point2i::new(x, y));
            while sampler.start_next_sample() {
                let pixel_sample = sampler.next_2d();
                let lens_sample = sampler.next_2d();
                let ray = scene.camera.generate_ray(
                    x as Float + pixel_sample.x,
                    y as Float + pixel_sample.y,
                    lens_sample,
                );
                let radiance = integrator.li(&ray, scene, sampler);
                check_radiance(radiance, x, y);
                film_tile.add_sample(x, y, radiance);
            }
            progress.inc(1);
        }
    }

    film.merge_film_tile(film_tile);
}

/// Renders tiles one at a time on the calling thread; useful for tests and
/// for deterministic single-threaded runs.
pub fn render_sequential(scene: &Scene, integrator: &Integrator, sampler: &dyn Sampler, film: &Film) {
    let resolution = film.resolution();
    let progress = make_progress_bar((resolution.x * resolution.y) as u64);
    for tile in tiles(resolution) {
        let mut tile_sampler = sampler.clone_with_seed(tile_id(tile, resolution.x));
        render_tile(scene, integrator, tile_sampler.as_mut(), film, tile, &progress);
    }
    progress.finish();
}

/// Renders tiles across the `rayon` global pool (§5: "embarrassingly
/// parallel over pixels (or tiles)").
pub fn render_parallel(scene: &Scene, integrator: &Integrator, sampler: &dyn Sampler, film: &Film) {
    let resolution = film.resolution();
    let tile_list = tiles(resolution);
    let progress = make_progress_bar((resolution.x * resolution.y) as u64);
    tile_list.into_par_iter().for_each(|tile| {
        let mut tile_sampler = sampler.clone_with_seed(tile_id(tile, resolution.x));
        render_tile(scene, integrator, tile_sampler.as_mut(), film, tile, &progress);
    });
    progress.finish();
}
