//! CLI driver: load a scene description, render it, write a linear-radiance
//! EXR image (spec.md §6). This binary is deliberately thin — it exists so
//! the core has somewhere to be exercised end-to-end; the real subject
//! matter is the `volpath` library crate.
//!
//! Grounded on the teacher's `src/bin/render.rs` for the overall
//! load-scene/render/write-image shape, and on the teacher's use of
//! `tracing`/`tracing-subscriber`/`tracing-tree` for structured logging.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{App, Arg};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use volpath::film::Film;
use volpath::integrator::render_parallel;
use volpath::scene_desc::SceneDesc;

fn main() -> Result<()> {
    let subscriber = Registry::default().with(tracing_tree::HierarchicalLayer::new(2));
    tracing::subscriber::set_global_default(subscriber).expect("failed to set up tracing subscriber");

    let matches = App::new("volpath")
        .about("Physically-based volumetric path tracer")
        .arg(
            Arg::with_name("SCENE")
                .help("Path to a JSON scene description (spec.md §6)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .default_value("out.exr")
                .help("Output EXR path"),
        )
        .get_matches();

    let scene_path = matches.value_of("SCENE").unwrap();
    let output_path = PathBuf::from(matches.value_of("output").unwrap());

    let contents = fs::read_to_string(scene_path)
        .with_context(|| format!("reading scene description '{}'", scene_path))?;
    let desc = SceneDesc::parse(&contents)?;
    let setup = desc.build().context("building scene from description")?;

    let resolution = setup.scene.camera.resolution();
    tracing::info!(width = resolution.x, height = resolution.y, spp = setup.image_samples, "starting render");

    let film = Film::new(resolution);
    render_parallel(&setup.scene, &setup.integrator, setup.sampler.as_ref(), &film);

    let (pixels, (width, height)) = film.into_rgb_buffer();
    write_exr(&output_path, &pixels, width, height)?;
    tracing::info!(path = %output_path.display(), "wrote image");

    Ok(())
}

/// Writes a linear RGB float image (spec.md §6: "a 32-bit-float RGB image").
fn write_exr(path: &std::path::Path, pixels: &[[volpath::Float; 3]], width: u32, height: u32) -> Result<()> {
    use exr::prelude::*;
    write_rgba_file(path, width as usize, height as usize, |x, y| {
        let p = pixels[y * width as usize + x];
        (p[0], p[1], p[2], 1.0f32)
    })
    .with_context(|| format!("writing EXR image to '{}'", path.display()))?;
    Ok(())
}
