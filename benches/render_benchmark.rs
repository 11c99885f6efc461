use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};
use criterion::{criterion_group, criterion_main, Criterion};

use volpath::background::ConstantBackground;
use volpath::camera::Camera;
use volpath::color::Color;
use volpath::film::Film;
use volpath::integrator::{render_sequential, Integrator};
use volpath::material::{Lambertian, Material};
use volpath::sampler::IndependentSampler;
use volpath::scene::Scene;
use volpath::shapes::{Quad, Shape};
use volpath::texture::Constant;
use volpath::{Point2, Point3f, Vec3f};

fn furnace_scene() -> Scene {
    let material = Arc::new(Material::Lambertian(Lambertian {
        albedo: Arc::new(Constant::new(Color::uniform(0.5))),
    }));
    let floor = Shape::Quad(Quad::new(
        Point3f::new(-5.0, -1.0, -5.0),
        Vec3f::new(10.0, 0.0, 0.0),
        Vec3f::new(0.0, 0.0, 10.0),
        Some(material),
        None,
    ));
    let camera = Camera::new(Matrix4::identity(), Point2::new(64, 64), 60.0, 1.0, 0.0, None);
    Scene::new(vec![floor], Box::new(ConstantBackground { color: Color::uniform(0.8) }), camera)
}

fn bench_render_tile(c: &mut Criterion) {
    let scene = furnace_scene();
    let integrator = Integrator::Unidirectional(volpath::integrator::unidirectional::Unidirectional::new(8));
    let sampler = IndependentSampler::new(4, 0);
    let resolution = scene.camera.resolution();

    c.bench_function("render_sequential_64x64_4spp", |b| {
        b.iter(|| {
            let film = Film::new(resolution);
            render_sequential(&scene, &integrator, &sampler, &film);
            film
        })
    });
}

criterion_group!(benches, bench_render_tile);
criterion_main!(benches);
