//! End-to-end render fixtures at reduced resolution: white furnace,
//! path vs light tracing, path vs BDPT, and reproducibility.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rs_lumen::accelerators::bvh::Bvh;
use rs_lumen::cameras::perspective::PerspectiveCamera;
use rs_lumen::core::film::Film;
use rs_lumen::core::geometry::{Point2i, Point3f, Vector3f};
use rs_lumen::core::integrator::{render_tiled, RayIntegrator};
use rs_lumen::core::light::Light;
use rs_lumen::core::lightdistrib::PowerLightSampler;
use rs_lumen::core::lumen::{Float, Spectrum};
use rs_lumen::core::primitive::Primitive;
use rs_lumen::core::scene::Scene;
use rs_lumen::filters::BoxFilter;
use rs_lumen::integrators::bdpt::BdptIntegrator;
use rs_lumen::integrators::light_path::LightPathIntegrator;
use rs_lumen::integrators::path::PathIntegrator;
use rs_lumen::lights::diffuse::DiffuseAreaLight;
use rs_lumen::lights::point::PointLight;
use rs_lumen::materials::arealight::DiffuseLightMaterial;
use rs_lumen::materials::diffuse::DiffuseMaterial;
use rs_lumen::samplers::independent::IndependentSampler;
use rs_lumen::scenes::diffuse_sphere_fixture;
use rs_lumen::shapes::sphere::Sphere;
use rs_lumen::textures::ConstantSpectrumTexture;

fn front_camera(resolution: Point2i, fov: Float, z: Float) -> PerspectiveCamera {
    PerspectiveCamera::new(
        Point3f::new(0.0, 0.0, z),
        Point3f::default(),
        Vector3f::new(0.0, 1.0, 0.0),
        fov,
        0.0,
        z,
        resolution,
        None,
    )
}

fn render_mean(
    integrator: &dyn RayIntegrator,
    scene: &Scene,
    camera: &PerspectiveCamera,
    resolution: Point2i,
    spp: i32,
) -> Spectrum {
    let film = Film::new(resolution, Arc::new(BoxFilter::new(1.0)));
    let sampler = IndependentSampler::new(spp, 0);
    let cancel = AtomicBool::new(false);
    render_tiled(integrator, scene, camera, &film, &sampler, 2, &cancel);
    film.mean_radiance(spp)
}

/// A unit white diffuse sphere inside a uniform unit furnace must
/// disappear: every pixel that sees the sphere still reads 1.
#[test]
fn white_furnace_path_integrator() {
    let scene = diffuse_sphere_fixture(Spectrum::new(1.0));
    let resolution = Point2i::new(48, 48);
    // narrow view so the sphere covers the whole frame
    let camera = front_camera(resolution, 30.0, 3.0);
    let integrator = PathIntegrator::new(
        32,
        1,
        false,
        Box::new(PowerLightSampler::new(scene.lights.clone())),
    );
    let mean = render_mean(&integrator, &scene, &camera, resolution, 196);
    for ch in 0..3 {
        assert!(
            (mean.c[ch] - 1.0).abs() < 0.015,
            "channel {} mean {}",
            ch,
            mean.c[ch]
        );
    }
}

fn pinhole_plane_scene() -> Scene {
    let mut prims: Vec<Primitive> = Vec::new();
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(0.0, -100.5, 0.0), 100.0)),
        Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.7))),
    ));
    let lights: Vec<Arc<dyn Light>> = vec![Arc::new(PointLight::new(
        Point3f::new(0.0, 1.5, 0.5),
        Spectrum::new(8.0),
    )) as Arc<dyn Light>];
    Scene::new(Bvh::new(prims), lights)
}

/// Light tracing and path tracing estimate the same image mean for a
/// diffuse plane lit by a point light.
#[test]
fn light_tracer_agrees_with_path_tracer() {
    let scene = pinhole_plane_scene();
    let resolution = Point2i::new(40, 40);
    let camera = front_camera(resolution, 45.0, 2.0);
    let spp: i32 = 512;
    let path = PathIntegrator::new(
        4,
        1,
        false,
        Box::new(PowerLightSampler::new(scene.lights.clone())),
    );
    let mean_path = render_mean(&path, &scene, &camera, resolution, spp);
    let light = LightPathIntegrator::new(
        4,
        Box::new(PowerLightSampler::new(scene.lights.clone())),
        false,
    );
    let mean_light = render_mean(&light, &scene, &camera, resolution, spp * 4);
    for ch in 0..3 {
        let rel: Float =
            (mean_path.c[ch] - mean_light.c[ch]).abs() / mean_path.c[ch].max(1e-4);
        assert!(
            rel < 0.05,
            "channel {}: path {} vs light {}",
            ch,
            mean_path.c[ch],
            mean_light.c[ch]
        );
    }
}

fn tiny_box_scene() -> Scene {
    // a diffuse cavity with a small spherical emitter
    let mut prims: Vec<Primitive> = Vec::new();
    let mut lights: Vec<Arc<dyn Light>> = Vec::new();
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(0.0, -100.8, 0.0), 100.0)),
        Arc::new(DiffuseMaterial::from_color(Spectrum::rgb(0.7, 0.6, 0.5))),
    ));
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(-1.6, 0.0, -0.4), 0.7)),
        Arc::new(DiffuseMaterial::from_color(Spectrum::rgb(0.2, 0.4, 0.8))),
    ));
    let emitter: Arc<Sphere> = Arc::new(Sphere::new(Point3f::new(0.9, 0.8, 0.4), 0.25));
    let emission = Spectrum::new(18.0);
    let material = Arc::new(DiffuseLightMaterial::from_color(emission, false));
    let light: Arc<dyn Light> = Arc::new(DiffuseAreaLight::new(
        emitter.clone(),
        ConstantSpectrumTexture::shared(emission),
        false,
    ));
    lights.push(light.clone());
    prims.push(Primitive::with_area_light(emitter, material, light));
    Scene::new(Bvh::new(prims), lights)
}

/// BDPT and the unidirectional path tracer converge to the same
/// solution.
#[test]
fn bdpt_agrees_with_path_tracer() {
    let scene = tiny_box_scene();
    let resolution = Point2i::new(32, 32);
    let camera = front_camera(resolution, 50.0, 3.0);
    let spp: i32 = 400;
    let path = PathIntegrator::new(
        5,
        1,
        false,
        Box::new(PowerLightSampler::new(scene.lights.clone())),
    );
    let mean_path = render_mean(&path, &scene, &camera, resolution, spp);
    let bdpt = BdptIntegrator::new(
        5,
        Box::new(PowerLightSampler::new(scene.lights.clone())),
        false,
    );
    let mean_bdpt = render_mean(&bdpt, &scene, &camera, resolution, spp);
    for ch in 0..3 {
        let rel: Float =
            (mean_path.c[ch] - mean_bdpt.c[ch]).abs() / mean_path.c[ch].max(1e-4);
        assert!(
            rel < 0.08,
            "channel {}: path {} vs bdpt {}",
            ch,
            mean_path.c[ch],
            mean_bdpt.c[ch]
        );
    }
}

/// Two renders with identical inputs are bitwise identical, so the
/// per-sample arenas leave no state behind.
#[test]
fn renders_are_reproducible() {
    let scene = tiny_box_scene();
    let resolution = Point2i::new(24, 24);
    let camera = front_camera(resolution, 50.0, 3.0);
    let path = PathIntegrator::new(
        4,
        1,
        false,
        Box::new(PowerLightSampler::new(scene.lights.clone())),
    );
    let spp: i32 = 16;
    let mut images: Vec<Vec<Spectrum>> = Vec::new();
    for _ in 0..2 {
        let film = Film::new(resolution, Arc::new(BoxFilter::new(1.0)));
        let sampler = IndependentSampler::new(spp, 0);
        let cancel = AtomicBool::new(false);
        render_tiled(&path, &scene, &camera, &film, &sampler, 3, &cancel);
        let mut image: Vec<Spectrum> = Vec::new();
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                image.push(film.pixel_radiance(x, y, spp));
            }
        }
        images.push(image);
    }
    for (a, b) in images[0].iter().zip(images[1].iter()) {
        assert_eq!(a.c, b.c);
    }
}
