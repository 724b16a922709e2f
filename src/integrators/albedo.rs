//! Hemispherical reflectance visualization, estimated over a small
//! fixed low-discrepancy sample set.

// others
use bumpalo::Bump;
// lumen
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{Point2f, Ray, Vector3f};
use crate::core::integrator::{escaped_radiance, RayIntegrator};
use crate::core::lumen::{Float, Spectrum, INFINITY, RAY_EPSILON};
use crate::core::reflection::Bsdf;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;

// precomputed Halton points
const RHO_SAMPLES: usize = 16;
const UC_RHO: [Float; RHO_SAMPLES] = [
    0.75741637, 0.37870818, 0.7083487, 0.18935409, 0.9149363, 0.35417435, 0.5990858, 0.09467703,
    0.8578725, 0.45746812, 0.686759, 0.17708716, 0.9674518, 0.2995429, 0.5083201, 0.047338516,
];
const U_RHO: [[Float; 2]; RHO_SAMPLES] = [
    [0.855985, 0.570367],
    [0.381823, 0.851844],
    [0.285328, 0.764262],
    [0.733380, 0.114073],
    [0.542663, 0.344465],
    [0.127274, 0.414848],
    [0.964700, 0.947162],
    [0.594089, 0.643463],
    [0.095109, 0.170369],
    [0.825444, 0.263359],
    [0.429467, 0.454469],
    [0.244460, 0.816459],
    [0.756135, 0.731258],
    [0.516165, 0.152852],
    [0.180888, 0.214174],
    [0.898579, 0.503897],
];

pub struct AlbedoIntegrator {}

impl AlbedoIntegrator {
    pub fn new() -> Self {
        AlbedoIntegrator {}
    }
}

impl Default for AlbedoIntegrator {
    fn default() -> Self {
        AlbedoIntegrator::new()
    }
}

impl RayIntegrator for AlbedoIntegrator {
    fn li(
        &self,
        ray: &Ray,
        scene: &Scene,
        _camera: &dyn Camera,
        _sampler: &mut dyn Sampler,
        arena: &Bump,
        _film: &Film,
    ) -> Spectrum {
        let isect = match scene.intersect(ray, RAY_EPSILON, INFINITY) {
            Some(isect) => isect,
            None => return escaped_radiance(scene, ray),
        };
        let wo: Vector3f = -ray.d;
        let mut l: Spectrum = isect.le(&wo);
        let bsdf: Bsdf = match isect.get_bsdf(&wo, arena) {
            Some(bsdf) => bsdf,
            None => return l,
        };
        let u2: Vec<Point2f> = U_RHO
            .iter()
            .map(|u| Point2f { x: u[0], y: u[1] })
            .collect();
        l += bsdf.rho_hd(&wo, &UC_RHO, &u2);
        l
    }
}
