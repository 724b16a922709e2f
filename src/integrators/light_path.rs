//! Light tracing: paths start at a light and connect every vertex to
//! the camera, splatting onto the film.

// others
use bumpalo::Bump;
// lumen
use crate::core::camera::{Camera, CameraSampleWi};
use crate::core::film::Film;
use crate::core::geometry::{nrm_abs_dot_vec3f, vec3_abs_dot_vec3f, Point3f, Ray, Vector3f};
use crate::core::integrator::{transmittance, RayIntegrator};
use crate::core::interaction::Intersection;
use crate::core::lightdistrib::LightSampler;
use crate::core::lumen::{
    clamp_t, float_word, hash_u64, sqr, Float, Spectrum, INFINITY, RAY_EPSILON,
};
use crate::core::material::TransportDirection;
use crate::core::reflection::{Bsdf, BsdfSample, SAMPLE_ALL};
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;

pub struct LightPathIntegrator {
    pub max_bounces: i32,
    pub light_sampler: Box<dyn LightSampler>,
    /// Ratio-track transmittance along connections instead of binary
    /// visibility.
    pub volumetric: bool,
}

impl LightPathIntegrator {
    pub fn new(max_bounces: i32, light_sampler: Box<dyn LightSampler>, volumetric: bool) -> Self {
        LightPathIntegrator {
            max_bounces,
            light_sampler,
            volumetric,
        }
    }
    /// Visibility (or transmittance) between a scene point and the
    /// camera aperture.
    fn connection_throughput(
        &self,
        scene: &Scene,
        p1: &Point3f,
        p2: &Point3f,
        medium: Option<std::sync::Arc<crate::core::medium::Medium>>,
        wavelength: usize,
    ) -> Spectrum {
        if self.volumetric {
            let mut rng: Rng = Rng::new(
                hash_u64(&[float_word(p1.x), float_word(p1.y), float_word(p1.z)]),
                hash_u64(&[float_word(p2.x), float_word(p2.y), float_word(p2.z)]),
            );
            transmittance(scene, p1, p2, medium, wavelength, &mut rng)
        } else {
            let mut d: Vector3f = *p2 - *p1;
            let dist: Float = d.length();
            if dist == 0.0 as Float {
                return Spectrum::default();
            }
            d = d / dist;
            let mut ray: Ray = Ray::new(*p1, d);
            let mut remaining: Float = dist;
            // step across boundary-only primitives
            while remaining > 1e-3 {
                match scene.intersect(&ray, RAY_EPSILON, remaining - 1e-3) {
                    Some(isect) => {
                        if let Some(prim) = isect.primitive {
                            if prim.material.is_some() {
                                return Spectrum::default();
                            }
                        }
                        remaining -= isect.t;
                        ray.o = isect.point;
                    }
                    None => break,
                }
            }
            Spectrum::new(1.0)
        }
    }
}

impl RayIntegrator for LightPathIntegrator {
    fn li(
        &self,
        _primary_ray: &Ray,
        scene: &Scene,
        camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        film: &Film,
    ) -> Spectrum {
        let wavelength: usize = clamp_t((sampler.get_1d() * 3.0) as usize, 0, 2);
        // pick a light and an emitted ray
        let sl = match self.light_sampler.sample(sampler.get_1d()) {
            Some(sl) => sl,
            None => return Spectrum::default(),
        };
        let le_sample = match sl.light.sample_le(sampler.get_2d(), sampler.get_2d()) {
            Some(le_sample) => le_sample,
            None => return Spectrum::default(),
        };
        // direct light-to-camera connection (bounce 0); delta lights
        // never register on the aperture this way
        if le_sample.pdf_p != 1.0 as Float && le_sample.pdf_w != 1.0 as Float {
            if let Some(cs) = camera.sample_wi(&le_sample.ray.o, &sampler.get_2d()) {
                let v: Spectrum = self.connection_throughput(
                    scene,
                    &le_sample.ray.o,
                    &cs.p_aperture,
                    le_sample.medium.clone(),
                    wavelength,
                );
                if !v.is_black() {
                    let l: Spectrum = le_sample.le
                        * cs.we
                        * v
                        * (nrm_abs_dot_vec3f(&le_sample.normal, &cs.wi)
                            * nrm_abs_dot_vec3f(&cs.normal, &cs.wi)
                            / (sl.pmf * cs.pdf * le_sample.pdf_p));
                    film.add_splat(&cs.p_raster, l);
                }
            }
        }
        let mut bounce: i32 = 0;
        let mut ray: Ray = le_sample.ray.clone();
        ray.medium = le_sample.medium.clone();
        let mut eta_scale: Float = 1.0;
        let mut beta: Spectrum = le_sample.le
            * (nrm_abs_dot_vec3f(&le_sample.normal, &ray.d)
                / (sl.pmf * le_sample.pdf_p * le_sample.pdf_w));
        // degenerate emitters (delta direction) carry no cosine
        if le_sample.normal == crate::core::geometry::Normal3f::default() {
            beta = le_sample.le / (sl.pmf * le_sample.pdf_p * le_sample.pdf_w);
        }
        loop {
            let isect: Intersection = match scene.intersect(&ray, RAY_EPSILON, INFINITY) {
                Some(isect) => isect,
                None => break,
            };
            let wo: Vector3f = -ray.d.normalize();
            let bsdf: Bsdf = match isect.get_bsdf(&wo, arena) {
                Some(bsdf) => bsdf,
                None => {
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            if bounce >= self.max_bounces {
                break;
            }
            bounce += 1;
            // connect this vertex to the camera
            if !bsdf.is_specular() {
                if let Some(cs) = camera.sample_wi(&isect.point, &sampler.get_2d()) {
                    let v: Spectrum = self.connection_throughput(
                        scene,
                        &isect.point,
                        &cs.p_aperture,
                        isect.get_medium(&cs.wi),
                        wavelength,
                    );
                    if !v.is_black() {
                        let l: Spectrum = beta
                            * cs.we
                            * v
                            * bsdf.f(&wo, &cs.wi, TransportDirection::ToCamera)
                            * (nrm_abs_dot_vec3f(&isect.shading.n, &cs.wi) / cs.pdf);
                        film.add_splat(&cs.p_raster, l);
                    }
                }
            }
            // extend the light path
            let bs: BsdfSample = match bsdf.sample_f(
                &wo,
                sampler.get_1d(),
                &sampler.get_2d(),
                TransportDirection::ToCamera,
                SAMPLE_ALL,
            ) {
                Some(bs) => bs,
                None => break,
            };
            if bs.is_transmission() {
                eta_scale *= sqr(bs.eta);
            }
            beta *= bs.f * vec3_abs_dot_vec3f(&bs.wi, &Vector3f::from(isect.shading.n)) / bs.pdf;
            ray = isect.spawn_ray(&bs.wi);
            // russian roulette
            let min_bounces: i32 = 2;
            if bounce > min_bounces {
                let p: Float = (beta.max_component_value() * eta_scale).min(1.0);
                if sampler.get_1d() > p {
                    break;
                }
                beta /= p;
            }
        }
        Spectrum::default()
    }
}
