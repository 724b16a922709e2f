//! Reference path tracers that rely on BSDF (and phase) sampling
//! only; no next-event estimation, no MIS.

// others
use bumpalo::Bump;
// lumen
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{nrm_abs_dot_vec3f, Ray, Vector3f};
use crate::core::integrator::{escaped_radiance, rr_survival, RayIntegrator};
use crate::core::interaction::Intersection;
use crate::core::lumen::{sqr, Float, Spectrum, INFINITY, RAY_EPSILON};
use crate::core::material::TransportDirection;
use crate::core::reflection::{Bsdf, BsdfSample, SAMPLE_ALL};
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;

pub struct NaivePathIntegrator {
    pub max_bounces: i32,
    pub rr_min_bounces: i32,
    /// Sample distances in media instead of treating them as vacuum.
    pub volumetric: bool,
}

impl NaivePathIntegrator {
    pub fn new(max_bounces: i32, rr_min_bounces: i32, volumetric: bool) -> Self {
        NaivePathIntegrator {
            max_bounces,
            rr_min_bounces,
            volumetric,
        }
    }
}

impl RayIntegrator for NaivePathIntegrator {
    fn li(
        &self,
        primary_ray: &Ray,
        scene: &Scene,
        _camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        _film: &Film,
    ) -> Spectrum {
        let mut l: Spectrum = Spectrum::default();
        let mut beta: Spectrum = Spectrum::new(1.0);
        let mut eta_scale: Float = 1.0;
        let mut ray: Ray = primary_ray.clone();
        let mut bounce: i32 = 0;
        loop {
            let isect: Option<Intersection> = scene.intersect(&ray, RAY_EPSILON, INFINITY);
            if self.volumetric {
                if let Some(medium) = ray.medium.clone() {
                    let t_max: Float = isect
                        .as_ref()
                        .map(|i| i.t)
                        .unwrap_or_else(|| 4.0 * scene.world_bound().diagonal().length().max(1.0));
                    let (event, weight) = medium.sample_distance(
                        &ray,
                        t_max,
                        sampler.get_1d(),
                        sampler.get_1d(),
                    );
                    beta *= weight;
                    if let Some((t, ms)) = event {
                        if bounce >= self.max_bounces {
                            break;
                        }
                        bounce += 1;
                        l += beta * ms.le;
                        let p = ray.position(t);
                        let wo: Vector3f = -ray.d;
                        let ps = match ms.phase.sample_p(&wo, &sampler.get_2d()) {
                            Some(ps) => ps,
                            None => break,
                        };
                        beta *= ps.p / ps.pdf;
                        ray = Ray {
                            o: p,
                            d: ps.wi,
                            medium: ray.medium.clone(),
                        };
                        if bounce > self.rr_min_bounces {
                            let q: Float = rr_survival(&beta, eta_scale);
                            if sampler.get_1d() >= q {
                                break;
                            }
                            beta /= q;
                        }
                        continue;
                    }
                }
            }
            let isect: Intersection = match isect {
                Some(isect) => isect,
                None => {
                    l += beta * escaped_radiance(scene, &ray);
                    break;
                }
            };
            let wo: Vector3f = -ray.d;
            l += beta * isect.le(&wo);
            if bounce >= self.max_bounces {
                break;
            }
            let bsdf: Bsdf = match isect.get_bsdf(&wo, arena) {
                Some(bsdf) => bsdf,
                None => {
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            let bs: BsdfSample = match bsdf.sample_f(
                &wo,
                sampler.get_1d(),
                &sampler.get_2d(),
                TransportDirection::ToLight,
                SAMPLE_ALL,
            ) {
                Some(bs) => bs,
                None => break,
            };
            beta *= bs.f * nrm_abs_dot_vec3f(&isect.shading.n, &bs.wi) / bs.pdf;
            if bs.is_transmission() {
                eta_scale *= sqr(bs.eta);
            }
            bounce += 1;
            ray = isect.spawn_ray(&bs.wi);
            if bounce > self.rr_min_bounces {
                let q: Float = rr_survival(&beta, eta_scale);
                if sampler.get_1d() >= q {
                    break;
                }
                beta /= q;
            }
            if beta.is_black() {
                break;
            }
        }
        l
    }
}
