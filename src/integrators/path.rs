//! Unidirectional path tracing with next-event estimation and
//! multiple importance sampling.

// others
use bumpalo::Bump;
// lumen
use crate::core::bssrdf::BssrdfSample;
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{nrm_abs_dot_vec3f, Ray, Vector3f};
use crate::core::integrator::{rr_survival, sample_ld_surface, RayIntegrator};
use crate::core::interaction::Intersection;
use crate::core::lightdistrib::LightSampler;
use crate::core::lumen::{sqr, Float, Spectrum, INFINITY, RAY_EPSILON};
use crate::core::material::TransportDirection;
use crate::core::reflection::{Bsdf, BsdfSample, Bxdf, NormalizedFresnelBxdf, SAMPLE_ALL};
use crate::core::sampler::Sampler;
use crate::core::sampling::balance_heuristic;
use crate::core::scene::Scene;

pub struct PathIntegrator {
    pub max_bounces: i32,
    pub rr_min_bounces: i32,
    pub regularize_bsdf: bool,
    pub light_sampler: Box<dyn LightSampler>,
}

impl PathIntegrator {
    pub fn new(
        max_bounces: i32,
        rr_min_bounces: i32,
        regularize_bsdf: bool,
        light_sampler: Box<dyn LightSampler>,
    ) -> Self {
        PathIntegrator {
            max_bounces,
            rr_min_bounces,
            regularize_bsdf,
            light_sampler,
        }
    }
    /// MIS weight applied to emission found by BSDF sampling.
    fn emission_weight(
        &self,
        specular_bounce: bool,
        prev_pdf: Float,
        light_pdf_solid_angle: Float,
        light: &std::sync::Arc<dyn crate::core::light::Light>,
    ) -> Float {
        if specular_bounce {
            return 1.0;
        }
        let pmf: Float = self.light_sampler.pmf(light);
        balance_heuristic(1, prev_pdf, 1, pmf * light_pdf_solid_angle)
    }
}

impl RayIntegrator for PathIntegrator {
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
        let mut specular_bounce: bool = true;
        let mut prev_pdf: Float = 1.0;
        let mut prev_point = ray.o;
        let mut bounce: i32 = 0;
        loop {
            let isect: Option<Intersection> = scene.intersect(&ray, RAY_EPSILON, INFINITY);
            let isect: Intersection = match isect {
                Some(isect) => isect,
                None => {
                    // escaped: infinite lights, MIS-weighted per light
                    for light in &scene.infinite_lights {
                        let weight: Float = self.emission_weight(
                            specular_bounce,
                            prev_pdf,
                            light.pdf_li(&ray),
                            light,
                        );
                        l += beta * light.le(&ray) * weight;
                    }
                    break;
                }
            };
            let wo: Vector3f = -ray.d;
            // emission at the hit, MIS against the previous bounce's
            // NEE strategy
            let le: Spectrum = isect.le(&wo);
            if !le.is_black() {
                if let Some(area_light) = isect.area_light() {
                    let emit_ray: Ray = Ray::new(prev_point, ray.d);
                    let weight: Float = self.emission_weight(
                        specular_bounce,
                        prev_pdf,
                        area_light.pdf_li(&emit_ray),
                        area_light,
                    );
                    l += beta * le * weight;
                } else if specular_bounce {
                    l += beta * le;
                }
            }
            if bounce >= self.max_bounces {
                break;
            }
            let mut bsdf: Bsdf = match isect.get_bsdf(&wo, arena) {
                Some(bsdf) => bsdf,
                None => {
                    // boundary-only primitive: pass through
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            if self.regularize_bsdf && !specular_bounce {
                bsdf.regularize();
            }
            // next-event estimation
            if !bsdf.is_specular() {
                l += beta
                    * sample_ld_surface(
                        scene,
                        self.light_sampler.as_ref(),
                        &isect,
                        &bsdf,
                        &wo,
                        sampler,
                    );
            }
            // sample the BSDF for the next direction
            let u0: Float = sampler.get_1d();
            let u12 = sampler.get_2d();
            let bs: BsdfSample =
                match bsdf.sample_f(&wo, u0, &u12, TransportDirection::ToLight, SAMPLE_ALL) {
                    Some(bs) => bs,
                    None => break,
                };
            beta *= bs.f * nrm_abs_dot_vec3f(&isect.shading.n, &bs.wi) / bs.pdf;
            if bs.is_transmission() {
                eta_scale *= sqr(bs.eta);
            }
            specular_bounce = bs.is_specular();
            prev_pdf = if bs.pdf_is_proportional {
                bsdf.pdf(&wo, &bs.wi, TransportDirection::ToLight, SAMPLE_ALL)
            } else {
                bs.pdf
            };
            prev_point = isect.point;
            bounce += 1;
            // subsurface entry: probe for the exit point and continue
            // from there with the normalized Fresnel lobe
            if bs.is_transmission() {
                if let Some(bssrdf) = isect.get_bssrdf(&wo) {
                    let probe: BssrdfSample = match bssrdf.sample_s(&scene.aggregate, sampler) {
                        Some(probe) => probe,
                        None => break,
                    };
                    beta *= probe.sp / probe.pdf;
                    if beta.is_black() {
                        break;
                    }
                    let pi: Intersection = probe.pi;
                    let exit_bsdf: Bsdf = Bsdf::new(
                        &pi.shading.n,
                        &pi.shading.tangent,
                        Bxdf::NormalizedFresnel(NormalizedFresnelBxdf::new(bssrdf.eta())),
                    );
                    let exit_wo: Vector3f = Vector3f::from(pi.shading.n);
                    l += beta
                        * sample_ld_surface(
                            scene,
                            self.light_sampler.as_ref(),
                            &pi,
                            &exit_bsdf,
                            &exit_wo,
                            sampler,
                        );
                    let exit_bs: BsdfSample = match exit_bsdf.sample_f(
                        &exit_wo,
                        sampler.get_1d(),
                        &sampler.get_2d(),
                        TransportDirection::ToLight,
                        SAMPLE_ALL,
                    ) {
                        Some(bs) => bs,
                        None => break,
                    };
                    beta *= exit_bs.f * nrm_abs_dot_vec3f(&pi.shading.n, &exit_bs.wi)
                        / exit_bs.pdf;
                    specular_bounce = false;
                    prev_pdf = exit_bs.pdf;
                    prev_point = pi.point;
                    ray = pi.spawn_ray(&exit_bs.wi);
                    continue;
                }
            }
            ray = isect.spawn_ray(&bs.wi);
            // russian roulette
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
