//! Path tracing through participating media with null-scattering
//! distance sampling and ratio-tracked shadow rays.

// others
use bumpalo::Bump;
// lumen
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{nrm_abs_dot_vec3f, Point3f, Ray, Vector3f};
use crate::core::integrator::{rr_survival, sample_ld_medium, transmittance, RayIntegrator};
use crate::core::interaction::Intersection;
use crate::core::lightdistrib::LightSampler;
use crate::core::lumen::{clamp_t, float_word, hash_u64, sqr, Float, Spectrum, INFINITY, RAY_EPSILON};
use crate::core::material::TransportDirection;
use crate::core::medium::{sample_majorant_transmittance, HenyeyGreenstein, MediumSample};
use crate::core::reflection::{Bsdf, BsdfSample, SAMPLE_ALL};
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;
use crate::core::sampling::balance_heuristic;
use crate::core::scene::Scene;

pub struct VolPathIntegrator {
    pub max_bounces: i32,
    pub rr_min_bounces: i32,
    pub regularize_bsdf: bool,
    pub light_sampler: Box<dyn LightSampler>,
}

enum MediumEvent {
    /// Real scattering at a point with the local phase function.
    Scatter(Point3f, HenyeyGreenstein),
    Absorb(Spectrum),
    None,
}

impl VolPathIntegrator {
    pub fn new(
        max_bounces: i32,
        rr_min_bounces: i32,
        regularize_bsdf: bool,
        light_sampler: Box<dyn LightSampler>,
    ) -> Self {
        VolPathIntegrator {
            max_bounces,
            rr_min_bounces,
            regularize_bsdf,
            light_sampler,
        }
    }
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

impl RayIntegrator for VolPathIntegrator {
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
        let mut prev_point: Point3f = ray.o;
        let mut bounce: i32 = 0;
        // hero wavelength for the stochastic medium estimators
        let wavelength: usize = clamp_t((sampler.get_1d() * 3.0) as usize, 0, 2);
        loop {
            let isect: Option<Intersection> = scene.intersect(&ray, RAY_EPSILON, INFINITY);
            // march through the current medium up to the hit (or the
            // scene's extent on a miss)
            if let Some(medium) = ray.medium.clone() {
                let t_max: Float = isect
                    .as_ref()
                    .map(|i| i.t)
                    .unwrap_or_else(|| 4.0 * scene.world_bound().diagonal().length().max(1.0));
                let seed: u64 = hash_u64(&[
                    float_word(ray.o.x),
                    float_word(ray.o.y),
                    float_word(ray.o.z),
                ]);
                let stream: u64 =
                    hash_u64(&[float_word(ray.d.x), float_word(ray.d.z), bounce as u64]);
                let mut step_rng: Rng = Rng::new(seed, stream);
                let mut event_rng: Rng = Rng::new(stream, seed);
                let u_event: Float = sampler.get_1d();
                let mut event: MediumEvent = MediumEvent::None;
                let mut local_beta: Spectrum = beta;
                let t_maj: Spectrum = sample_majorant_transmittance(
                    &medium,
                    wavelength,
                    &ray,
                    t_max,
                    u_event,
                    &mut step_rng,
                    |p, ms: MediumSample, sigma_maj, t_maj| {
                        let denom: Float = sigma_maj.c[wavelength] * t_maj.c[wavelength];
                        if denom <= 0.0 as Float {
                            return false;
                        }
                        let p_absorb: Float = ms.sigma_a.c[wavelength] / sigma_maj.c[wavelength];
                        let p_scatter: Float = ms.sigma_s.c[wavelength] / sigma_maj.c[wavelength];
                        let u: Float = event_rng.uniform_float();
                        if u < p_absorb {
                            // terminate with (possible) emission
                            local_beta *= t_maj * ms.sigma_a / (denom * p_absorb);
                            event = MediumEvent::Absorb(local_beta * ms.le);
                            false
                        } else if u < p_absorb + p_scatter {
                            local_beta *= t_maj * ms.sigma_s / (denom * p_scatter);
                            event = MediumEvent::Scatter(p, ms.phase);
                            false
                        } else {
                            // null collision; keep tracking
                            let p_null: Float = (1.0 as Float - p_absorb - p_scatter).max(1e-6);
                            let sigma_n: Spectrum = (sigma_maj - ms.sigma_a - ms.sigma_s)
                                .clamp(0.0, std::f32::INFINITY);
                            local_beta *= t_maj * sigma_n / (denom * p_null);
                            !local_beta.is_black()
                        }
                    },
                );
                match event {
                    MediumEvent::Absorb(le) => {
                        l += le;
                        break;
                    }
                    MediumEvent::Scatter(p, phase) => {
                        beta = local_beta;
                        if bounce >= self.max_bounces {
                            break;
                        }
                        bounce += 1;
                        // NEE from the medium vertex
                        let wo: Vector3f = -ray.d;
                        l += beta
                            * sample_ld_medium(
                                scene,
                                self.light_sampler.as_ref(),
                                &p,
                                &wo,
                                &phase,
                                ray.medium.clone(),
                                wavelength,
                                sampler,
                            );
                        // sample the phase function for the next leg
                        let ps = match phase.sample_p(&wo, &sampler.get_2d()) {
                            Some(ps) => ps,
                            None => break,
                        };
                        beta *= ps.p / ps.pdf;
                        specular_bounce = false;
                        prev_pdf = ps.pdf;
                        prev_point = p;
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
                    MediumEvent::None => {
                        // passed through; fold the residual majorant
                        // transmittance into beta
                        let denom: Float = t_maj.c[wavelength];
                        if denom <= 0.0 as Float {
                            break;
                        }
                        beta = local_beta * t_maj / denom;
                    }
                }
            }
            let isect: Intersection = match isect {
                Some(isect) => isect,
                None => {
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
                    // medium boundary: step across and pick up the new
                    // medium
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            if self.regularize_bsdf && !specular_bounce {
                bsdf.regularize();
            }
            if !bsdf.is_specular() {
                l += beta
                    * sample_ld_surface_vol(
                        scene,
                        self.light_sampler.as_ref(),
                        &isect,
                        &bsdf,
                        &wo,
                        wavelength,
                        sampler,
                    );
            }
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
            specular_bounce = bs.is_specular();
            prev_pdf = if bs.pdf_is_proportional {
                bsdf.pdf(&wo, &bs.wi, TransportDirection::ToLight, SAMPLE_ALL)
            } else {
                bs.pdf
            };
            prev_point = isect.point;
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

/// Surface NEE with a ratio-tracked shadow ray instead of binary
/// visibility.
fn sample_ld_surface_vol(
    scene: &Scene,
    light_sampler: &dyn LightSampler,
    isect: &Intersection,
    bsdf: &Bsdf,
    wo: &Vector3f,
    wavelength: usize,
    sampler: &mut dyn Sampler,
) -> Spectrum {
    let sl = match light_sampler.sample(sampler.get_1d()) {
        Some(sl) => sl,
        None => return Spectrum::default(),
    };
    let ls = match sl.light.sample_li(&isect.point, sampler.get_2d()) {
        Some(ls) => ls,
        None => return Spectrum::default(),
    };
    if ls.pdf == 0.0 as Float || ls.li.is_black() {
        return Spectrum::default();
    }
    let f: Spectrum = bsdf.f(wo, &ls.wi, TransportDirection::ToLight)
        * nrm_abs_dot_vec3f(&isect.shading.n, &ls.wi);
    if f.is_black() {
        return Spectrum::default();
    }
    let target: Point3f = isect.point + ls.wi * ls.visibility.min(1e7);
    let mut rng: Rng = Rng::new(
        hash_u64(&[
            float_word(isect.point.x),
            float_word(isect.point.y),
            float_word(isect.point.z),
        ]),
        hash_u64(&[float_word(ls.wi.x), float_word(ls.wi.y)]),
    );
    let tr: Spectrum = transmittance(
        scene,
        &isect.point,
        &target,
        isect.get_medium(&ls.wi),
        wavelength,
        &mut rng,
    );
    if tr.is_black() {
        return Spectrum::default();
    }
    let light_pdf: Float = sl.pmf * ls.pdf;
    if sl.light.is_delta() {
        return f * tr * ls.li / light_pdf;
    }
    let bsdf_pdf: Float = bsdf.pdf(wo, &ls.wi, TransportDirection::ToLight, SAMPLE_ALL);
    let weight: Float = balance_heuristic(1, light_pdf, 1, bsdf_pdf);
    f * tr * ls.li * (weight / light_pdf)
}
