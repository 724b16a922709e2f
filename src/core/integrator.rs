//! The integrator contract, the tile-parallel render driver, and the
//! direct-lighting helpers every integrator shares.

// std
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
// others
use bumpalo::Bump;
// lumen
use crate::blockqueue::{BlockQueue, TILE_SIZE};
use crate::core::camera::Camera;
use crate::core::film::{Film, FilmTile};
use crate::core::geometry::{
    nrm_abs_dot_vec3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::interaction::Intersection;
use crate::core::lightdistrib::{LightSampler, SampledLight};
use crate::core::lumen::{clamp_t, float_word, hash_u64, Float, Spectrum, RAY_EPSILON};
use crate::core::material::TransportDirection;
use crate::core::medium::{sample_majorant_transmittance, HenyeyGreenstein, Medium};
use crate::core::reflection::{Bsdf, SAMPLE_ALL};
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;
use crate::core::sampling::balance_heuristic;
use crate::core::scene::Scene;

/// A per-pixel-sample integrator. Light-tracing contributions go
/// straight to the film's splat plane; the return value is the eye
/// path's radiance estimate.
pub trait RayIntegrator: Send + Sync {
    fn li(
        &self,
        ray: &Ray,
        scene: &Scene,
        camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        film: &Film,
    ) -> Spectrum;
}

/// Render all tiles of the film across the worker pool. Tiles are
/// deterministic in the pixel index; each worker owns its sampler
/// clone and scratch arena.
pub fn render_tiled(
    integrator: &dyn RayIntegrator,
    scene: &Scene,
    camera: &dyn Camera,
    film: &Film,
    sampler_prototype: &dyn Sampler,
    num_threads: usize,
    cancel: &AtomicBool,
) {
    let queue: BlockQueue = BlockQueue::new(film.resolution, TILE_SIZE);
    let spp: i32 = sampler_prototype.samples_per_pixel();
    let progress: Mutex<pbr::ProgressBar<std::io::Stdout>> =
        Mutex::new(pbr::ProgressBar::new(queue.num_blocks() as u64));
    crossbeam::scope(|scope| {
        for _ in 0..num_threads.max(1) {
            scope.spawn(|_| {
                let mut arena: Bump = Bump::new();
                while let Some((tile_index, bounds)) = queue.next() {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let mut sampler: Box<dyn Sampler> =
                        sampler_prototype.clone_with_seed(tile_index as u64);
                    let mut tile: FilmTile = film.get_tile(bounds);
                    for pixel in bounds.points() {
                        for sample_index in 0..spp {
                            sampler.start_pixel_sample(pixel, sample_index);
                            let filter_offset: Point2f =
                                film.filter.sample(&sampler.get_2d());
                            let film_sample: Point2f = Point2f {
                                x: pixel.x as Float + 0.5 + filter_offset.x,
                                y: pixel.y as Float + 0.5 + filter_offset.y,
                            };
                            let aperture_sample: Point2f = sampler.get_2d();
                            let (ray, ray_weight) =
                                camera.sample_ray(&film_sample, &aperture_sample);
                            let mut l: Spectrum = integrator.li(
                                &ray,
                                scene,
                                camera,
                                sampler.as_mut(),
                                &arena,
                                film,
                            ) * ray_weight;
                            if l.has_nans() {
                                debug_assert!(false, "non-finite radiance sample");
                                film.note_saturation();
                                l = l.zero_if_nan();
                            }
                            tile.add_sample(pixel, l, 1.0);
                            arena.reset();
                        }
                    }
                    film.merge_tile(&tile);
                    progress.lock().unwrap().inc();
                }
            });
        }
    })
    .unwrap();
    progress.lock().unwrap().finish();
}

/// Radiance from the infinite lights for an escaped ray.
pub fn escaped_radiance(scene: &Scene, ray: &Ray) -> Spectrum {
    let mut l: Spectrum = Spectrum::default();
    for light in &scene.infinite_lights {
        l += light.le(ray);
    }
    l
}

/// Next-event estimation at a surface vertex, MIS-weighted against
/// BSDF sampling with the balance heuristic.
pub fn sample_ld_surface(
    scene: &Scene,
    light_sampler: &dyn LightSampler,
    isect: &Intersection,
    bsdf: &Bsdf,
    wo: &Vector3f,
    sampler: &mut dyn Sampler,
) -> Spectrum {
    let sl: SampledLight = match light_sampler.sample(sampler.get_1d()) {
        Some(sl) => sl,
        None => return Spectrum::default(),
    };
    let u_light: Point2f = sampler.get_2d();
    let ls = match sl.light.sample_li(&isect.point, u_light) {
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
    let shadow_ray: Ray = isect.spawn_ray(&ls.wi);
    if scene.intersect_p(&shadow_ray, RAY_EPSILON, ls.visibility - SHADOW_MARGIN) {
        return Spectrum::default();
    }
    let light_pdf: Float = sl.pmf * ls.pdf;
    if sl.light.is_delta() {
        return f * ls.li / light_pdf;
    }
    let bsdf_pdf: Float = bsdf.pdf(wo, &ls.wi, TransportDirection::ToLight, SAMPLE_ALL);
    let weight: Float = balance_heuristic(1, light_pdf, 1, bsdf_pdf);
    f * ls.li * (weight / light_pdf)
}

const SHADOW_MARGIN: Float = 1e-3;

/// Transmittance between two points through possibly nested media,
/// estimated by ratio tracking with a single stochastic wavelength.
pub fn transmittance(
    scene: &Scene,
    p1: &Point3f,
    p2: &Point3f,
    medium: Option<Arc<Medium>>,
    wavelength: usize,
    rng: &mut Rng,
) -> Spectrum {
    let mut w: Vector3f = *p2 - *p1;
    let mut visibility: Float = w.length();
    if visibility == 0.0 as Float {
        return Spectrum::new(1.0);
    }
    w = w / visibility;
    let mut ray: Ray = Ray {
        o: *p1,
        d: w,
        medium,
    };
    let mut tr: Spectrum = Spectrum::new(1.0);
    let mut r_pdf: Spectrum = Spectrum::new(1.0);
    while visibility > SHADOW_MARGIN {
        let isect = scene.intersect(&ray, RAY_EPSILON, visibility - SHADOW_MARGIN);
        // opaque surfaces cut the connection
        if let Some(ref isect) = isect {
            if let Some(prim) = isect.primitive {
                if prim.material.is_some() {
                    return Spectrum::default();
                }
            }
        }
        if let Some(ref medium) = ray.medium {
            let t_max: Float = isect.as_ref().map(|i| i.t).unwrap_or(visibility);
            let u: Float = rng.uniform_float();
            let t_maj: Spectrum = sample_majorant_transmittance(
                medium,
                wavelength,
                &ray,
                t_max,
                u,
                rng,
                |_p, ms, sigma_maj, t_maj| {
                    let sigma_n: Spectrum =
                        (sigma_maj - ms.sigma_a - ms.sigma_s).clamp(0.0, std::f32::INFINITY);
                    let pdf: Float = sigma_maj.c[wavelength] * t_maj.c[wavelength];
                    if pdf <= 0.0 as Float {
                        return false;
                    }
                    tr *= sigma_n * t_maj / pdf;
                    r_pdf *= sigma_maj * t_maj / pdf;
                    !tr.is_black() && !r_pdf.is_black()
                },
            );
            let pdf: Float = t_maj.c[wavelength];
            if pdf > 0.0 as Float {
                tr *= t_maj / pdf;
                r_pdf *= t_maj / pdf;
            }
        }
        if tr.is_black() {
            return Spectrum::default();
        }
        match isect {
            Some(isect) => {
                visibility -= isect.t;
                ray.medium = isect.get_medium(&ray.d);
                ray.o = isect.point;
            }
            None => break,
        }
    }
    let denom: Float = r_pdf.average();
    if denom <= 0.0 as Float {
        return Spectrum::default();
    }
    tr / denom
}

/// Next-event estimation from inside a medium: the phase function
/// replaces the BSDF and the shadow ray is ratio tracked.
#[allow(clippy::too_many_arguments)]
pub fn sample_ld_medium(
    scene: &Scene,
    light_sampler: &dyn LightSampler,
    p: &Point3f,
    wo: &Vector3f,
    phase: &HenyeyGreenstein,
    medium: Option<Arc<Medium>>,
    wavelength: usize,
    sampler: &mut dyn Sampler,
) -> Spectrum {
    let sl: SampledLight = match light_sampler.sample(sampler.get_1d()) {
        Some(sl) => sl,
        None => return Spectrum::default(),
    };
    let ls = match sl.light.sample_li(p, sampler.get_2d()) {
        Some(ls) => ls,
        None => return Spectrum::default(),
    };
    if ls.pdf == 0.0 as Float || ls.li.is_black() {
        return Spectrum::default();
    }
    let ph: Float = phase.p(wo, &ls.wi);
    if ph == 0.0 as Float {
        return Spectrum::default();
    }
    let target: Point3f = *p + ls.wi * ls.visibility.min(1e7);
    let mut rng: Rng = Rng::new(
        hash_u64(&[float_word(p.x), float_word(p.y), float_word(p.z)]),
        hash_u64(&[float_word(ls.wi.x), float_word(ls.wi.y)]),
    );
    let tr: Spectrum = transmittance(scene, p, &target, medium, wavelength, &mut rng);
    if tr.is_black() {
        return Spectrum::default();
    }
    let light_pdf: Float = sl.pmf * ls.pdf;
    if sl.light.is_delta() {
        return tr * ls.li * (ph / light_pdf);
    }
    let weight: Float = balance_heuristic(1, light_pdf, 1, phase.pdf(wo, &ls.wi));
    tr * ls.li * (ph * weight / light_pdf)
}

/// Russian-roulette survival probability used by the path integrators.
pub fn rr_survival(beta: &Spectrum, eta_scale: Float) -> Float {
    clamp_t(beta.max_component_value() * eta_scale, 0.0, 1.0)
}
