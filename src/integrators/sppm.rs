//! Stochastic progressive photon mapping: alternating eye and photon
//! passes over a shared visible-point grid, with per-pixel radius
//! shrinking between iterations.

// std
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
// others
use atomic::Atomic;
use bumpalo::Bump;
// lumen
use crate::blockqueue::{BlockQueue, TILE_SIZE};
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{
    nrm_abs_dot_vec3f, pnt3_distance_squaredf, Point2f, Point2i, Point3f, Ray, Vector3f,
};
use crate::core::integrator::sample_ld_surface;
use crate::core::lightdistrib::LightSampler;
use crate::core::lumen::{Float, Spectrum, INFINITY, PI, RAY_EPSILON};
use crate::core::material::TransportDirection;
use crate::core::reflection::{Bsdf, BsdfSample, SAMPLE_ALL};
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;

const RADIUS_ALPHA: Float = 2.0 / 3.0;

/// Persistent per-pixel photon statistics.
struct SppmPixel {
    radius: Float,
    /// Accumulated direct/emitted radiance from the eye passes.
    ld: Spectrum,
    n: Float,
    tau: Spectrum,
    phi: [Atomic<f32>; 3],
    m: AtomicU32,
}

impl SppmPixel {
    fn new(radius: Float) -> Self {
        SppmPixel {
            radius,
            ld: Spectrum::default(),
            n: 0.0,
            tau: Spectrum::default(),
            phi: [Atomic::new(0.0), Atomic::new(0.0), Atomic::new(0.0)],
            m: AtomicU32::new(0),
        }
    }
}

/// One iteration's camera-visible point for a pixel.
struct VisiblePoint<'a> {
    pixel_index: usize,
    point: Point3f,
    wo: Vector3f,
    bsdf: Bsdf<'a>,
    beta: Spectrum,
}

fn atomic_add(slot: &Atomic<f32>, value: f32) {
    let mut current: f32 = slot.load(Ordering::Relaxed);
    loop {
        match slot.compare_exchange_weak(
            current,
            current + value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}

fn grid_cell(p: &Point3f, cell_size: Float) -> (i64, i64, i64) {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

pub struct SppmIntegrator {
    pub max_bounces: i32,
    pub n_photons: i32,
    pub initial_radius: Float,
    pub light_sampler: Box<dyn LightSampler>,
}

impl SppmIntegrator {
    pub fn new(
        max_bounces: i32,
        n_photons: i32,
        initial_radius: Float,
        light_sampler: Box<dyn LightSampler>,
    ) -> Self {
        SppmIntegrator {
            max_bounces,
            n_photons,
            initial_radius,
            light_sampler,
        }
    }
    /// Trace one eye path up to its first non-specular vertex,
    /// accumulating emission and one NEE estimate along the way.
    #[allow(clippy::too_many_arguments)]
    fn trace_eye_path<'a>(
        &self,
        scene: &'a Scene,
        camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        arena: &'a Bump,
        pixel: Point2i,
        resolution_x: i32,
        ld: &mut Spectrum,
    ) -> Option<VisiblePoint<'a>> {
        let film_sample: Point2f = Point2f {
            x: pixel.x as Float + sampler.get_1d(),
            y: pixel.y as Float + sampler.get_1d(),
        };
        let (mut ray, _w) = camera.sample_ray(&film_sample, &sampler.get_2d());
        let mut beta: Spectrum = Spectrum::new(1.0);
        let mut specular_bounce: bool = true;
        for _bounce in 0..self.max_bounces {
            let isect = match scene.intersect(&ray, RAY_EPSILON, INFINITY) {
                Some(isect) => isect,
                None => {
                    if specular_bounce {
                        for light in &scene.infinite_lights {
                            *ld += beta * light.le(&ray);
                        }
                    }
                    return None;
                }
            };
            let wo: Vector3f = -ray.d;
            if specular_bounce {
                *ld += beta * isect.le(&wo);
            }
            let bsdf: Bsdf<'a> = match isect.get_bsdf(&wo, arena) {
                Some(bsdf) => bsdf,
                None => {
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            if !bsdf.is_specular() {
                // direct light at the visible point comes from NEE,
                // photons carry the rest
                *ld += beta
                    * sample_ld_surface(
                        scene,
                        self.light_sampler.as_ref(),
                        &isect,
                        &bsdf,
                        &wo,
                        sampler,
                    );
                let pixel_index: usize = (pixel.y * resolution_x + pixel.x) as usize;
                return Some(VisiblePoint {
                    pixel_index,
                    point: isect.point,
                    wo,
                    bsdf,
                    beta,
                });
            }
            // follow the specular chain
            let bs: BsdfSample = match bsdf.sample_f(
                &wo,
                sampler.get_1d(),
                &sampler.get_2d(),
                TransportDirection::ToLight,
                SAMPLE_ALL,
            ) {
                Some(bs) => bs,
                None => return None,
            };
            beta *= bs.f * nrm_abs_dot_vec3f(&isect.shading.n, &bs.wi) / bs.pdf;
            specular_bounce = bs.is_specular();
            ray = isect.spawn_ray(&bs.wi);
            if beta.is_black() {
                return None;
            }
        }
        None
    }
    /// Trace one photon path and deposit its energy on nearby visible
    /// points.
    fn trace_photon(
        &self,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        grid: &HashMap<(i64, i64, i64), Vec<usize>>,
        visible_points: &[VisiblePoint],
        pixels: &[SppmPixel],
        cell_size: Float,
    ) {
        let sl = match self.light_sampler.sample(sampler.get_1d()) {
            Some(sl) => sl,
            None => return,
        };
        let le_sample = match sl.light.sample_le(sampler.get_2d(), sampler.get_2d()) {
            Some(le_sample) => le_sample,
            None => return,
        };
        if le_sample.pdf_p == 0.0 as Float || le_sample.pdf_w == 0.0 as Float {
            return;
        }
        let cos_term: Float =
            if le_sample.normal == crate::core::geometry::Normal3f::default() {
                1.0
            } else {
                nrm_abs_dot_vec3f(&le_sample.normal, &le_sample.ray.d)
            };
        let mut beta: Spectrum =
            le_sample.le * (cos_term / (sl.pmf * le_sample.pdf_p * le_sample.pdf_w));
        let mut ray: Ray = le_sample.ray.clone();
        for bounce in 0..self.max_bounces {
            if beta.is_black() {
                return;
            }
            let isect = match scene.intersect(&ray, RAY_EPSILON, INFINITY) {
                Some(isect) => isect,
                None => return,
            };
            let wo: Vector3f = -ray.d;
            let bsdf: Bsdf = match isect.get_bsdf(&wo, arena) {
                Some(bsdf) => bsdf,
                None => {
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            // deposit on visible points near this hit (skipping the
            // direct connection, which the eye pass handled with NEE)
            if bounce > 0 {
                let cell = grid_cell(&isect.point, cell_size);
                for dz in -1..=1 {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            let key = (cell.0 + dx, cell.1 + dy, cell.2 + dz);
                            if let Some(indices) = grid.get(&key) {
                                for index in indices {
                                    let vp: &VisiblePoint = &visible_points[*index];
                                    let pixel: &SppmPixel = &pixels[vp.pixel_index];
                                    if pnt3_distance_squaredf(&vp.point, &isect.point)
                                        > pixel.radius * pixel.radius
                                    {
                                        continue;
                                    }
                                    let phi: Spectrum = beta
                                        * vp.bsdf.f(&vp.wo, &wo, TransportDirection::ToLight);
                                    if phi.is_black() || phi.has_nans() {
                                        continue;
                                    }
                                    atomic_add(&pixel.phi[0], phi.c[0]);
                                    atomic_add(&pixel.phi[1], phi.c[1]);
                                    atomic_add(&pixel.phi[2], phi.c[2]);
                                    pixel.m.fetch_add(1, Ordering::Relaxed);
                                }
                            }
                        }
                    }
                }
            }
            // continue the photon by sampling the BSDF
            let bs: BsdfSample = match bsdf.sample_f(
                &wo,
                sampler.get_1d(),
                &sampler.get_2d(),
                TransportDirection::ToCamera,
                SAMPLE_ALL,
            ) {
                Some(bs) => bs,
                None => return,
            };
            let new_beta: Spectrum =
                beta * bs.f * nrm_abs_dot_vec3f(&isect.shading.n, &bs.wi) / bs.pdf;
            // roulette against relative throughput
            let q: Float = (1.0 as Float
                - new_beta.luminance() / beta.luminance().max(1e-8))
            .max(0.0);
            if sampler.get_1d() < q {
                return;
            }
            beta = new_beta / (1.0 as Float - q);
            ray = isect.spawn_ray(&bs.wi);
        }
    }
    /// Run the full progressive estimate; one iteration per pixel
    /// sample.
    pub fn render(
        &self,
        scene: &Scene,
        camera: &dyn Camera,
        film: &Film,
        sampler_prototype: &dyn Sampler,
        num_threads: usize,
        cancel: &AtomicBool,
    ) {
        let resolution: Point2i = film.resolution;
        let n_pixels: usize = (resolution.x * resolution.y) as usize;
        let initial_radius: Float = if self.initial_radius > 0.0 as Float {
            self.initial_radius
        } else {
            scene.world_bound().diagonal().length() * 1e-3
        };
        let mut pixels: Vec<SppmPixel> = (0..n_pixels)
            .map(|_| SppmPixel::new(initial_radius))
            .collect();
        let iterations: i32 = sampler_prototype.samples_per_pixel();
        let progress: Mutex<pbr::ProgressBar<std::io::Stdout>> =
            Mutex::new(pbr::ProgressBar::new(iterations as u64));
        for iteration in 0..iterations {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let thread_count: usize = num_threads.max(1);
            let arenas: Vec<Bump> = (0..thread_count).map(|_| Bump::new()).collect();
            let visible_points: Mutex<Vec<VisiblePoint>> = Mutex::new(Vec::with_capacity(n_pixels));
            let ld_updates: Mutex<Vec<(usize, Spectrum)>> = Mutex::new(Vec::new());
            // eye pass
            {
                let queue: BlockQueue = BlockQueue::new(resolution, TILE_SIZE);
                let next_arena: AtomicUsize = AtomicUsize::new(0);
                crossbeam::scope(|scope| {
                    for _ in 0..thread_count {
                        let arena_index: usize = next_arena.fetch_add(1, Ordering::Relaxed);
                        let arena: &Bump = &arenas[arena_index];
                        let visible_points = &visible_points;
                        let ld_updates = &ld_updates;
                        let queue = &queue;
                        scope.spawn(move |_| {
                            let mut local_vps: Vec<VisiblePoint> = Vec::new();
                            let mut local_ld: Vec<(usize, Spectrum)> = Vec::new();
                            while let Some((tile_index, bounds)) = queue.next() {
                                let mut sampler: Box<dyn Sampler> = sampler_prototype
                                    .clone_with_seed(
                                        (iteration as u64) << 32 | tile_index as u64,
                                    );
                                for pixel in bounds.points() {
                                    sampler.start_pixel_sample(pixel, iteration);
                                    let mut ld: Spectrum = Spectrum::default();
                                    if let Some(vp) = self.trace_eye_path(
                                        scene,
                                        camera,
                                        sampler.as_mut(),
                                        arena,
                                        pixel,
                                        resolution.x,
                                        &mut ld,
                                    ) {
                                        local_vps.push(vp);
                                    }
                                    if !ld.is_black() {
                                        local_ld.push((
                                            (pixel.y * resolution.x + pixel.x) as usize,
                                            ld,
                                        ));
                                    }
                                }
                            }
                            visible_points.lock().unwrap().extend(local_vps);
                            ld_updates.lock().unwrap().extend(local_ld);
                        });
                    }
                })
                .unwrap();
            }
            for (index, ld) in ld_updates.into_inner().unwrap() {
                pixels[index].ld += ld;
            }
            let visible_points: Vec<VisiblePoint> = visible_points.into_inner().unwrap();
            // hash the visible points on a grid sized by the largest
            // current radius
            let cell_size: Float = visible_points
                .iter()
                .map(|vp| pixels[vp.pixel_index].radius)
                .fold(initial_radius, Float::max);
            let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
            for (index, vp) in visible_points.iter().enumerate() {
                grid.entry(grid_cell(&vp.point, cell_size))
                    .or_insert_with(Vec::new)
                    .push(index);
            }
            // photon pass
            {
                let photon_counter: AtomicUsize = AtomicUsize::new(0);
                let pixels_ref: &Vec<SppmPixel> = &pixels;
                let grid_ref = &grid;
                let vps_ref: &Vec<VisiblePoint> = &visible_points;
                crossbeam::scope(|scope| {
                    for _ in 0..thread_count {
                        let photon_counter = &photon_counter;
                        scope.spawn(move |_| {
                            let mut photon_arena: Bump = Bump::new();
                            loop {
                                let index: usize =
                                    photon_counter.fetch_add(1, Ordering::Relaxed);
                                if index >= self.n_photons as usize {
                                    break;
                                }
                                let mut sampler: Box<dyn Sampler> = sampler_prototype
                                    .clone_with_seed(
                                        0x9e37_79b9_u64 << 32
                                            | (iteration as u64) << 24
                                            | index as u64,
                                    );
                                sampler.start_pixel_sample(
                                    Point2i::new(index as i32, iteration),
                                    0,
                                );
                                self.trace_photon(
                                    scene,
                                    sampler.as_mut(),
                                    &photon_arena,
                                    grid_ref,
                                    vps_ref,
                                    pixels_ref,
                                    cell_size,
                                );
                                photon_arena.reset();
                            }
                        });
                    }
                })
                .unwrap();
            }
            // shrink radii and fold the photon contributions into tau
            for vp in &visible_points {
                let pixel: &mut SppmPixel = &mut pixels[vp.pixel_index];
                let m: u32 = pixel.m.swap(0, Ordering::Relaxed);
                if m > 0 {
                    let phi: Spectrum = Spectrum::rgb(
                        pixel.phi[0].swap(0.0, Ordering::Relaxed),
                        pixel.phi[1].swap(0.0, Ordering::Relaxed),
                        pixel.phi[2].swap(0.0, Ordering::Relaxed),
                    );
                    let n_new: Float = pixel.n + RADIUS_ALPHA * m as Float;
                    let r_new: Float =
                        pixel.radius * (n_new / (pixel.n + m as Float)).sqrt();
                    let ratio2: Float = (r_new * r_new) / (pixel.radius * pixel.radius);
                    pixel.tau = (pixel.tau + vp.beta * phi) * ratio2;
                    pixel.n = n_new;
                    pixel.radius = r_new;
                }
            }
            progress.lock().unwrap().inc();
        }
        progress.lock().unwrap().finish();
        // resolve into the film
        let total_photons: Float = iterations as Float * self.n_photons as Float;
        let mut tile = film.get_tile(film.full_bounds());
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let pixel: &SppmPixel = &pixels[(y * resolution.x + x) as usize];
                let mut l: Spectrum = pixel.ld / iterations as Float;
                if pixel.radius > 0.0 as Float && total_photons > 0.0 as Float {
                    l += pixel.tau / (PI * pixel.radius * pixel.radius * total_photons);
                }
                tile.add_sample(Point2i::new(x, y), l, 1.0);
            }
        }
        film.merge_tile(&tile);
    }
}
