//! The renderer configuration record and the driver that turns it
//! into an image.

// std
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
// lumen
use crate::cameras::orthographic::OrthographicCamera;
use crate::cameras::perspective::PerspectiveCamera;
use crate::cameras::spherical::SphericalCamera;
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::filter::Filter;
use crate::core::geometry::{Point2f, Point2i, Point3f, Vector3f};
use crate::core::integrator::{render_tiled, RayIntegrator};
use crate::core::lightdistrib::{LightSampler, PowerLightSampler, UniformLightSampler};
use crate::core::lumen::Float;
use crate::core::medium::Medium;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::core::transform::{Quaternion, Transform};
use crate::filters::{BoxFilter, GaussianFilter, TentFilter};
use crate::integrators::albedo::AlbedoIntegrator;
use crate::integrators::ao::AoIntegrator;
use crate::integrators::bdpt::BdptIntegrator;
use crate::integrators::debug::{DebugIntegrator, DebugView};
use crate::integrators::light_path::LightPathIntegrator;
use crate::integrators::naive::NaivePathIntegrator;
use crate::integrators::path::PathIntegrator;
use crate::integrators::random_walk::RandomWalkIntegrator;
use crate::integrators::sppm::SppmIntegrator;
use crate::integrators::vol_path::VolPathIntegrator;
use crate::samplers::independent::IndependentSampler;
use crate::samplers::stratified::StratifiedSampler;

#[derive(Debug)]
pub enum RenderError {
    Config(String),
    AssetLoad(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::Config(msg) => write!(f, "configuration error: {}", msg),
            RenderError::AssetLoad(msg) => write!(f, "asset load error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum IntegratorType {
    Path,
    VolPath,
    LightPath,
    LightVolPath,
    Bdpt,
    VolBdpt,
    Pm,
    Sppm,
    NaivePath,
    NaiveVolPath,
    RandomWalk,
    Ao,
    Albedo,
    Debug,
}

impl IntegratorType {
    pub fn parse(name: &str) -> Option<IntegratorType> {
        match name {
            "path" => Some(IntegratorType::Path),
            "vol_path" => Some(IntegratorType::VolPath),
            "light_path" => Some(IntegratorType::LightPath),
            "light_vol_path" => Some(IntegratorType::LightVolPath),
            "bdpt" => Some(IntegratorType::Bdpt),
            "vol_bdpt" => Some(IntegratorType::VolBdpt),
            "pm" => Some(IntegratorType::Pm),
            "sppm" => Some(IntegratorType::Sppm),
            "naive_path" => Some(IntegratorType::NaivePath),
            "naive_vol_path" => Some(IntegratorType::NaiveVolPath),
            "random_walk" => Some(IntegratorType::RandomWalk),
            "ao" => Some(IntegratorType::Ao),
            "albedo" => Some(IntegratorType::Albedo),
            "debug" => Some(IntegratorType::Debug),
            _ => None,
        }
    }
}

pub struct IntegratorInfo {
    pub integrator_type: IntegratorType,
    pub max_bounces: i32,
    pub rr_min_bounces: i32,
    pub regularize_bsdf: bool,
    pub ao_range: Float,
    pub n_photons: i32,
    pub initial_radius: Float,
}

impl Default for IntegratorInfo {
    fn default() -> Self {
        IntegratorInfo {
            integrator_type: IntegratorType::Path,
            max_bounces: 16,
            rr_min_bounces: 1,
            regularize_bsdf: false,
            ao_range: 0.1,
            n_photons: 100_000,
            initial_radius: -1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FilterType {
    Box,
    Tent,
    Gaussian,
}

pub struct FilterInfo {
    pub filter_type: FilterType,
    pub extent: Float,
    pub gaussian_stddev: Float,
}

impl Default for FilterInfo {
    fn default() -> Self {
        FilterInfo {
            filter_type: FilterType::Gaussian,
            extent: 3.0,
            gaussian_stddev: 0.5,
        }
    }
}

pub struct FilmInfo {
    pub filename: String,
    pub resolution: Point2i,
    pub filter_info: FilterInfo,
}

impl Default for FilmInfo {
    fn default() -> Self {
        FilmInfo {
            filename: String::from("image.png"),
            resolution: Point2i { x: 1280, y: 720 },
            filter_info: FilterInfo::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SamplerType {
    Independent,
    Stratified,
}

pub struct SamplerInfo {
    pub sampler_type: SamplerType,
    pub spp: i32,
}

impl Default for SamplerInfo {
    fn default() -> Self {
        SamplerInfo {
            sampler_type: SamplerType::Independent,
            spp: 64,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraType {
    Perspective,
    Orthographic,
    Spherical,
}

pub struct CameraInfo {
    pub camera_type: CameraType,
    /// Translation, rotation, scale; the camera looks down its local
    /// -z axis.
    pub transform: (Vector3f, Quaternion, Vector3f),
    /// Convenience look-at specification used by the built-in scenes;
    /// preferred when set.
    pub look_at: Option<(Point3f, Point3f, Vector3f)>,
    pub fov: Float,
    pub aperture_radius: Float,
    pub focus_distance: Float,
    /// Used by the orthographic camera only.
    pub viewport_size: Point2f,
    pub film_info: FilmInfo,
    pub sampler_info: SamplerInfo,
    pub medium: Option<Arc<Medium>>,
}

impl Default for CameraInfo {
    fn default() -> Self {
        CameraInfo {
            camera_type: CameraType::Perspective,
            transform: (
                Vector3f::default(),
                Quaternion::default(),
                Vector3f::new(1.0, 1.0, 1.0),
            ),
            look_at: None,
            fov: 35.0,
            aperture_radius: 0.0,
            focus_distance: 1.0,
            viewport_size: Point2f { x: 1.0, y: 1.0 },
            film_info: FilmInfo::default(),
            sampler_info: SamplerInfo::default(),
            medium: None,
        }
    }
}

pub struct RendererInfo {
    pub scene: Scene,
    pub camera_info: CameraInfo,
    pub integrator_info: IntegratorInfo,
}

fn create_filter(info: &FilterInfo) -> Arc<dyn Filter> {
    match info.filter_type {
        FilterType::Box => Arc::new(BoxFilter::new(info.extent.max(1e-3))),
        FilterType::Tent => Arc::new(TentFilter::new(info.extent.max(1e-3))),
        FilterType::Gaussian => {
            Arc::new(GaussianFilter::new(info.gaussian_stddev, info.extent.max(1e-3)))
        }
    }
}

fn create_sampler(info: &SamplerInfo) -> Result<Box<dyn Sampler>, RenderError> {
    if info.spp <= 0 {
        return Err(RenderError::Config(String::from(
            "samples per pixel must be positive",
        )));
    }
    match info.sampler_type {
        SamplerType::Independent => Ok(Box::new(IndependentSampler::new(info.spp, 0))),
        SamplerType::Stratified => {
            // stratify on the nearest square grid
            let x: i32 = (info.spp as Float).sqrt().round().max(1.0) as i32;
            let y: i32 = (info.spp + x - 1) / x;
            Ok(Box::new(StratifiedSampler::new(x, y, true, 0)))
        }
    }
}

fn create_camera(info: &CameraInfo) -> Result<Box<dyn Camera>, RenderError> {
    let resolution: Point2i = info.film_info.resolution;
    if resolution.x <= 0 || resolution.y <= 0 {
        return Err(RenderError::Config(String::from("empty film resolution")));
    }
    let (look_from, look_at, up) = match info.look_at {
        Some(look_at) => look_at,
        None => {
            // derive a view from the rigid transform
            let (p, q, _s) = info.transform;
            let t: Transform = Transform::compose(&p, &q, &Vector3f::new(1.0, 1.0, 1.0));
            let origin: Point3f = t.transform_point(&Point3f::default());
            let forward: Vector3f = t.transform_vector(&Vector3f::new(0.0, 0.0, -1.0));
            let up: Vector3f = t.transform_vector(&Vector3f::new(0.0, 1.0, 0.0));
            (origin, origin + forward, up)
        }
    };
    match info.camera_type {
        CameraType::Perspective => Ok(Box::new(PerspectiveCamera::new(
            look_from,
            look_at,
            up,
            info.fov,
            info.aperture_radius,
            info.focus_distance,
            resolution,
            info.medium.clone(),
        ))),
        CameraType::Orthographic => Ok(Box::new(OrthographicCamera::new(
            info.viewport_size,
            resolution.x,
            look_from,
            look_at,
            up,
            info.medium.clone(),
        ))),
        CameraType::Spherical => Ok(Box::new(SphericalCamera::new(
            look_from,
            resolution,
            info.medium.clone(),
        ))),
    }
}

fn create_light_sampler(scene: &Scene, prefer_power: bool) -> Box<dyn LightSampler> {
    if prefer_power && scene.lights.len() > 1 {
        Box::new(PowerLightSampler::new(scene.lights.clone()))
    } else {
        Box::new(UniformLightSampler::new(scene.lights.clone()))
    }
}

/// Render the configured frame; the partially accumulated film is
/// written even when cancellation interrupts the tile loop.
pub fn render(info: &RendererInfo, num_threads: usize, cancel: &AtomicBool) -> Result<(), RenderError> {
    let filter: Arc<dyn Filter> = create_filter(&info.camera_info.film_info.filter_info);
    let film: Film = Film::new(info.camera_info.film_info.resolution, filter);
    let camera: Box<dyn Camera> = create_camera(&info.camera_info)?;
    let sampler: Box<dyn Sampler> = create_sampler(&info.camera_info.sampler_info)?;
    let spp: i32 = sampler.samples_per_pixel();
    let scene: &Scene = &info.scene;
    let ii: &IntegratorInfo = &info.integrator_info;
    println!(
        "rendering {} ({}x{}) with {:?}, {} spp, {} threads",
        info.camera_info.film_info.filename,
        film.resolution.x,
        film.resolution.y,
        ii.integrator_type,
        spp,
        num_threads
    );
    let start: Instant = Instant::now();
    match ii.integrator_type {
        IntegratorType::Pm | IntegratorType::Sppm => {
            let integrator: SppmIntegrator = SppmIntegrator::new(
                ii.max_bounces,
                ii.n_photons,
                ii.initial_radius,
                create_light_sampler(scene, true),
            );
            integrator.render(
                scene,
                camera.as_ref(),
                &film,
                sampler.as_ref(),
                num_threads,
                cancel,
            );
        }
        _ => {
            let integrator: Box<dyn RayIntegrator> = match ii.integrator_type {
                IntegratorType::Path => Box::new(PathIntegrator::new(
                    ii.max_bounces,
                    ii.rr_min_bounces,
                    ii.regularize_bsdf,
                    create_light_sampler(scene, true),
                )),
                IntegratorType::VolPath => Box::new(VolPathIntegrator::new(
                    ii.max_bounces,
                    ii.rr_min_bounces,
                    ii.regularize_bsdf,
                    create_light_sampler(scene, true),
                )),
                IntegratorType::LightPath => Box::new(LightPathIntegrator::new(
                    ii.max_bounces,
                    create_light_sampler(scene, true),
                    false,
                )),
                IntegratorType::LightVolPath => Box::new(LightPathIntegrator::new(
                    ii.max_bounces,
                    create_light_sampler(scene, true),
                    true,
                )),
                IntegratorType::Bdpt => Box::new(BdptIntegrator::new(
                    ii.max_bounces,
                    create_light_sampler(scene, true),
                    false,
                )),
                IntegratorType::VolBdpt => Box::new(BdptIntegrator::new(
                    ii.max_bounces,
                    create_light_sampler(scene, true),
                    true,
                )),
                IntegratorType::NaivePath => Box::new(NaivePathIntegrator::new(
                    ii.max_bounces,
                    ii.rr_min_bounces,
                    false,
                )),
                IntegratorType::NaiveVolPath => Box::new(NaivePathIntegrator::new(
                    ii.max_bounces,
                    ii.rr_min_bounces,
                    true,
                )),
                IntegratorType::RandomWalk => {
                    Box::new(RandomWalkIntegrator::new(ii.max_bounces))
                }
                IntegratorType::Ao => Box::new(AoIntegrator::new(ii.ao_range)),
                IntegratorType::Albedo => Box::new(AlbedoIntegrator::new()),
                IntegratorType::Debug => {
                    Box::new(DebugIntegrator::new(DebugView::ShadingNormal))
                }
                IntegratorType::Pm | IntegratorType::Sppm => unreachable!(),
            };
            render_tiled(
                integrator.as_ref(),
                scene,
                camera.as_ref(),
                &film,
                sampler.as_ref(),
                num_threads,
                cancel,
            );
        }
    }
    let elapsed = start.elapsed();
    println!(
        "render finished in {:.2}s ({} saturated samples)",
        elapsed.as_secs_f64(),
        film.saturation_count()
    );
    film.write(&info.camera_info.film_info.filename, spp)
        .map_err(RenderError::AssetLoad)?;
    Ok(())
}
