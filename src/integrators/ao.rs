//! Ambient occlusion within a configurable range.

// others
use bumpalo::Bump;
// lumen
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::frame::Frame;
use crate::core::geometry::{Ray, Vector3f};
use crate::core::integrator::RayIntegrator;
use crate::core::lumen::{Float, Spectrum, INFINITY, RAY_EPSILON};
use crate::core::sampler::Sampler;
use crate::core::sampling::cosine_sample_hemisphere;
use crate::core::scene::Scene;

pub struct AoIntegrator {
    pub range: Float,
}

impl AoIntegrator {
    pub fn new(range: Float) -> Self {
        AoIntegrator { range }
    }
}

impl RayIntegrator for AoIntegrator {
    fn li(
        &self,
        ray: &Ray,
        scene: &Scene,
        _camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        _arena: &Bump,
        _film: &Film,
    ) -> Spectrum {
        let isect = match scene.intersect(ray, RAY_EPSILON, INFINITY) {
            Some(isect) => isect,
            None => return Spectrum::new(1.0),
        };
        // one cosine-weighted occlusion probe; the cosine cancels the
        // estimator weight
        let frame: Frame = Frame::from_z(&Vector3f::from(isect.shading.n).normalize());
        let wi: Vector3f = frame.from_local(&cosine_sample_hemisphere(&sampler.get_2d()));
        let shadow_ray: Ray = isect.spawn_ray(&wi);
        if scene.intersect_p(&shadow_ray, RAY_EPSILON, self.range) {
            Spectrum::default()
        } else {
            Spectrum::new(1.0)
        }
    }
}
