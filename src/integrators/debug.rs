//! Inspection integrator: shading normals or uv coordinates as color.

// others
use bumpalo::Bump;
// lumen
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::Ray;
use crate::core::integrator::RayIntegrator;
use crate::core::lumen::{Spectrum, INFINITY, RAY_EPSILON};
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;

#[derive(Copy, Clone, PartialEq)]
pub enum DebugView {
    ShadingNormal,
    Uv,
}

pub struct DebugIntegrator {
    pub view: DebugView,
}

impl DebugIntegrator {
    pub fn new(view: DebugView) -> Self {
        DebugIntegrator { view }
    }
}

impl RayIntegrator for DebugIntegrator {
    fn li(
        &self,
        ray: &Ray,
        scene: &Scene,
        _camera: &dyn Camera,
        _sampler: &mut dyn Sampler,
        _arena: &Bump,
        _film: &Film,
    ) -> Spectrum {
        match scene.intersect(ray, RAY_EPSILON, INFINITY) {
            Some(isect) => match self.view {
                DebugView::ShadingNormal => Spectrum::rgb(
                    0.5 * (isect.shading.n.x + 1.0),
                    0.5 * (isect.shading.n.y + 1.0),
                    0.5 * (isect.shading.n.z + 1.0),
                ),
                DebugView::Uv => Spectrum::rgb(isect.uv.x, isect.uv.y, 0.0),
            },
            None => Spectrum::default(),
        }
    }
}
