//! The light interface and its sample records.

// std
use std::sync::Arc;
// lumen
use crate::core::geometry::{Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::lumen::{Float, Spectrum};
use crate::core::medium::Medium;

/// Result of sampling a light as seen from a reference point.
#[derive(Default, Clone)]
pub struct LightSampleLi {
    pub li: Spectrum,
    pub wi: Vector3f,
    pub pdf: Float,
    /// Distance to the sampled point; shadow rays test up to it.
    pub visibility: Float,
    pub point: Point3f,
    pub normal: Normal3f,
}

/// Result of sampling an emitted ray, used by the bidirectional
/// integrators.
#[derive(Default, Clone)]
pub struct LightSampleLe {
    pub le: Spectrum,
    pub ray: Ray,
    pub normal: Normal3f,
    pub pdf_p: Float,
    pub pdf_w: Float,
    pub medium: Option<Arc<Medium>>,
}

pub trait Light: Send + Sync {
    /// Radiance arriving along a ray that escaped the scene; only
    /// infinite lights return non-black values.
    fn le(&self, _ray: &Ray) -> Spectrum {
        Spectrum::default()
    }
    fn sample_li(&self, ref_point: &Point3f, u: Point2f) -> Option<LightSampleLi>;
    /// Solid-angle density of `sample_li` returning the ray's
    /// direction; zero for delta lights.
    fn pdf_li(&self, ray: &Ray) -> Float;
    fn sample_le(&self, u0: Point2f, u1: Point2f) -> Option<LightSampleLe>;
    /// Positional and directional emission densities for a ray leaving
    /// the light.
    fn pdf_le(&self, ray: &Ray) -> (Float, Float);
    /// Emission densities at a point on an area light for direction w.
    fn pdf_le_at(&self, _normal: &Normal3f, _w: &Vector3f) -> (Float, Float) {
        (0.0, 0.0)
    }
    /// Cache scene-dependent state (infinite lights keep the world's
    /// bounding sphere).
    fn preprocess(&mut self, _world_bounds: &Bounds3f) {}
    /// Total emitted flux, used by the power light sampler.
    fn phi(&self) -> Spectrum;
    fn is_delta(&self) -> bool {
        false
    }
    fn is_area(&self) -> bool {
        false
    }
    fn is_infinite(&self) -> bool {
        false
    }
}
