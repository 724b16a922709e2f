//! The camera interface: forward ray generation for eye paths and the
//! reverse importance queries used by light tracing.

// std
use std::sync::Arc;
// lumen
use crate::core::geometry::{Normal3f, Point2f, Point2i, Point3f, Ray, Vector3f};
use crate::core::lumen::{Float, Spectrum};
use crate::core::medium::Medium;

/// Result of sampling a direction from a scene point toward the
/// camera aperture.
#[derive(Default, Clone)]
pub struct CameraSampleWi {
    pub we: Spectrum,
    pub wi: Vector3f,
    pub pdf: Float,
    pub p_raster: Point2f,
    pub p_aperture: Point3f,
    pub normal: Normal3f,
}

pub trait Camera: Send + Sync {
    /// Generate the primary ray for a film-space sample (in pixels,
    /// filter offset already applied) and a lens sample. Returns the
    /// ray weight.
    fn sample_ray(&self, film_sample: &Point2f, aperture_sample: &Point2f) -> (Ray, Float);
    /// Sample a connection from a reference point to the aperture;
    /// None for cameras that cannot be connected to (or when the
    /// connection falls outside the film).
    fn sample_wi(&self, _ref_point: &Point3f, _u: &Point2f) -> Option<CameraSampleWi> {
        None
    }
    /// Importance carried by a ray leaving the aperture, with the
    /// raster position it corresponds to.
    fn we(&self, _ray: &Ray) -> (Spectrum, Option<Point2f>) {
        (Spectrum::default(), None)
    }
    /// Positional and directional densities of `sample_ray` emitting
    /// the given ray.
    fn pdf_we(&self, _ray: &Ray) -> (Float, Float) {
        (0.0, 0.0)
    }
    fn resolution(&self) -> Point2i;
    fn medium(&self) -> Option<Arc<Medium>>;
}
