//! The geometric interface shapes expose to primitives and area
//! lights.

// lumen
use crate::core::geometry::{
    nrm_abs_dot_vec3f, pnt3_distance_squaredf, Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::lumen::{Float, INFINITY, RAY_EPSILON};

/// Geometric record of a ray-shape intersection, without any of the
/// scene-level bindings (primitive, material, lights).
#[derive(Debug, Default, Copy, Clone)]
pub struct ShapeHit {
    pub t: Float,
    pub point: Point3f,
    /// Outward geometric normal.
    pub n: Normal3f,
    pub shading_n: Normal3f,
    pub tangent: Vector3f,
    pub uv: Point2f,
}

/// A point sampled on a shape's surface.
#[derive(Debug, Default, Copy, Clone)]
pub struct ShapeSample {
    pub point: Point3f,
    pub normal: Normal3f,
    pub uv: Point2f,
    pub pdf: Float,
}

pub trait Shape: Send + Sync {
    fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<ShapeHit>;
    fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        self.intersect(ray, t_min, t_max).is_some()
    }
    fn world_bound(&self) -> Bounds3f;
    fn area(&self) -> Float;
    /// Uniform area sampling; the returned pdf is with respect to
    /// surface area.
    fn sample(&self, u: &Point2f) -> ShapeSample;
    /// Sample a point as seen from a reference position; the returned
    /// pdf is with respect to solid angle at the reference.
    fn sample_from(&self, ref_point: &Point3f, u: &Point2f) -> Option<ShapeSample> {
        let mut ss: ShapeSample = self.sample(u);
        let mut wi: Vector3f = ss.point - *ref_point;
        let dist2: Float = wi.length_squared();
        if dist2 == 0.0 as Float {
            return None;
        }
        wi = wi / dist2.sqrt();
        // convert the area density to solid angle
        let cos_theta: Float = nrm_abs_dot_vec3f(&ss.normal, &wi);
        if cos_theta < 1e-8 {
            return None;
        }
        ss.pdf *= dist2 / cos_theta;
        if ss.pdf.is_infinite() {
            return None;
        }
        Some(ss)
    }
    /// Solid-angle density that `sample_from` at the ray origin picks
    /// the ray's direction.
    fn pdf_from(&self, ray: &Ray) -> Float {
        if let Some(hit) = self.intersect(ray, RAY_EPSILON, INFINITY) {
            let dist2: Float = pnt3_distance_squaredf(&ray.o, &hit.point);
            let cos_theta: Float = nrm_abs_dot_vec3f(&hit.n, &ray.d);
            if cos_theta < 1e-8 {
                return 0.0;
            }
            dist2 / (cos_theta * self.area())
        } else {
            0.0
        }
    }
    /// Area density of the uniform surface sampler.
    fn pdf_area(&self) -> Float {
        1.0 as Float / self.area()
    }
}
