//! Orthographic projection camera.

// std
use std::sync::Arc;
// lumen
use crate::core::camera::Camera;
use crate::core::geometry::{vec3_cross_vec3, Point2f, Point2i, Point3f, Ray, Vector3f};
use crate::core::lumen::Float;
use crate::core::medium::Medium;

pub struct OrthographicCamera {
    origin: Point3f,
    lower_left: Point3f,
    horizontal: Vector3f,
    vertical: Vector3f,
    resolution: Point2i,
    medium: Option<Arc<Medium>>,
    w: Vector3f,
}

impl OrthographicCamera {
    pub fn new(
        viewport_size: Point2f,
        resolution_x: i32,
        look_from: Point3f,
        look_at: Point3f,
        up: Vector3f,
        medium: Option<Arc<Medium>>,
    ) -> Self {
        // the film aspect follows the viewport
        let resolution: Point2i = Point2i {
            x: resolution_x,
            y: (resolution_x as Float * viewport_size.y / viewport_size.x) as i32,
        };
        let w: Vector3f = (look_from - look_at).normalize();
        let u: Vector3f = vec3_cross_vec3(&up, &w).normalize();
        let v: Vector3f = vec3_cross_vec3(&w, &u);
        let horizontal: Vector3f = u * viewport_size.x;
        let vertical: Vector3f = v * viewport_size.y;
        let lower_left: Point3f = look_from - horizontal / 2.0 - vertical / 2.0;
        OrthographicCamera {
            origin: look_from,
            lower_left,
            horizontal,
            vertical,
            resolution,
            medium,
            w,
        }
    }
}

impl Camera for OrthographicCamera {
    fn sample_ray(&self, film_sample: &Point2f, _aperture_sample: &Point2f) -> (Ray, Float) {
        let s: Float = film_sample.x / self.resolution.x as Float;
        let t: Float = film_sample.y / self.resolution.y as Float;
        let pixel_point: Point3f = self.lower_left + self.horizontal * s + self.vertical * t;
        let ray: Ray = Ray {
            o: pixel_point,
            d: -self.w,
            medium: self.medium.clone(),
        };
        (ray, 1.0)
    }
    fn resolution(&self) -> Point2i {
        self.resolution
    }
    fn medium(&self) -> Option<Arc<Medium>> {
        self.medium.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rays_are_parallel() {
        let cam = OrthographicCamera::new(
            Point2f::new(2.0, 1.0),
            200,
            Point3f::new(0.0, 0.0, 5.0),
            Point3f::default(),
            Vector3f::new(0.0, 1.0, 0.0),
            None,
        );
        assert_eq!(cam.resolution(), Point2i::new(200, 100));
        let (r0, _) = cam.sample_ray(&Point2f::new(10.0, 10.0), &Point2f::default());
        let (r1, _) = cam.sample_ray(&Point2f::new(150.0, 80.0), &Point2f::default());
        assert!((r0.d - r1.d).length() < 1e-6);
        assert!((r0.o - r1.o).length() > 0.1);
        // both originate from different film points but share the axis
        assert!((cam.origin.z - 5.0).abs() < 1e-6);
    }
}
