//! Equirectangular camera covering the full sphere, for 360 renders.

// std
use std::sync::Arc;
// lumen
use crate::core::camera::Camera;
use crate::core::geometry::{spherical_direction, Point2f, Point2i, Point3f, Ray};
use crate::core::lumen::{Float, PI, TWO_PI};
use crate::core::medium::Medium;

pub struct SphericalCamera {
    origin: Point3f,
    resolution: Point2i,
    medium: Option<Arc<Medium>>,
}

impl SphericalCamera {
    pub fn new(position: Point3f, resolution: Point2i, medium: Option<Arc<Medium>>) -> Self {
        SphericalCamera {
            origin: position,
            resolution,
            medium,
        }
    }
}

impl Camera for SphericalCamera {
    fn sample_ray(&self, film_sample: &Point2f, _aperture_sample: &Point2f) -> (Ray, Float) {
        let theta: Float = (1.0 as Float - film_sample.y / self.resolution.y as Float) * PI;
        let phi: Float = film_sample.x / self.resolution.x as Float * TWO_PI;
        let ray: Ray = Ray {
            o: self.origin,
            d: spherical_direction(theta.sin(), theta.cos(), phi),
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
    fn test_covers_the_sphere() {
        let cam = SphericalCamera::new(Point3f::default(), Point2i::new(64, 32), None);
        // film center looks along -x (phi = pi), horizontal
        let (mid, _) = cam.sample_ray(&Point2f::new(32.0, 16.0), &Point2f::default());
        assert!(mid.d.z.abs() < 1e-5);
        // top row points up
        let (top, _) = cam.sample_ray(&Point2f::new(0.0, 32.0), &Point2f::default());
        assert!(top.d.z < -0.999 || top.d.z > 0.999);
    }
}
