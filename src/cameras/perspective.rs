//! Thin-lens perspective camera.

// std
use std::sync::Arc;
// lumen
use crate::core::camera::{Camera, CameraSampleWi};
use crate::core::geometry::{
    vec3_cross_vec3, vec3_dot_vec3f, Normal3f, Point2f, Point2i, Point3f, Ray, Vector3f,
};
use crate::core::lumen::{radians, Float, Spectrum, PI};
use crate::core::medium::Medium;
use crate::core::sampling::concentric_sample_disk;

pub struct PerspectiveCamera {
    origin: Point3f,
    lower_left: Point3f,
    horizontal: Vector3f,
    vertical: Vector3f,
    lens_radius: Float,
    focus_dist: Float,
    /// Area of the plane of focus covered by the film.
    film_area: Float,
    resolution: Point2i,
    medium: Option<Arc<Medium>>,
    // local coordinate frame; w points backward
    u: Vector3f,
    v: Vector3f,
    w: Vector3f,
}

impl PerspectiveCamera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        look_from: Point3f,
        look_at: Point3f,
        up: Vector3f,
        vfov: Float,
        aperture_radius: Float,
        focus_dist: Float,
        resolution: Point2i,
        medium: Option<Arc<Medium>>,
    ) -> Self {
        let theta: Float = radians(vfov);
        let h: Float = (theta / 2.0).tan();
        let viewport_height: Float = 2.0 as Float * h;
        let aspect_ratio: Float = resolution.x as Float / resolution.y as Float;
        let viewport_width: Float = aspect_ratio * viewport_height;
        let w: Vector3f = (look_from - look_at).normalize();
        let u: Vector3f = vec3_cross_vec3(&up, &w).normalize();
        let v: Vector3f = vec3_cross_vec3(&w, &u);
        let horizontal: Vector3f = u * (focus_dist * viewport_width);
        let vertical: Vector3f = v * (focus_dist * viewport_height);
        let lower_left: Point3f =
            look_from - horizontal / 2.0 - vertical / 2.0 - w * focus_dist;
        PerspectiveCamera {
            origin: look_from,
            lower_left,
            horizontal,
            vertical,
            lens_radius: aperture_radius,
            focus_dist,
            film_area: horizontal.length() * vertical.length(),
            resolution,
            medium,
            u,
            v,
            w,
        }
    }
    fn lens_area(&self) -> Float {
        if self.lens_radius > 0.0 as Float {
            PI * self.lens_radius * self.lens_radius
        } else {
            1.0
        }
    }
    fn forward(&self) -> Vector3f {
        -self.w
    }
    /// Map a point on the plane of focus to raster coordinates;
    /// None when it lies outside the film rectangle.
    fn raster_from_focus(&self, p_focus: &Point3f) -> Option<Point2f> {
        let rel: Vector3f = *p_focus - self.lower_left;
        let s: Float = vec3_dot_vec3f(&rel, &self.horizontal) / self.horizontal.length_squared();
        let t: Float = vec3_dot_vec3f(&rel, &self.vertical) / self.vertical.length_squared();
        if s < 0.0 || s >= 1.0 || t < 0.0 || t >= 1.0 {
            return None;
        }
        Some(Point2f {
            x: s * self.resolution.x as Float,
            y: t * self.resolution.y as Float,
        })
    }
}

impl Camera for PerspectiveCamera {
    fn sample_ray(&self, film_sample: &Point2f, aperture_sample: &Point2f) -> (Ray, Float) {
        let rd: Point2f = concentric_sample_disk(aperture_sample) * self.lens_radius;
        let offset: Vector3f = self.u * rd.x + self.v * rd.y;
        let camera_point: Point3f = self.origin + offset;
        let s: Float = film_sample.x / self.resolution.x as Float;
        let t: Float = film_sample.y / self.resolution.y as Float;
        let pixel_point: Point3f = self.lower_left + self.horizontal * s + self.vertical * t;
        let ray: Ray = Ray {
            o: camera_point,
            d: (pixel_point - camera_point).normalize(),
            medium: self.medium.clone(),
        };
        (ray, 1.0)
    }
    fn sample_wi(&self, ref_point: &Point3f, u: &Point2f) -> Option<CameraSampleWi> {
        let rd: Point2f = concentric_sample_disk(u) * self.lens_radius;
        let p_aperture: Point3f = self.origin + self.u * rd.x + self.v * rd.y;
        let mut wi: Vector3f = p_aperture - *ref_point;
        let dist: Float = wi.length();
        if dist == 0.0 as Float {
            return None;
        }
        wi = wi / dist;
        let cos_theta: Float = vec3_dot_vec3f(&self.forward(), &-wi);
        if cos_theta <= 0.0 as Float {
            return None;
        }
        let (we, p_raster) = self.we(&Ray::new(p_aperture, -wi));
        let p_raster: Point2f = p_raster?;
        let pdf: Float = dist * dist / (cos_theta * self.lens_area());
        Some(CameraSampleWi {
            we,
            wi,
            pdf,
            p_raster,
            p_aperture,
            normal: Normal3f::from(self.forward()),
        })
    }
    fn we(&self, ray: &Ray) -> (Spectrum, Option<Point2f>) {
        let cos_theta: Float = vec3_dot_vec3f(&ray.d, &self.forward());
        if cos_theta <= 0.0 as Float {
            return (Spectrum::default(), None);
        }
        let p_focus: Point3f = ray.position(self.focus_dist / cos_theta);
        let p_raster: Option<Point2f> = self.raster_from_focus(&p_focus);
        if p_raster.is_none() {
            return (Spectrum::default(), None);
        }
        // the importance is normalized so that it integrates to one
        // over the film
        let cos_2: Float = cos_theta * cos_theta;
        let we: Float = self.focus_dist * self.focus_dist
            / (self.film_area * self.lens_area() * cos_2 * cos_2);
        (Spectrum::new(we), p_raster)
    }
    fn pdf_we(&self, ray: &Ray) -> (Float, Float) {
        let cos_theta: Float = vec3_dot_vec3f(&ray.d, &self.forward());
        if cos_theta <= 0.0 as Float {
            return (0.0, 0.0);
        }
        let p_focus: Point3f = ray.position(self.focus_dist / cos_theta);
        if self.raster_from_focus(&p_focus).is_none() {
            return (0.0, 0.0);
        }
        let pdf_p: Float = 1.0 as Float / self.lens_area();
        let pdf_w: Float =
            self.focus_dist * self.focus_dist / (self.film_area * cos_theta * cos_theta * cos_theta);
        (pdf_p, pdf_w)
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

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(
            Point3f::new(0.0, 0.0, 3.0),
            Point3f::default(),
            Vector3f::new(0.0, 1.0, 0.0),
            45.0,
            0.0,
            3.0,
            Point2i::new(128, 128),
            None,
        )
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let cam = camera();
        let (ray, weight) = cam.sample_ray(&Point2f::new(64.0, 64.0), &Point2f::new(0.5, 0.5));
        assert_eq!(weight, 1.0);
        assert!((ray.d.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_we_round_trip_raster() {
        let cam = camera();
        let film = Point2f::new(30.0, 100.0);
        let (ray, _) = cam.sample_ray(&film, &Point2f::new(0.5, 0.5));
        let (we, p_raster) = cam.we(&ray);
        let p = p_raster.unwrap();
        assert!(!we.is_black());
        assert!((p.x - film.x).abs() < 0.05 && (p.y - film.y).abs() < 0.05);
    }

    #[test]
    fn test_sample_wi_sees_scene_point() {
        let cam = camera();
        let cs = cam
            .sample_wi(&Point3f::new(0.0, 0.0, 0.0), &Point2f::new(0.5, 0.5))
            .unwrap();
        // direction from the point toward the aperture
        assert!(cs.wi.z > 0.99);
        assert!(cs.pdf > 0.0);
        assert!((cs.p_raster.x - 64.0).abs() < 0.5);
    }
}
