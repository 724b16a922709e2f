//! Infinite-area lights: a constant sky and an equirectangular
//! environment map.

// std
use std::sync::Arc;
// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{
    spherical_phi, spherical_theta, Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::light::{Light, LightSampleLe, LightSampleLi};
use crate::core::lumen::{sqr, Float, Spectrum, FOUR_PI, INV_2_PI, INV_PI, PI, TWO_PI};
use crate::core::sampling::{concentric_sample_disk, uniform_sample_sphere, uniform_sphere_pdf, Distribution2D};
use crate::core::texture::SpectrumTexture;
use crate::core::transform::Transform;

pub struct UniformInfiniteLight {
    pub l: Spectrum,
    pub scale: Float,
    world_center: Point3f,
    world_radius: Float,
}

impl UniformInfiniteLight {
    pub fn new(l: Spectrum, scale: Float) -> Self {
        UniformInfiniteLight {
            l,
            scale,
            world_center: Point3f::default(),
            world_radius: 1.0,
        }
    }
}

impl Light for UniformInfiniteLight {
    fn le(&self, _ray: &Ray) -> Spectrum {
        self.l * self.scale
    }
    fn sample_li(&self, ref_point: &Point3f, u: Point2f) -> Option<LightSampleLi> {
        let wi: Vector3f = uniform_sample_sphere(u);
        Some(LightSampleLi {
            li: self.l * self.scale,
            wi,
            pdf: uniform_sphere_pdf(),
            visibility: 2.0 as Float * self.world_radius,
            point: *ref_point + wi * (2.0 as Float * self.world_radius),
            normal: Normal3f::default(),
        })
    }
    fn pdf_li(&self, _ray: &Ray) -> Float {
        uniform_sphere_pdf()
    }
    fn sample_le(&self, u0: Point2f, u1: Point2f) -> Option<LightSampleLe> {
        let wo: Vector3f = uniform_sample_sphere(u1);
        let frame: Frame = Frame::from_z(&wo);
        let u_disk: Point2f = concentric_sample_disk(&u0);
        let p_disk: Point3f = self.world_center
            + frame.from_local(&Vector3f::new(u_disk.x, u_disk.y, 0.0)) * self.world_radius;
        Some(LightSampleLe {
            le: self.l * self.scale,
            ray: Ray::new(p_disk - wo * self.world_radius, wo),
            normal: Normal3f::default(),
            pdf_p: 1.0 as Float / (PI * sqr(self.world_radius)),
            pdf_w: uniform_sphere_pdf(),
            medium: None,
        })
    }
    fn pdf_le(&self, _ray: &Ray) -> (Float, Float) {
        (
            1.0 as Float / (PI * sqr(self.world_radius)),
            uniform_sphere_pdf(),
        )
    }
    fn preprocess(&mut self, world_bounds: &Bounds3f) {
        let (center, radius) = world_bounds.bounding_sphere();
        self.world_center = center;
        self.world_radius = radius.max(1.0);
    }
    fn phi(&self) -> Spectrum {
        self.l * (self.scale * FOUR_PI * PI * sqr(self.world_radius))
    }
    fn is_infinite(&self) -> bool {
        true
    }
}

/// Environment light driven by an equirectangular radiance map; a 2D
/// distribution over luminance times sin(theta) importance-samples it.
pub struct ImageInfiniteLight {
    pub l_map: Arc<dyn SpectrumTexture>,
    pub l_scale: Float,
    transform: Transform,
    distribution: Distribution2D,
    world_center: Point3f,
    world_radius: Float,
}

impl ImageInfiniteLight {
    pub fn new(
        l_map: Arc<dyn SpectrumTexture>,
        width: i32,
        height: i32,
        l_scale: Float,
        transform: Transform,
    ) -> Self {
        let mut image: Vec<Float> = Vec::with_capacity((width * height) as usize);
        for v in 0..height {
            let vp: Float = (v as Float + 0.5) / height as Float;
            let sin_theta: Float = (PI * vp).sin();
            for u in 0..width {
                let up: Float = u as Float / width as Float;
                let lum: Float = l_map.evaluate(&Point2f { x: up, y: vp }).luminance();
                image.push((sin_theta * lum).max(0.0));
            }
        }
        ImageInfiniteLight {
            l_map,
            l_scale,
            transform,
            distribution: Distribution2D::new(image, width, height),
            world_center: Point3f::default(),
            world_radius: 1.0,
        }
    }
    fn uv_for_direction(&self, w: &Vector3f) -> (Point2f, Float) {
        let w_local: Vector3f = self.transform.transform_vector_inverse(w).normalize();
        let theta: Float = spherical_theta(&w_local);
        let phi: Float = spherical_phi(&w_local);
        (
            Point2f {
                x: phi * INV_2_PI,
                y: 1.0 as Float - theta * INV_PI,
            },
            theta.sin(),
        )
    }
    fn direction_for_uv(&self, uv: &Point2f) -> (Vector3f, Float) {
        let theta: Float = (1.0 as Float - uv.y) * PI;
        let phi: Float = uv.x * TWO_PI;
        let w_local: Vector3f = Vector3f {
            x: theta.sin() * phi.cos(),
            y: theta.sin() * phi.sin(),
            z: theta.cos(),
        };
        (self.transform.transform_vector(&w_local), theta.sin())
    }
}

impl Light for ImageInfiniteLight {
    fn le(&self, ray: &Ray) -> Spectrum {
        let (uv, _) = self.uv_for_direction(&ray.d.normalize());
        self.l_map.evaluate(&uv) * self.l_scale
    }
    fn sample_li(&self, ref_point: &Point3f, u: Point2f) -> Option<LightSampleLi> {
        let mut map_pdf: Float = 0.0;
        let uv: Point2f = self.distribution.sample_continuous(u, &mut map_pdf);
        if map_pdf == 0.0 as Float {
            return None;
        }
        let (wi, sin_theta) = self.direction_for_uv(&uv);
        if sin_theta == 0.0 as Float {
            return None;
        }
        let pdf: Float = map_pdf / (2.0 as Float * sqr(PI) * sin_theta);
        Some(LightSampleLi {
            li: self.l_map.evaluate(&uv) * self.l_scale,
            wi,
            pdf,
            visibility: 2.0 as Float * self.world_radius,
            point: *ref_point + wi * (2.0 as Float * self.world_radius),
            normal: Normal3f::default(),
        })
    }
    fn pdf_li(&self, ray: &Ray) -> Float {
        let (uv, sin_theta) = self.uv_for_direction(&ray.d.normalize());
        if sin_theta == 0.0 as Float {
            return 0.0;
        }
        self.distribution.pdf(uv) / (2.0 as Float * sqr(PI) * sin_theta)
    }
    fn sample_le(&self, u0: Point2f, u1: Point2f) -> Option<LightSampleLe> {
        let mut map_pdf: Float = 0.0;
        let uv: Point2f = self.distribution.sample_continuous(u1, &mut map_pdf);
        if map_pdf == 0.0 as Float {
            return None;
        }
        let (w_in, sin_theta) = self.direction_for_uv(&uv);
        if sin_theta == 0.0 as Float {
            return None;
        }
        // emitted rays travel opposite the incoming direction
        let wo: Vector3f = -w_in;
        let frame: Frame = Frame::from_z(&wo);
        let u_disk: Point2f = concentric_sample_disk(&u0);
        let p_disk: Point3f = self.world_center
            + frame.from_local(&Vector3f::new(u_disk.x, u_disk.y, 0.0)) * self.world_radius;
        Some(LightSampleLe {
            le: self.l_map.evaluate(&uv) * self.l_scale,
            ray: Ray::new(p_disk - wo * self.world_radius, wo),
            normal: Normal3f::from(wo),
            pdf_p: 1.0 as Float / (PI * sqr(self.world_radius)),
            pdf_w: map_pdf / (2.0 as Float * sqr(PI) * sin_theta),
            medium: None,
        })
    }
    fn pdf_le(&self, ray: &Ray) -> (Float, Float) {
        let (uv, sin_theta) = self.uv_for_direction(&-ray.d.normalize());
        let pdf_w: Float = if sin_theta == 0.0 as Float {
            0.0
        } else {
            self.distribution.pdf(uv) / (2.0 as Float * sqr(PI) * sin_theta)
        };
        (1.0 as Float / (PI * sqr(self.world_radius)), pdf_w)
    }
    fn preprocess(&mut self, world_bounds: &Bounds3f) {
        let (center, radius) = world_bounds.bounding_sphere();
        self.world_center = center;
        self.world_radius = radius.max(1.0);
    }
    fn phi(&self) -> Spectrum {
        self.l_map.average() * (self.l_scale * FOUR_PI * PI * sqr(self.world_radius))
    }
    fn is_infinite(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_light_energy() {
        let light = UniformInfiniteLight::new(Spectrum::new(1.0), 1.0);
        let ray = Ray::new(Point3f::default(), Vector3f::new(0.3, 0.4, -0.5));
        assert!((light.le(&ray).c[0] - 1.0).abs() < 1e-6);
        assert!((light.pdf_li(&ray) - uniform_sphere_pdf()).abs() < 1e-8);
        let ls = light
            .sample_li(&Point3f::default(), Point2f::new(0.3, 0.7))
            .unwrap();
        assert!((ls.wi.length() - 1.0).abs() < 1e-5);
    }

    struct Gradient {}

    impl SpectrumTexture for Gradient {
        fn evaluate(&self, uv: &Point2f) -> Spectrum {
            Spectrum::new(uv.y * uv.y)
        }
        fn average(&self) -> Spectrum {
            Spectrum::new(1.0 / 3.0)
        }
    }

    #[test]
    fn test_image_light_importance_prefers_bright_rows() {
        let light = ImageInfiniteLight::new(
            Arc::new(Gradient {}),
            16,
            16,
            1.0,
            Transform::identity(),
        );
        // the gradient peaks at v -> 1 (theta -> 0, straight up);
        // sampled directions should lean that way
        let mut z_sum: Float = 0.0;
        let n: usize = 64;
        for i in 0..n {
            let u = Point2f::new(
                (i as Float + 0.5) / n as Float,
                ((i * 29 % n) as Float + 0.5) / n as Float,
            );
            if let Some(ls) = light.sample_li(&Point3f::default(), u) {
                z_sum += ls.wi.z;
                assert!(ls.pdf > 0.0);
            }
        }
        assert!(z_sum / n as Float > 0.2);
    }
}
