//! An isotropic point light.

// std
use std::sync::Arc;
// lumen
use crate::core::geometry::{Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::light::{Light, LightSampleLe, LightSampleLi};
use crate::core::lumen::{Float, Spectrum, FOUR_PI};
use crate::core::medium::Medium;
use crate::core::sampling::{uniform_sample_sphere, uniform_sphere_pdf};

pub struct PointLight {
    pub position: Point3f,
    pub intensity: Spectrum,
    pub medium: Option<Arc<Medium>>,
}

impl PointLight {
    pub fn new(position: Point3f, intensity: Spectrum) -> Self {
        PointLight {
            position,
            intensity,
            medium: None,
        }
    }
}

impl Light for PointLight {
    fn sample_li(&self, ref_point: &Point3f, _u: Point2f) -> Option<LightSampleLi> {
        let mut wi: Vector3f = self.position - *ref_point;
        let distance: Float = wi.length();
        if distance == 0.0 as Float {
            return None;
        }
        wi = wi / distance;
        Some(LightSampleLi {
            li: self.intensity / (distance * distance),
            wi,
            pdf: 1.0,
            visibility: distance,
            point: self.position,
            normal: Normal3f::default(),
        })
    }
    fn pdf_li(&self, _ray: &Ray) -> Float {
        0.0
    }
    fn sample_le(&self, _u0: Point2f, u1: Point2f) -> Option<LightSampleLe> {
        let w: Vector3f = uniform_sample_sphere(u1);
        Some(LightSampleLe {
            le: self.intensity,
            ray: Ray::new_with_medium(self.position, w, self.medium.clone()),
            normal: Normal3f::from(w),
            pdf_p: 1.0,
            pdf_w: uniform_sphere_pdf(),
            medium: self.medium.clone(),
        })
    }
    fn pdf_le(&self, _ray: &Ray) -> (Float, Float) {
        (0.0, uniform_sphere_pdf())
    }
    fn phi(&self) -> Spectrum {
        self.intensity * FOUR_PI
    }
    fn is_delta(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_square_falloff() {
        let light = PointLight::new(Point3f::new(0.0, 2.0, 0.0), Spectrum::new(4.0));
        let ls = light.sample_li(&Point3f::default(), Point2f::default()).unwrap();
        assert!((ls.li.c[0] - 1.0).abs() < 1e-5);
        assert!((ls.wi.y - 1.0).abs() < 1e-5);
        assert_eq!(ls.pdf, 1.0);
        assert!((ls.visibility - 2.0).abs() < 1e-5);
    }
}
