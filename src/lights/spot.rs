//! A point light restricted to a smooth cone of directions.

// std
use std::sync::Arc;
// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::light::{Light, LightSampleLe, LightSampleLi};
use crate::core::lumen::{radians, smooth_step, Float, Spectrum, TWO_PI};
use crate::core::medium::Medium;
use crate::core::sampling::{uniform_cone_pdf, uniform_sample_cone};

pub struct SpotLight {
    pub position: Point3f,
    /// Frame whose z axis is the beam direction.
    frame: Frame,
    cos_theta_min: Float,
    cos_theta_max: Float,
    pub intensity: Spectrum,
    pub medium: Option<Arc<Medium>>,
}

impl SpotLight {
    pub fn new(
        position: Point3f,
        direction: Vector3f,
        intensity: Spectrum,
        angle_max: Float,
        angle_falloff_start: Float,
    ) -> Self {
        let cos_theta_min: Float = radians(angle_falloff_start).cos();
        let cos_theta_max: Float = radians(angle_max).cos();
        assert!(cos_theta_min > cos_theta_max);
        SpotLight {
            position,
            frame: Frame::from_z(&direction.normalize()),
            cos_theta_min,
            cos_theta_max,
            intensity,
            medium: None,
        }
    }
    fn falloff(&self, cos_theta: Float) -> Float {
        smooth_step(self.cos_theta_max, self.cos_theta_min, cos_theta)
    }
}

impl Light for SpotLight {
    fn sample_li(&self, ref_point: &Point3f, _u: Point2f) -> Option<LightSampleLi> {
        let mut wi: Vector3f = self.position - *ref_point;
        let distance: Float = wi.length();
        if distance == 0.0 as Float {
            return None;
        }
        wi = wi / distance;
        let cos_theta: Float = self.frame.to_local(&-wi).z;
        let l: Spectrum = self.intensity * self.falloff(cos_theta);
        if l.is_black() {
            return None;
        }
        Some(LightSampleLi {
            li: l / (distance * distance),
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
        let w_local: Vector3f = uniform_sample_cone(u1, self.cos_theta_max);
        let w: Vector3f = self.frame.from_local(&w_local);
        Some(LightSampleLe {
            le: self.intensity * self.falloff(w_local.z),
            ray: Ray::new_with_medium(self.position, w, self.medium.clone()),
            normal: Normal3f::default(),
            pdf_p: 1.0,
            pdf_w: uniform_cone_pdf(self.cos_theta_max),
            medium: self.medium.clone(),
        })
    }
    fn pdf_le(&self, ray: &Ray) -> (Float, Float) {
        let cos_theta: Float = self.frame.to_local(&ray.d).z;
        let pdf_w: Float = if cos_theta >= self.cos_theta_max {
            uniform_cone_pdf(self.cos_theta_max)
        } else {
            0.0
        };
        (0.0, pdf_w)
    }
    fn phi(&self) -> Spectrum {
        self.intensity
            * (TWO_PI
                * ((1.0 as Float - self.cos_theta_min)
                    + (self.cos_theta_min - self.cos_theta_max) / 2.0))
    }
    fn is_delta(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cone_cutoff() {
        let light = SpotLight::new(
            Point3f::new(0.0, 1.0, 0.0),
            Vector3f::new(0.0, -1.0, 0.0),
            Spectrum::new(10.0),
            30.0,
            15.0,
        );
        // directly below: full intensity
        let below = light
            .sample_li(&Point3f::new(0.0, 0.0, 0.0), Point2f::default())
            .unwrap();
        assert!((below.li.c[0] - 10.0).abs() < 1e-4);
        // far to the side: outside the cone
        assert!(light
            .sample_li(&Point3f::new(5.0, 0.9, 0.0), Point2f::default())
            .is_none());
    }
}
