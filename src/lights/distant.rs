//! A directional light arriving from a fixed direction with a small
//! visible angular radius.

// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::light::{Light, LightSampleLe, LightSampleLi};
use crate::core::lumen::{Float, Spectrum, INFINITY};
use crate::core::sampling::concentric_sample_disk;

pub struct DistantLight {
    /// Direction the light travels (toward the scene).
    pub dir: Vector3f,
    pub intensity: Spectrum,
    /// Jitter radius that softens shadow edges.
    pub radius: Float,
}

impl DistantLight {
    pub fn new(direction: Vector3f, intensity: Spectrum, visible_radius: Float) -> Self {
        DistantLight {
            dir: direction.normalize(),
            intensity,
            radius: visible_radius,
        }
    }
}

impl Light for DistantLight {
    fn sample_li(&self, _ref_point: &Point3f, u: Point2f) -> Option<LightSampleLi> {
        let frame: Frame = Frame::from_z(&-self.dir);
        let d: Point2f = concentric_sample_disk(&u) * self.radius;
        let wi: Vector3f = (frame.from_local(&Vector3f::new(d.x, d.y, 1.0))).normalize();
        Some(LightSampleLi {
            li: self.intensity,
            wi,
            pdf: 1.0,
            visibility: INFINITY,
            point: Point3f::default(),
            normal: Normal3f::default(),
        })
    }
    fn pdf_li(&self, _ray: &Ray) -> Float {
        0.0
    }
    fn sample_le(&self, _u0: Point2f, _u1: Point2f) -> Option<LightSampleLe> {
        // not connectible from the light side
        None
    }
    fn pdf_le(&self, _ray: &Ray) -> (Float, Float) {
        (0.0, 0.0)
    }
    fn phi(&self) -> Spectrum {
        self.intensity
    }
    fn is_delta(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_and_infinite_visibility() {
        let light = DistantLight::new(Vector3f::new(0.0, -1.0, 0.0), Spectrum::new(2.0), 0.0);
        let ls = light
            .sample_li(&Point3f::default(), Point2f::new(0.5, 0.5))
            .unwrap();
        assert!((ls.wi.y - 1.0).abs() < 1e-5);
        assert_eq!(ls.visibility, INFINITY);
        assert_eq!(ls.pdf, 1.0);
    }
}
