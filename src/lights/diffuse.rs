//! Area lights with diffuse (cosine) emission from a shape.

// std
use std::sync::Arc;
// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{nrm_abs_dot_vec3f, nrm_dot_vec3f, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::light::{Light, LightSampleLe, LightSampleLi};
use crate::core::lumen::{Float, Spectrum, FLOAT_ONE_MINUS_EPSILON, PI, RAY_EPSILON};
use crate::core::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere};
use crate::core::shape::{Shape, ShapeSample};
use crate::core::texture::SpectrumTexture;

pub struct DiffuseAreaLight {
    pub shape: Arc<dyn Shape>,
    pub emission: Arc<dyn SpectrumTexture>,
    pub two_sided: bool,
}

impl DiffuseAreaLight {
    pub fn new(
        shape: Arc<dyn Shape>,
        emission: Arc<dyn SpectrumTexture>,
        two_sided: bool,
    ) -> Self {
        DiffuseAreaLight {
            shape,
            emission,
            two_sided,
        }
    }
    /// Emission toward `w` from a point with the given normal and uv.
    pub fn emitted(&self, normal: &Normal3f, w: &Vector3f, uv: &Point2f) -> Spectrum {
        if self.two_sided || nrm_dot_vec3f(normal, w) > 0.0 as Float {
            self.emission.evaluate(uv)
        } else {
            Spectrum::default()
        }
    }
}

impl Light for DiffuseAreaLight {
    fn sample_li(&self, ref_point: &Point3f, u: Point2f) -> Option<LightSampleLi> {
        let ss: ShapeSample = self.shape.sample_from(ref_point, &u)?;
        let mut wi: Vector3f = ss.point - *ref_point;
        let distance: Float = wi.length();
        if distance == 0.0 as Float || ss.pdf == 0.0 as Float {
            return None;
        }
        wi = wi / distance;
        let li: Spectrum = self.emitted(&ss.normal, &-wi, &ss.uv);
        if li.is_black() {
            return None;
        }
        // orient the returned normal toward the receiver
        let normal: Normal3f = if nrm_dot_vec3f(&ss.normal, &wi) < 0.0 as Float {
            ss.normal
        } else {
            -ss.normal
        };
        Some(LightSampleLi {
            li,
            wi,
            pdf: ss.pdf,
            visibility: distance - RAY_EPSILON,
            point: ss.point,
            normal,
        })
    }
    fn pdf_li(&self, ray: &Ray) -> Float {
        self.shape.pdf_from(ray)
    }
    fn sample_le(&self, u0: Point2f, u1: Point2f) -> Option<LightSampleLe> {
        let ss: ShapeSample = self.shape.sample(&u0);
        let mut normal: Normal3f = ss.normal;
        let mut u1: Point2f = u1;
        let pdf_w: Float;
        // choose the emitting hemisphere
        if self.two_sided {
            if u1.x < 0.5 {
                u1.x = (2.0 as Float * u1.x).min(FLOAT_ONE_MINUS_EPSILON);
            } else {
                u1.x = (2.0 as Float * (u1.x - 0.5)).min(FLOAT_ONE_MINUS_EPSILON);
                normal = -normal;
            }
            let w_local: Vector3f = cosine_sample_hemisphere(&u1);
            pdf_w = 0.5 as Float * cosine_hemisphere_pdf(w_local.z);
            let frame: Frame = Frame::from_z(&Vector3f::from(normal));
            let w: Vector3f = frame.from_local(&w_local);
            if pdf_w == 0.0 as Float {
                return None;
            }
            return Some(LightSampleLe {
                le: self.emission.evaluate(&ss.uv),
                ray: Ray::new(ss.point, w),
                normal,
                pdf_p: ss.pdf,
                pdf_w,
                medium: None,
            });
        }
        let w_local: Vector3f = cosine_sample_hemisphere(&u1);
        pdf_w = cosine_hemisphere_pdf(w_local.z);
        if pdf_w == 0.0 as Float {
            return None;
        }
        let frame: Frame = Frame::from_z(&Vector3f::from(normal));
        let w: Vector3f = frame.from_local(&w_local);
        Some(LightSampleLe {
            le: self.emission.evaluate(&ss.uv),
            ray: Ray::new(ss.point, w),
            normal,
            pdf_p: ss.pdf,
            pdf_w,
            medium: None,
        })
    }
    fn pdf_le(&self, _ray: &Ray) -> (Float, Float) {
        // positions on area lights are queried through pdf_le_at
        (0.0, 0.0)
    }
    fn pdf_le_at(&self, normal: &Normal3f, w: &Vector3f) -> (Float, Float) {
        let pdf_p: Float = self.shape.pdf_area();
        let pdf_w: Float = cosine_hemisphere_pdf(nrm_abs_dot_vec3f(normal, w))
            * if self.two_sided { 0.5 } else { 1.0 };
        (pdf_p, pdf_w)
    }
    fn phi(&self) -> Spectrum {
        self.emission.average()
            * self.shape.area()
            * PI
            * if self.two_sided { 2.0 } else { 1.0 }
    }
    fn is_area(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::sphere::Sphere;
    use crate::textures::ConstantSpectrumTexture;

    fn unit_sphere_light(two_sided: bool) -> DiffuseAreaLight {
        DiffuseAreaLight::new(
            Arc::new(Sphere::new(Point3f::default(), 1.0)),
            Arc::new(ConstantSpectrumTexture::new(Spectrum::new(5.0))),
            two_sided,
        )
    }

    #[test]
    fn test_phi_scales_with_sides() {
        let one = unit_sphere_light(false);
        let two = unit_sphere_light(true);
        assert!((two.phi().c[0] / one.phi().c[0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_sample_li_points_at_sphere() {
        let light = unit_sphere_light(false);
        let ref_point = Point3f::new(0.0, 0.0, 4.0);
        let ls = light.sample_li(&ref_point, Point2f::new(0.4, 0.7)).unwrap();
        assert!(ls.pdf > 0.0);
        // direction goes toward the sphere
        assert!(ls.wi.z < 0.0);
        assert!((ls.li.c[0] - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_sample_le_leaves_surface() {
        let light = unit_sphere_light(false);
        let le = light
            .sample_le(Point2f::new(0.3, 0.6), Point2f::new(0.2, 0.8))
            .unwrap();
        assert!(le.pdf_p > 0.0 && le.pdf_w > 0.0);
        // the ray leaves on the outside of the normal's hemisphere
        assert!(nrm_dot_vec3f(&le.normal, &le.ray.d) > 0.0);
    }
}
