//! Participating media: phase functions, majorant segments, and the
//! null-scattering transmittance driver.

// std
use std::sync::Arc;
// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{vec3_dot_vec3f, Point3f, Ray, Vector3f};
use crate::core::lumen::{Float, Spectrum, INV_4_PI, TWO_PI};
use crate::core::geometry::Point2f;
use crate::core::rng::Rng;
use crate::core::sampling::sample_exponential;
use crate::media::homogeneous::{HomogeneousMajorantIterator, HomogeneousMedium};

/// Henyey-Greenstein phase function value.
pub fn phase_hg(cos_theta: Float, g: Float) -> Float {
    let denom: Float = 1.0 as Float + g * g + 2.0 as Float * g * cos_theta;
    INV_4_PI * (1.0 as Float - g * g) / (denom * denom.max(0.0).sqrt())
}

#[derive(Debug, Default, Copy, Clone)]
pub struct PhaseFunctionSample {
    pub p: Float,
    pub wi: Vector3f,
    pub pdf: Float,
}

/// The Henyey-Greenstein phase function with asymmetry g in (-1, 1).
#[derive(Debug, Default, Copy, Clone)]
pub struct HenyeyGreenstein {
    pub g: Float,
}

impl HenyeyGreenstein {
    pub fn new(g: Float) -> Self {
        HenyeyGreenstein { g }
    }
    pub fn p(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        phase_hg(vec3_dot_vec3f(wo, wi), self.g)
    }
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        self.p(wo, wi)
    }
    pub fn sample_p(&self, wo: &Vector3f, u: &Point2f) -> Option<PhaseFunctionSample> {
        let g: Float = self.g;
        // sample cos(theta) for the HG distribution
        let cos_theta: Float = if g.abs() < 1e-3 {
            1.0 as Float - 2.0 as Float * u.x
        } else {
            let sqr_term: Float =
                (1.0 as Float - g * g) / (1.0 as Float + g - 2.0 as Float * g * u.x);
            -(1.0 as Float + g * g - sqr_term * sqr_term) / (2.0 as Float * g)
        };
        // build the scattered direction around wo
        let sin_theta: Float = (1.0 as Float - cos_theta * cos_theta).max(0.0).sqrt();
        let phi: Float = TWO_PI * u.y;
        let frame: Frame = Frame::from_z(wo);
        let wi: Vector3f = frame.from_local(&Vector3f {
            x: sin_theta * phi.cos(),
            y: sin_theta * phi.sin(),
            z: cos_theta,
        });
        let p: Float = phase_hg(cos_theta, g);
        if p <= 0.0 as Float {
            return None;
        }
        Some(PhaseFunctionSample { p, wi, pdf: p })
    }
}

/// Medium properties at a point.
#[derive(Debug, Default, Copy, Clone)]
pub struct MediumSample {
    pub sigma_a: Spectrum,
    pub sigma_s: Spectrum,
    pub le: Spectrum,
    pub phase: HenyeyGreenstein,
}

/// An interval of the ray with a constant bound on extinction.
#[derive(Debug, Default, Copy, Clone)]
pub struct RayMajorantSegment {
    pub t_min: Float,
    pub t_max: Float,
    pub sigma_maj: Spectrum,
}

pub enum RayMajorantIterator {
    Homogeneous(HomogeneousMajorantIterator),
}

impl RayMajorantIterator {
    pub fn next_segment(&mut self) -> Option<RayMajorantSegment> {
        match self {
            RayMajorantIterator::Homogeneous(it) => it.next_segment(),
        }
    }
}

pub enum Medium {
    Homogeneous(HomogeneousMedium),
}

impl Medium {
    pub fn is_emissive(&self) -> bool {
        match self {
            Medium::Homogeneous(m) => m.is_emissive(),
        }
    }
    pub fn sample_point(&self, p: Point3f) -> MediumSample {
        match self {
            Medium::Homogeneous(m) => m.sample_point(p),
        }
    }
    pub fn sample_ray(&self, ray: &Ray, t_max: Float) -> RayMajorantIterator {
        match self {
            Medium::Homogeneous(m) => RayMajorantIterator::Homogeneous(m.sample_ray(ray, t_max)),
        }
    }
    /// Closed-form distance sampling used by the bidirectional
    /// integrators: returns an optional scattering event and the
    /// throughput weight for the sampled segment.
    pub fn sample_distance(
        &self,
        ray: &Ray,
        t_max: Float,
        u_channel: Float,
        u_dist: Float,
    ) -> (Option<(Float, MediumSample)>, Spectrum) {
        match self {
            Medium::Homogeneous(m) => m.sample_distance(ray, t_max, u_channel, u_dist),
        }
    }
    /// Analytic transmittance over [0, t_max] (homogeneous media only
    /// need Beer's law).
    pub fn tr(&self, t_max: Float) -> Spectrum {
        match self {
            Medium::Homogeneous(m) => m.tr(t_max),
        }
    }
    pub fn phase(&self) -> HenyeyGreenstein {
        match self {
            Medium::Homogeneous(m) => m.phase,
        }
    }
}

/// Which medium lies on either side of a surface.
#[derive(Default, Clone)]
pub struct MediumInterface {
    pub inside: Option<Arc<Medium>>,
    pub outside: Option<Arc<Medium>>,
}

impl MediumInterface {
    pub fn new(inside: Option<Arc<Medium>>, outside: Option<Arc<Medium>>) -> Self {
        MediumInterface { inside, outside }
    }
    pub fn uniform(medium: Arc<Medium>) -> Self {
        MediumInterface {
            inside: Some(medium.clone()),
            outside: Some(medium),
        }
    }
    pub fn is_transition(&self) -> bool {
        match (&self.inside, &self.outside) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        }
    }
}

/// Walk a ray through a medium's majorant segments, invoking the
/// callback at each sampled null/real collision until it asks to stop
/// or the segment range [0, t_max] is exhausted. Returns the majorant
/// transmittance beyond the last visited collision.
pub fn sample_majorant_transmittance<F>(
    medium: &Medium,
    wavelength: usize,
    ray: &Ray,
    t_max: Float,
    u: Float,
    rng: &mut Rng,
    mut callback: F,
) -> Spectrum
where
    F: FnMut(Point3f, MediumSample, Spectrum, Spectrum) -> bool,
{
    let mut u: Float = u;
    let mut t_maj: Spectrum = Spectrum::new(1.0);
    let mut iter: RayMajorantIterator = medium.sample_ray(ray, t_max);
    while let Some(seg) = iter.next_segment() {
        let sigma_maj: Spectrum = seg.sigma_maj;
        if sigma_maj.c[wavelength] == 0.0 as Float {
            let dt: Float = seg.t_max - seg.t_min;
            t_maj *= (sigma_maj * -dt).exp();
            continue;
        }
        let mut t_min: Float = seg.t_min;
        loop {
            let t: Float = t_min + sample_exponential(u, sigma_maj.c[wavelength]);
            u = rng.uniform_float();
            if t < seg.t_max {
                t_maj *= (sigma_maj * -(t - t_min)).exp();
                let ms: MediumSample = medium.sample_point(ray.position(t));
                if !callback(ray.position(t), ms, sigma_maj, t_maj) {
                    // the callback terminated the walk
                    return Spectrum::new(1.0);
                }
                t_maj = Spectrum::new(1.0);
                t_min = t;
            } else {
                t_maj *= (sigma_maj * -(seg.t_max - t_min)).exp();
                break;
            }
        }
    }
    t_maj
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_hg_normalized() {
        // integral of p over the sphere should be 1
        for g in &[-0.5, 0.0, 0.7] {
            let n: usize = 4096;
            let mut sum: Float = 0.0;
            for i in 0..n {
                let cos_theta: Float = -1.0 + 2.0 * (i as Float + 0.5) / n as Float;
                sum += phase_hg(cos_theta, *g) * TWO_PI * (2.0 / n as Float);
            }
            assert!((sum - 1.0).abs() < 1e-2, "g={} integral {}", g, sum);
        }
    }

    #[test]
    fn test_hg_sample_pdf_equals_p() {
        let hg = HenyeyGreenstein::new(0.4);
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let ps = hg.sample_p(&wo, &Point2f::new(0.3, 0.8)).unwrap();
        assert!((ps.p - ps.pdf).abs() < 1e-7);
        assert!((ps.p - hg.p(&wo, &ps.wi)).abs() < 1e-5);
    }

    #[test]
    fn test_hg_isotropic_limit() {
        let p: Float = phase_hg(0.3, 0.0);
        assert!((p - INV_4_PI).abs() < 1e-7);
    }
}
