//! A medium with constant scattering properties everywhere inside it.

// lumen
use crate::core::geometry::Ray;
use crate::core::geometry::Point3f;
use crate::core::lumen::{clamp_t, Float, Spectrum};
use crate::core::medium::{HenyeyGreenstein, MediumSample, RayMajorantSegment};

pub struct HomogeneousMedium {
    pub sigma_a: Spectrum,
    pub sigma_s: Spectrum,
    pub le: Spectrum,
    pub phase: HenyeyGreenstein,
}

impl HomogeneousMedium {
    pub fn new(sigma_a: Spectrum, sigma_s: Spectrum, le: Spectrum, g: Float) -> Self {
        HomogeneousMedium {
            sigma_a,
            sigma_s,
            le,
            phase: HenyeyGreenstein::new(g),
        }
    }
    pub fn is_emissive(&self) -> bool {
        !self.le.is_black()
    }
    pub fn sample_point(&self, _p: Point3f) -> MediumSample {
        MediumSample {
            sigma_a: self.sigma_a,
            sigma_s: self.sigma_s,
            le: self.le,
            phase: self.phase,
        }
    }
    pub fn sample_ray(&self, _ray: &Ray, t_max: Float) -> HomogeneousMajorantIterator {
        HomogeneousMajorantIterator {
            segment: Some(RayMajorantSegment {
                t_min: 0.0,
                t_max,
                sigma_maj: self.sigma_a + self.sigma_s,
            }),
        }
    }
    pub fn tr(&self, t_max: Float) -> Spectrum {
        let sigma_t: Spectrum = self.sigma_a + self.sigma_s;
        (sigma_t * -t_max).exp()
    }
    /// Closed-form distance sampling with a uniformly chosen channel;
    /// the returned weight folds sigma_s and the sampling pdf in.
    pub fn sample_distance(
        &self,
        _ray: &Ray,
        t_max: Float,
        u_channel: Float,
        u_dist: Float,
    ) -> (Option<(Float, MediumSample)>, Spectrum) {
        let sigma_t: Spectrum = self.sigma_a + self.sigma_s;
        let channel: usize = clamp_t((u_channel * 3.0) as usize, 0, 2);
        if sigma_t.c[channel] == 0.0 as Float {
            return (None, Spectrum::new(1.0));
        }
        let dist: Float = -(1.0 as Float - u_dist).ln() / sigma_t.c[channel];
        let t: Float = dist.min(t_max);
        let sampled_medium: bool = t < t_max;
        let tr: Spectrum = (sigma_t * -t).exp();
        // pdf averaged over the channel choice
        if sampled_medium {
            let density: Spectrum = sigma_t * tr;
            let pdf: Float = density.average().max(1e-20);
            let weight: Spectrum = tr * self.sigma_s / pdf;
            (
                Some((
                    t,
                    MediumSample {
                        sigma_a: self.sigma_a,
                        sigma_s: self.sigma_s,
                        le: self.le,
                        phase: self.phase,
                    },
                )),
                weight,
            )
        } else {
            let pdf: Float = tr.average().max(1e-20);
            (None, tr / pdf)
        }
    }
}

pub struct HomogeneousMajorantIterator {
    segment: Option<RayMajorantSegment>,
}

impl HomogeneousMajorantIterator {
    pub fn next_segment(&mut self) -> Option<RayMajorantSegment> {
        self.segment.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Point3f, Vector3f};

    #[test]
    fn test_single_majorant_segment() {
        let m = HomogeneousMedium::new(Spectrum::new(0.1), Spectrum::new(0.4), Spectrum::default(), 0.0);
        let ray = Ray::new(Point3f::default(), Vector3f::new(0.0, 0.0, 1.0));
        let mut it = m.sample_ray(&ray, 5.0);
        let seg = it.next_segment().unwrap();
        assert_eq!(seg.t_min, 0.0);
        assert_eq!(seg.t_max, 5.0);
        assert!((seg.sigma_maj.c[0] - 0.5).abs() < 1e-6);
        assert!(it.next_segment().is_none());
    }

    #[test]
    fn test_distance_sampling_is_unbiased_for_tr() {
        // E[weight * indicator(pass-through)] approximates Tr
        let m = HomogeneousMedium::new(Spectrum::new(0.2), Spectrum::new(0.3), Spectrum::default(), 0.0);
        let ray = Ray::new(Point3f::default(), Vector3f::new(0.0, 0.0, 1.0));
        let t_max: Float = 2.0;
        let n: usize = 8192;
        let mut sum: Float = 0.0;
        use crate::core::rng::Rng;
        let mut rng = Rng::new(11, 2);
        for _ in 0..n {
            let (hit, w) = m.sample_distance(&ray, t_max, rng.uniform_float(), rng.uniform_float());
            if hit.is_none() {
                sum += w.c[0];
            }
        }
        let estimate: Float = sum / n as Float;
        let expected: Float = (-0.5 * t_max as Float).exp();
        // surviving-path estimator carries weight Tr/pdf, so the mean
        // over all trials recovers Tr
        assert!((estimate - expected).abs() < 0.05, "{} vs {}", estimate, expected);
    }
}
