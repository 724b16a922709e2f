//! Microfacet distributions: anisotropic Trowbridge-Reitz (GGX) with
//! visible-normal sampling, and the Charlie distribution used for sheen.

// lumen
use crate::core::geometry::{vec3_abs_dot_vec3f, vec3_cross_vec3, Point2f, Vector3f};
use crate::core::lumen::{clamp_t, lerp, sqr, Float, INV_2_PI, PI};
use crate::core::sampling::concentric_sample_disk;
use crate::core::scattering::sheen_directional_albedo;

pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}

pub fn cos_2_theta(w: &Vector3f) -> Float {
    w.z * w.z
}

pub fn abs_cos_theta(w: &Vector3f) -> Float {
    w.z.abs()
}

pub fn sin_2_theta(w: &Vector3f) -> Float {
    (0.0 as Float).max(1.0 as Float - cos_2_theta(w))
}

pub fn sin_theta(w: &Vector3f) -> Float {
    sin_2_theta(w).sqrt()
}

pub fn tan_theta(w: &Vector3f) -> Float {
    sin_theta(w) / cos_theta(w)
}

pub fn tan_2_theta(w: &Vector3f) -> Float {
    sin_2_theta(w) / cos_2_theta(w)
}

pub fn cos_phi(w: &Vector3f) -> Float {
    let sin_theta: Float = sin_theta(w);
    if sin_theta == 0.0 as Float {
        1.0
    } else {
        clamp_t(w.x / sin_theta, -1.0, 1.0)
    }
}

pub fn sin_phi(w: &Vector3f) -> Float {
    let sin_theta: Float = sin_theta(w);
    if sin_theta == 0.0 as Float {
        0.0
    } else {
        clamp_t(w.y / sin_theta, -1.0, 1.0)
    }
}

/// Trowbridge-Reitz (GGX) distribution with per-axis roughness.
#[derive(Debug, Copy, Clone)]
pub struct TrowbridgeReitzDistribution {
    pub alpha_x: Float,
    pub alpha_y: Float,
}

impl TrowbridgeReitzDistribution {
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        TrowbridgeReitzDistribution {
            alpha_x: alpha_x.max(1e-4),
            alpha_y: alpha_y.max(1e-4),
        }
    }
    /// Perceptually linear roughness to alpha.
    pub fn roughness_to_alpha(roughness: Float) -> Float {
        roughness * roughness
    }
    /// Distributions this smooth are handled as perfect speculars.
    pub fn effectively_smooth(&self) -> bool {
        self.alpha_x.max(self.alpha_y) < 1e-3
    }
    pub fn d(&self, wm: &Vector3f) -> Float {
        let tan_2_theta: Float = tan_2_theta(wm);
        if tan_2_theta.is_infinite() {
            return 0.0;
        }
        let cos_4_theta: Float = sqr(cos_2_theta(wm));
        if cos_4_theta < 1e-16 {
            return 0.0;
        }
        let e: Float =
            tan_2_theta * (sqr(cos_phi(wm) / self.alpha_x) + sqr(sin_phi(wm) / self.alpha_y));
        1.0 as Float / (PI * self.alpha_x * self.alpha_y * cos_4_theta * sqr(1.0 as Float + e))
    }
    pub fn lambda(&self, w: &Vector3f) -> Float {
        let tan_2_theta: Float = tan_2_theta(w);
        if tan_2_theta.is_infinite() {
            return 0.0;
        }
        let alpha_2: Float = sqr(cos_phi(w) * self.alpha_x) + sqr(sin_phi(w) * self.alpha_y);
        ((1.0 as Float + alpha_2 * tan_2_theta).sqrt() - 1.0 as Float) / 2.0 as Float
    }
    pub fn g1(&self, w: &Vector3f) -> Float {
        1.0 as Float / (1.0 as Float + self.lambda(w))
    }
    pub fn g(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        1.0 as Float / (1.0 as Float + self.lambda(wo) + self.lambda(wi))
    }
    /// Sample a visible microfacet normal: stretch to the isotropic
    /// configuration, build a basis around the stretched direction,
    /// sample the projected hemisphere, and unstretch.
    pub fn sample_wm(&self, wo: &Vector3f, u: &Point2f) -> Vector3f {
        let mut wh: Vector3f = Vector3f {
            x: self.alpha_x * wo.x,
            y: self.alpha_y * wo.y,
            z: wo.z,
        }
        .normalize();
        if wh.z < 0.0 as Float {
            wh = -wh;
        }
        let t1: Vector3f = if wh.z < 0.999 {
            vec3_cross_vec3(&Vector3f::new(0.0, 0.0, 1.0), &wh).normalize()
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };
        let t2: Vector3f = vec3_cross_vec3(&wh, &t1);
        // sample the hemisphere weighted by its marginal along wh
        let mut p: Point2f = concentric_sample_disk(u);
        let h: Float = (1.0 as Float - sqr(p.x)).sqrt();
        p.y = lerp((1.0 as Float + wh.z) / 2.0 as Float, h, p.y);
        let pz: Float = (0.0 as Float)
            .max(1.0 as Float - p.x * p.x - p.y * p.y)
            .sqrt();
        let nh: Vector3f = t1 * p.x + t2 * p.y + wh * pz;
        Vector3f {
            x: self.alpha_x * nh.x,
            y: self.alpha_y * nh.y,
            z: nh.z.max(1e-6),
        }
        .normalize()
    }
    /// Density of `sample_wm` per solid angle of the half vector.
    pub fn pdf(&self, wo: &Vector3f, wm: &Vector3f) -> Float {
        self.g1(wo) / abs_cos_theta(wo) * self.d(wm) * vec3_abs_dot_vec3f(wo, wm)
    }
    /// Widen near-specular distributions to tame fireflies on paths
    /// found via specular chains.
    pub fn regularize(&mut self) {
        if self.alpha_x < 0.3 {
            self.alpha_x = clamp_t(2.0 * self.alpha_x, 0.1, 0.3);
        }
        if self.alpha_y < 0.3 {
            self.alpha_y = clamp_t(2.0 * self.alpha_y, 0.1, 0.3);
        }
    }
}

/// Charlie sheen distribution (Estevez & Kulla) with the Ashikhmin
/// shadowing fit.
#[derive(Debug, Copy, Clone)]
pub struct CharlieSheenDistribution {
    pub alpha: Float,
}

impl CharlieSheenDistribution {
    pub fn new(alpha: Float) -> Self {
        CharlieSheenDistribution {
            alpha: clamp_t(alpha, 1e-3, 1.0),
        }
    }
    pub fn d(&self, wm: &Vector3f) -> Float {
        let inv_alpha: Float = 1.0 as Float / self.alpha;
        let sin_2_theta: Float = sin_2_theta(wm);
        (2.0 as Float + inv_alpha) * sin_2_theta.powf(inv_alpha * 0.5) * INV_2_PI
    }
    fn l(&self, x: Float) -> Float {
        // interpolate fit coefficients in (1 - alpha)^2
        let t: Float = sqr(1.0 as Float - self.alpha);
        let a: Float = lerp(t, 25.3245, 21.5473);
        let b: Float = lerp(t, 3.32435, 3.82987);
        let c: Float = lerp(t, 0.16801, 0.19823);
        let d: Float = lerp(t, -1.27393, -1.97760);
        let e: Float = lerp(t, -4.85967, -4.32054);
        a / (1.0 as Float + b * x.powf(c)) + d * x + e
    }
    pub fn lambda(&self, w: &Vector3f) -> Float {
        let cos_theta: Float = abs_cos_theta(w);
        if cos_theta < 0.5 {
            self.l(cos_theta).exp()
        } else {
            (2.0 as Float * self.l(0.5) - self.l(1.0 as Float - cos_theta)).exp()
        }
    }
    pub fn g(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        1.0 as Float / (1.0 as Float + self.lambda(wo) + self.lambda(wi))
    }
    /// Directional albedo of the sheen lobe, from the startup table.
    pub fn e(&self, wo: &Vector3f) -> Float {
        sheen_directional_albedo(abs_cos_theta(wo), self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::vec3_dot_vec3f;
    use crate::core::rng::Rng;

    #[test]
    fn test_ggx_d_integrates_to_projected_area() {
        // integral of D(wm) cos(theta) over the hemisphere should be 1
        let mf = TrowbridgeReitzDistribution::new(0.25, 0.25);
        let n_theta: usize = 256;
        let n_phi: usize = 64;
        let mut sum: Float = 0.0;
        for i in 0..n_theta {
            let theta: Float = (i as Float + 0.5) / n_theta as Float * PI / 2.0;
            for j in 0..n_phi {
                let phi: Float = (j as Float + 0.5) / n_phi as Float * 2.0 * PI;
                let wm = Vector3f::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                sum += mf.d(&wm) * theta.cos() * theta.sin();
            }
        }
        sum *= (PI / 2.0 / n_theta as Float) * (2.0 * PI / n_phi as Float);
        assert!((sum - 1.0).abs() < 1e-2, "integral = {}", sum);
    }

    #[test]
    fn test_sample_wm_pdf_consistency() {
        let mf = TrowbridgeReitzDistribution::new(0.3, 0.15);
        let wo = Vector3f::new(0.3, -0.2, 0.9).normalize();
        let mut rng = Rng::new(5, 11);
        for _ in 0..128 {
            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let wm = mf.sample_wm(&wo, &u);
            assert!(wm.z > 0.0);
            assert!(mf.pdf(&wo, &wm) > 0.0);
            assert!(vec3_dot_vec3f(&wo, &wm) > 0.0);
        }
    }

    #[test]
    fn test_smooth_threshold() {
        assert!(TrowbridgeReitzDistribution::new(1e-4, 1e-4).effectively_smooth());
        assert!(!TrowbridgeReitzDistribution::new(0.01, 0.01).effectively_smooth());
    }

    #[test]
    fn test_regularize_widens() {
        let mut mf = TrowbridgeReitzDistribution::new(0.01, 0.5);
        mf.regularize();
        assert!(mf.alpha_x >= 0.1 && mf.alpha_x <= 0.3);
        assert_eq!(mf.alpha_y, 0.5);
    }

    #[test]
    fn test_charlie_d_nonnegative() {
        let mf = CharlieSheenDistribution::new(0.3);
        let wm = Vector3f::new(0.5, 0.0, 0.866);
        assert!(mf.d(&wm) >= 0.0);
        assert!(mf.g(&Vector3f::new(0.0, 0.0, 1.0), &wm) <= 1.0);
    }
}
