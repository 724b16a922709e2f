//! Draw random samples from a chosen probability distribution.

// std
use std::sync::Arc;
// lumen
use crate::core::geometry::{Point2f, Vector2f, Vector3f, XYEnum};
use crate::core::lumen::{clamp_t, find_interval, Float};
use crate::core::lumen::{
    FLOAT_ONE_MINUS_EPSILON, INV_2_PI, INV_4_PI, INV_PI, PI_OVER_2, PI_OVER_4, TWO_PI,
};

#[derive(Debug, Default, Clone)]
pub struct Distribution1D {
    pub func: Vec<Float>,
    pub cdf: Vec<Float>,
    pub func_int: Float,
}

impl Distribution1D {
    pub fn new(f: Vec<Float>) -> Self {
        let n: usize = f.len();
        // compute integral of step function at $x_i$
        let mut cdf: Vec<Float> = Vec::with_capacity(n + 1);
        cdf.push(0.0 as Float);
        for i in 1..=n {
            let previous: Float = cdf[i - 1];
            cdf.push(previous + f[i - 1] / n as Float);
        }
        // transform step function integral into CDF
        let func_int: Float = cdf[n];
        if func_int == 0.0 as Float {
            for (i, item) in cdf.iter_mut().enumerate().skip(1).take(n) {
                *item = i as Float / n as Float;
            }
        } else {
            for item in cdf.iter_mut().skip(1).take(n) {
                *item /= func_int;
            }
        }
        Distribution1D {
            func: f,
            cdf,
            func_int,
        }
    }
    pub fn count(&self) -> usize {
        self.func.len()
    }
    pub fn sample_continuous(
        &self,
        u: Float,
        pdf: Option<&mut Float>,
        off: Option<&mut usize>,
    ) -> Float {
        // find surrounding CDF segments and _offset_
        let offset: usize = find_interval(self.cdf.len(), |index| self.cdf[index] <= u);
        if let Some(off_ref) = off {
            *off_ref = offset;
        }
        // compute offset along CDF segment
        let mut du: Float = u - self.cdf[offset];
        if (self.cdf[offset + 1] - self.cdf[offset]) > 0.0 as Float {
            du /= self.cdf[offset + 1] - self.cdf[offset];
        }
        // compute PDF for sampled offset
        if let Some(value) = pdf {
            if self.func_int > 0.0 as Float {
                *value = self.func[offset] / self.func_int;
            } else {
                *value = 0.0;
            }
        }
        // return $x\in{}[0,1)$ corresponding to sample
        (offset as Float + du) / self.count() as Float
    }
    pub fn sample_discrete(&self, u: Float, pdf: Option<&mut Float>) -> usize {
        let offset: usize = find_interval(self.cdf.len(), |index| self.cdf[index] <= u);
        if let Some(value) = pdf {
            if self.func_int > 0.0 as Float {
                *value = self.func[offset] / (self.func_int * self.func.len() as Float);
            } else {
                *value = 0.0;
            }
        }
        offset
    }
    pub fn discrete_pdf(&self, index: usize) -> Float {
        assert!(index < self.func.len());
        self.func[index] / (self.func_int * self.func.len() as Float)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Distribution2D {
    pub p_conditional_v: Vec<Arc<Distribution1D>>,
    pub p_marginal: Arc<Distribution1D>,
}

impl Distribution2D {
    pub fn new(func: Vec<Float>, nu: i32, nv: i32) -> Self {
        let mut p_conditional_v: Vec<Arc<Distribution1D>> = Vec::with_capacity(nv as usize);
        for v in 0..nv {
            // compute conditional sampling distribution for $\tilde{v}$
            let f: Vec<Float> = func[(v * nu) as usize..((v + 1) * nu) as usize].to_vec();
            p_conditional_v.push(Arc::new(Distribution1D::new(f)));
        }
        // compute marginal sampling distribution $p[\tilde{v}]$
        let mut marginal_func: Vec<Float> = Vec::with_capacity(nv as usize);
        for v in 0..nv {
            marginal_func.push(p_conditional_v[v as usize].func_int);
        }
        let p_marginal: Arc<Distribution1D> = Arc::new(Distribution1D::new(marginal_func));
        Distribution2D {
            p_conditional_v,
            p_marginal,
        }
    }
    pub fn sample_continuous(&self, u: Point2f, pdf: &mut Float) -> Point2f {
        let mut pdfs: [Float; 2] = [0.0 as Float; 2];
        let mut v: usize = 0_usize;
        let d1: Float =
            self.p_marginal
                .sample_continuous(u[XYEnum::Y], Some(&mut (pdfs[1])), Some(&mut v));
        let d0: Float =
            self.p_conditional_v[v].sample_continuous(u[XYEnum::X], Some(&mut (pdfs[0])), None);
        *pdf = pdfs[0] * pdfs[1];
        Point2f { x: d0, y: d1 }
    }
    pub fn pdf(&self, p: Point2f) -> Float {
        let iu: usize = clamp_t(
            (p[XYEnum::X] * self.p_conditional_v[0].count() as Float) as usize,
            0_usize,
            self.p_conditional_v[0].count() - 1_usize,
        );
        let iv: usize = clamp_t(
            (p[XYEnum::Y] * self.p_marginal.count() as Float) as usize,
            0_usize,
            self.p_marginal.count() - 1_usize,
        );
        self.p_conditional_v[iv].func[iu] / self.p_marginal.func_int
    }
}

/// Cosine-weighted hemisphere sampling using Malley's method.
pub fn cosine_sample_hemisphere(u: &Point2f) -> Vector3f {
    let d: Point2f = concentric_sample_disk(u);
    let z: Float = (0.0 as Float)
        .max(1.0 as Float - d.x * d.x - d.y * d.y)
        .sqrt();
    Vector3f { x: d.x, y: d.y, z }
}

/// Returns a weight of cos_theta / PI.
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

/// Veach's balance heuristic.
pub fn balance_heuristic(nf: u8, f_pdf: Float, ng: u8, g_pdf: Float) -> Float {
    let f: Float = nf as Float * f_pdf;
    let g: Float = ng as Float * g_pdf;
    f / (f + g)
}

/// Veach's power heuristic with beta = 2.
pub fn power_heuristic(nf: u8, f_pdf: Float, ng: u8, g_pdf: Float) -> Float {
    let f: Float = nf as Float * f_pdf;
    let g: Float = ng as Float * g_pdf;
    (f * f) / (f * f + g * g)
}

/// Uniformly sample rays in a hemisphere. Choose a direction.
pub fn uniform_sample_hemisphere(u: &Point2f) -> Vector3f {
    let z: Float = u[XYEnum::X];
    let r: Float = (0.0 as Float).max(1.0 as Float - z * z).sqrt();
    let phi: Float = TWO_PI * u[XYEnum::Y];
    Vector3f {
        x: r * phi.cos(),
        y: r * phi.sin(),
        z,
    }
}

pub fn uniform_hemisphere_pdf() -> Float {
    INV_2_PI
}

/// Uniformly sample rays in a full sphere. Choose a direction.
pub fn uniform_sample_sphere(u: Point2f) -> Vector3f {
    let z: Float = 1.0 as Float - 2.0 as Float * u[XYEnum::X];
    let r: Float = (0.0 as Float).max(1.0 as Float - z * z).sqrt();
    let phi: Float = TWO_PI * u[XYEnum::Y];
    Vector3f {
        x: r * phi.cos(),
        y: r * phi.sin(),
        z,
    }
}

pub fn uniform_sphere_pdf() -> Float {
    INV_4_PI
}

/// Uniformly distribute samples over a unit disk.
pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    // map uniform random numbers to $[-1,1]^2$
    let u_offset: Point2f = *u * 2.0 as Float - Vector2f { x: 1.0, y: 1.0 };
    // handle degeneracy at the origin
    if u_offset.x == 0.0 as Float && u_offset.y == 0.0 as Float {
        return Point2f::default();
    }
    // apply concentric mapping to point
    let theta: Float;
    let r: Float;
    if u_offset.x.abs() > u_offset.y.abs() {
        r = u_offset.x;
        theta = PI_OVER_4 * (u_offset.y / u_offset.x);
    } else {
        r = u_offset.y;
        theta = PI_OVER_2 - PI_OVER_4 * (u_offset.x / u_offset.y);
    }
    Point2f {
        x: theta.cos(),
        y: theta.sin(),
    } * r
}

pub fn uniform_cone_pdf(cos_theta_max: Float) -> Float {
    1.0 as Float / (TWO_PI * (1.0 as Float - cos_theta_max))
}

/// Samples in a cone of directions about the (0, 0, 1) axis.
pub fn uniform_sample_cone(u: Point2f, cos_theta_max: Float) -> Vector3f {
    let cos_theta: Float = (1.0 as Float - u[XYEnum::X]) + u[XYEnum::X] * cos_theta_max;
    let sin_theta: Float = (1.0 as Float - cos_theta * cos_theta).sqrt();
    let phi: Float = u[XYEnum::Y] * TWO_PI;
    Vector3f {
        x: phi.cos() * sin_theta,
        y: phi.sin() * sin_theta,
        z: cos_theta,
    }
}

/// Uniformly distributing samples over isosceles right triangles
/// actually works for any triangle.
pub fn uniform_sample_triangle(u: &Point2f) -> Point2f {
    let su0: Float = u[XYEnum::X].sqrt();
    Point2f {
        x: 1.0 as Float - su0,
        y: u[XYEnum::Y] * su0,
    }
}

/// Sample t in [0, inf) with density a * exp(-a t).
pub fn sample_exponential(u: Float, a: Float) -> Float {
    -(1.0 as Float - u).ln() / a
}

pub fn exponential_pdf(t: Float, a: Float) -> Float {
    a * (-a * t).exp()
}

/// Normalized Gaussian evaluated at x.
pub fn gaussian(x: Float, mu: Float, sigma: Float) -> Float {
    1.0 as Float / (TWO_PI * sigma * sigma).sqrt()
        * (-((x - mu) * (x - mu)) / (2.0 as Float * sigma * sigma)).exp()
}

/// Map one uniform sample to a stratum of a discrete choice and remap
/// the sample for reuse.
pub fn remap_u(u: Float, p_lo: Float) -> Float {
    ((u - p_lo) / (1.0 as Float - p_lo)).min(FLOAT_ONE_MINUS_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_1d_inversion() {
        let d: Distribution1D = Distribution1D::new(vec![1.0, 3.0]);
        // ~1/4 of the mass lies in the first half
        let mut pdf: Float = 0.0;
        let x: Float = d.sample_continuous(0.125, Some(&mut pdf), None);
        assert!(x < 0.5);
        assert!((pdf - 0.5).abs() < 1e-5);
        let x: Float = d.sample_continuous(0.75, Some(&mut pdf), None);
        assert!(x > 0.5);
        assert!((pdf - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_distribution_1d_discrete_pmf_sums_to_one() {
        let d: Distribution1D = Distribution1D::new(vec![0.5, 1.0, 2.5]);
        let sum: Float = (0..3).map(|i| d.discrete_pdf(i)).sum();
        assert!((sum - 1.0).abs() < 1e-5);
        let mut pmf: Float = 0.0;
        let i: usize = d.sample_discrete(0.99, Some(&mut pmf));
        assert_eq!(i, 2);
        assert!((pmf - 2.5 / 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_distribution_2d_pdf_normalized() {
        let func: Vec<Float> = vec![1.0, 2.0, 3.0, 4.0];
        let d: Distribution2D = Distribution2D::new(func, 2, 2);
        // integrate pdf over the 4 cells
        let mut sum: Float = 0.0;
        for v in 0..2 {
            for u in 0..2 {
                let p = Point2f::new((u as Float + 0.5) / 2.0, (v as Float + 0.5) / 2.0);
                sum += d.pdf(p) * 0.25;
            }
        }
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_hemisphere_upper() {
        for i in 0..64 {
            let u = Point2f::new((i as Float + 0.5) / 64.0, ((i * 7 % 64) as Float + 0.5) / 64.0);
            let w: Vector3f = cosine_sample_hemisphere(&u);
            assert!(w.z >= 0.0);
            assert!((w.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_heuristics() {
        assert!((balance_heuristic(1, 1.0, 1, 3.0) - 0.25).abs() < 1e-6);
        assert!((power_heuristic(1, 1.0, 1, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_concentric_disk_in_unit_disk() {
        for i in 0..32 {
            let u = Point2f::new((i as Float + 0.5) / 32.0, ((i * 11 % 32) as Float + 0.5) / 32.0);
            let d: Point2f = concentric_sample_disk(&u);
            assert!(d.x * d.x + d.y * d.y <= 1.0 + 1e-5);
        }
    }
}
