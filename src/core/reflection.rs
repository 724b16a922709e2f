//! When light is incident on a surface it scatters; the BxDF types
//! here describe the directional distribution of that scattering. All
//! directions are in the reflection coordinate system where the
//! shading normal is +z.

// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{
    vec3_abs_dot_vec3f, vec3_dot_vec3f, vec3_same_hemisphere_vec3, Normal3f, Point2f, Vector3f,
};
use crate::core::layered::LayeredBxdf;
use crate::core::lumen::{clamp_t, lerp, sqr, Float, Spectrum, INV_PI, PI, TWO_PI};
use crate::core::material::TransportDirection;
use crate::core::microfacet::{
    abs_cos_theta, cos_theta, CharlieSheenDistribution, TrowbridgeReitzDistribution,
};
use crate::core::sampling::{
    cosine_hemisphere_pdf, cosine_sample_hemisphere, uniform_hemisphere_pdf,
    uniform_sample_hemisphere,
};
use crate::core::scattering::{
    conductor_average_albedo, conductor_directional_albedo, dielectric_average_albedo,
    dielectric_directional_albedo, fr_complex, fr_conductor_average, fr_dielectric, fr_schlick,
    fresnel_moment1, reflect, refract,
};
use crate::core::spectrum::spectrum_lerp;

pub const BXDF_UNSET: u8 = 0;
pub const BXDF_REFLECTION: u8 = 1 << 0;
pub const BXDF_TRANSMISSION: u8 = 1 << 1;
pub const BXDF_DIFFUSE: u8 = 1 << 2;
pub const BXDF_GLOSSY: u8 = 1 << 3;
pub const BXDF_SPECULAR: u8 = 1 << 4;
pub const BXDF_DIFFUSE_REFLECTION: u8 = BXDF_DIFFUSE | BXDF_REFLECTION;
pub const BXDF_DIFFUSE_TRANSMISSION: u8 = BXDF_DIFFUSE | BXDF_TRANSMISSION;
pub const BXDF_GLOSSY_REFLECTION: u8 = BXDF_GLOSSY | BXDF_REFLECTION;
pub const BXDF_GLOSSY_TRANSMISSION: u8 = BXDF_GLOSSY | BXDF_TRANSMISSION;
pub const BXDF_SPECULAR_REFLECTION: u8 = BXDF_SPECULAR | BXDF_REFLECTION;
pub const BXDF_SPECULAR_TRANSMISSION: u8 = BXDF_SPECULAR | BXDF_TRANSMISSION;
pub const BXDF_ALL: u8 =
    BXDF_REFLECTION | BXDF_TRANSMISSION | BXDF_DIFFUSE | BXDF_GLOSSY | BXDF_SPECULAR;

/// Sampling restriction mask over the two hemispheres.
pub const SAMPLE_REFLECTION: u8 = 1 << 0;
pub const SAMPLE_TRANSMISSION: u8 = 1 << 1;
pub const SAMPLE_ALL: u8 = SAMPLE_REFLECTION | SAMPLE_TRANSMISSION;

pub fn is_reflective(flags: u8) -> bool {
    flags & BXDF_REFLECTION != 0
}

pub fn is_transmissive(flags: u8) -> bool {
    flags & BXDF_TRANSMISSION != 0
}

pub fn is_diffuse(flags: u8) -> bool {
    flags & BXDF_DIFFUSE != 0
}

pub fn is_glossy(flags: u8) -> bool {
    flags & BXDF_GLOSSY != 0
}

pub fn is_specular(flags: u8) -> bool {
    flags & BXDF_SPECULAR != 0
}

pub fn is_non_specular(flags: u8) -> bool {
    flags & (BXDF_DIFFUSE | BXDF_GLOSSY) != 0
}

#[derive(Debug, Default, Copy, Clone)]
pub struct BsdfSample {
    pub f: Spectrum,
    pub wi: Vector3f,
    pub pdf: Float,
    pub flags: u8,
    /// Relative index of refraction crossed by this sample.
    pub eta: Float,
    /// True when `pdf` is only proportional to the real density (the
    /// layered lobe's stochastic estimate).
    pub pdf_is_proportional: bool,
}

impl BsdfSample {
    pub fn new(f: Spectrum, wi: Vector3f, pdf: Float, flags: u8) -> Self {
        BsdfSample {
            f,
            wi,
            pdf,
            flags,
            eta: 1.0,
            pdf_is_proportional: false,
        }
    }
    pub fn new_with_eta(f: Spectrum, wi: Vector3f, pdf: Float, flags: u8, eta: Float) -> Self {
        BsdfSample {
            f,
            wi,
            pdf,
            flags,
            eta,
            pdf_is_proportional: false,
        }
    }
    pub fn is_reflection(&self) -> bool {
        is_reflective(self.flags)
    }
    pub fn is_transmission(&self) -> bool {
        is_transmissive(self.flags)
    }
    pub fn is_specular(&self) -> bool {
        is_specular(self.flags)
    }
    pub fn is_diffuse(&self) -> bool {
        is_diffuse(self.flags)
    }
    pub fn is_glossy(&self) -> bool {
        is_glossy(self.flags)
    }
}

// ------------------------------------------------------------------
// Lambertian
// ------------------------------------------------------------------

#[derive(Debug, Default, Copy, Clone)]
pub struct LambertianBxdf {
    pub r: Spectrum,
}

impl LambertianBxdf {
    pub fn new(reflectance: Spectrum) -> Self {
        LambertianBxdf { r: reflectance }
    }
    pub fn flags(&self) -> u8 {
        if self.r.is_black() {
            BXDF_UNSET
        } else {
            BXDF_DIFFUSE_REFLECTION
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, _direction: TransportDirection) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        self.r * INV_PI
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Float {
        if flags & SAMPLE_REFLECTION == 0 || !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0;
        }
        cosine_hemisphere_pdf(abs_cos_theta(wi))
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        _u0: Float,
        u12: &Point2f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if flags & SAMPLE_REFLECTION == 0 {
            return None;
        }
        let mut wi: Vector3f = cosine_sample_hemisphere(u12);
        let pdf: Float = cosine_hemisphere_pdf(cos_theta(&wi));
        if wo.z < 0.0 as Float {
            wi.z = -wi.z;
        }
        if pdf == 0.0 as Float {
            return None;
        }
        Some(BsdfSample::new(
            self.r * INV_PI,
            wi,
            pdf,
            BXDF_DIFFUSE_REFLECTION,
        ))
    }
}

// ------------------------------------------------------------------
// Energy-preserving Oren-Nayar (EON)
// ------------------------------------------------------------------

const CONSTANT1_FON: Float = 0.5 - 2.0 / (3.0 * PI);
const CONSTANT2_FON: Float = 2.0 / 3.0 - 28.0 / (15.0 * PI);

fn e_fon_exact(mu: Float, r: Float) -> Float {
    let af: Float = 1.0 as Float / (1.0 as Float + CONSTANT1_FON * r);
    let bf: Float = r * af;
    let si: Float = (1.0 as Float - mu * mu).max(0.0).sqrt();
    let g: Float = si * (mu.acos() - si * mu)
        + (2.0 as Float / 3.0 as Float) * ((si / mu) * (1.0 as Float - si * si * si) - si);
    af + (bf * INV_PI) * g
}

fn ltc_coeffs(mu: Float, r: Float) -> (Float, Float, Float, Float) {
    let a: Float =
        1.0 + r * (0.303392 + (-0.518982 + 0.111709 * mu) * mu + (-0.276266 + 0.335918 * mu) * r);
    let b: Float =
        r * (-1.16407 + 1.15859 * mu + (0.150815 - 0.150105 * mu) * r) / (mu * mu * mu - 1.43545);
    let c: Float = 1.0 + (0.20013 + (-0.506373 + 0.261777 * mu) * mu) * r;
    let d: Float =
        ((0.540852 + (-1.01625 + 0.475392 * mu) * mu) * r) / (-1.0743 + mu * (0.0725628 + mu));
    (a, b, c, d)
}

/// Basis whose x axis lies under the outgoing direction; the CLTC lobe
/// is expressed in it.
fn orthonormal_basis_ltc(w: &Vector3f) -> (Vector3f, Vector3f, Vector3f) {
    let len_sqr: Float = w.x * w.x + w.y * w.y;
    let x: Vector3f = if len_sqr > 0.0 as Float {
        Vector3f::new(w.x, w.y, 0.0) * (1.0 as Float / len_sqr.sqrt())
    } else {
        Vector3f::new(1.0, 0.0, 0.0)
    };
    let y: Vector3f = Vector3f::new(-x.y, x.x, 0.0);
    (x, y, Vector3f::new(0.0, 0.0, 1.0))
}

fn cltc_sample(wo: &Vector3f, r: Float, u1: Float, u2: Float) -> (Vector3f, Float) {
    let (a, b, c, d) = ltc_coeffs(wo.z, r);
    let big_r: Float = u1.sqrt();
    let phi: Float = TWO_PI * u2;
    let mut x: Float = big_r * phi.cos();
    let y: Float = big_r * phi.sin();
    let vz: Float = 1.0 as Float / (d * d + 1.0 as Float).sqrt();
    let s: Float = 0.5 as Float * (1.0 as Float + vz);
    x = -lerp(s, (1.0 as Float - y * y).sqrt(), x);
    let wh: Vector3f = Vector3f::new(x, y, (1.0 as Float - (x * x + y * y)).max(0.0).sqrt());
    let pdf_wh: Float = wh.z / (PI * s);
    let wi: Vector3f = Vector3f::new(a * wh.x + b * wh.z, c * wh.y, d * wh.x + wh.z);
    let len: Float = wi.length();
    let det_m: Float = c * (a - b * d);
    let pdf_wi: Float = pdf_wh * len * len * len / det_m;
    let (bx, by, bz) = orthonormal_basis_ltc(wo);
    let wi_world: Vector3f = (bx * wi.x + by * wi.y + bz * wi.z).normalize();
    (wi_world, pdf_wi)
}

fn cltc_pdf(wo_local: &Vector3f, wi_local: &Vector3f, r: Float) -> Float {
    let (bx, by, bz) = orthonormal_basis_ltc(wo_local);
    // rows of the transpose
    let wi: Vector3f = Vector3f::new(
        vec3_dot_vec3f(&bx, wi_local),
        vec3_dot_vec3f(&by, wi_local),
        vec3_dot_vec3f(&bz, wi_local),
    );
    let (a, b, c, d) = ltc_coeffs(wo_local.z, r);
    let det_m: Float = c * (a - b * d);
    let wh: Vector3f = Vector3f::new(
        c * (wi.x - b * wi.z),
        (a - b * d) * wi.y,
        -c * (d * wi.x - a * wi.z),
    );
    let len_sqr: Float = vec3_dot_vec3f(&wh, &wh);
    if len_sqr == 0.0 as Float {
        return 0.0;
    }
    let vz: Float = 1.0 as Float / (d * d + 1.0 as Float).sqrt();
    let s: Float = 0.5 as Float * (1.0 as Float + vz);
    det_m * det_m / (len_sqr * len_sqr) * wh.z.max(0.0) / (PI * s)
}

fn eon_uniform_lobe_prob(wo: &Vector3f, r: Float) -> Float {
    let mu: Float = wo.z;
    r.powf(0.1) * (0.162925 + mu * (-0.372058 + (0.538233 - 0.290822 * mu) * mu))
}

/// Energy-preserving Oren-Nayar with the fitted multi-scatter term and
/// CLTC importance sampling.
#[derive(Debug, Copy, Clone)]
pub struct EonBxdf {
    pub rho: Spectrum,
    pub r: Float,
}

impl EonBxdf {
    pub fn new(rho: Spectrum, roughness: Float) -> Self {
        EonBxdf {
            rho,
            r: clamp_t(roughness, 0.0, 1.0),
        }
    }
    pub fn flags(&self) -> u8 {
        if self.rho.is_black() {
            BXDF_UNSET
        } else {
            BXDF_DIFFUSE_REFLECTION
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, _direction: TransportDirection) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        let mu_i: Float = wi.z.abs();
        let mu_o: Float = wo.z.abs();
        let s: Float = vec3_dot_vec3f(wi, wo) - mu_i * mu_o;
        let sovertf: Float = if s > 0.0 as Float {
            s / mu_i.max(mu_o)
        } else {
            s
        };
        let af: Float = 1.0 as Float / (1.0 as Float + CONSTANT1_FON * self.r);
        let f_ss: Spectrum = (self.rho * INV_PI) * (af * (1.0 as Float + self.r * sovertf));
        let ef_o: Float = e_fon_exact(mu_o, self.r);
        let ef_i: Float = e_fon_exact(mu_i, self.r);
        let avg_ef: Float = af * (1.0 as Float + CONSTANT2_FON * self.r);
        let rho_ms: Spectrum = (self.rho * self.rho) * avg_ef
            / (Spectrum::new(1.0) - self.rho * (1.0 as Float - avg_ef));
        let eps: Float = 1.0e-7;
        let f_ms: Spectrum = (rho_ms * INV_PI)
            * (eps.max(1.0 as Float - ef_o) * eps.max(1.0 as Float - ef_i)
                / eps.max(1.0 as Float - avg_ef));
        f_ss + f_ms
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Float {
        if flags & SAMPLE_REFLECTION == 0 || !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0;
        }
        let p_u: Float = eon_uniform_lobe_prob(wo, self.r);
        let p_c: Float = 1.0 as Float - p_u;
        let pdf_c: Float = cltc_pdf(wo, wi, self.r);
        p_u * uniform_hemisphere_pdf() + p_c * pdf_c
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        u12: &Point2f,
        direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if flags & SAMPLE_REFLECTION == 0 {
            return None;
        }
        let p_u: Float = eon_uniform_lobe_prob(wo, self.r);
        let p_c: Float = 1.0 as Float - p_u;
        let wi: Vector3f;
        let pdf_c: Float;
        if u0 <= p_u {
            wi = uniform_sample_hemisphere(u12);
            pdf_c = cltc_pdf(wo, &wi, self.r);
        } else {
            let (wi_c, pdf) = cltc_sample(wo, self.r, u12.x, u12.y);
            wi = wi_c;
            pdf_c = pdf;
        }
        let pdf: Float = p_u * uniform_hemisphere_pdf() + p_c * pdf_c;
        if pdf <= 0.0 as Float || wi.z == 0.0 as Float {
            return None;
        }
        Some(BsdfSample::new(
            self.f(wo, &wi, direction),
            wi,
            pdf,
            BXDF_DIFFUSE_REFLECTION,
        ))
    }
}

// ------------------------------------------------------------------
// Perfect specular reflection
// ------------------------------------------------------------------

#[derive(Debug, Default, Copy, Clone)]
pub struct SpecularReflectionBxdf {
    pub r: Spectrum,
}

impl SpecularReflectionBxdf {
    pub fn new(reflectance: Spectrum) -> Self {
        SpecularReflectionBxdf { r: reflectance }
    }
    pub fn flags(&self) -> u8 {
        if self.r.is_black() {
            BXDF_UNSET
        } else {
            BXDF_SPECULAR_REFLECTION
        }
    }
    pub fn f(&self, _wo: &Vector3f, _wi: &Vector3f, _direction: TransportDirection) -> Spectrum {
        Spectrum::default()
    }
    pub fn pdf(
        &self,
        _wo: &Vector3f,
        _wi: &Vector3f,
        _direction: TransportDirection,
        _flags: u8,
    ) -> Float {
        0.0
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        _u0: Float,
        _u12: &Point2f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if flags & SAMPLE_REFLECTION == 0 {
            return None;
        }
        let wi: Vector3f = Vector3f::new(-wo.x, -wo.y, wo.z);
        Some(BsdfSample::new(
            self.r / abs_cos_theta(&wi),
            wi,
            1.0,
            BXDF_SPECULAR_REFLECTION,
        ))
    }
}

// ------------------------------------------------------------------
// Dielectric (smooth, rough, and multi-scattering compensated)
// ------------------------------------------------------------------

#[derive(Debug, Copy, Clone)]
pub struct DielectricBxdf {
    pub eta: Float,
    /// Tint applied to transmitted paths, stored as its square root so
    /// a two-interface traversal multiplies to the requested color.
    pub r: Spectrum,
    pub mf: TrowbridgeReitzDistribution,
    pub ms: bool,
}

impl DielectricBxdf {
    pub fn new(eta: Float, r: Spectrum, mf: TrowbridgeReitzDistribution, ms: bool) -> Self {
        DielectricBxdf {
            eta,
            r: r.sqrt(),
            mf,
            ms,
        }
    }
    pub fn flags(&self) -> u8 {
        let flags: u8 = if self.eta == 1.0 as Float {
            BXDF_TRANSMISSION
        } else {
            BXDF_REFLECTION | BXDF_TRANSMISSION
        };
        flags
            | if self.mf.effectively_smooth() {
                BXDF_SPECULAR
            } else {
                BXDF_GLOSSY
            }
    }
    pub fn regularize(&mut self) {
        self.mf.regularize();
    }
    fn e(&self, w: &Vector3f, eta_o: Float) -> Float {
        let alpha: Float = (self.mf.alpha_x * self.mf.alpha_y).sqrt();
        dielectric_directional_albedo(self.eta, eta_o, abs_cos_theta(w), alpha)
    }
    fn e_avg(&self, eta_o: Float) -> Float {
        let alpha: Float = (self.mf.alpha_x * self.mf.alpha_y).sqrt();
        dielectric_average_albedo(self.eta, eta_o, alpha)
    }
    /// Fraction of multiply-scattered energy that leaves back through
    /// the entry side.
    fn scattering_ratio(&self, eta_o: Float) -> Float {
        let e_avg: Float = clamp_t(self.e_avg(eta_o), 1e-4, 1.0 - 1e-4);
        // cosine-weighted average Fresnel
        let n: i32 = 16;
        let mut f_avg: Float = 0.0;
        for i in 0..n {
            let mu: Float = (i as Float + 0.5) / n as Float;
            f_avg += fr_dielectric(mu, eta_o) * mu;
        }
        f_avg *= 2.0 as Float / n as Float;
        clamp_t(
            f_avg * e_avg / (1.0 as Float - f_avg * (1.0 as Float - e_avg)),
            0.0,
            1.0,
        )
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, direction: TransportDirection) -> Spectrum {
        if self.eta == 1.0 as Float || self.mf.effectively_smooth() {
            return Spectrum::default();
        }
        // evaluate rough dielectric BSDF
        let cos_theta_o: Float = cos_theta(wo);
        let cos_theta_i: Float = cos_theta(wi);
        let reflect_case: bool = cos_theta_i * cos_theta_o > 0.0 as Float;
        let mut eta_p: Float = 1.0;
        if !reflect_case {
            // flip interface
            eta_p = if cos_theta_o > 0.0 as Float {
                self.eta
            } else {
                1.0 as Float / self.eta
            };
        }
        let eta_o: Float = if cos_theta_o > 0.0 as Float {
            self.eta
        } else {
            1.0 as Float / self.eta
        };
        let eta_i: Float = 1.0 as Float / eta_o;
        let mut wm: Vector3f = *wi * eta_p + *wo;
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float || wm.length_squared() == 0.0
        {
            return Spectrum::default();
        }
        wm = wm.normalize();
        if wm.z < 0.0 as Float {
            wm = -wm;
        }
        // discard backfacing microfacets
        if vec3_dot_vec3f(&wm, wi) * cos_theta_i < 0.0 as Float
            || vec3_dot_vec3f(&wm, wo) * cos_theta_o < 0.0 as Float
        {
            return Spectrum::default();
        }
        let fr: Float = fr_dielectric(vec3_dot_vec3f(wo, &wm), self.eta);
        if reflect_case {
            let fr_ss: Float = self.mf.d(&wm) * self.mf.g(wo, wi) * fr
                / (4.0 as Float * cos_theta_i * cos_theta_o).abs();
            if !self.ms {
                return Spectrum::new(fr_ss);
            }
            let ratio: Float = self.scattering_ratio(eta_o);
            let fr_ms: Float = ratio
                * (1.0 as Float - self.e(wi, eta_o))
                * (1.0 as Float - self.e(wo, eta_o))
                / (PI * (1.0 as Float - self.e_avg(eta_o))).max(1e-4);
            Spectrum::new(fr_ss + fr_ms)
        } else {
            let denom: Float = sqr(vec3_dot_vec3f(wi, &wm) + vec3_dot_vec3f(wo, &wm) / eta_p)
                * cos_theta_i
                * cos_theta_o;
            let mut ft_ss: Float = self.mf.d(&wm)
                * (1.0 as Float - fr)
                * self.mf.g(wo, wi)
                * (vec3_dot_vec3f(wi, &wm) * vec3_dot_vec3f(wo, &wm) / denom).abs();
            if !self.ms {
                // handle solid angle squeezing
                if direction == TransportDirection::ToLight {
                    ft_ss /= sqr(eta_p);
                }
                return self.r * ft_ss;
            }
            let ratio: Float = self.scattering_ratio(eta_o);
            let mut ft_ms: Float = (1.0 as Float - ratio)
                * (1.0 as Float - self.e(wi, eta_i))
                * (1.0 as Float - self.e(wo, eta_o))
                / (PI * (1.0 as Float - self.e_avg(eta_i))).max(1e-4);
            if direction == TransportDirection::ToLight {
                ft_ss /= sqr(eta_p);
            } else {
                ft_ms *= sqr(eta_p);
            }
            self.r * (ft_ss + ft_ms)
        }
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Float {
        if self.eta == 1.0 as Float || self.mf.effectively_smooth() {
            return 0.0;
        }
        // compute generalized half vector wm
        let cos_theta_o: Float = cos_theta(wo);
        let cos_theta_i: Float = cos_theta(wi);
        let reflect_case: bool = cos_theta_i * cos_theta_o > 0.0 as Float;
        let mut eta_p: Float = 1.0;
        if !reflect_case {
            eta_p = if cos_theta_o > 0.0 as Float {
                self.eta
            } else {
                1.0 as Float / self.eta
            };
        }
        let eta_o: Float = if cos_theta_o > 0.0 as Float {
            self.eta
        } else {
            1.0 as Float / self.eta
        };
        let mut wm: Vector3f = *wi * eta_p + *wo;
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float || wm.length_squared() == 0.0
        {
            return 0.0;
        }
        wm = wm.normalize();
        if wm.z < 0.0 as Float {
            wm = -wm;
        }
        if vec3_dot_vec3f(&wm, wi) * cos_theta_i < 0.0 as Float
            || vec3_dot_vec3f(&wm, wo) * cos_theta_o < 0.0 as Float
        {
            return 0.0;
        }
        let r: Float = fr_dielectric(vec3_dot_vec3f(wo, &wm), self.eta);
        let t: Float = 1.0 as Float - r;
        let mut pr_ss: Float = r;
        let mut pt_ss: Float = t;
        if flags & SAMPLE_REFLECTION == 0 {
            pr_ss = 0.0;
        }
        if flags & SAMPLE_TRANSMISSION == 0 {
            pt_ss = 0.0;
        }
        if pr_ss == 0.0 && pt_ss == 0.0 {
            return 0.0;
        }
        let p_ss_sum: Float = pr_ss + pt_ss;
        let pdf_ss: Float = if reflect_case {
            self.mf.pdf(wo, &wm) / (4.0 as Float * vec3_abs_dot_vec3f(wo, &wm)) * pr_ss / p_ss_sum
        } else {
            let dwm_dwi: Float = vec3_abs_dot_vec3f(wi, &wm)
                / sqr(vec3_dot_vec3f(wi, &wm) + vec3_dot_vec3f(wo, &wm) / eta_p);
            self.mf.pdf(wo, &wm) * dwm_dwi * pt_ss / p_ss_sum
        };
        if !self.ms {
            return pdf_ss;
        }
        let ratio: Float = self.scattering_ratio(eta_o);
        let mut pr_ms: Float = ratio;
        let mut pt_ms: Float = 1.0 as Float - ratio;
        if flags & SAMPLE_REFLECTION == 0 {
            pr_ms = 0.0;
        }
        if flags & SAMPLE_TRANSMISSION == 0 {
            pt_ms = 0.0;
        }
        let e_o: Float = clamp_t(self.e(wo, eta_o), 1e-4, 1.0 - 1e-4);
        let p_ms_sum: Float = (pr_ms + pt_ms).max(1e-6);
        let pdf_ms: Float = if reflect_case {
            pr_ms / p_ms_sum * cosine_hemisphere_pdf(abs_cos_theta(wi))
        } else {
            pt_ms / p_ms_sum * cosine_hemisphere_pdf(abs_cos_theta(wi))
        };
        lerp(e_o, pdf_ms, pdf_ss)
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        u12: &Point2f,
        direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if self.eta == 1.0 as Float || self.mf.effectively_smooth() {
            // sample perfect specular dielectric BSDF
            let r: Float = fr_dielectric(cos_theta(wo), self.eta);
            let t: Float = 1.0 as Float - r;
            let mut pr: Float = r;
            let mut pt: Float = t;
            if flags & SAMPLE_REFLECTION == 0 {
                pr = 0.0;
            }
            if flags & SAMPLE_TRANSMISSION == 0 {
                pt = 0.0;
            }
            if pr == 0.0 && pt == 0.0 {
                return None;
            }
            if u0 < pr / (pr + pt) {
                let wi: Vector3f = Vector3f::new(-wo.x, -wo.y, wo.z);
                let fr: Spectrum = Spectrum::new(r / abs_cos_theta(&wi));
                return Some(BsdfSample::new(
                    fr,
                    wi,
                    pr / (pr + pt),
                    BXDF_SPECULAR_REFLECTION,
                ));
            } else {
                let (wi, eta_p) = refract(wo, &Vector3f::new(0.0, 0.0, 1.0), self.eta)?;
                let mut ft: Spectrum = self.r * (t / abs_cos_theta(&wi));
                // handle solid angle squeezing
                if direction == TransportDirection::ToLight {
                    ft /= sqr(eta_p);
                }
                return Some(BsdfSample::new_with_eta(
                    ft,
                    wi,
                    pt / (pr + pt),
                    BXDF_SPECULAR_TRANSMISSION,
                    eta_p,
                ));
            }
        }
        if wo.z == 0.0 as Float {
            return None;
        }
        let eta_o: Float = if cos_theta(wo) > 0.0 as Float {
            self.eta
        } else {
            1.0 as Float / self.eta
        };
        let e_o: Float = if self.ms {
            clamp_t(self.e(wo, eta_o), 1e-4, 1.0 - 1e-4)
        } else {
            1.0
        };
        let (wi, flag, eta) = if u0 < e_o {
            // sample the single-scattering lobe
            let u0: Float = u0 / e_o;
            let wm: Vector3f = self.mf.sample_wm(wo, u12);
            let r: Float = fr_dielectric(vec3_dot_vec3f(wo, &wm), self.eta);
            let t: Float = 1.0 as Float - r;
            let mut pr: Float = r;
            let mut pt: Float = t;
            if flags & SAMPLE_REFLECTION == 0 {
                pr = 0.0;
            }
            if flags & SAMPLE_TRANSMISSION == 0 {
                pt = 0.0;
            }
            if pr == 0.0 && pt == 0.0 {
                return None;
            }
            if u0 < pr / (pr + pt) {
                let wi: Vector3f = reflect(wo, &wm);
                if !vec3_same_hemisphere_vec3(wo, &wi) {
                    return None;
                }
                (wi, BXDF_GLOSSY_REFLECTION, 1.0)
            } else {
                let (wi, eta_p) = refract(wo, &wm, self.eta)?;
                if vec3_same_hemisphere_vec3(wo, &wi) || wi.z == 0.0 as Float {
                    return None;
                }
                (wi, BXDF_GLOSSY_TRANSMISSION, eta_p)
            }
        } else {
            // sample the multi-scattering lobe
            let ratio: Float = self.scattering_ratio(eta_o);
            let mut pr_ms: Float = ratio;
            let mut pt_ms: Float = 1.0 as Float - ratio;
            if flags & SAMPLE_REFLECTION == 0 {
                pr_ms = 0.0;
            }
            if flags & SAMPLE_TRANSMISSION == 0 {
                pt_ms = 0.0;
            }
            if pr_ms == 0.0 && pt_ms == 0.0 {
                return None;
            }
            let u0: Float = (u0 - e_o) / (1.0 as Float - e_o);
            let mut wi: Vector3f = cosine_sample_hemisphere(u12);
            if u0 < pr_ms / (pr_ms + pt_ms) {
                if cos_theta(wo) < 0.0 as Float {
                    wi = -wi;
                }
                (wi, BXDF_DIFFUSE_REFLECTION, 1.0)
            } else {
                if cos_theta(wo) > 0.0 as Float {
                    wi = -wi;
                }
                (wi, BXDF_DIFFUSE_TRANSMISSION, eta_o)
            }
        };
        let f: Spectrum = self.f(wo, &wi, direction);
        let pdf: Float = self.pdf(wo, &wi, direction, flags);
        if pdf <= 0.0 as Float || f.is_black() {
            return None;
        }
        Some(BsdfSample::new_with_eta(f, wi, pdf, flag, eta))
    }
}

// ------------------------------------------------------------------
// Conductor
// ------------------------------------------------------------------

#[derive(Debug, Copy, Clone)]
pub struct ConductorBxdf {
    pub mf: TrowbridgeReitzDistribution,
    pub eta: Spectrum,
    pub k: Spectrum,
    pub ms: bool,
}

impl ConductorBxdf {
    pub fn new(eta: Spectrum, k: Spectrum, mf: TrowbridgeReitzDistribution, ms: bool) -> Self {
        ConductorBxdf { mf, eta, k, ms }
    }
    pub fn flags(&self) -> u8 {
        if self.mf.effectively_smooth() {
            BXDF_SPECULAR_REFLECTION
        } else {
            BXDF_GLOSSY_REFLECTION
        }
    }
    pub fn regularize(&mut self) {
        self.mf.regularize();
    }
    fn f0_key(&self) -> Float {
        fr_complex(1.0, self.eta, self.k).average()
    }
    fn e(&self, w: &Vector3f) -> Float {
        let alpha: Float = (self.mf.alpha_x * self.mf.alpha_y).sqrt();
        conductor_directional_albedo(self.f0_key(), abs_cos_theta(w), alpha)
    }
    fn e_avg(&self) -> Float {
        let alpha: Float = (self.mf.alpha_x * self.mf.alpha_y).sqrt();
        conductor_average_albedo(self.f0_key(), alpha)
    }
    fn f_ms(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        let e_avg: Float = clamp_t(self.e_avg(), 1e-4, 1.0 - 1e-4);
        let fresnel_avg: Spectrum = fr_conductor_average(self.eta, self.k);
        let fresnel_ms: Spectrum = fresnel_avg * fresnel_avg * e_avg
            / (Spectrum::new(1.0) - fresnel_avg * (1.0 as Float - e_avg));
        fresnel_ms * ((1.0 as Float - self.e(wo)) * (1.0 as Float - self.e(wi)))
            / (PI * (1.0 as Float - e_avg))
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, _direction: TransportDirection) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) || self.mf.effectively_smooth() {
            return Spectrum::default();
        }
        let cos_theta_o: Float = abs_cos_theta(wo);
        let cos_theta_i: Float = abs_cos_theta(wi);
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float {
            return Spectrum::default();
        }
        let mut wm: Vector3f = *wo + *wi;
        if wm.length_squared() == 0.0 as Float {
            return Spectrum::default();
        }
        wm = wm.normalize();
        let fr: Spectrum = fr_complex(vec3_abs_dot_vec3f(wo, &wm), self.eta, self.k);
        let f_ss: Spectrum =
            fr * self.mf.d(&wm) * self.mf.g(wo, wi) / (4.0 as Float * cos_theta_i * cos_theta_o);
        if self.ms {
            f_ss + self.f_ms(wo, wi)
        } else {
            f_ss
        }
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Float {
        if flags & SAMPLE_REFLECTION == 0 {
            return 0.0;
        }
        if !vec3_same_hemisphere_vec3(wo, wi) || self.mf.effectively_smooth() {
            return 0.0;
        }
        let mut wm: Vector3f = *wo + *wi;
        if wm.length_squared() == 0.0 as Float {
            return 0.0;
        }
        wm = wm.normalize();
        if wm.z < 0.0 as Float {
            wm = -wm;
        }
        let pdf_ss: Float = self.mf.pdf(wo, &wm) / (4.0 as Float * vec3_abs_dot_vec3f(wo, &wm));
        if !self.ms {
            return pdf_ss;
        }
        let pdf_ms: Float = cosine_hemisphere_pdf(abs_cos_theta(wi));
        lerp(self.e(wo), pdf_ms, pdf_ss)
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        u12: &Point2f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if flags & SAMPLE_REFLECTION == 0 {
            return None;
        }
        if self.mf.effectively_smooth() {
            // sample perfect specular conductor BRDF
            let wi: Vector3f = Vector3f::new(-wo.x, -wo.y, wo.z);
            let f: Spectrum = fr_complex(abs_cos_theta(&wi), self.eta, self.k) / abs_cos_theta(&wi);
            return Some(BsdfSample::new(f, wi, 1.0, BXDF_SPECULAR_REFLECTION));
        }
        if wo.z == 0.0 as Float {
            return None;
        }
        let (wm, wi, flag) = if !self.ms || u0 < self.e(wo) {
            let wm: Vector3f = self.mf.sample_wm(wo, u12);
            let wi: Vector3f = reflect(wo, &wm);
            (wm, wi, BXDF_GLOSSY_REFLECTION)
        } else {
            // sample the multi-scattering lobe
            let mut wi: Vector3f = cosine_sample_hemisphere(u12);
            if wo.z < 0.0 as Float {
                wi = -wi;
            }
            let wm: Vector3f = (*wo + wi).normalize();
            (wm, wi, BXDF_DIFFUSE_REFLECTION)
        };
        if !vec3_same_hemisphere_vec3(wo, &wi) {
            return None;
        }
        let cos_theta_o: Float = abs_cos_theta(wo);
        let cos_theta_i: Float = abs_cos_theta(&wi);
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float {
            return None;
        }
        let fr: Spectrum = fr_complex(vec3_abs_dot_vec3f(wo, &wm), self.eta, self.k);
        let mut f: Spectrum =
            fr * self.mf.d(&wm) * self.mf.g(wo, &wi) / (4.0 as Float * cos_theta_i * cos_theta_o);
        let pdf_ss: Float = self.mf.pdf(wo, &wm) / (4.0 as Float * vec3_abs_dot_vec3f(wo, &wm));
        let pdf: Float = if self.ms {
            f += self.f_ms(wo, &wi);
            lerp(self.e(wo), cosine_hemisphere_pdf(cos_theta_i), pdf_ss)
        } else {
            pdf_ss
        };
        if pdf <= 0.0 as Float {
            return None;
        }
        Some(BsdfSample::new(f, wi, pdf, flag))
    }
}

// ------------------------------------------------------------------
// Thin dielectric
// ------------------------------------------------------------------

#[derive(Debug, Default, Copy, Clone)]
pub struct ThinDielectricBxdf {
    pub eta: Float,
}

impl ThinDielectricBxdf {
    pub fn new(eta: Float) -> Self {
        ThinDielectricBxdf { eta }
    }
    pub fn flags(&self) -> u8 {
        BXDF_SPECULAR | BXDF_REFLECTION | BXDF_TRANSMISSION
    }
    pub fn f(&self, _wo: &Vector3f, _wi: &Vector3f, _direction: TransportDirection) -> Spectrum {
        Spectrum::default()
    }
    pub fn pdf(
        &self,
        _wo: &Vector3f,
        _wi: &Vector3f,
        _direction: TransportDirection,
        _flags: u8,
    ) -> Float {
        0.0
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        _u12: &Point2f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        let mut r: Float = fr_dielectric(abs_cos_theta(wo), self.eta);
        let mut t: Float = 1.0 as Float - r;
        // account for the second interface with the closed-form series
        if r < 1.0 as Float {
            r += sqr(t) * r / (1.0 as Float - sqr(r));
            t = 1.0 as Float - r;
        }
        let mut pr: Float = r;
        let mut pt: Float = t;
        if flags & SAMPLE_REFLECTION == 0 {
            pr = 0.0;
        }
        if flags & SAMPLE_TRANSMISSION == 0 {
            pt = 0.0;
        }
        if pr == 0.0 && pt == 0.0 {
            return None;
        }
        if u0 < pr / (pr + pt) {
            let wi: Vector3f = Vector3f::new(-wo.x, -wo.y, wo.z);
            let fr: Spectrum = Spectrum::new(r / abs_cos_theta(&wi));
            Some(BsdfSample::new(
                fr,
                wi,
                pr / (pr + pt),
                BXDF_SPECULAR_REFLECTION,
            ))
        } else {
            // transmission passes straight through a thin slab
            let wi: Vector3f = -(*wo);
            let ft: Spectrum = Spectrum::new(t / abs_cos_theta(&wi));
            Some(BsdfSample::new(
                ft,
                wi,
                pt / (pr + pt),
                BXDF_SPECULAR_TRANSMISSION,
            ))
        }
    }
}

// ------------------------------------------------------------------
// Metallic-roughness
// ------------------------------------------------------------------

pub const DEFAULT_DIELECTRIC_IOR: Float = 1.5;

#[derive(Debug, Copy, Clone)]
pub struct MetallicRoughnessBxdf {
    pub color: Spectrum,
    pub metallic: Float,
    pub mf: TrowbridgeReitzDistribution,
}

impl MetallicRoughnessBxdf {
    pub fn new(color: Spectrum, metallic: Float, mf: TrowbridgeReitzDistribution) -> Self {
        MetallicRoughnessBxdf {
            color,
            metallic,
            mf,
        }
    }
    pub fn f0(color: Spectrum, metallic: Float) -> Spectrum {
        spectrum_lerp(metallic, &Spectrum::new(0.04), &color)
    }
    pub fn flags(&self) -> u8 {
        BXDF_DIFFUSE | BXDF_GLOSSY | BXDF_REFLECTION
    }
    pub fn regularize(&mut self) {
        self.mf.regularize();
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, _direction: TransportDirection) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        let cos_theta_o: Float = abs_cos_theta(wo);
        let cos_theta_i: Float = abs_cos_theta(wi);
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float {
            return Spectrum::default();
        }
        let mut wm: Vector3f = *wo + *wi;
        if wm.length_squared() == 0.0 as Float {
            return Spectrum::default();
        }
        wm = wm.normalize();
        let f0: Spectrum = MetallicRoughnessBxdf::f0(self.color, self.metallic);
        let fr: Spectrum = fr_schlick(f0, vec3_dot_vec3f(wi, &wm));
        let f_s: Spectrum =
            fr * self.mf.d(&wm) * self.mf.g(wo, wi) / (4.0 as Float * cos_theta_i * cos_theta_o);
        let f_d: Spectrum =
            (Spectrum::new(1.0) - fr) * (self.color * INV_PI) * (1.0 as Float - self.metallic);
        f_d + f_s
    }
    fn lobe_probs(&self, wo: &Vector3f, wm: &Vector3f) -> Option<(Float, Float)> {
        let r: Float = fr_dielectric(vec3_dot_vec3f(wo, wm), DEFAULT_DIELECTRIC_IOR);
        let t: Float = 1.0 as Float - r;
        let pr: Float = r;
        let pt: Float = t * (1.0 as Float - self.metallic);
        if pr == 0.0 && pt == 0.0 {
            return None;
        }
        let p_sum: Float = pr + pt;
        Some((pr / p_sum, pt / p_sum))
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Float {
        if flags & SAMPLE_REFLECTION == 0 {
            return 0.0;
        }
        if !vec3_same_hemisphere_vec3(wo, wi) || self.mf.effectively_smooth() {
            return 0.0;
        }
        let mut wm: Vector3f = *wo + *wi;
        if wm.length_squared() == 0.0 as Float {
            return 0.0;
        }
        wm = wm.normalize();
        if wm.z < 0.0 as Float {
            wm = -wm;
        }
        if let Some((pr, pt)) = self.lobe_probs(wo, &wm) {
            let pdf_r: Float = self.mf.pdf(wo, &wm) / (4.0 as Float * vec3_abs_dot_vec3f(wo, &wm));
            let pdf_d: Float = abs_cos_theta(wi) * INV_PI;
            pr * pdf_r + pt * pdf_d
        } else {
            0.0
        }
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        u12: &Point2f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if flags & SAMPLE_REFLECTION == 0 {
            return None;
        }
        if wo.z == 0.0 as Float {
            return None;
        }
        // sample half vector
        let mut wm: Vector3f = self.mf.sample_wm(wo, u12);
        let mut wi: Vector3f = reflect(wo, &wm);
        let (pr, pt) = self.lobe_probs(wo, &wm)?;
        let flag: u8;
        if u0 < pr {
            // sample glossy reflection
            if !vec3_same_hemisphere_vec3(wo, &wi) {
                return None;
            }
            flag = BXDF_GLOSSY_REFLECTION;
        } else {
            // sample diffuse reflection
            wi = cosine_sample_hemisphere(u12);
            if wo.z < 0.0 as Float {
                wi = -wi;
            }
            wm = (wi + *wo).normalize();
            flag = BXDF_DIFFUSE_REFLECTION;
        }
        let cos_theta_o: Float = abs_cos_theta(wo);
        let cos_theta_i: Float = abs_cos_theta(&wi);
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float {
            return None;
        }
        let f0: Spectrum = MetallicRoughnessBxdf::f0(self.color, self.metallic);
        let fr: Spectrum = fr_schlick(f0, vec3_dot_vec3f(&wi, &wm));
        let f_r: Spectrum =
            fr * self.mf.d(&wm) * self.mf.g(wo, &wi) / (4.0 as Float * cos_theta_i * cos_theta_o);
        let f_d: Spectrum =
            (Spectrum::new(1.0) - fr) * (self.color * INV_PI) * (1.0 as Float - self.metallic);
        let pdf_r: Float = self.mf.pdf(wo, &wm) / (4.0 as Float * vec3_abs_dot_vec3f(wo, &wm));
        let pdf_d: Float = cos_theta_i * INV_PI;
        let pdf: Float = pr * pdf_r + pt * pdf_d;
        if pdf <= 0.0 as Float {
            return None;
        }
        Some(BsdfSample::new(f_r + f_d, wi, pdf, flag))
    }
}

// ------------------------------------------------------------------
// Principled
// ------------------------------------------------------------------

#[derive(Debug, Copy, Clone)]
pub struct PrincipledBxdf {
    pub color: Spectrum,
    pub metallic: Float,
    pub mf: TrowbridgeReitzDistribution,
    pub eta: Float,
    pub transmission: Float,
    pub clearcoat: Float,
    pub mf_clearcoat: TrowbridgeReitzDistribution,
    pub clearcoat_color: Spectrum,
    pub sheen: Float,
    pub mf_sheen: CharlieSheenDistribution,
    pub sheen_color: Spectrum,
}

impl PrincipledBxdf {
    pub fn flags(&self) -> u8 {
        BXDF_DIFFUSE | BXDF_GLOSSY | BXDF_REFLECTION | BXDF_TRANSMISSION
    }
    pub fn regularize(&mut self) {
        self.mf.regularize();
        self.mf_clearcoat.regularize();
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, direction: TransportDirection) -> Spectrum {
        let cos_theta_o: Float = cos_theta(wo);
        let cos_theta_i: Float = cos_theta(wi);
        let reflect_case: bool = cos_theta_i * cos_theta_o > 0.0 as Float;
        let mut eta_p: Float = 1.0;
        if !reflect_case {
            eta_p = if cos_theta_o > 0.0 as Float {
                self.eta
            } else {
                1.0 as Float / self.eta
            };
        }
        let mut wm: Vector3f = *wi * eta_p + *wo;
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float || wm.length_squared() == 0.0
        {
            return Spectrum::default();
        }
        wm = wm.normalize();
        if wm.z < 0.0 as Float {
            wm = -wm;
        }
        if vec3_dot_vec3f(&wm, wi) * cos_theta_i < 0.0 as Float
            || vec3_dot_vec3f(&wm, wo) * cos_theta_o < 0.0 as Float
        {
            return Spectrum::default();
        }
        let f_d: Spectrum = Spectrum::new(fr_dielectric(vec3_dot_vec3f(wo, &wm), self.eta));
        let f_c: Spectrum = fr_schlick(self.color, vec3_dot_vec3f(wi, &wm));
        let fr: Spectrum = spectrum_lerp(self.metallic, &f_d, &f_c);
        let tr: Spectrum = Spectrum::new(1.0) - fr;
        if reflect_case {
            // base specular: dielectric reflection and metal reflection
            let denom: Float = (4.0 as Float * cos_theta_i * cos_theta_o).abs();
            let mut f: Spectrum = fr * self.mf.d(&wm) * self.mf.g(wo, wi) / denom;
            // diffuse base
            f += tr
                * self.color
                * (INV_PI * (1.0 as Float - self.transmission) * (1.0 as Float - self.metallic));
            // clearcoat layer
            if self.clearcoat > 0.0 as Float {
                let f_cc: Float = fr_dielectric(vec3_dot_vec3f(wo, &wm), DEFAULT_DIELECTRIC_IOR);
                f += self.clearcoat_color
                    * (self.clearcoat
                        * f_cc
                        * self.mf_clearcoat.d(&wm)
                        * self.mf_clearcoat.g(wo, wi)
                        / denom);
            }
            // sheen layer
            if self.sheen > 0.0 as Float {
                f += self.sheen_color
                    * (self.sheen * self.mf_sheen.d(&wm) * self.mf_sheen.g(wo, wi) / denom);
            }
            f
        } else {
            // dielectric transmission through the base
            let denom: Float = sqr(vec3_dot_vec3f(wi, &wm) + vec3_dot_vec3f(wo, &wm) / eta_p)
                * cos_theta_i
                * cos_theta_o;
            let mut f: Spectrum = self.color.sqrt()
                * tr
                * (self.transmission
                    * self.mf.d(&wm)
                    * self.mf.g(wo, wi)
                    * (vec3_dot_vec3f(wi, &wm) * vec3_dot_vec3f(wo, &wm) / denom).abs());
            // handle solid angle squeezing
            if direction == TransportDirection::ToLight {
                f /= sqr(eta_p);
            }
            f
        }
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Float {
        let cos_theta_o: Float = cos_theta(wo);
        let cos_theta_i: Float = cos_theta(wi);
        let reflect_case: bool = cos_theta_i * cos_theta_o > 0.0 as Float;
        let mut eta_p: Float = 1.0;
        if !reflect_case {
            eta_p = if cos_theta_o > 0.0 as Float {
                self.eta
            } else {
                1.0 as Float / self.eta
            };
        }
        let mut wm: Vector3f = *wi * eta_p + *wo;
        if cos_theta_i == 0.0 as Float || cos_theta_o == 0.0 as Float || wm.length_squared() == 0.0
        {
            return 0.0;
        }
        wm = wm.normalize();
        if wm.z < 0.0 as Float {
            wm = -wm;
        }
        if vec3_dot_vec3f(&wm, wi) * cos_theta_i < 0.0 as Float
            || vec3_dot_vec3f(&wm, wo) * cos_theta_o < 0.0 as Float
        {
            return 0.0;
        }
        let r: Float = fr_dielectric(vec3_dot_vec3f(wo, &wm), self.eta);
        let t: Float = 1.0 as Float - r;
        let mut pr: Float = r;
        let mut pt: Float = t;
        if flags & SAMPLE_REFLECTION == 0 {
            pr = 0.0;
        }
        if flags & SAMPLE_TRANSMISSION == 0 {
            pt = 0.0;
        }
        if pr == 0.0 && pt == 0.0 {
            return 0.0;
        }
        let p_sum: Float = pr + pt;
        pr /= p_sum;
        pt /= p_sum;
        // mix the metallic lobe in: metallic paths always sample the
        // specular half vector
        let p_metal: Float = self.metallic;
        let p_base: Float = 1.0 as Float - self.metallic;
        if reflect_case {
            let pdf_spec: Float =
                self.mf.pdf(wo, &wm) / (4.0 as Float * vec3_abs_dot_vec3f(wo, &wm));
            let mut pdf: Float = (p_metal + p_base * pr) * pdf_spec;
            pdf += p_base
                * pt
                * (1.0 as Float - self.transmission)
                * abs_cos_theta(wi)
                * INV_PI;
            pdf
        } else {
            let dwm_dwi: Float = vec3_abs_dot_vec3f(wi, &wm)
                / sqr(vec3_dot_vec3f(wi, &wm) + vec3_dot_vec3f(wo, &wm) / eta_p);
            p_base * pt * self.transmission * self.mf.pdf(wo, &wm) * dwm_dwi
        }
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        u12: &Point2f,
        direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        let flag: u8;
        let mut wi: Vector3f;
        let mut eta_p: Float = 1.0;
        if u0 < self.metallic {
            let wm: Vector3f = self.mf.sample_wm(wo, u12);
            wi = reflect(wo, &wm);
            if !vec3_same_hemisphere_vec3(wo, &wi) {
                return None;
            }
            flag = BXDF_GLOSSY_REFLECTION;
        } else {
            let wm: Vector3f = self.mf.sample_wm(wo, u12);
            let r: Float = fr_dielectric(vec3_dot_vec3f(wo, &wm), self.eta);
            let t: Float = 1.0 as Float - r;
            let mut pr: Float = r;
            let mut pt: Float = t;
            if flags & SAMPLE_REFLECTION == 0 {
                pr = 0.0;
            }
            if flags & SAMPLE_TRANSMISSION == 0 {
                pt = 0.0;
            }
            if pr == 0.0 && pt == 0.0 {
                return None;
            }
            let p_sum: Float = pr + pt;
            pr /= p_sum;
            pt /= p_sum;
            // renormalize
            let mut u0: Float = (u0 - self.metallic) / (1.0 as Float - self.metallic);
            if u0 < pr {
                // sample glossy reflection
                wi = reflect(wo, &wm);
                if !vec3_same_hemisphere_vec3(wo, &wi) {
                    return None;
                }
                flag = BXDF_GLOSSY_REFLECTION;
            } else {
                u0 = (u0 - pr) / pt;
                if u0 < self.transmission {
                    // sample glossy transmission
                    let (wt, eta) = refract(wo, &wm, self.eta)?;
                    if vec3_same_hemisphere_vec3(wo, &wt) || wt.z == 0.0 as Float {
                        return None;
                    }
                    wi = wt;
                    eta_p = eta;
                    flag = BXDF_GLOSSY_TRANSMISSION;
                } else {
                    // sample diffuse reflection
                    wi = cosine_sample_hemisphere(u12);
                    if wo.z < 0.0 as Float {
                        wi = -wi;
                    }
                    flag = BXDF_DIFFUSE_REFLECTION;
                }
            }
        }
        let f: Spectrum = self.f(wo, &wi, direction);
        let pdf: Float = self.pdf(wo, &wi, direction, flags);
        if pdf <= 0.0 as Float || f.is_black() {
            return None;
        }
        Some(BsdfSample::new_with_eta(f, wi, pdf, flag, eta_p))
    }
}

// ------------------------------------------------------------------
// Sheen
// ------------------------------------------------------------------

#[derive(Debug, Copy, Clone)]
pub struct SheenBxdf {
    pub base: Spectrum,
    pub sheen: Spectrum,
    pub mf: CharlieSheenDistribution,
}

impl SheenBxdf {
    pub fn new(base: Spectrum, sheen: Spectrum, mf: CharlieSheenDistribution) -> Self {
        SheenBxdf { base, sheen, mf }
    }
    pub fn flags(&self) -> u8 {
        BXDF_DIFFUSE_REFLECTION
    }
    fn eval(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        let wm: Vector3f = (*wi + *wo).normalize();
        let cos_theta_o: Float = cos_theta(wo);
        let cos_theta_i: Float = cos_theta(wi);
        let denom: Float = (4.0 as Float * cos_theta_i * cos_theta_o).abs();
        if denom == 0.0 as Float {
            return Spectrum::default();
        }
        // combine with a lambertian base by albedo normalization
        let f_diffuse: Spectrum = self.base * ((1.0 as Float - self.mf.e(wo)) * INV_PI);
        let f_sheen: Spectrum = self.sheen * (self.mf.d(&wm) * self.mf.g(wo, wi) / denom);
        f_diffuse + f_sheen
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, _direction: TransportDirection) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        self.eval(wo, wi)
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        _flags: u8,
    ) -> Float {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return 0.0;
        }
        cosine_hemisphere_pdf(abs_cos_theta(wi))
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        _u0: Float,
        u12: &Point2f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if flags & SAMPLE_REFLECTION == 0 {
            return None;
        }
        let mut wi: Vector3f = cosine_sample_hemisphere(u12);
        if wo.z < 0.0 as Float {
            wi = -wi;
        }
        let pdf: Float = cosine_hemisphere_pdf(abs_cos_theta(&wi));
        if pdf == 0.0 as Float {
            return None;
        }
        Some(BsdfSample::new(
            self.eval(wo, &wi),
            wi,
            pdf,
            BXDF_DIFFUSE_REFLECTION,
        ))
    }
}

// ------------------------------------------------------------------
// Normalized Fresnel (BSSRDF exit interface)
// ------------------------------------------------------------------

#[derive(Debug, Default, Copy, Clone)]
pub struct NormalizedFresnelBxdf {
    pub eta: Float,
}

impl NormalizedFresnelBxdf {
    pub fn new(eta: Float) -> Self {
        NormalizedFresnelBxdf { eta }
    }
    pub fn flags(&self) -> u8 {
        BXDF_DIFFUSE | BXDF_REFLECTION
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, direction: TransportDirection) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        // normalization constant
        let c: Float = 1.0 as Float
            / (PI * (1.0 as Float - 2.0 as Float * fresnel_moment1(1.0 as Float / self.eta)));
        let mut f: Spectrum =
            Spectrum::new(c * (1.0 as Float - fr_dielectric(cos_theta(wi), self.eta)));
        // handle solid angle squeezing for BSSRDF transmission
        if direction == TransportDirection::ToLight {
            f *= sqr(self.eta);
        }
        f
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        _direction: TransportDirection,
        flags: u8,
    ) -> Float {
        if flags & SAMPLE_REFLECTION == 0 {
            return 0.0;
        }
        if vec3_same_hemisphere_vec3(wo, wi) {
            cosine_hemisphere_pdf(abs_cos_theta(wi))
        } else {
            0.0
        }
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        _u0: Float,
        u12: &Point2f,
        direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        if flags & SAMPLE_REFLECTION == 0 {
            return None;
        }
        let mut wi: Vector3f = cosine_sample_hemisphere(u12);
        let pdf: Float = cosine_hemisphere_pdf(abs_cos_theta(&wi));
        if wo.z < 0.0 as Float {
            wi.z = -wi.z;
        }
        if pdf == 0.0 as Float {
            return None;
        }
        Some(BsdfSample::new(
            self.f(wo, &wi, direction),
            wi,
            pdf,
            BXDF_DIFFUSE_REFLECTION,
        ))
    }
}

// ------------------------------------------------------------------
// The closed lobe set
// ------------------------------------------------------------------

#[derive(Clone)]
pub enum Bxdf<'a> {
    Lambertian(LambertianBxdf),
    Eon(EonBxdf),
    SpecRefl(SpecularReflectionBxdf),
    Dielectric(DielectricBxdf),
    Conductor(ConductorBxdf),
    ThinDielectric(ThinDielectricBxdf),
    MetallicRoughness(MetallicRoughnessBxdf),
    Principled(PrincipledBxdf),
    Sheen(SheenBxdf),
    NormalizedFresnel(NormalizedFresnelBxdf),
    Layered(LayeredBxdf<'a>),
}

impl<'a> Bxdf<'a> {
    pub fn flags(&self) -> u8 {
        match self {
            Bxdf::Lambertian(b) => b.flags(),
            Bxdf::Eon(b) => b.flags(),
            Bxdf::SpecRefl(b) => b.flags(),
            Bxdf::Dielectric(b) => b.flags(),
            Bxdf::Conductor(b) => b.flags(),
            Bxdf::ThinDielectric(b) => b.flags(),
            Bxdf::MetallicRoughness(b) => b.flags(),
            Bxdf::Principled(b) => b.flags(),
            Bxdf::Sheen(b) => b.flags(),
            Bxdf::NormalizedFresnel(b) => b.flags(),
            Bxdf::Layered(b) => b.flags(),
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, direction: TransportDirection) -> Spectrum {
        match self {
            Bxdf::Lambertian(b) => b.f(wo, wi, direction),
            Bxdf::Eon(b) => b.f(wo, wi, direction),
            Bxdf::SpecRefl(b) => b.f(wo, wi, direction),
            Bxdf::Dielectric(b) => b.f(wo, wi, direction),
            Bxdf::Conductor(b) => b.f(wo, wi, direction),
            Bxdf::ThinDielectric(b) => b.f(wo, wi, direction),
            Bxdf::MetallicRoughness(b) => b.f(wo, wi, direction),
            Bxdf::Principled(b) => b.f(wo, wi, direction),
            Bxdf::Sheen(b) => b.f(wo, wi, direction),
            Bxdf::NormalizedFresnel(b) => b.f(wo, wi, direction),
            Bxdf::Layered(b) => b.f(wo, wi, direction),
        }
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        u12: &Point2f,
        direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        match self {
            Bxdf::Lambertian(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::Eon(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::SpecRefl(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::Dielectric(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::Conductor(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::ThinDielectric(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::MetallicRoughness(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::Principled(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::Sheen(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::NormalizedFresnel(b) => b.sample_f(wo, u0, u12, direction, flags),
            Bxdf::Layered(b) => b.sample_f(wo, u0, u12, direction, flags),
        }
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        direction: TransportDirection,
        flags: u8,
    ) -> Float {
        match self {
            Bxdf::Lambertian(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::Eon(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::SpecRefl(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::Dielectric(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::Conductor(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::ThinDielectric(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::MetallicRoughness(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::Principled(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::Sheen(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::NormalizedFresnel(b) => b.pdf(wo, wi, direction, flags),
            Bxdf::Layered(b) => b.pdf(wo, wi, direction, flags),
        }
    }
    pub fn regularize(&mut self) {
        match self {
            Bxdf::Dielectric(b) => b.regularize(),
            Bxdf::Conductor(b) => b.regularize(),
            Bxdf::MetallicRoughness(b) => b.regularize(),
            Bxdf::Principled(b) => b.regularize(),
            _ => {}
        }
    }
    /// Hemispherical-directional reflectance estimated over the given
    /// fixed sample set.
    pub fn rho_hd(&self, wo: &Vector3f, uc: &[Float], u2: &[Point2f]) -> Spectrum {
        let mut r: Spectrum = Spectrum::default();
        for i in 0..uc.len() {
            if let Some(bs) =
                self.sample_f(wo, uc[i], &u2[i], TransportDirection::ToLight, SAMPLE_ALL)
            {
                if bs.pdf > 0.0 as Float {
                    r += bs.f * (abs_cos_theta(&bs.wi) / bs.pdf);
                }
            }
        }
        r / uc.len() as Float
    }
}

// ------------------------------------------------------------------
// BSDF: a lobe bound to a shading frame
// ------------------------------------------------------------------

#[derive(Clone)]
pub struct Bsdf<'a> {
    pub frame: Frame,
    pub bxdf: Bxdf<'a>,
}

impl<'a> Bsdf<'a> {
    /// Bind a lobe to a shading frame; the tangent is re-orthogonalized
    /// against the shading normal.
    pub fn new(ns: &Normal3f, tangent: &Vector3f, bxdf: Bxdf<'a>) -> Bsdf<'a> {
        let z: Vector3f = Vector3f::from(*ns).normalize();
        let mut x: Vector3f = *tangent - z * vec3_dot_vec3f(tangent, &z);
        let frame: Frame = if x.length_squared() > 1e-12 {
            x = x.normalize();
            Frame::from_xz(&x, &z)
        } else {
            Frame::from_z(&z)
        };
        Bsdf { frame, bxdf }
    }
    pub fn flags(&self) -> u8 {
        self.bxdf.flags()
    }
    pub fn is_specular(&self) -> bool {
        !is_non_specular(self.flags())
    }
    pub fn regularize(&mut self) {
        self.bxdf.regularize();
    }
    pub fn f(&self, wo_w: &Vector3f, wi_w: &Vector3f, direction: TransportDirection) -> Spectrum {
        let wo: Vector3f = self.frame.to_local(wo_w);
        let wi: Vector3f = self.frame.to_local(wi_w);
        if wo.z == 0.0 as Float {
            return Spectrum::default();
        }
        self.bxdf.f(&wo, &wi, direction)
    }
    pub fn sample_f(
        &self,
        wo_w: &Vector3f,
        u0: Float,
        u12: &Point2f,
        direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        let wo: Vector3f = self.frame.to_local(wo_w);
        if wo.z == 0.0 as Float {
            return None;
        }
        let mut bs: BsdfSample = self.bxdf.sample_f(&wo, u0, u12, direction, flags)?;
        if bs.pdf == 0.0 as Float || bs.f.is_black() || bs.wi.z == 0.0 as Float {
            return None;
        }
        bs.wi = self.frame.from_local(&bs.wi);
        Some(bs)
    }
    pub fn pdf(
        &self,
        wo_w: &Vector3f,
        wi_w: &Vector3f,
        direction: TransportDirection,
        flags: u8,
    ) -> Float {
        let wo: Vector3f = self.frame.to_local(wo_w);
        let wi: Vector3f = self.frame.to_local(wi_w);
        if wo.z == 0.0 as Float {
            return 0.0;
        }
        self.bxdf.pdf(&wo, &wi, direction, flags)
    }
    pub fn rho_hd(&self, wo_w: &Vector3f, uc: &[Float], u2: &[Point2f]) -> Spectrum {
        let wo: Vector3f = self.frame.to_local(wo_w);
        if wo.z == 0.0 as Float {
            return Spectrum::default();
        }
        self.bxdf.rho_hd(&wo, uc, u2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Rng;

    fn hemispherical_energy(bxdf: &Bxdf, wo: &Vector3f, n: usize) -> Float {
        let mut rng = Rng::new(0xfeed, 0);
        let mut sum: Spectrum = Spectrum::default();
        for _ in 0..n {
            let u0: Float = rng.uniform_float();
            let u12 = Point2f::new(rng.uniform_float(), rng.uniform_float());
            if let Some(bs) = bxdf.sample_f(wo, u0, &u12, TransportDirection::ToLight, SAMPLE_ALL) {
                if bs.pdf > 0.0 {
                    sum += bs.f * (abs_cos_theta(&bs.wi) / bs.pdf);
                }
            }
        }
        (sum / n as Float).max_component_value()
    }

    #[test]
    fn test_lambertian_energy_conservation() {
        let bxdf = Bxdf::Lambertian(LambertianBxdf::new(Spectrum::new(1.0)));
        for cos_o in &[0.1, 0.5, 0.9] {
            let sin_o: Float = (1.0 - cos_o * cos_o).sqrt();
            let wo = Vector3f::new(sin_o, 0.0, *cos_o);
            let e: Float = hemispherical_energy(&bxdf, &wo, 4096);
            assert!(e <= 1.0 + 1e-3, "energy {} at cos {}", e, cos_o);
            assert!(e >= 0.98, "lambertian with r=1 should be lossless, got {}", e);
        }
    }

    #[test]
    fn test_eon_energy_conservation() {
        let bxdf = Bxdf::Eon(EonBxdf::new(Spectrum::new(1.0), 0.7));
        for cos_o in &[0.2, 0.6, 0.95] {
            let sin_o: Float = (1.0 - cos_o * cos_o).sqrt();
            let wo = Vector3f::new(sin_o, 0.0, *cos_o);
            let e: Float = hemispherical_energy(&bxdf, &wo, 8192);
            assert!(e <= 1.0 + 5e-3, "energy {} at cos {}", e, cos_o);
        }
    }

    #[test]
    fn test_lambertian_reciprocity() {
        let b = LambertianBxdf::new(Spectrum::rgb(0.3, 0.5, 0.7));
        let wo = Vector3f::new(0.3, -0.1, 0.948_683_3).normalize();
        let wi = Vector3f::new(-0.5, 0.4, 0.768_114_6).normalize();
        let fab = b.f(&wo, &wi, TransportDirection::ToLight);
        let fba = b.f(&wi, &wo, TransportDirection::ToLight);
        assert!((fab.c[0] - fba.c[0]).abs() < 1e-6);
    }

    #[test]
    fn test_conductor_reciprocity() {
        let b = ConductorBxdf::new(
            Spectrum::rgb(0.2, 0.9, 1.4),
            Spectrum::rgb(3.9, 2.5, 2.1),
            TrowbridgeReitzDistribution::new(0.2, 0.2),
            false,
        );
        let wo = Vector3f::new(0.4, 0.2, 0.891_570_7).normalize();
        let wi = Vector3f::new(-0.3, 0.5, 0.812_403_8).normalize();
        let fab = b.f(&wo, &wi, TransportDirection::ToLight);
        let fba = b.f(&wi, &wo, TransportDirection::ToLight);
        for ch in 0..3 {
            let rel: Float = (fab.c[ch] - fba.c[ch]).abs() / fab.c[ch].max(1e-6);
            assert!(rel < 1e-4, "channel {} relative error {}", ch, rel);
        }
    }

    #[test]
    fn test_specular_returns_delta_sample() {
        let b = SpecularReflectionBxdf::new(Spectrum::new(0.9));
        let wo = Vector3f::new(0.6, 0.0, 0.8);
        let bs = b
            .sample_f(
                &wo,
                0.5,
                &Point2f::default(),
                TransportDirection::ToLight,
                SAMPLE_ALL,
            )
            .unwrap();
        assert_eq!(bs.pdf, 1.0);
        assert!(bs.is_specular());
        assert!((bs.wi.x + 0.6).abs() < 1e-6 && (bs.wi.z - 0.8).abs() < 1e-6);
        // f * |cos| / pdf recovers the reflectance
        assert!((bs.f.c[0] * abs_cos_theta(&bs.wi) - 0.9).abs() < 1e-5);
        assert!(b.f(&wo, &bs.wi, TransportDirection::ToLight).is_black());
        assert_eq!(
            b.pdf(&wo, &bs.wi, TransportDirection::ToLight, SAMPLE_ALL),
            0.0
        );
    }

    #[test]
    fn test_thin_dielectric_splits_energy() {
        let b = ThinDielectricBxdf::new(1.5);
        let wo = Vector3f::new(0.2, 0.3, 0.932_737_9).normalize();
        let mut refl: Float = 0.0;
        let mut total: Float = 0.0;
        let mut rng = Rng::new(3, 9);
        let n: usize = 2048;
        for _ in 0..n {
            if let Some(bs) = b.sample_f(
                &wo,
                rng.uniform_float(),
                &Point2f::default(),
                TransportDirection::ToLight,
                SAMPLE_ALL,
            ) {
                let w: Float = bs.f.c[0] * abs_cos_theta(&bs.wi) / bs.pdf;
                total += w;
                if bs.is_reflection() {
                    refl += w;
                }
            }
        }
        total /= n as Float;
        refl /= n as Float;
        assert!((total - 1.0).abs() < 1e-2, "total energy {}", total);
        assert!(refl > 0.0 && refl < total);
    }

    #[test]
    fn test_dielectric_smooth_refracts() {
        let b = DielectricBxdf::new(
            1.5,
            Spectrum::new(1.0),
            TrowbridgeReitzDistribution::new(0.0, 0.0),
            false,
        );
        let wo = Vector3f::new(0.2, 0.0, 0.979_795_9);
        // u0 = 0.99 picks transmission for most angles
        let bs = b
            .sample_f(
                &wo,
                0.99,
                &Point2f::new(0.3, 0.7),
                TransportDirection::ToLight,
                SAMPLE_ALL,
            )
            .unwrap();
        assert!(bs.is_transmission());
        assert!(bs.wi.z < 0.0);
        assert!((bs.eta - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_sampling_pdf_consistency_metallic_roughness() {
        // histogram test: sampled directions should be distributed
        // according to the declared pdf
        let b = MetallicRoughnessBxdf::new(
            Spectrum::rgb(0.8, 0.6, 0.4),
            0.3,
            TrowbridgeReitzDistribution::new(0.25, 0.25),
        );
        let wo = Vector3f::new(0.4, -0.1, 0.911_043_3).normalize();
        let n_theta: usize = 8;
        let n_samples: usize = 65536;
        let mut counts: Vec<Float> = vec![0.0; n_theta];
        let mut expected: Vec<Float> = vec![0.0; n_theta];
        let mut rng = Rng::new(17, 4);
        for _ in 0..n_samples {
            let u0: Float = rng.uniform_float();
            let u12 = Point2f::new(rng.uniform_float(), rng.uniform_float());
            if let Some(bs) = b.sample_f(&wo, u0, &u12, TransportDirection::ToLight, SAMPLE_ALL) {
                let bin: usize = ((bs.wi.z.max(0.0) * n_theta as Float) as usize).min(n_theta - 1);
                counts[bin] += 1.0;
            }
        }
        // integrate the pdf over each cos-theta band
        let n_int: usize = 64;
        for it in 0..n_theta * n_int {
            let z: Float = (it as Float + 0.5) / (n_theta * n_int) as Float;
            let sin_t: Float = (1.0 - z * z).sqrt();
            let n_phi: usize = 64;
            for ip in 0..n_phi {
                let phi: Float = (ip as Float + 0.5) / n_phi as Float * 2.0 * PI;
                let wi = Vector3f::new(sin_t * phi.cos(), sin_t * phi.sin(), z);
                let pdf: Float = b.pdf(&wo, &wi, TransportDirection::ToLight, SAMPLE_ALL);
                expected[it / n_int] +=
                    pdf * (2.0 * PI / n_phi as Float) / (n_theta * n_int) as Float;
            }
        }
        for bin in 0..n_theta {
            let observed: Float = counts[bin] / n_samples as Float;
            let want: Float = expected[bin];
            if want > 5e-3 {
                let rel: Float = (observed - want).abs() / want;
                assert!(
                    rel < 0.15,
                    "bin {}: observed {} expected {}",
                    bin,
                    observed,
                    want
                );
            }
        }
    }

    #[test]
    fn test_bsdf_frame_round_trip() {
        let ns = Normal3f::new(0.0, 1.0, 0.0);
        let tangent = Vector3f::new(1.0, 0.0, 0.0);
        let bsdf = Bsdf::new(
            &ns,
            &tangent,
            Bxdf::Lambertian(LambertianBxdf::new(Spectrum::new(0.5))),
        );
        let wo = Vector3f::new(0.0, 1.0, 0.0);
        let bs = bsdf
            .sample_f(
                &wo,
                0.5,
                &Point2f::new(0.4, 0.6),
                TransportDirection::ToLight,
                SAMPLE_ALL,
            )
            .unwrap();
        // sampled direction must lie in the upper hemisphere around ns
        assert!(bs.wi.y > 0.0);
        let f = bsdf.f(&wo, &bs.wi, TransportDirection::ToLight);
        assert!((f.c[0] - 0.5 * INV_PI).abs() < 1e-6);
    }
}
