//! Fresnel terms, reflection/refraction geometry, and the
//! energy-compensation tables used by the multi-scattering lobes.

// others
use num::complex::Complex;
// lumen
use crate::core::geometry::{vec3_abs_dot_vec3f, vec3_dot_vec3f, Point2f, Vector3f};
use crate::core::lumen::{clamp_t, sqr, Float, Spectrum};
use crate::core::microfacet::{CharlieSheenDistribution, TrowbridgeReitzDistribution};
use crate::core::rng::Rng;
use crate::core::sampling::{uniform_hemisphere_pdf, uniform_sample_hemisphere};

pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    -(*wo) + *n * (2.0 as Float * vec3_dot_vec3f(wo, n))
}

/// Compute the refracted direction, or `None` on total internal
/// reflection. The returned eta is the relative index after the
/// interface orientation has been resolved.
pub fn refract(wo: &Vector3f, n: &Vector3f, eta: Float) -> Option<(Vector3f, Float)> {
    let mut cos_theta_i: Float = vec3_dot_vec3f(n, wo);
    let mut eta: Float = eta;
    let mut n: Vector3f = *n;
    // flip the interface if the ray leaves the medium
    if cos_theta_i < 0.0 as Float {
        eta = 1.0 as Float / eta;
        cos_theta_i = -cos_theta_i;
        n = -n;
    }
    let sin_2_theta_i: Float = (0.0 as Float).max(1.0 as Float - sqr(cos_theta_i));
    let sin_2_theta_t: Float = sin_2_theta_i / sqr(eta);
    if sin_2_theta_t >= 1.0 as Float {
        return None;
    }
    let cos_theta_t: Float = (1.0 as Float - sin_2_theta_t).sqrt();
    let wt: Vector3f = -(*wo) / eta + n * (cos_theta_i / eta - cos_theta_t);
    Some((wt, eta))
}

/// Unpolarized Fresnel reflectance at a dielectric boundary; *eta* is
/// the transmitted-over-incident relative index.
pub fn fr_dielectric(cos_theta_i: Float, eta: Float) -> Float {
    let mut cos_theta_i: Float = clamp_t(cos_theta_i, -1.0, 1.0);
    let mut eta: Float = eta;
    if cos_theta_i < 0.0 as Float {
        eta = 1.0 as Float / eta;
        cos_theta_i = -cos_theta_i;
    }
    let sin_2_theta_i: Float = (0.0 as Float).max(1.0 as Float - sqr(cos_theta_i));
    let sin_2_theta_t: Float = sin_2_theta_i / sqr(eta);
    if sin_2_theta_t >= 1.0 as Float {
        return 1.0;
    }
    let cos_theta_t: Float = (1.0 as Float - sin_2_theta_t).sqrt();
    let r_parl: Float = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp: Float = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    (sqr(r_parl) + sqr(r_perp)) / 2.0 as Float
}

fn fr_complex_scalar(cos_theta_i: Float, eta: Float, k: Float) -> Float {
    let cos_theta_i: Float = clamp_t(cos_theta_i, 0.0, 1.0);
    let sin_2_theta_i: Float = 1.0 as Float - sqr(cos_theta_i);
    let eta_c: Complex<Float> = Complex::new(eta, k);
    let sin_2_theta_t: Complex<Float> = Complex::new(sin_2_theta_i, 0.0) / (eta_c * eta_c);
    let cos_theta_t: Complex<Float> = (Complex::new(1.0, 0.0) - sin_2_theta_t).sqrt();
    let r_parl: Complex<Float> =
        (eta_c * cos_theta_i - cos_theta_t) / (eta_c * cos_theta_i + cos_theta_t);
    let r_perp: Complex<Float> =
        (Complex::new(cos_theta_i, 0.0) - eta_c * cos_theta_t)
            / (Complex::new(cos_theta_i, 0.0) + eta_c * cos_theta_t);
    (r_parl.norm_sqr() + r_perp.norm_sqr()) / 2.0 as Float
}

/// Per-channel complex-index Fresnel reflectance for conductors.
pub fn fr_complex(cos_theta_i: Float, eta: Spectrum, k: Spectrum) -> Spectrum {
    Spectrum::rgb(
        fr_complex_scalar(cos_theta_i, eta.c[0], k.c[0]),
        fr_complex_scalar(cos_theta_i, eta.c[1], k.c[1]),
        fr_complex_scalar(cos_theta_i, eta.c[2], k.c[2]),
    )
}

/// Cosine-weighted average of the conductor Fresnel curve, used by the
/// multi-scattering compensation term.
pub fn fr_conductor_average(eta: Spectrum, k: Spectrum) -> Spectrum {
    let n: i32 = 16;
    let mut sum: Spectrum = Spectrum::default();
    for i in 0..n {
        let mu: Float = (i as Float + 0.5) / n as Float;
        sum += fr_complex(mu, eta, k) * mu;
    }
    sum * (2.0 as Float / n as Float)
}

pub fn fr_schlick(f0: Spectrum, cos_theta: Float) -> Spectrum {
    let m: Float = clamp_t(1.0 as Float - cos_theta, 0.0, 1.0);
    f0 + (Spectrum::new(1.0) - f0) * (m * m * m * m * m)
}

pub fn fr_schlick_scalar(f0: Float, cos_theta: Float) -> Float {
    let m: Float = clamp_t(1.0 as Float - cos_theta, 0.0, 1.0);
    f0 + (1.0 as Float - f0) * (m * m * m * m * m)
}

pub fn map_ior_to_f0(eta: Float) -> Float {
    sqr((eta - 1.0 as Float) / (eta + 1.0 as Float))
}

pub fn map_f0_to_ior(f0: Float) -> Float {
    let s: Float = f0.sqrt().min(0.999);
    (1.0 as Float + s) / (1.0 as Float - s)
}

/// First moment of the dielectric Fresnel reflectance (fitted
/// polynomial), used by the normalized Fresnel BSSRDF exit term.
pub fn fresnel_moment1(eta: Float) -> Float {
    let eta2: Float = eta * eta;
    let eta3: Float = eta2 * eta;
    let eta4: Float = eta3 * eta;
    let eta5: Float = eta4 * eta;
    if eta < 1.0 as Float {
        0.45966 - 1.73965 * eta + 3.37668 * eta2 - 3.904_945 * eta3 + 2.49277 * eta4
            - 0.68441 * eta5
    } else {
        -4.61686 + 11.1136 * eta - 10.4646 * eta2 + 5.11455 * eta3 - 1.27198 * eta4
            + 0.12746 * eta5
    }
}

// ------------------------------------------------------------------
// Energy-compensation tables
// ------------------------------------------------------------------

/// Dense grid with bilinear lookups over [0,1]^2.
pub struct EnergyTable2 {
    pub nx: usize,
    pub ny: usize,
    pub data: Vec<Float>,
}

impl EnergyTable2 {
    pub fn lookup(&self, x: Float, y: Float) -> Float {
        let fx: Float = clamp_t(x, 0.0, 1.0) * (self.nx - 1) as Float;
        let fy: Float = clamp_t(y, 0.0, 1.0) * (self.ny - 1) as Float;
        let x0: usize = (fx as usize).min(self.nx - 2);
        let y0: usize = (fy as usize).min(self.ny - 2);
        let dx: Float = fx - x0 as Float;
        let dy: Float = fy - y0 as Float;
        let at = |xi: usize, yi: usize| self.data[yi * self.nx + xi];
        let v0: Float = at(x0, y0) * (1.0 - dx) + at(x0 + 1, y0) * dx;
        let v1: Float = at(x0, y0 + 1) * (1.0 - dx) + at(x0 + 1, y0 + 1) * dx;
        v0 * (1.0 - dy) + v1 * dy
    }
}

/// Dense grid with trilinear lookups over [0,1]^3.
pub struct EnergyTable3 {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub data: Vec<Float>,
}

impl EnergyTable3 {
    pub fn lookup(&self, x: Float, y: Float, z: Float) -> Float {
        let fx: Float = clamp_t(x, 0.0, 1.0) * (self.nx - 1) as Float;
        let fy: Float = clamp_t(y, 0.0, 1.0) * (self.ny - 1) as Float;
        let fz: Float = clamp_t(z, 0.0, 1.0) * (self.nz - 1) as Float;
        let x0: usize = (fx as usize).min(self.nx - 2);
        let y0: usize = (fy as usize).min(self.ny - 2);
        let z0: usize = (fz as usize).min(self.nz - 2);
        let dx: Float = fx - x0 as Float;
        let dy: Float = fy - y0 as Float;
        let dz: Float = fz - z0 as Float;
        let at = |xi: usize, yi: usize, zi: usize| {
            self.data[(zi * self.ny + yi) * self.nx + xi]
        };
        let mut v: Float = 0.0;
        for (zi, wz) in &[(z0, 1.0 - dz), (z0 + 1, dz)] {
            for (yi, wy) in &[(y0, 1.0 - dy), (y0 + 1, dy)] {
                for (xi, wx) in &[(x0, 1.0 - dx), (x0 + 1, dx)] {
                    v += at(*xi, *yi, *zi) * wx * wy * wz;
                }
            }
        }
        v
    }
}

pub struct ScatteringTables {
    pub conductor_e: EnergyTable3,
    pub conductor_e_avg: EnergyTable2,
    pub dielectric_e: EnergyTable3,
    pub dielectric_e_inv: EnergyTable3,
    pub dielectric_e_avg: EnergyTable2,
    pub dielectric_e_inv_avg: EnergyTable2,
    pub sheen_e: EnergyTable2,
}

// grid resolution of the tables; axes are (f0, cos_theta, alpha)
const N_F0: usize = 16;
const N_COS: usize = 16;
const N_ALPHA: usize = 32;
const N_TABLE_SAMPLES: usize = 32;

fn conductor_cell_energy(f0: Float, cos_theta: Float, alpha: Float, rng: &mut Rng) -> Float {
    let mf = TrowbridgeReitzDistribution::new(alpha.max(1e-3), alpha.max(1e-3));
    let sin_theta: Float = (1.0 as Float - sqr(cos_theta)).max(0.0).sqrt();
    let wo = Vector3f::new(sin_theta, 0.0, cos_theta.max(1e-3));
    let mut e: Float = 0.0;
    for _ in 0..N_TABLE_SAMPLES {
        let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
        let wm: Vector3f = mf.sample_wm(&wo, &u);
        let wi: Vector3f = reflect(&wo, &wm);
        if wi.z <= 0.0 {
            continue;
        }
        // with visible-normal sampling the albedo estimator reduces to
        // F * G / G1
        e += fr_schlick_scalar(f0, vec3_abs_dot_vec3f(&wo, &wm)) * mf.g(&wo, &wi) / mf.g1(&wo);
    }
    e / N_TABLE_SAMPLES as Float
}

fn dielectric_cell_energy(eta: Float, cos_theta: Float, alpha: Float, rng: &mut Rng) -> Float {
    let mf = TrowbridgeReitzDistribution::new(alpha.max(1e-3), alpha.max(1e-3));
    let sin_theta: Float = (1.0 as Float - sqr(cos_theta)).max(0.0).sqrt();
    let wo = Vector3f::new(sin_theta, 0.0, cos_theta.max(1e-3));
    let mut e: Float = 0.0;
    for _ in 0..N_TABLE_SAMPLES {
        let u0: Float = rng.uniform_float();
        let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
        let wm: Vector3f = mf.sample_wm(&wo, &u);
        let r: Float = fr_dielectric(vec3_dot_vec3f(&wo, &wm), eta);
        if u0 < r {
            let wi: Vector3f = reflect(&wo, &wm);
            if wi.z <= 0.0 {
                continue;
            }
            e += mf.g(&wo, &wi) / mf.g1(&wo);
        } else if let Some((wi, _eta_p)) = refract(&wo, &wm, eta) {
            if wi.z >= 0.0 {
                continue;
            }
            e += mf.g(&wo, &wi) / mf.g1(&wo);
        }
    }
    e / N_TABLE_SAMPLES as Float
}

fn sheen_cell_energy(cos_theta: Float, alpha: Float, rng: &mut Rng) -> Float {
    let mf = CharlieSheenDistribution::new(alpha);
    let sin_theta: Float = (1.0 as Float - sqr(cos_theta)).max(0.0).sqrt();
    let wo = Vector3f::new(sin_theta, 0.0, cos_theta.max(1e-3));
    let mut e: Float = 0.0;
    for _ in 0..N_TABLE_SAMPLES {
        let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
        let wi: Vector3f = uniform_sample_hemisphere(&u);
        if wi.z <= 0.0 {
            continue;
        }
        let wm: Vector3f = (wo + wi).normalize();
        let f: Float = mf.d(&wm) * mf.g(&wo, &wi) / (4.0 as Float * wo.z * wi.z).abs();
        e += f * wi.z / uniform_hemisphere_pdf();
    }
    (e / N_TABLE_SAMPLES as Float).min(1.0)
}

fn average_over_cosine(e: &EnergyTable3) -> EnergyTable2 {
    // E_avg(f0, alpha) = 2 * integral of E(f0, mu, alpha) * mu dmu
    let mut data: Vec<Float> = vec![0.0; e.nx * e.nz];
    for iz in 0..e.nz {
        for ix in 0..e.nx {
            let mut sum: Float = 0.0;
            for iy in 0..e.ny {
                let mu: Float = (iy as Float + 0.5) / e.ny as Float;
                sum += e.lookup(
                    ix as Float / (e.nx - 1) as Float,
                    mu,
                    iz as Float / (e.nz - 1) as Float,
                ) * mu;
            }
            data[iz * e.nx + ix] = 2.0 * sum / e.ny as Float;
        }
    }
    EnergyTable2 {
        nx: e.nx,
        ny: e.nz,
        data,
    }
}

impl ScatteringTables {
    pub fn build() -> Self {
        let grid3 = |table_id: u64, f: &dyn Fn(Float, Float, Float, &mut Rng) -> Float| {
            let mut data: Vec<Float> = Vec::with_capacity(N_F0 * N_COS * N_ALPHA);
            for iz in 0..N_ALPHA {
                for iy in 0..N_COS {
                    for ix in 0..N_F0 {
                        let f0: Float = ix as Float / (N_F0 - 1) as Float;
                        let cos_theta: Float = (iy as Float + 0.5) / N_COS as Float;
                        let alpha: Float = iz as Float / (N_ALPHA - 1) as Float;
                        let mut rng = Rng::new(table_id, ((iz * N_COS + iy) * N_F0 + ix) as u64);
                        data.push(f(f0, cos_theta, alpha, &mut rng));
                    }
                }
            }
            EnergyTable3 {
                nx: N_F0,
                ny: N_COS,
                nz: N_ALPHA,
                data,
            }
        };
        let conductor_e = grid3(1, &conductor_cell_energy);
        let dielectric_e = grid3(2, &|f0, c, a, rng| {
            dielectric_cell_energy(map_f0_to_ior(f0), c, a, rng)
        });
        let dielectric_e_inv = grid3(3, &|f0, c, a, rng| {
            dielectric_cell_energy(1.0 as Float / map_f0_to_ior(f0), c, a, rng)
        });
        let mut sheen_data: Vec<Float> = Vec::with_capacity(N_COS * N_ALPHA);
        for iy in 0..N_ALPHA {
            for ix in 0..N_COS {
                let cos_theta: Float = (ix as Float + 0.5) / N_COS as Float;
                let alpha: Float = (iy as Float / (N_ALPHA - 1) as Float).max(1e-3);
                let mut rng = Rng::new(4, (iy * N_COS + ix) as u64);
                sheen_data.push(sheen_cell_energy(cos_theta, alpha, &mut rng));
            }
        }
        let conductor_e_avg = average_over_cosine(&conductor_e);
        let dielectric_e_avg = average_over_cosine(&dielectric_e);
        let dielectric_e_inv_avg = average_over_cosine(&dielectric_e_inv);
        ScatteringTables {
            conductor_e,
            conductor_e_avg,
            dielectric_e,
            dielectric_e_inv,
            dielectric_e_avg,
            dielectric_e_inv_avg,
            sheen_e: EnergyTable2 {
                nx: N_COS,
                ny: N_ALPHA,
                data: sheen_data,
            },
        }
    }
}

lazy_static::lazy_static! {
    pub static ref SCATTERING_TABLES: ScatteringTables = ScatteringTables::build();
}

pub fn conductor_directional_albedo(f0: Float, cos_theta: Float, alpha: Float) -> Float {
    SCATTERING_TABLES.conductor_e.lookup(f0, cos_theta, alpha)
}

pub fn conductor_average_albedo(f0: Float, alpha: Float) -> Float {
    SCATTERING_TABLES.conductor_e_avg.lookup(f0, alpha)
}

/// Directional albedo of a single-scatter rough dielectric seen from
/// the side whose relative index is *eta_o*.
pub fn dielectric_directional_albedo(eta: Float, eta_o: Float, cos_theta: Float, alpha: Float) -> Float {
    if eta >= 1.0 as Float {
        let f0: Float = map_ior_to_f0(eta);
        if eta_o >= 1.0 as Float {
            SCATTERING_TABLES.dielectric_e.lookup(f0, cos_theta, alpha)
        } else {
            SCATTERING_TABLES.dielectric_e_inv.lookup(f0, cos_theta, alpha)
        }
    } else {
        let f0: Float = map_ior_to_f0(1.0 as Float / eta);
        if eta_o >= 1.0 as Float {
            SCATTERING_TABLES.dielectric_e.lookup(f0, cos_theta, alpha)
        } else {
            SCATTERING_TABLES.dielectric_e_inv.lookup(f0, cos_theta, alpha)
        }
    }
}

pub fn dielectric_average_albedo(eta: Float, eta_o: Float, alpha: Float) -> Float {
    let f0: Float = if eta >= 1.0 as Float {
        map_ior_to_f0(eta)
    } else {
        map_ior_to_f0(1.0 as Float / eta)
    };
    if eta_o >= 1.0 as Float {
        SCATTERING_TABLES.dielectric_e_avg.lookup(f0, alpha)
    } else {
        SCATTERING_TABLES.dielectric_e_inv_avg.lookup(f0, alpha)
    }
}

pub fn sheen_directional_albedo(cos_theta: Float, alpha: Float) -> Float {
    SCATTERING_TABLES.sheen_e.lookup(cos_theta, alpha)
}

/// A fixed hemispherical estimate of sheen albedo magnitude used for
/// normalizing the sheen base term.
pub fn sheen_average_albedo(alpha: Float) -> Float {
    let mut sum: Float = 0.0;
    let n: usize = 16;
    for i in 0..n {
        let mu: Float = (i as Float + 0.5) / n as Float;
        sum += sheen_directional_albedo(mu, alpha) * mu;
    }
    2.0 * sum / n as Float
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fr_dielectric_limits() {
        // normal incidence matches the analytic f0
        let eta: Float = 1.5;
        assert!((fr_dielectric(1.0, eta) - map_ior_to_f0(eta)).abs() < 1e-5);
        // grazing incidence goes to 1
        assert!(fr_dielectric(0.001, eta) > 0.98);
        // total internal reflection from the dense side
        assert_eq!(fr_dielectric(0.2, 1.0 / 1.5), 1.0);
    }

    #[test]
    fn test_refract_snell() {
        let wo = Vector3f::new(0.5, 0.0, 0.866_025_4).normalize();
        let n = Vector3f::new(0.0, 0.0, 1.0);
        let (wi, eta_p) = refract(&wo, &n, 1.5).unwrap();
        assert!(wi.z < 0.0);
        assert_eq!(eta_p, 1.5);
        // sin(theta_i) = eta * sin(theta_t)
        let sin_i: Float = (1.0 - sqr(wo.z)).sqrt();
        let sin_t: Float = (1.0 - sqr(wi.z)).sqrt();
        assert!((sin_i - 1.5 * sin_t).abs() < 1e-5);
    }

    #[test]
    fn test_fr_complex_exceeds_dielectric() {
        let eta = Spectrum::new(0.2);
        let k = Spectrum::new(3.9);
        let f = fr_complex(0.8, eta, k);
        assert!(f.c[0] > 0.8 && f.c[0] <= 1.0);
    }

    #[test]
    fn test_tables_are_deterministic_and_bounded() {
        let a = ScatteringTables::build();
        let b = ScatteringTables::build();
        assert_eq!(a.conductor_e.data, b.conductor_e.data);
        assert_eq!(a.dielectric_e.data, b.dielectric_e.data);
        assert_eq!(a.sheen_e.data, b.sheen_e.data);
        for v in a
            .conductor_e
            .data
            .iter()
            .chain(a.dielectric_e.data.iter())
            .chain(a.dielectric_e_inv.data.iter())
        {
            assert!(*v >= 0.0 && *v <= 1.05, "albedo entry out of range: {}", v);
        }
    }

    #[test]
    fn test_conductor_albedo_tracks_f0() {
        // higher f0 reflects more energy at equal roughness
        let lo = conductor_directional_albedo(0.2, 0.7, 0.4);
        let hi = conductor_directional_albedo(0.9, 0.7, 0.4);
        assert!(hi > lo);
    }
}
