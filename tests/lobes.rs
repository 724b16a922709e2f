//! Lobe-level invariants: white-furnace energy, reciprocity, and
//! sampling/pdf agreement across the closed BxDF set.

use rs_lumen::core::geometry::{Point2f, Vector3f};
use rs_lumen::core::lumen::{Float, Spectrum};
use rs_lumen::core::material::TransportDirection;
use rs_lumen::core::microfacet::{abs_cos_theta, CharlieSheenDistribution, TrowbridgeReitzDistribution};
use rs_lumen::core::reflection::{
    Bxdf, ConductorBxdf, DielectricBxdf, EonBxdf, LambertianBxdf, MetallicRoughnessBxdf,
    PrincipledBxdf, SheenBxdf, SAMPLE_ALL,
};
use rs_lumen::core::rng::Rng;

fn wo_from_cos(cos_theta: Float) -> Vector3f {
    let sin_theta: Float = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vector3f::new(sin_theta, 0.0, cos_theta)
}

/// Monte Carlo estimate of the hemispherical energy of a lobe.
fn energy(bxdf: &Bxdf, cos_o: Float, n: usize, seed: u64) -> Float {
    let wo: Vector3f = wo_from_cos(cos_o);
    let mut rng = Rng::new(seed, 0x51a3);
    let mut sum: Spectrum = Spectrum::default();
    for _ in 0..n {
        let u0: Float = rng.uniform_float();
        let u12 = Point2f::new(rng.uniform_float(), rng.uniform_float());
        if let Some(bs) = bxdf.sample_f(&wo, u0, &u12, TransportDirection::ToLight, SAMPLE_ALL) {
            if bs.pdf > 0.0 {
                sum += bs.f * (abs_cos_theta(&bs.wi) / bs.pdf);
            }
        }
    }
    (sum / n as Float).max_component_value()
}

#[test]
fn white_furnace_lambertian() {
    let bxdf = Bxdf::Lambertian(LambertianBxdf::new(Spectrum::new(1.0)));
    for cos_o in &[0.15, 0.5, 0.95] {
        let e: Float = energy(&bxdf, *cos_o, 65536, 7);
        assert!(e <= 1.0 + 1e-3, "cos {}: energy {}", cos_o, e);
        assert!(e >= 0.99, "cos {}: energy {}", cos_o, e);
    }
}

#[test]
fn white_furnace_conductor_compensated() {
    // a perfect reflector with the multi-scatter term should return
    // all energy even at high roughness
    let r: Float = 0.9999;
    let k: Float = 2.0 * r.sqrt() / (1.0 - r).sqrt();
    for alpha in &[0.1, 0.4, 0.9] {
        let bxdf = Bxdf::Conductor(ConductorBxdf::new(
            Spectrum::new(1.0),
            Spectrum::new(k),
            TrowbridgeReitzDistribution::new(*alpha, *alpha),
            true,
        ));
        for cos_o in &[0.3, 0.8] {
            let e: Float = energy(&bxdf, *cos_o, 32768, 13);
            assert!(e <= 1.08, "alpha {} cos {}: energy {}", alpha, cos_o, e);
            assert!(e >= 0.9, "alpha {} cos {}: energy {}", alpha, cos_o, e);
        }
    }
}

#[test]
fn white_furnace_uncompensated_conductor_loses_energy() {
    // without compensation the rough reflector must lose energy, and
    // strictly more than the compensated version
    let r: Float = 0.9999;
    let k: Float = 2.0 * r.sqrt() / (1.0 - r).sqrt();
    let mf = TrowbridgeReitzDistribution::new(0.8, 0.8);
    let plain = Bxdf::Conductor(ConductorBxdf::new(
        Spectrum::new(1.0),
        Spectrum::new(k),
        mf,
        false,
    ));
    let compensated = Bxdf::Conductor(ConductorBxdf::new(
        Spectrum::new(1.0),
        Spectrum::new(k),
        mf,
        true,
    ));
    let e_plain: Float = energy(&plain, 0.6, 32768, 3);
    let e_comp: Float = energy(&compensated, 0.6, 32768, 3);
    assert!(e_plain < 0.95, "single-scatter energy {}", e_plain);
    assert!(e_comp > e_plain + 0.02);
}

#[test]
fn white_furnace_dielectric_near_unity_ior() {
    // eta ~ 1 passes essentially everything through
    let bxdf = Bxdf::Dielectric(DielectricBxdf::new(
        1.0001,
        Spectrum::new(1.0),
        TrowbridgeReitzDistribution::new(0.3, 0.3),
        false,
    ));
    let e: Float = energy(&bxdf, 0.6, 65536, 21);
    assert!(e <= 1.0 + 2e-2, "energy {}", e);
    assert!(e >= 0.93, "energy {}", e);
}

#[test]
fn white_furnace_principled_metallic() {
    for roughness in &[0.05, 0.5] {
        let alpha: Float =
            TrowbridgeReitzDistribution::roughness_to_alpha(*roughness).max(1e-3);
        let bxdf = Bxdf::Principled(PrincipledBxdf {
            color: Spectrum::new(1.0),
            metallic: 1.0,
            mf: TrowbridgeReitzDistribution::new(alpha, alpha),
            eta: 1.5,
            transmission: 0.0,
            clearcoat: 0.0,
            mf_clearcoat: TrowbridgeReitzDistribution::new(0.01, 0.01),
            clearcoat_color: Spectrum::new(1.0),
            sheen: 0.0,
            mf_sheen: CharlieSheenDistribution::new(0.3),
            sheen_color: Spectrum::new(1.0),
        });
        let e: Float = energy(&bxdf, 0.7, 32768, 31);
        assert!(e <= 1.02, "roughness {}: energy {}", roughness, e);
        assert!(e >= 0.8, "roughness {}: energy {}", roughness, e);
    }
}

#[test]
fn reciprocity_surface_lobes() {
    let wo = Vector3f::new(0.31, -0.22, 0.924_607_9).normalize();
    let wi = Vector3f::new(-0.45, 0.18, 0.874_642_8).normalize();
    let lobes: Vec<Bxdf> = vec![
        Bxdf::Lambertian(LambertianBxdf::new(Spectrum::rgb(0.2, 0.5, 0.8))),
        Bxdf::Eon(EonBxdf::new(Spectrum::rgb(0.7, 0.6, 0.5), 0.5)),
        Bxdf::Conductor(ConductorBxdf::new(
            Spectrum::rgb(0.14, 0.37, 1.44),
            Spectrum::rgb(3.98, 2.39, 1.60),
            TrowbridgeReitzDistribution::new(0.3, 0.3),
            false,
        )),
        Bxdf::MetallicRoughness(MetallicRoughnessBxdf::new(
            Spectrum::rgb(0.9, 0.7, 0.4),
            0.4,
            TrowbridgeReitzDistribution::new(0.2, 0.2),
        )),
        Bxdf::Sheen(SheenBxdf::new(
            Spectrum::rgb(0.4, 0.3, 0.2),
            Spectrum::new(1.0),
            CharlieSheenDistribution::new(0.4),
        )),
    ];
    for bxdf in &lobes {
        let fab: Spectrum = bxdf.f(&wo, &wi, TransportDirection::ToLight);
        let fba: Spectrum = bxdf.f(&wi, &wo, TransportDirection::ToLight);
        for ch in 0..3 {
            let denom: Float = fab.c[ch].abs().max(1e-5);
            let rel: Float = (fab.c[ch] - fba.c[ch]).abs() / denom;
            assert!(rel < 1e-4, "channel {} relative error {}", ch, rel);
        }
    }
}

#[test]
fn sampling_matches_pdf_binned() {
    // chi-square style check: 32x16 (phi, cos-theta) binning of
    // sampled directions against the analytic pdf
    let bxdf = Bxdf::Eon(EonBxdf::new(Spectrum::new(0.8), 0.6));
    let wo = wo_from_cos(0.55);
    let n_phi: usize = 32;
    let n_cos: usize = 16;
    let n_samples: usize = 262_144;
    let mut counts: Vec<Float> = vec![0.0; n_phi * n_cos];
    let mut rng = Rng::new(2, 9);
    let mut accepted: usize = 0;
    for _ in 0..n_samples {
        let u0: Float = rng.uniform_float();
        let u12 = Point2f::new(rng.uniform_float(), rng.uniform_float());
        if let Some(bs) = bxdf.sample_f(&wo, u0, &u12, TransportDirection::ToLight, SAMPLE_ALL) {
            let cos_bin: usize =
                ((bs.wi.z.max(0.0) * n_cos as Float) as usize).min(n_cos - 1);
            let phi: Float = bs.wi.y.atan2(bs.wi.x);
            let phi01: Float = (phi / (2.0 * std::f32::consts::PI)).rem_euclid(1.0);
            let phi_bin: usize = ((phi01 * n_phi as Float) as usize).min(n_phi - 1);
            counts[cos_bin * n_phi + phi_bin] += 1.0;
            accepted += 1;
        }
    }
    assert!(accepted > n_samples * 9 / 10);
    // compare the observed frequency of each bin with the pdf
    // integrated over the bin by midpoint rule
    let mut chi2: Float = 0.0;
    let mut dof: usize = 0;
    for cos_bin in 0..n_cos {
        for phi_bin in 0..n_phi {
            let z: Float = (cos_bin as Float + 0.5) / n_cos as Float;
            let phi: Float =
                (phi_bin as Float + 0.5) / n_phi as Float * 2.0 * std::f32::consts::PI;
            let sin_t: Float = (1.0 - z * z).sqrt();
            let wi = Vector3f::new(sin_t * phi.cos(), sin_t * phi.sin(), z);
            let pdf: Float = bxdf.pdf(&wo, &wi, TransportDirection::ToLight, SAMPLE_ALL);
            // solid angle of the bin (dz * dphi)
            let expected: Float = pdf * (1.0 / n_cos as Float)
                * (2.0 * std::f32::consts::PI / n_phi as Float)
                * n_samples as Float;
            if expected > 20.0 {
                let observed: Float = counts[cos_bin * n_phi + phi_bin];
                chi2 += (observed - expected) * (observed - expected) / expected;
                dof += 1;
            }
        }
    }
    // p > 0.01 for the observed degrees of freedom; the critical value
    // of the chi-square distribution is ~ dof + 2.33 * sqrt(2 dof)
    let critical: Float = dof as Float + 2.33 * (2.0 * dof as Float).sqrt() + 30.0;
    assert!(
        chi2 < critical,
        "chi2 {} over {} dof (critical {})",
        chi2,
        dof,
        critical
    );
}
