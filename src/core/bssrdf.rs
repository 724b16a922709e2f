//! The bidirectional scattering surface reflectance distribution
//! function (BSSRDF) gives exitant radiance at a point on a surface
//! given incident differential irradiance at another point.

// std
use std::f32::consts::PI;
// others
use smallvec::SmallVec;
use strum::IntoEnumIterator;
// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{
    nrm_dot_nrmf, pnt3_distancef, vec3_dot_vec3f, Normal3f, Point2f, Point3f, Ray, Vector3f,
};
use crate::core::interaction::Intersection;
use crate::core::lumen::{clamp_t, Float, Spectrum, FLOAT_ONE_MINUS_EPSILON, RAY_EPSILON};
use crate::core::medium::HenyeyGreenstein;
use crate::core::primitive::Intersectable;
use crate::core::sampler::Sampler;
use crate::core::sampling::sample_exponential;
use crate::core::spectrum::RgbEnum;

/// Probability of probing along each of the local frame axes; the
/// shading normal is favored.
const AXIS_PROBS: [Float; 3] = [0.25, 0.25, 0.5];
const MAX_PROBE_HITS: usize = 8;

/// Shared state of the separable BSSRDFs: exit point, frame, relative
/// index, and the identity of the owning material so probes only
/// accept hits on the same surface.
#[derive(Clone)]
pub struct SeparableBssrdfCore {
    pub po_point: Point3f,
    pub po_wo: Vector3f,
    pub eta: Float,
    pub ns: Normal3f,
    pub ss: Vector3f,
    pub ts: Vector3f,
    pub material_key: usize,
}

impl SeparableBssrdfCore {
    pub fn new(isect: &Intersection, wo: &Vector3f, eta: Float, material_key: usize) -> Self {
        let ns: Normal3f = isect.shading.n;
        let frame: Frame = Frame::from_z(&Vector3f::from(ns).normalize());
        SeparableBssrdfCore {
            po_point: isect.point,
            po_wo: *wo,
            eta,
            ns,
            ss: frame.x,
            ts: frame.y,
            material_key,
        }
    }
}

/// A successfully probed exit point plus the spatial term and its
/// density.
pub struct BssrdfSample<'a> {
    pub pi: Intersection<'a>,
    pub sp: Spectrum,
    pub pdf: Float,
}

fn same_material(isect: &Intersection, key: usize) -> bool {
    if let Some(prim) = isect.primitive {
        if let Some(ref material) = prim.material {
            return std::sync::Arc::as_ptr(material) as *const () as usize == key;
        }
    }
    false
}

// ------------------------------------------------------------------
// Disney diffusion profile
// ------------------------------------------------------------------

/// Two-exponential approximation of the diffusion profile.
#[derive(Clone)]
pub struct DisneyBssrdf {
    pub core: SeparableBssrdfCore,
    pub r: Spectrum,
    pub d: Spectrum,
}

impl DisneyBssrdf {
    pub fn new(core: SeparableBssrdfCore, r: Spectrum, d: Spectrum) -> Self {
        DisneyBssrdf { core, r, d }
    }
    pub fn sr(&self, r: Float) -> Spectrum {
        let r: Float = r.max(1e-6);
        let exp1: Spectrum = (Spectrum::new(-r) / self.d).exp();
        let exp2: Spectrum = (Spectrum::new(-r) / (self.d * 3.0)).exp();
        self.r * (exp1 + exp2) / (self.d * (8.0 * PI * r))
    }
    pub fn sample_sr(&self, wavelength: RgbEnum, u: Float) -> Float {
        let d: Float = self.d[wavelength];
        if u < 0.25 {
            // sample the first exponential
            let u: Float = (u * 4.0).min(FLOAT_ONE_MINUS_EPSILON);
            d * (1.0 as Float / (1.0 as Float - u)).ln()
        } else {
            // the second exponential
            let u: Float = ((u - 0.25) / 0.75).min(FLOAT_ONE_MINUS_EPSILON);
            3.0 as Float * d * (1.0 as Float / (1.0 as Float - u)).ln()
        }
    }
    pub fn pdf_sr(&self, r: Float) -> Spectrum {
        let r: Float = r.max(1e-6);
        let exp1: Spectrum = (Spectrum::new(-r) / self.d).exp();
        let exp2: Spectrum = (Spectrum::new(-r) / (self.d * 3.0)).exp();
        // weighted mixture of the two exponentials' radial densities
        exp1 * 0.25 / (self.d * (2.0 * PI * r)) + exp2 * 0.75 / (self.d * (6.0 * PI * r))
    }
    pub fn max_sr(&self, wavelength: RgbEnum) -> Float {
        self.sample_sr(wavelength, 0.999)
    }
}

// ------------------------------------------------------------------
// Random-walk subsurface scattering
// ------------------------------------------------------------------

/// Brute-force volumetric subsurface scattering: walk through the
/// interior until the path exits through the same surface.
#[derive(Clone)]
pub struct RandomWalkBssrdf {
    pub core: SeparableBssrdfCore,
    pub reflectance: Spectrum,
    pub sigma_t: Spectrum,
    pub g: Float,
}

impl RandomWalkBssrdf {
    pub fn new(
        core: SeparableBssrdfCore,
        reflectance: Spectrum,
        sigma_t: Spectrum,
        g: Float,
    ) -> Self {
        RandomWalkBssrdf {
            core,
            reflectance,
            sigma_t,
            g,
        }
    }
    /// Single-scattering albedo chosen so that the white-sphere
    /// multiple-scatter limit matches the requested reflectance
    /// (van de Hulst inversion).
    fn walk_albedo(&self) -> Spectrum {
        let mut a: [Float; 3] = [0.0; 3];
        for (ch, out) in a.iter_mut().enumerate() {
            let r: Float = clamp_t(self.reflectance.c[ch], 0.0, 0.999);
            let s: Float =
                4.09712 + 4.20863 * r - (9.59217 + 41.6898 * r + 17.7157 * r * r).sqrt();
            *out = clamp_t(1.0 as Float - s * s, 0.0, 1.0);
        }
        Spectrum { c: a }
    }
    fn walk<'s>(
        &self,
        accel: &'s dyn Intersectable,
        sampler: &mut dyn Sampler,
    ) -> Option<(Intersection<'s>, Spectrum)> {
        let albedo: Spectrum = self.walk_albedo();
        let phase: HenyeyGreenstein = HenyeyGreenstein::new(self.g);
        // refract the entry direction to start inside the surface
        let frame: Frame = Frame::from_z(&-Vector3f::from(self.core.ns).normalize());
        let u_start: Point2f = sampler.get_2d();
        let local: Vector3f = crate::core::sampling::cosine_sample_hemisphere(&u_start);
        let mut w: Vector3f = frame.from_local(&local);
        let mut p: Point3f = self.core.po_point;
        let mut beta: Spectrum = Spectrum::new(1.0);
        let max_bounces: i32 = 256;
        for _ in 0..max_bounces {
            // sample the flight distance on a uniformly chosen channel
            let ch: usize = clamp_t((sampler.get_1d() * 3.0) as usize, 0, 2);
            let sigma: Float = self.sigma_t.c[ch];
            if sigma <= 0.0 {
                return None;
            }
            let t: Float = sample_exponential(sampler.get_1d(), sigma);
            let ray: Ray = Ray::new(p, w);
            if let Some(isect) = accel.intersect(&ray, RAY_EPSILON, t) {
                if !same_material(&isect, self.core.material_key) {
                    // the walk escaped into other geometry
                    return None;
                }
                // weight by the per-channel transmittance over the
                // chosen-channel pdf of reaching the surface
                let tr: Spectrum = (self.sigma_t * -isect.t).exp();
                let pdf: Float = (tr.c[0] + tr.c[1] + tr.c[2]) / 3.0;
                if pdf <= 0.0 {
                    return None;
                }
                beta *= tr / pdf;
                return Some((isect, beta));
            }
            // scattered inside the medium
            let tr: Spectrum = (self.sigma_t * -t).exp();
            let density: Spectrum = self.sigma_t * tr;
            let pdf: Float = (density.c[0] + density.c[1] + density.c[2]) / 3.0;
            if pdf <= 0.0 {
                return None;
            }
            beta *= density * albedo / pdf;
            p = ray.position(t);
            let ps = phase.sample_p(&-w, &sampler.get_2d())?;
            w = ps.wi;
            // terminate low-throughput walks
            let survive: Float = beta.max_component_value().min(1.0);
            if survive < 0.25 {
                if sampler.get_1d() > survive {
                    return None;
                }
                beta /= survive;
            }
        }
        None
    }
}

// ------------------------------------------------------------------
// Dispatch
// ------------------------------------------------------------------

#[derive(Clone)]
pub enum Bssrdf {
    Disney(DisneyBssrdf),
    RandomWalk(RandomWalkBssrdf),
}

impl Bssrdf {
    pub fn core(&self) -> &SeparableBssrdfCore {
        match self {
            Bssrdf::Disney(b) => &b.core,
            Bssrdf::RandomWalk(b) => &b.core,
        }
    }
    pub fn eta(&self) -> Float {
        self.core().eta
    }
    /// Sample an exit point on the surface. The returned spatial term
    /// and pdf are combined by the caller as `sp / pdf`; the exit
    /// directional term is the normalized Fresnel lobe.
    pub fn sample_s<'s>(
        &self,
        accel: &'s dyn Intersectable,
        sampler: &mut dyn Sampler,
    ) -> Option<BssrdfSample<'s>> {
        match self {
            Bssrdf::Disney(b) => sample_sp_disney(b, accel, sampler),
            Bssrdf::RandomWalk(b) => {
                let (pi, beta) = b.walk(accel, sampler)?;
                Some(BssrdfSample {
                    pi,
                    sp: beta,
                    pdf: 1.0,
                })
            }
        }
    }
}

/// Projection-based sampling of the diffusion profile: pick an axis
/// and wavelength, sample a radius, then probe the geometry for the
/// actual exit point.
fn sample_sp_disney<'s>(
    bssrdf: &DisneyBssrdf,
    accel: &'s dyn Intersectable,
    sampler: &mut dyn Sampler,
) -> Option<BssrdfSample<'s>> {
    let core: &SeparableBssrdfCore = &bssrdf.core;
    let u1: Float = sampler.get_1d();
    let u2: Point2f = sampler.get_2d();
    // choose the projection axis
    let (vx, vy, vz): (Vector3f, Vector3f, Vector3f);
    let mut u1: Float = u1;
    if u1 < 0.5 {
        vx = core.ss;
        vy = core.ts;
        vz = Vector3f::from(core.ns);
        u1 *= 2.0;
    } else if u1 < 0.75 {
        vx = core.ts;
        vy = Vector3f::from(core.ns);
        vz = core.ss;
        u1 = (u1 - 0.5) * 4.0;
    } else {
        vx = Vector3f::from(core.ns);
        vy = core.ss;
        vz = core.ts;
        u1 = (u1 - 0.75) * 4.0;
    }
    // choose the spectral channel
    let ch: usize = clamp_t((u1 * 3.0) as usize, 0, 2);
    let ch_enum: RgbEnum = match ch {
        0 => RgbEnum::Red,
        1 => RgbEnum::Green,
        _ => RgbEnum::Blue,
    };
    u1 = u1 * 3.0 - ch as Float;
    // sample the profile radius
    let r: Float = bssrdf.sample_sr(ch_enum, u2.x);
    if r < 0.0 {
        return None;
    }
    let phi: Float = 2.0 * PI * u2.y;
    let r_max: Float = bssrdf.max_sr(ch_enum);
    if r >= r_max {
        return None;
    }
    let l: Float = 2.0 * (r_max * r_max - r * r).max(0.0).sqrt();
    // probe segment through the surface
    let start: Point3f =
        core.po_point + (vx * phi.cos() + vy * phi.sin()) * r - vz * (l * 0.5 as Float);
    let target: Point3f = start + vz * l;
    let mut chain: SmallVec<[Intersection; MAX_PROBE_HITS]> = SmallVec::new();
    let mut base: Point3f = start;
    loop {
        if chain.len() >= MAX_PROBE_HITS {
            break;
        }
        let d: Vector3f = target - base;
        let dist: Float = d.length();
        if dist <= RAY_EPSILON {
            break;
        }
        let ray: Ray = Ray::new(base, d / dist);
        match accel.intersect(&ray, RAY_EPSILON, dist) {
            Some(isect) => {
                base = isect.point;
                if same_material(&isect, core.material_key) {
                    chain.push(isect);
                }
            }
            None => break,
        }
    }
    if chain.is_empty() {
        return None;
    }
    let n_found: usize = chain.len();
    let selected: usize = clamp_t((u1 * n_found as Float) as usize, 0, n_found - 1);
    let pi: Intersection = chain[selected].clone();
    let pdf: Float = pdf_sp(bssrdf, &pi) / n_found as Float;
    if pdf <= 0.0 {
        return None;
    }
    let sp: Spectrum = bssrdf.sr(pnt3_distancef(&core.po_point, &pi.point));
    Some(BssrdfSample { pi, sp, pdf })
}

/// Combined density of all axis/channel strategies for an exit point,
/// combined with the balance heuristic.
fn pdf_sp(bssrdf: &DisneyBssrdf, pi: &Intersection) -> Float {
    let core: &SeparableBssrdfCore = &bssrdf.core;
    let d: Vector3f = core.po_point - pi.point;
    let d_local: Vector3f = Vector3f {
        x: vec3_dot_vec3f(&core.ss, &d),
        y: vec3_dot_vec3f(&core.ts, &d),
        z: vec3_dot_vec3f(&Vector3f::from(core.ns), &d),
    };
    let n_local: Normal3f = Normal3f {
        x: vec3_dot_vec3f(&core.ss, &Vector3f::from(pi.n)),
        y: vec3_dot_vec3f(&core.ts, &Vector3f::from(pi.n)),
        z: nrm_dot_nrmf(&core.ns, &pi.n),
    };
    // profile radius under projection along each axis
    let r_proj: [Float; 3] = [
        (d_local.y * d_local.y + d_local.z * d_local.z).sqrt(),
        (d_local.z * d_local.z + d_local.x * d_local.x).sqrt(),
        (d_local.x * d_local.x + d_local.y * d_local.y).sqrt(),
    ];
    let ch_prob: Float = 1.0 as Float / 3.0;
    let mut pdf: Float = 0.0;
    for (axis, axis_prob) in AXIS_PROBS.iter().enumerate() {
        let pdf_r: Spectrum = bssrdf.pdf_sr(r_proj[axis]);
        for ch in RgbEnum::iter() {
            pdf += pdf_r[ch]
                * match axis {
                    0 => n_local.x.abs(),
                    1 => n_local.y.abs(),
                    _ => n_local.z.abs(),
                }
                * ch_prob
                * axis_prob;
        }
    }
    pdf
}

pub fn subsurface_diffusion_scale(reflectance: &Spectrum) -> Spectrum {
    // map surface reflectance to the diffusion length scale
    let r: Spectrum = *reflectance;
    let delta: Spectrum = r - Spectrum::new(0.8);
    Spectrum::new(1.9) - r + delta * delta * 3.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_core() -> SeparableBssrdfCore {
        SeparableBssrdfCore {
            po_point: Point3f::default(),
            po_wo: Vector3f::new(0.0, 0.0, 1.0),
            eta: 1.5,
            ns: Normal3f::new(0.0, 0.0, 1.0),
            ss: Vector3f::new(1.0, 0.0, 0.0),
            ts: Vector3f::new(0.0, 1.0, 0.0),
            material_key: 0,
        }
    }

    #[test]
    fn test_disney_profile_normalized() {
        // integral of Sr over the plane (2 pi r dr) should be close to R
        let b = DisneyBssrdf::new(test_core(), Spectrum::new(0.5), Spectrum::new(1.0));
        let n: usize = 4096;
        let r_max: Float = 40.0;
        let mut sum: Float = 0.0;
        for i in 0..n {
            let r: Float = (i as Float + 0.5) / n as Float * r_max;
            sum += b.sr(r).c[0] * 2.0 * PI * r * (r_max / n as Float);
        }
        assert!((sum - 0.5).abs() < 0.01, "integral {}", sum);
    }

    #[test]
    fn test_sample_sr_inverts_pdf() {
        let b = DisneyBssrdf::new(test_core(), Spectrum::new(1.0), Spectrum::new(0.5));
        // radii sampled at increasing u must be increasing
        let r1: Float = b.sample_sr(RgbEnum::Red, 0.1);
        let r2: Float = b.sample_sr(RgbEnum::Red, 0.2);
        assert!(r1 < r2);
        // pdf integrates to ~1 over the plane
        let n: usize = 8192;
        let r_max: Float = 30.0;
        let mut sum: Float = 0.0;
        for i in 0..n {
            let r: Float = (i as Float + 0.5) / n as Float * r_max;
            sum += b.pdf_sr(r).c[0] * 2.0 * PI * r * (r_max / n as Float);
        }
        assert!((sum - 1.0).abs() < 0.02, "pdf integral {}", sum);
    }

    #[test]
    fn test_diffusion_scale_matches_fit() {
        let s = subsurface_diffusion_scale(&Spectrum::new(0.8));
        assert!((s.c[0] - 1.1).abs() < 1e-5);
    }
}
