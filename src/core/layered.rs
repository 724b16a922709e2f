//! Coated surfaces evaluated by a stochastic random walk between two
//! interface lobes with an optional scattering medium in the slab.

// lumen
use crate::core::geometry::{vec3_same_hemisphere_vec3, Point2f, Vector3f};
use crate::core::lumen::{clamp_t, float_word, hash_u64, lerp, Float, Spectrum};
use crate::core::material::TransportDirection;
use crate::core::medium::HenyeyGreenstein;
use crate::core::microfacet::abs_cos_theta;
use crate::core::reflection::{
    is_specular, Bxdf, BsdfSample, BXDF_GLOSSY, BXDF_REFLECTION, BXDF_SPECULAR, BXDF_TRANSMISSION,
    SAMPLE_ALL, SAMPLE_REFLECTION, SAMPLE_TRANSMISSION,
};
use crate::core::rng::Rng;
use crate::core::sampling::{power_heuristic, sample_exponential, uniform_sphere_pdf};

fn hash_vec(v: &Vector3f) -> u64 {
    hash_u64(&[float_word(v.x), float_word(v.y), float_word(v.z)])
}

/// Slab transmittance along w for a depth difference dz (the slab's
/// extinction is fixed at one; thickness is in optical units).
fn tr(dz: Float, w: &Vector3f) -> Float {
    if dz.abs() <= std::f32::MIN_POSITIVE {
        return 1.0;
    }
    (-(dz / w.z).abs()).exp()
}

#[derive(Clone)]
pub struct LayeredBxdf<'a> {
    pub top: &'a Bxdf<'a>,
    pub bottom: &'a Bxdf<'a>,
    pub two_sided: bool,
    pub albedo: Spectrum,
    pub thickness: Float,
    pub g: Float,
    pub max_bounces: i32,
    pub samples: i32,
}

impl<'a> LayeredBxdf<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        top: &'a Bxdf<'a>,
        bottom: &'a Bxdf<'a>,
        two_sided: bool,
        albedo: Spectrum,
        thickness: Float,
        g: Float,
        max_bounces: i32,
        samples: i32,
    ) -> Self {
        LayeredBxdf {
            top,
            bottom,
            two_sided,
            albedo,
            thickness: thickness.max(1e-4),
            g,
            max_bounces,
            samples,
        }
    }
    pub fn flags(&self) -> u8 {
        let top_flags: u8 = self.top.flags();
        let bottom_flags: u8 = self.bottom.flags();
        let mut flags: u8 = BXDF_REFLECTION;
        if (top_flags & BXDF_TRANSMISSION != 0) && (bottom_flags & BXDF_TRANSMISSION != 0) {
            flags |= BXDF_TRANSMISSION;
        }
        if is_specular(top_flags) && is_specular(bottom_flags) && self.albedo.is_black() {
            flags | BXDF_SPECULAR
        } else {
            flags | BXDF_GLOSSY
        }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f, direction: TransportDirection) -> Spectrum {
        let mut wo: Vector3f = *wo;
        let mut wi: Vector3f = *wi;
        let mut f: Spectrum = Spectrum::default();
        if self.two_sided && wo.z < 0.0 as Float {
            wo = -wo;
            wi = -wi;
        }
        let entered_top: bool = self.two_sided || wo.z > 0.0 as Float;
        let enter_interface: &Bxdf = if entered_top { self.top } else { self.bottom };
        let exit_bottom: bool = vec3_same_hemisphere_vec3(&wo, &wi) ^ entered_top;
        let (exit_interface, non_exit_interface): (&Bxdf, &Bxdf) = if exit_bottom {
            (self.bottom, self.top)
        } else {
            (self.top, self.bottom)
        };
        let z_exit: Float = if exit_bottom { 0.0 } else { self.thickness };
        // part of the BSDF is given by direct reflection off the
        // entrance interface
        if vec3_same_hemisphere_vec3(&wo, &wi) {
            f = enter_interface.f(&wo, &wi, direction) * self.samples as Float;
        }
        let mut rng: Rng = Rng::new(hash_vec(&wo), hash_vec(&wi));
        let phase: HenyeyGreenstein = HenyeyGreenstein::new(self.g);
        for _ in 0..self.samples {
            // transmit through the entrance interface, conditioned on wo;
            // this starts the random walk
            let wo_sample: BsdfSample = match enter_interface.sample_f(
                &wo,
                rng.uniform_float(),
                &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                direction,
                SAMPLE_TRANSMISSION,
            ) {
                Some(s) => s,
                None => continue,
            };
            if wo_sample.f.is_black() || wo_sample.pdf == 0.0 || wo_sample.wi.z == 0.0 {
                continue;
            }
            // transmit through the exit interface conditioned on wi;
            // this is the virtual light the walk connects to
            let wi_sample: BsdfSample = match exit_interface.sample_f(
                &wi,
                rng.uniform_float(),
                &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                direction.flip(),
                SAMPLE_TRANSMISSION,
            ) {
                Some(s) => s,
                None => continue,
            };
            if wi_sample.f.is_black() || wi_sample.pdf == 0.0 || wi_sample.wi.z == 0.0 {
                continue;
            }
            let mut beta: Spectrum = wo_sample.f * abs_cos_theta(&wo_sample.wi) / wo_sample.pdf;
            let mut z: Float = if entered_top { self.thickness } else { 0.0 };
            let mut w: Vector3f = wo_sample.wi;
            let rr_min: Float = 0.25;
            for bounce in 0..self.max_bounces {
                if bounce > 3 {
                    let p: Float = beta.max_component_value();
                    if p < rr_min {
                        if rng.uniform_float() > p {
                            break;
                        }
                        beta /= p;
                    }
                }
                if self.albedo.is_black() {
                    // no medium scattering; advance to the next boundary
                    z = if z == self.thickness { 0.0 } else { self.thickness };
                    beta *= tr(self.thickness, &w);
                } else {
                    let sigma_t: Float = 1.0;
                    let dz: Float =
                        sample_exponential(rng.uniform_float(), sigma_t / w.z.abs());
                    let z_p: Float = if w.z > 0.0 { z + dz } else { z - dz };
                    if 0.0 < z_p && z_p < self.thickness {
                        // scattered in the medium: add the MIS-combined
                        // NEE contribution through the exit interface
                        let mut w_mis: Float = 1.0;
                        if !is_specular(exit_interface.flags()) {
                            w_mis = power_heuristic(
                                1,
                                wi_sample.pdf,
                                1,
                                phase.pdf(&-w, &-wi_sample.wi),
                            );
                        }
                        f += beta
                            * self.albedo
                            * (w_mis
                                * phase.p(&-w, &-wi_sample.wi)
                                * tr(z_p - z_exit, &wi_sample.wi))
                            * wi_sample.f
                            / wi_sample.pdf;
                        // sample the phase function for the next vertex
                        let ps = match phase.sample_p(
                            &-w,
                            &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                        ) {
                            Some(ps) => ps,
                            None => continue,
                        };
                        if ps.pdf == 0.0 || ps.wi.z == 0.0 {
                            continue;
                        }
                        beta *= self.albedo * (ps.p / ps.pdf);
                        w = ps.wi;
                        z = z_p;
                        // phase-sampled contribution through the exit
                        if !is_specular(exit_interface.flags())
                            && ((w.z > 0.0 && z < z_exit) || (w.z < 0.0 && z > z_exit))
                        {
                            let f_exit: Spectrum = exit_interface.f(&-w, &wi, direction);
                            if !f_exit.is_black() {
                                let pdf_exit: Float = exit_interface.pdf(
                                    &-w,
                                    &wi,
                                    direction,
                                    SAMPLE_TRANSMISSION,
                                );
                                let w_mis: Float = power_heuristic(1, ps.pdf, 1, pdf_exit);
                                f += beta * (w_mis * tr(z_p - z_exit, &ps.wi)) * f_exit;
                            }
                        }
                        continue;
                    }
                    z = clamp_t(z_p, 0.0, self.thickness);
                }
                // the walk reached an interface
                if z == z_exit {
                    // no direct contribution here, NEE already accounts
                    // for light through the exit interface
                    let exit_sample: BsdfSample = match exit_interface.sample_f(
                        &-w,
                        rng.uniform_float(),
                        &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                        direction,
                        SAMPLE_REFLECTION,
                    ) {
                        Some(s) => s,
                        None => break,
                    };
                    if exit_sample.f.is_black() || exit_sample.pdf == 0.0 || exit_sample.wi.z == 0.0
                    {
                        break;
                    }
                    beta *= exit_sample.f * abs_cos_theta(&exit_sample.wi) / exit_sample.pdf;
                    w = exit_sample.wi;
                } else {
                    if !is_specular(non_exit_interface.flags()) {
                        // NEE through the non-exit interface
                        let mut w_mis: Float = 1.0;
                        if !is_specular(exit_interface.flags()) {
                            w_mis = power_heuristic(
                                1,
                                wi_sample.pdf,
                                1,
                                non_exit_interface.pdf(&-w, &-wi_sample.wi, direction, SAMPLE_ALL),
                            );
                        }
                        f += beta
                            * non_exit_interface.f(&-w, &-wi_sample.wi, direction)
                            * (w_mis
                                * abs_cos_theta(&wi_sample.wi)
                                * tr(self.thickness, &wi_sample.wi))
                            * wi_sample.f
                            / wi_sample.pdf;
                    }
                    // bounce off the non-exit interface
                    let ref_sample: BsdfSample = match non_exit_interface.sample_f(
                        &-w,
                        rng.uniform_float(),
                        &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                        direction,
                        SAMPLE_REFLECTION,
                    ) {
                        Some(s) => s,
                        None => break,
                    };
                    if ref_sample.f.is_black() || ref_sample.pdf == 0.0 || ref_sample.wi.z == 0.0 {
                        break;
                    }
                    beta *= ref_sample.f * abs_cos_theta(&ref_sample.wi) / ref_sample.pdf;
                    w = ref_sample.wi;
                    if !is_specular(exit_interface.flags()) {
                        // contribution of this bounce through the exit
                        let f_exit: Spectrum = exit_interface.f(&-w, &wi, direction);
                        if !f_exit.is_black() {
                            let mut w_mis: Float = 1.0;
                            if !is_specular(non_exit_interface.flags()) {
                                let pdf_exit: Float = exit_interface.pdf(
                                    &-w,
                                    &wi,
                                    direction,
                                    SAMPLE_TRANSMISSION,
                                );
                                w_mis = power_heuristic(1, ref_sample.pdf, 1, pdf_exit);
                            }
                            f += beta * (w_mis * tr(self.thickness, &ref_sample.wi)) * f_exit;
                        }
                    }
                }
            }
        }
        f / self.samples as Float
    }
    pub fn sample_f(
        &self,
        wo: &Vector3f,
        u0: Float,
        u12: &Point2f,
        direction: TransportDirection,
        flags: u8,
    ) -> Option<BsdfSample> {
        let mut wo: Vector3f = *wo;
        let mut flipped: bool = false;
        if self.two_sided && wo.z < 0.0 as Float {
            wo = -wo;
            flipped = true;
        }
        // sample the entrance interface to get the initial direction
        let entered_top: bool = self.two_sided || wo.z > 0.0 as Float;
        let enter_interface: &Bxdf = if entered_top { self.top } else { self.bottom };
        let mut wo_sample: BsdfSample =
            enter_interface.sample_f(&wo, u0, u12, direction, SAMPLE_ALL)?;
        if wo_sample.f.is_black() || wo_sample.pdf == 0.0 || wo_sample.wi.z == 0.0 {
            return None;
        }
        if wo_sample.is_reflection() {
            if flags & SAMPLE_REFLECTION == 0 {
                return None;
            }
            if flipped {
                wo_sample.wi = -wo_sample.wi;
            }
            wo_sample.pdf_is_proportional = true;
            return Some(wo_sample);
        }
        let mut w: Vector3f = wo_sample.wi;
        let mut was_specular: bool = wo_sample.is_specular();
        let mut rng: Rng = Rng::new(
            hash_vec(&wo),
            hash_u64(&[float_word(u0), float_word(u12.x), float_word(u12.y)]),
        );
        // path state, initialized from the entrance sample
        let mut f: Spectrum = wo_sample.f * abs_cos_theta(&wo_sample.wi);
        let mut pdf: Float = wo_sample.pdf;
        let mut z: Float = if entered_top { self.thickness } else { 0.0 };
        let phase: HenyeyGreenstein = HenyeyGreenstein::new(self.g);
        let rr_min: Float = 0.25;
        for bounce in 0..self.max_bounces {
            if bounce > 3 {
                let beta: Float = f.max_component_value() / pdf;
                if beta < rr_min {
                    if rng.uniform_float() > beta {
                        return None;
                    }
                    pdf *= beta;
                }
            }
            if w.z == 0.0 {
                return None;
            }
            if self.albedo.is_black() {
                z = if z == self.thickness { 0.0 } else { self.thickness };
                f *= tr(self.thickness, &w);
            } else {
                let sigma_t: Float = 1.0;
                let dz: Float = sample_exponential(rng.uniform_float(), sigma_t / w.z.abs());
                let z_p: Float = if w.z > 0.0 { z + dz } else { z - dz };
                if 0.0 < z_p && z_p < self.thickness {
                    let ps = phase.sample_p(
                        &-w,
                        &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                    )?;
                    if ps.pdf == 0.0 || ps.wi.z == 0.0 {
                        return None;
                    }
                    f *= self.albedo * ps.p;
                    pdf *= ps.pdf;
                    was_specular = false;
                    w = ps.wi;
                    z = z_p;
                    continue;
                }
                z = clamp_t(z_p, 0.0, self.thickness);
            }
            let interface: &Bxdf = if z == 0.0 { self.bottom } else { self.top };
            let bs: BsdfSample = match interface.sample_f(
                &-w,
                rng.uniform_float(),
                &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                direction,
                SAMPLE_ALL,
            ) {
                Some(s) => s,
                None => return None,
            };
            if bs.f.is_black() || bs.pdf == 0.0 || bs.wi.z == 0.0 {
                return None;
            }
            f *= bs.f;
            pdf *= bs.pdf;
            was_specular &= bs.is_specular();
            w = bs.wi;
            // the walk leaves the layers on a transmission event
            if bs.is_transmission() {
                let mut sample_flags: u8 = if vec3_same_hemisphere_vec3(&wo, &w) {
                    BXDF_REFLECTION
                } else {
                    BXDF_TRANSMISSION
                };
                sample_flags |= if was_specular { BXDF_SPECULAR } else { BXDF_GLOSSY };
                if flipped {
                    w = -w;
                }
                let mut out: BsdfSample = BsdfSample::new(f, w, pdf, sample_flags);
                out.pdf_is_proportional = true;
                return Some(out);
            }
            f *= abs_cos_theta(&bs.wi);
        }
        None
    }
    pub fn pdf(
        &self,
        wo: &Vector3f,
        wi: &Vector3f,
        direction: TransportDirection,
        flags: u8,
    ) -> Float {
        let mut wo: Vector3f = *wo;
        let mut wi: Vector3f = *wi;
        if self.two_sided && wo.z < 0.0 as Float {
            wo = -wo;
            wi = -wi;
        }
        let entered_top: bool = self.two_sided || wo.z > 0.0 as Float;
        let reflection: bool = vec3_same_hemisphere_vec3(&wo, &wi);
        let mut pdf: Float = 0.0;
        if reflection && (flags & SAMPLE_REFLECTION != 0) {
            // the first R strategy
            pdf += self.samples as Float
                * if entered_top {
                    self.top.pdf(&wo, &wi, direction, SAMPLE_REFLECTION)
                } else {
                    self.bottom.pdf(&wo, &wi, direction, SAMPLE_REFLECTION)
                };
        }
        let mut rng: Rng = Rng::new(hash_vec(&wi), hash_vec(&wo));
        for _ in 0..self.samples {
            if reflection && (flags & SAMPLE_REFLECTION != 0) {
                // estimate the first TRT strategy
                let (r_interface, t_interface): (&Bxdf, &Bxdf) = if entered_top {
                    (self.bottom, self.top)
                } else {
                    (self.top, self.bottom)
                };
                let wo_sample = t_interface.sample_f(
                    &wo,
                    rng.uniform_float(),
                    &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                    direction,
                    SAMPLE_TRANSMISSION,
                );
                let wi_sample = t_interface.sample_f(
                    &wi,
                    rng.uniform_float(),
                    &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                    direction.flip(),
                    SAMPLE_TRANSMISSION,
                );
                if let (Some(wo_sample), Some(wi_sample)) = (wo_sample, wi_sample) {
                    if wo_sample.f.is_black() || wo_sample.pdf == 0.0 {
                        continue;
                    }
                    if wi_sample.f.is_black() || wi_sample.pdf == 0.0 {
                        continue;
                    }
                    if is_specular(t_interface.flags()) {
                        pdf += r_interface.pdf(
                            &-wo_sample.wi,
                            &-wi_sample.wi,
                            direction,
                            SAMPLE_ALL,
                        );
                    } else if let Some(r_sample) = r_interface.sample_f(
                        &-wo_sample.wi,
                        rng.uniform_float(),
                        &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                        direction,
                        SAMPLE_ALL,
                    ) {
                        if r_sample.f.is_black() || r_sample.pdf == 0.0 {
                            continue;
                        }
                        if is_specular(r_interface.flags()) {
                            pdf += t_interface.pdf(&-r_sample.wi, &wi, direction, SAMPLE_ALL);
                        } else {
                            let pdf_r: Float = r_interface.pdf(
                                &-wo_sample.wi,
                                &-wi_sample.wi,
                                direction,
                                SAMPLE_ALL,
                            );
                            pdf += power_heuristic(1, wi_sample.pdf, 1, pdf_r) * pdf_r;
                            let pdf_t: Float =
                                t_interface.pdf(&-r_sample.wi, &wi, direction, SAMPLE_ALL);
                            pdf += power_heuristic(1, r_sample.pdf, 1, pdf_t) * pdf_t;
                        }
                    }
                }
            } else if !reflection && (flags & SAMPLE_TRANSMISSION != 0) {
                // estimate the first TT strategy
                let (to_interface, ti_interface): (&Bxdf, &Bxdf) = if entered_top {
                    (self.top, self.bottom)
                } else {
                    (self.bottom, self.top)
                };
                let wo_sample = match to_interface.sample_f(
                    &wo,
                    rng.uniform_float(),
                    &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                    direction,
                    SAMPLE_ALL,
                ) {
                    Some(s) => s,
                    None => continue,
                };
                if wo_sample.f.is_black()
                    || wo_sample.pdf == 0.0
                    || wo_sample.wi.z == 0.0
                    || wo_sample.is_reflection()
                {
                    continue;
                }
                let wi_sample = match ti_interface.sample_f(
                    &wi,
                    rng.uniform_float(),
                    &Point2f::new(rng.uniform_float(), rng.uniform_float()),
                    direction.flip(),
                    SAMPLE_ALL,
                ) {
                    Some(s) => s,
                    None => continue,
                };
                if wi_sample.f.is_black()
                    || wi_sample.pdf == 0.0
                    || wi_sample.wi.z == 0.0
                    || wi_sample.is_reflection()
                {
                    continue;
                }
                if is_specular(to_interface.flags()) {
                    pdf += ti_interface.pdf(&-wo_sample.wi, &wi, direction, SAMPLE_ALL);
                } else if is_specular(ti_interface.flags()) {
                    pdf += to_interface.pdf(&wo, &-wi_sample.wi, direction, SAMPLE_ALL);
                } else {
                    // combine the two strategies with constant weights
                    let pdf_ti: Float =
                        ti_interface.pdf(&-wo_sample.wi, &wi, direction, SAMPLE_ALL);
                    let pdf_to: Float =
                        to_interface.pdf(&wo, &-wi_sample.wi, direction, SAMPLE_ALL);
                    pdf += 0.5 as Float * (pdf_to + pdf_ti);
                }
            }
        }
        // mix with a uniform-sphere floor; diffuse multiple scattering
        // keeps the estimate away from zero
        lerp(0.9 as Float, uniform_sphere_pdf(), pdf / self.samples as Float)
    }
}
