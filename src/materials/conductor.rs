//! Metal surfaces parameterized either by complex index of refraction
//! or by reflectance.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::{clamp_t, Float, Spectrum};
use crate::core::material::Material;
use crate::core::microfacet::TrowbridgeReitzDistribution;
use crate::core::reflection::{Bsdf, Bxdf, ConductorBxdf};
use crate::core::texture::{FloatTexture, SpectrumTexture};
use crate::textures::ConstantFloatTexture;

pub struct ConductorMaterial {
    pub eta: Spectrum,
    pub k: Spectrum,
    pub u_roughness: Arc<dyn FloatTexture>,
    pub v_roughness: Arc<dyn FloatTexture>,
    pub energy_compensation: bool,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl ConductorMaterial {
    pub fn new(eta: Spectrum, k: Spectrum, roughness: Float, energy_compensation: bool) -> Self {
        ConductorMaterial {
            eta,
            k,
            u_roughness: ConstantFloatTexture::shared(roughness),
            v_roughness: ConstantFloatTexture::shared(roughness),
            energy_compensation,
            normalmap: None,
        }
    }
    /// Build from a target normal-incidence reflectance instead of
    /// measured constants.
    pub fn from_reflectance(reflectance: Spectrum, roughness: Float, energy_compensation: bool) -> Self {
        let mut k: [Float; 3] = [0.0; 3];
        for ch in 0..3 {
            let r: Float = clamp_t(reflectance.c[ch], 0.0, 0.9999);
            k[ch] = 2.0 as Float * r.sqrt() / (1.0 as Float - r).sqrt();
        }
        ConductorMaterial::new(Spectrum::new(1.0), Spectrum { c: k }, roughness, energy_compensation)
    }
}

impl Material for ConductorMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        let alpha_x: Float =
            TrowbridgeReitzDistribution::roughness_to_alpha(self.u_roughness.evaluate(&isect.uv));
        let alpha_y: Float =
            TrowbridgeReitzDistribution::roughness_to_alpha(self.v_roughness.evaluate(&isect.uv));
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::Conductor(ConductorBxdf::new(
                self.eta,
                self.k,
                TrowbridgeReitzDistribution::new(alpha_x, alpha_y),
                self.energy_compensation,
            )),
        ))
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scattering::fr_complex;

    #[test]
    fn test_reflectance_inversion() {
        // eta=1 with the fitted k reproduces the requested normal
        // incidence reflectance
        let target: Float = 0.8;
        let m = ConductorMaterial::from_reflectance(Spectrum::new(target), 0.2, false);
        let f = fr_complex(1.0, m.eta, m.k);
        assert!((f.c[0] - target).abs() < 1e-3, "got {}", f.c[0]);
    }
}
