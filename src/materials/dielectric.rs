//! Dielectric and thin-dielectric surfaces.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::{Float, Spectrum};
use crate::core::material::Material;
use crate::core::microfacet::TrowbridgeReitzDistribution;
use crate::core::reflection::{Bsdf, Bxdf, DielectricBxdf, ThinDielectricBxdf};
use crate::core::texture::{FloatTexture, SpectrumTexture};
use crate::textures::ConstantFloatTexture;

pub struct DielectricMaterial {
    pub eta: Float,
    pub reflectance: Spectrum,
    pub u_roughness: Arc<dyn FloatTexture>,
    pub v_roughness: Arc<dyn FloatTexture>,
    /// Enable the multiple-scattering compensation lobe.
    pub energy_compensation: bool,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl DielectricMaterial {
    pub fn new(eta: Float, roughness: Float) -> Self {
        DielectricMaterial {
            eta,
            reflectance: Spectrum::new(1.0),
            u_roughness: ConstantFloatTexture::shared(roughness),
            v_roughness: ConstantFloatTexture::shared(roughness),
            energy_compensation: false,
            normalmap: None,
        }
    }
    pub fn with_compensation(eta: Float, roughness: Float) -> Self {
        let mut m: DielectricMaterial = DielectricMaterial::new(eta, roughness);
        m.energy_compensation = true;
        m
    }
}

impl Material for DielectricMaterial {
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
        // the interface flips when the ray arrives from the inside
        let eta_p: Float = if isect.front_face {
            self.eta
        } else {
            1.0 as Float / self.eta
        };
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::Dielectric(DielectricBxdf::new(
                eta_p,
                self.reflectance,
                TrowbridgeReitzDistribution::new(alpha_x, alpha_y),
                self.energy_compensation,
            )),
        ))
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}

pub struct ThinDielectricMaterial {
    pub eta: Float,
}

impl ThinDielectricMaterial {
    pub fn new(eta: Float) -> Self {
        ThinDielectricMaterial { eta }
    }
}

impl Material for ThinDielectricMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::ThinDielectric(ThinDielectricBxdf::new(self.eta)),
        ))
    }
}
