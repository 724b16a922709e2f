//! A single uber material combining metal, dielectric transmission,
//! clearcoat, sheen, and anisotropy.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::{Point2f, Vector3f};
use crate::core::interaction::Intersection;
use crate::core::lumen::{Float, Spectrum};
use crate::core::material::Material;
use crate::core::microfacet::{CharlieSheenDistribution, TrowbridgeReitzDistribution};
use crate::core::reflection::{Bsdf, Bxdf, PrincipledBxdf};
use crate::core::texture::{FloatTexture, SpectrumTexture};
use crate::textures::{ConstantFloatTexture, ConstantSpectrumTexture};

const MIN_ALPHA: Float = 1e-3;

pub struct PrincipledMaterial {
    pub basecolor: Arc<dyn SpectrumTexture>,
    pub metallic: Arc<dyn FloatTexture>,
    pub roughness: Arc<dyn FloatTexture>,
    pub anisotropy: Float,
    pub eta: Float,
    pub transmission: Arc<dyn FloatTexture>,
    pub clearcoat: Float,
    pub clearcoat_roughness: Float,
    pub clearcoat_color: Spectrum,
    pub sheen: Float,
    pub sheen_roughness: Float,
    pub sheen_color: Spectrum,
    pub emissive: Option<Arc<dyn SpectrumTexture>>,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl PrincipledMaterial {
    pub fn from_values(
        basecolor: Spectrum,
        metallic: Float,
        roughness: Float,
        eta: Float,
        transmission: Float,
    ) -> Self {
        PrincipledMaterial {
            basecolor: ConstantSpectrumTexture::shared(basecolor),
            metallic: ConstantFloatTexture::shared(metallic),
            roughness: ConstantFloatTexture::shared(roughness),
            anisotropy: 0.0,
            eta,
            transmission: ConstantFloatTexture::shared(transmission),
            clearcoat: 0.0,
            clearcoat_roughness: 0.1,
            clearcoat_color: Spectrum::new(1.0),
            sheen: 0.0,
            sheen_roughness: 0.3,
            sheen_color: Spectrum::new(1.0),
            emissive: None,
            normalmap: None,
        }
    }
    /// Per-axis alphas for a roughness/anisotropy pair.
    pub fn roughness_to_alpha(roughness: Float, anisotropy: Float) -> Point2f {
        let alpha: Float = TrowbridgeReitzDistribution::roughness_to_alpha(roughness).max(MIN_ALPHA);
        let ratio: Float = (1.0 as Float - 0.9 * anisotropy).sqrt();
        Point2f {
            x: alpha / ratio,
            y: alpha * ratio,
        }
    }
}

impl Material for PrincipledMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        let alpha: Point2f = PrincipledMaterial::roughness_to_alpha(
            self.roughness.evaluate(&isect.uv),
            self.anisotropy,
        );
        let alpha_cc: Float =
            TrowbridgeReitzDistribution::roughness_to_alpha(self.clearcoat_roughness)
                .max(MIN_ALPHA);
        let eta_p: Float = if isect.front_face {
            self.eta
        } else {
            1.0 as Float / self.eta
        };
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::Principled(PrincipledBxdf {
                color: self.basecolor.evaluate(&isect.uv),
                metallic: self.metallic.evaluate(&isect.uv),
                mf: TrowbridgeReitzDistribution::new(alpha.x, alpha.y),
                eta: eta_p,
                transmission: self.transmission.evaluate(&isect.uv),
                clearcoat: self.clearcoat,
                mf_clearcoat: TrowbridgeReitzDistribution::new(alpha_cc, alpha_cc),
                clearcoat_color: self.clearcoat_color,
                sheen: self.sheen,
                mf_sheen: CharlieSheenDistribution::new(self.sheen_roughness),
                sheen_color: self.sheen_color,
            }),
        ))
    }
    fn le(&self, isect: &Intersection, _wo: &Vector3f) -> Spectrum {
        match &self.emissive {
            Some(emissive) if isect.front_face => emissive.evaluate(&isect.uv),
            _ => Spectrum::default(),
        }
    }
    fn is_emissive(&self) -> bool {
        self.emissive.is_some()
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}
