//! The glTF-style metallic-roughness workflow material.

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
use crate::core::reflection::{Bsdf, Bxdf, MetallicRoughnessBxdf};
use crate::core::texture::{FloatTexture, SpectrumTexture};
use crate::textures::{ConstantFloatTexture, ConstantSpectrumTexture};

const MIN_ALPHA: Float = 1e-3;

pub struct MetallicRoughnessMaterial {
    pub basecolor: Arc<dyn SpectrumTexture>,
    pub metallic: Arc<dyn FloatTexture>,
    pub u_roughness: Arc<dyn FloatTexture>,
    pub v_roughness: Arc<dyn FloatTexture>,
    pub emissive: Option<Arc<dyn SpectrumTexture>>,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl MetallicRoughnessMaterial {
    pub fn new(
        basecolor: Arc<dyn SpectrumTexture>,
        metallic: Arc<dyn FloatTexture>,
        roughness: Arc<dyn FloatTexture>,
    ) -> Self {
        MetallicRoughnessMaterial {
            basecolor,
            metallic,
            u_roughness: roughness.clone(),
            v_roughness: roughness,
            emissive: None,
            normalmap: None,
        }
    }
    pub fn from_values(basecolor: Spectrum, metallic: Float, roughness: Float) -> Self {
        MetallicRoughnessMaterial::new(
            ConstantSpectrumTexture::shared(basecolor),
            ConstantFloatTexture::shared(metallic),
            ConstantFloatTexture::shared(roughness),
        )
    }
    fn roughness_to_alpha(roughness: Float) -> Float {
        TrowbridgeReitzDistribution::roughness_to_alpha(roughness).max(MIN_ALPHA)
    }
}

impl Material for MetallicRoughnessMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        let alpha_x: Float =
            MetallicRoughnessMaterial::roughness_to_alpha(self.u_roughness.evaluate(&isect.uv));
        let alpha_y: Float =
            MetallicRoughnessMaterial::roughness_to_alpha(self.v_roughness.evaluate(&isect.uv));
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::MetallicRoughness(MetallicRoughnessBxdf::new(
                self.basecolor.evaluate(&isect.uv),
                self.metallic.evaluate(&isect.uv),
                TrowbridgeReitzDistribution::new(alpha_x, alpha_y),
            )),
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
