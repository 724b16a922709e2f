//! Perfect mirror.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::Spectrum;
use crate::core::material::Material;
use crate::core::reflection::{Bsdf, Bxdf, SpecularReflectionBxdf};
use crate::core::texture::SpectrumTexture;
use crate::textures::ConstantSpectrumTexture;

pub struct MirrorMaterial {
    pub reflectance: Arc<dyn SpectrumTexture>,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl MirrorMaterial {
    pub fn new(
        reflectance: Arc<dyn SpectrumTexture>,
        normalmap: Option<Arc<dyn SpectrumTexture>>,
    ) -> Self {
        MirrorMaterial {
            reflectance,
            normalmap,
        }
    }
    pub fn from_color(reflectance: Spectrum) -> Self {
        MirrorMaterial {
            reflectance: ConstantSpectrumTexture::shared(reflectance),
            normalmap: None,
        }
    }
}

impl Material for MirrorMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::SpecRefl(SpecularReflectionBxdf::new(
                self.reflectance.evaluate(&isect.uv),
            )),
        ))
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}
