//! The emissive material bound to diffuse area lights.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::Spectrum;
use crate::core::material::Material;
use crate::core::reflection::{Bsdf, Bxdf, LambertianBxdf};
use crate::core::texture::SpectrumTexture;
use crate::textures::ConstantSpectrumTexture;

pub struct DiffuseLightMaterial {
    pub emission: Arc<dyn SpectrumTexture>,
    pub two_sided: bool,
}

impl DiffuseLightMaterial {
    pub fn new(emission: Arc<dyn SpectrumTexture>, two_sided: bool) -> Self {
        DiffuseLightMaterial {
            emission,
            two_sided,
        }
    }
    pub fn from_color(emission: Spectrum, two_sided: bool) -> Self {
        DiffuseLightMaterial {
            emission: ConstantSpectrumTexture::shared(emission),
            two_sided,
        }
    }
}

impl Material for DiffuseLightMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        // emitters absorb whatever reaches them
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::Lambertian(LambertianBxdf::new(Spectrum::default())),
        ))
    }
    fn le(&self, isect: &Intersection, _wo: &Vector3f) -> Spectrum {
        if isect.front_face || self.two_sided {
            self.emission.evaluate(&isect.uv)
        } else {
            Spectrum::default()
        }
    }
    fn is_emissive(&self) -> bool {
        true
    }
}
