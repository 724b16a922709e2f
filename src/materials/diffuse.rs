//! Diffuse surfaces: Lambertian when perfectly smooth, the
//! energy-preserving Oren-Nayar lobe otherwise.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::Spectrum;
use crate::core::material::Material;
use crate::core::reflection::{Bsdf, Bxdf, EonBxdf, LambertianBxdf};
use crate::core::texture::{FloatTexture, SpectrumTexture};
use crate::textures::{ConstantFloatTexture, ConstantSpectrumTexture};

pub struct DiffuseMaterial {
    pub albedo: Arc<dyn SpectrumTexture>,
    pub roughness: Arc<dyn FloatTexture>,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl DiffuseMaterial {
    pub fn new(
        albedo: Arc<dyn SpectrumTexture>,
        roughness: Arc<dyn FloatTexture>,
        normalmap: Option<Arc<dyn SpectrumTexture>>,
    ) -> Self {
        DiffuseMaterial {
            albedo,
            roughness,
            normalmap,
        }
    }
    pub fn from_color(albedo: Spectrum) -> Self {
        DiffuseMaterial {
            albedo: ConstantSpectrumTexture::shared(albedo),
            roughness: ConstantFloatTexture::shared(0.0),
            normalmap: None,
        }
    }
}

impl Material for DiffuseMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        let albedo: Spectrum = self.albedo.evaluate(&isect.uv);
        let roughness = self.roughness.evaluate(&isect.uv);
        let bxdf: Bxdf = if roughness > 0.0 {
            Bxdf::Eon(EonBxdf::new(albedo, roughness))
        } else {
            Bxdf::Lambertian(LambertianBxdf::new(albedo))
        };
        Some(Bsdf::new(&isect.shading.n, &isect.shading.tangent, bxdf))
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}
