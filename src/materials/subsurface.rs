//! Subsurface materials: a diffusion-profile variant and a brute
//! force random-walk variant. Both expose a dielectric interface BSDF
//! and hand the interior over to the BSSRDF.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::bssrdf::{
    subsurface_diffusion_scale, Bssrdf, DisneyBssrdf, RandomWalkBssrdf, SeparableBssrdfCore,
};
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::{Float, Spectrum};
use crate::core::material::Material;
use crate::core::microfacet::TrowbridgeReitzDistribution;
use crate::core::reflection::{Bsdf, Bxdf, DielectricBxdf};
use crate::core::texture::{FloatTexture, SpectrumTexture};
use crate::textures::{ConstantFloatTexture, ConstantSpectrumTexture};

fn material_key(isect: &Intersection) -> usize {
    isect
        .primitive
        .and_then(|prim| prim.material.as_ref())
        .map(|m| Arc::as_ptr(m) as *const () as usize)
        .unwrap_or(0)
}

fn interface_bsdf<'b>(
    isect: &Intersection,
    eta: Float,
    roughness: Float,
    ms: bool,
) -> Option<Bsdf<'b>> {
    let alpha: Float = TrowbridgeReitzDistribution::roughness_to_alpha(roughness);
    let eta_p: Float = if isect.front_face { eta } else { 1.0 as Float / eta };
    Some(Bsdf::new(
        &isect.shading.n,
        &isect.shading.tangent,
        Bxdf::Dielectric(DielectricBxdf::new(
            eta_p,
            Spectrum::new(1.0),
            TrowbridgeReitzDistribution::new(alpha, alpha),
            ms,
        )),
    ))
}

/// Subsurface scattering through the two-exponential diffusion
/// profile.
pub struct SubsurfaceDiffusionMaterial {
    pub reflectance: Arc<dyn SpectrumTexture>,
    /// Mean free path per channel.
    pub mfp: Spectrum,
    pub eta: Float,
    pub roughness: Arc<dyn FloatTexture>,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl SubsurfaceDiffusionMaterial {
    pub fn new(reflectance: Spectrum, mfp: Spectrum, eta: Float, roughness: Float) -> Self {
        SubsurfaceDiffusionMaterial {
            reflectance: ConstantSpectrumTexture::shared(reflectance),
            mfp,
            eta,
            roughness: ConstantFloatTexture::shared(roughness),
            normalmap: None,
        }
    }
}

impl Material for SubsurfaceDiffusionMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        interface_bsdf(isect, self.eta, self.roughness.evaluate(&isect.uv), true)
    }
    fn get_bssrdf(&self, isect: &Intersection, wo: &Vector3f) -> Option<Bssrdf> {
        let r: Spectrum = self.reflectance.evaluate(&isect.uv);
        let d: Spectrum = self.mfp / subsurface_diffusion_scale(&r);
        Some(Bssrdf::Disney(DisneyBssrdf::new(
            SeparableBssrdfCore::new(isect, wo, self.eta, material_key(isect)),
            r,
            d,
        )))
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}

/// Subsurface scattering by explicit volumetric random walk.
pub struct SubsurfaceRandomWalkMaterial {
    pub reflectance: Arc<dyn SpectrumTexture>,
    pub mfp: Spectrum,
    pub eta: Float,
    pub roughness: Arc<dyn FloatTexture>,
    pub g: Float,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl SubsurfaceRandomWalkMaterial {
    pub fn new(reflectance: Spectrum, mfp: Spectrum, eta: Float, roughness: Float, g: Float) -> Self {
        SubsurfaceRandomWalkMaterial {
            reflectance: ConstantSpectrumTexture::shared(reflectance),
            mfp,
            eta,
            roughness: ConstantFloatTexture::shared(roughness),
            g,
            normalmap: None,
        }
    }
}

impl Material for SubsurfaceRandomWalkMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        interface_bsdf(isect, self.eta, self.roughness.evaluate(&isect.uv), false)
    }
    fn get_bssrdf(&self, isect: &Intersection, wo: &Vector3f) -> Option<Bssrdf> {
        let sigma_t: Spectrum = Spectrum::rgb(
            1.0 as Float / self.mfp.c[0],
            1.0 as Float / self.mfp.c[1],
            1.0 as Float / self.mfp.c[2],
        );
        Some(Bssrdf::RandomWalk(RandomWalkBssrdf::new(
            SeparableBssrdfCore::new(isect, wo, self.eta, material_key(isect)),
            self.reflectance.evaluate(&isect.uv),
            sigma_t,
            self.g,
        )))
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}
