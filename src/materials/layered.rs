//! A material that stacks two other materials' lobes into a single
//! layered BSDF.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::layered::LayeredBxdf;
use crate::core::lumen::{Float, Spectrum};
use crate::core::material::Material;
use crate::core::reflection::{Bsdf, Bxdf};
use crate::core::texture::{FloatTexture, SpectrumTexture};

pub struct LayeredMaterial {
    pub top: Arc<dyn Material>,
    pub bottom: Arc<dyn Material>,
    pub two_sided: bool,
    pub albedo: Spectrum,
    pub thickness: Float,
    pub g: Float,
    pub max_bounces: i32,
    pub samples: i32,
    pub alpha: Option<Arc<dyn FloatTexture>>,
    pub normalmap: Option<Arc<dyn SpectrumTexture>>,
}

impl LayeredMaterial {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        top: Arc<dyn Material>,
        bottom: Arc<dyn Material>,
        two_sided: bool,
        albedo: Spectrum,
        thickness: Float,
        g: Float,
    ) -> Self {
        LayeredMaterial {
            top,
            bottom,
            two_sided,
            albedo,
            thickness,
            g,
            max_bounces: 16,
            samples: 1,
            alpha: None,
            normalmap: None,
        }
    }
}

impl Material for LayeredMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        wo: &Vector3f,
        arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        let top_bsdf: Bsdf<'b> = self.top.get_bsdf(isect, wo, arena)?;
        let bottom_bsdf: Bsdf<'b> = self.bottom.get_bsdf(isect, wo, arena)?;
        // the interface lobes live in the per-sample arena so the
        // layered lobe can borrow them
        let top_bxdf: &'b Bxdf<'b> = arena.alloc(top_bsdf.bxdf);
        let bottom_bxdf: &'b Bxdf<'b> = arena.alloc(bottom_bsdf.bxdf);
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::Layered(LayeredBxdf::new(
                top_bxdf,
                bottom_bxdf,
                self.two_sided,
                self.albedo,
                self.thickness,
                self.g,
                self.max_bounces,
                self.samples,
            )),
        ))
    }
    fn alpha(&self, isect: &Intersection) -> Float {
        match &self.alpha {
            Some(alpha) => alpha.evaluate(&isect.uv),
            None => 1.0,
        }
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        self.normalmap.as_ref()
    }
}
