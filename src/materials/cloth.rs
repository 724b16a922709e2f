//! Fabric surfaces driven by the Charlie sheen lobe.

// others
use bumpalo::Bump;
// lumen
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::{Float, Spectrum};
use crate::core::material::Material;
use crate::core::microfacet::{CharlieSheenDistribution, TrowbridgeReitzDistribution};
use crate::core::reflection::{Bsdf, Bxdf, SheenBxdf};

pub struct ClothMaterial {
    pub basecolor: Spectrum,
    pub sheen_color: Spectrum,
    pub roughness: Float,
}

impl ClothMaterial {
    pub fn new(basecolor: Spectrum, sheen_color: Spectrum, roughness: Float) -> Self {
        ClothMaterial {
            basecolor,
            sheen_color,
            roughness,
        }
    }
}

impl Material for ClothMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        _wo: &Vector3f,
        _arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        let alpha: Float =
            TrowbridgeReitzDistribution::roughness_to_alpha(self.roughness).max(1e-3);
        Some(Bsdf::new(
            &isect.shading.n,
            &isect.shading.tangent,
            Bxdf::Sheen(SheenBxdf::new(
                self.basecolor,
                self.sheen_color,
                CharlieSheenDistribution::new(alpha),
            )),
        ))
    }
}
