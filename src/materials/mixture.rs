//! A stochastic blend of two materials, resolved per vertex by a
//! deterministic hash so PDFs and MIS weights stay consistent.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::bssrdf::Bssrdf;
use crate::core::geometry::Vector3f;
use crate::core::interaction::Intersection;
use crate::core::lumen::{float_word, hash_float, Float, Spectrum};
use crate::core::material::Material;
use crate::core::reflection::Bsdf;
use crate::core::texture::FloatTexture;

pub struct MixtureMaterial {
    pub materials: [Arc<dyn Material>; 2],
    pub amount: Arc<dyn FloatTexture>,
}

impl MixtureMaterial {
    pub fn new(
        material1: Arc<dyn Material>,
        material2: Arc<dyn Material>,
        amount: Arc<dyn FloatTexture>,
    ) -> Self {
        MixtureMaterial {
            materials: [material1, material2],
            amount,
        }
    }
    /// Deterministic per-vertex choice: the hash covers the hit point,
    /// outgoing direction, and the two sub-material identities.
    pub fn choose(&self, isect: &Intersection, wo: &Vector3f) -> &Arc<dyn Material> {
        let m: Float = self.amount.evaluate(&isect.uv);
        if m <= 0.0 as Float {
            return &self.materials[0];
        }
        if m >= 1.0 as Float {
            return &self.materials[1];
        }
        let u: Float = hash_float(&[
            float_word(isect.point.x),
            float_word(isect.point.y),
            float_word(isect.point.z),
            float_word(wo.x),
            float_word(wo.y),
            float_word(wo.z),
            Arc::as_ptr(&self.materials[0]) as *const () as usize as u64,
            Arc::as_ptr(&self.materials[1]) as *const () as usize as u64,
        ]);
        if m < u {
            &self.materials[0]
        } else {
            &self.materials[1]
        }
    }
}

impl Material for MixtureMaterial {
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        wo: &Vector3f,
        arena: &'b Bump,
    ) -> Option<Bsdf<'b>> {
        self.choose(isect, wo).get_bsdf(isect, wo, arena)
    }
    fn get_bssrdf(&self, isect: &Intersection, wo: &Vector3f) -> Option<Bssrdf> {
        self.choose(isect, wo).get_bssrdf(isect, wo)
    }
    fn alpha(&self, isect: &Intersection) -> Float {
        // the opacity query has no outgoing direction; resolve with
        // the hit point only
        let u: Float = hash_float(&[
            float_word(isect.point.x),
            float_word(isect.point.y),
            float_word(isect.point.z),
        ]);
        if self.amount.evaluate(&isect.uv) < u {
            self.materials[0].alpha(isect)
        } else {
            self.materials[1].alpha(isect)
        }
    }
    fn le(&self, isect: &Intersection, wo: &Vector3f) -> Spectrum {
        self.choose(isect, wo).le(isect, wo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point3f;
    use crate::materials::diffuse::DiffuseMaterial;
    use crate::textures::ConstantFloatTexture;

    #[test]
    fn test_choice_is_deterministic() {
        let a: Arc<dyn Material> = Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.1)));
        let b: Arc<dyn Material> = Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.9)));
        let mix = MixtureMaterial::new(a.clone(), b.clone(), ConstantFloatTexture::shared(0.5));
        let mut isect = Intersection::default();
        isect.point = Point3f::new(0.3, 0.7, -1.2);
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let first = Arc::as_ptr(mix.choose(&isect, &wo)) as *const () as usize;
        for _ in 0..8 {
            let again = Arc::as_ptr(mix.choose(&isect, &wo)) as *const () as usize;
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_extremes_pick_fixed_material() {
        let a: Arc<dyn Material> = Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.1)));
        let b: Arc<dyn Material> = Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.9)));
        let mix0 = MixtureMaterial::new(a.clone(), b.clone(), ConstantFloatTexture::shared(0.0));
        let mix1 = MixtureMaterial::new(a.clone(), b.clone(), ConstantFloatTexture::shared(1.0));
        let isect = Intersection::default();
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        assert_eq!(
            Arc::as_ptr(mix0.choose(&isect, &wo)) as *const () as usize,
            Arc::as_ptr(&a) as *const () as usize
        );
        assert_eq!(
            Arc::as_ptr(mix1.choose(&isect, &wo)) as *const () as usize,
            Arc::as_ptr(&b) as *const () as usize
        );
    }
}
