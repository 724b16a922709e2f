//! Materials map an intersection to the BSDF (and possibly BSSRDF)
//! that scatters light there.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::bssrdf::Bssrdf;
use crate::core::interaction::Intersection;
use crate::core::geometry::Vector3f;
use crate::core::lumen::{Float, Spectrum};
use crate::core::reflection::Bsdf;
use crate::core::texture::SpectrumTexture;

/// Which way radiance flows along the path being built. Importance
/// transport (paths traced from the camera) and radiance transport
/// (paths traced from a light) differ in the eta^2 factor on
/// refraction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TransportDirection {
    /// Importance flows toward the light (camera paths).
    ToLight,
    /// Radiance flows toward the camera (light paths).
    ToCamera,
}

impl TransportDirection {
    pub fn flip(self) -> TransportDirection {
        match self {
            TransportDirection::ToLight => TransportDirection::ToCamera,
            TransportDirection::ToCamera => TransportDirection::ToLight,
        }
    }
}

pub trait Material: Send + Sync {
    /// Build the BSDF for this intersection in the per-sample arena.
    fn get_bsdf<'b>(
        &self,
        isect: &Intersection,
        wo: &Vector3f,
        arena: &'b Bump,
    ) -> Option<Bsdf<'b>>;
    /// Subsurface term, if the material has one.
    fn get_bssrdf(&self, _isect: &Intersection, _wo: &Vector3f) -> Option<Bssrdf> {
        None
    }
    /// Stochastic cutout opacity; 1 means fully present.
    fn alpha(&self, _isect: &Intersection) -> Float {
        1.0
    }
    fn normal_map(&self) -> Option<&Arc<dyn SpectrumTexture>> {
        None
    }
    /// Emitted radiance; non-black only for emissive materials.
    fn le(&self, _isect: &Intersection, _wo: &Vector3f) -> Spectrum {
        Spectrum::default()
    }
    fn is_emissive(&self) -> bool {
        false
    }
}
