//! Texture interfaces; implementations live in the `textures` module.

// lumen
use crate::core::geometry::Point2f;
use crate::core::lumen::{Float, Spectrum};

pub trait FloatTexture: Send + Sync {
    fn evaluate(&self, uv: &Point2f) -> Float;
}

pub trait SpectrumTexture: Send + Sync {
    fn evaluate(&self, uv: &Point2f) -> Spectrum;
    /// Mean value over the texture domain, used for light power
    /// estimates.
    fn average(&self) -> Spectrum;
}
