//! A physically based offline renderer: Monte Carlo light transport
//! over a closed set of BSDF lobes, with unidirectional and
//! bidirectional path tracing, photon mapping, and participating
//! media.

#[macro_use]
extern crate impl_ops;
#[macro_use]
extern crate strum_macros;

pub mod accelerators;
pub mod blockqueue;
pub mod cameras;
pub mod core;
pub mod filters;
pub mod integrators;
pub mod lights;
pub mod materials;
pub mod media;
pub mod samplers;
pub mod scenes;
pub mod shapes;
pub mod textures;
