pub mod arealight;
pub mod cloth;
pub mod conductor;
pub mod dielectric;
pub mod diffuse;
pub mod layered;
pub mod metallic_roughness;
pub mod mirror;
pub mod mixture;
pub mod principled;
pub mod subsurface;
