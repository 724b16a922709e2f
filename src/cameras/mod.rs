pub mod orthographic;
pub mod perspective;
pub mod spherical;
