//! The abstraction integrators use to draw well-distributed sample
//! values per pixel sample.

// lumen
use crate::core::geometry::{Point2f, Point2i};
use crate::core::lumen::Float;

/// Every sampler produces a stream of 1D and 2D values for one pixel
/// sample at a time; `start_pixel_sample` reseeds the stream so the
/// same (pixel, index) pair always replays the same values.
pub trait Sampler: Send + Sync {
    fn samples_per_pixel(&self) -> i32;
    fn start_pixel_sample(&mut self, pixel: Point2i, sample_index: i32);
    fn get_1d(&mut self) -> Float;
    fn get_2d(&mut self) -> Point2f;
    /// A fresh sampler of the same kind on an independent stream;
    /// workers clone the prototype with a tile-dependent seed.
    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler>;
}
