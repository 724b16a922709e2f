//! The simplest sampler: every dimension is an independent uniform
//! variate from a per-pixel-sample PCG stream.

// lumen
use crate::core::geometry::{Point2f, Point2i};
use crate::core::lumen::{hash_u64, Float};
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;

pub struct IndependentSampler {
    samples_per_pixel: i32,
    seed: u64,
    rng: Rng,
}

impl IndependentSampler {
    pub fn new(samples_per_pixel: i32, seed: u64) -> Self {
        IndependentSampler {
            samples_per_pixel,
            seed,
            rng: Rng::new(seed, 0),
        }
    }
}

impl Sampler for IndependentSampler {
    fn samples_per_pixel(&self) -> i32 {
        self.samples_per_pixel
    }
    fn start_pixel_sample(&mut self, pixel: Point2i, sample_index: i32) {
        self.rng.set_sequence(
            hash_u64(&[pixel.x as u64, pixel.y as u64, self.seed]),
            sample_index as u64,
        );
    }
    fn get_1d(&mut self) -> Float {
        self.rng.uniform_float()
    }
    fn get_2d(&mut self) -> Point2f {
        Point2f {
            x: self.rng.uniform_float(),
            y: self.rng.uniform_float(),
        }
    }
    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler> {
        Box::new(IndependentSampler::new(
            self.samples_per_pixel,
            hash_u64(&[self.seed, seed]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_sample_replay() {
        let mut s = IndependentSampler::new(16, 1);
        s.start_pixel_sample(Point2i::new(3, 5), 7);
        let a: Vec<Float> = (0..8).map(|_| s.get_1d()).collect();
        s.start_pixel_sample(Point2i::new(3, 5), 7);
        let b: Vec<Float> = (0..8).map(|_| s.get_1d()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_clone_decorrelates() {
        let s = IndependentSampler::new(16, 1);
        let mut a = s.clone_with_seed(1);
        let mut b = s.clone_with_seed(2);
        a.start_pixel_sample(Point2i::new(0, 0), 0);
        b.start_pixel_sample(Point2i::new(0, 0), 0);
        assert_ne!(a.get_1d(), b.get_1d());
    }
}
