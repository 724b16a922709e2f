//! Stratified sampling with per-dimension permutations, so each pixel
//! sees a jittered stratum in every dimension without banding.

// lumen
use crate::core::geometry::{Point2f, Point2i};
use crate::core::lumen::{hash_u64, permutation_element, Float};
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;

pub struct StratifiedSampler {
    x_samples: i32,
    y_samples: i32,
    jitter: bool,
    seed: u64,
    rng: Rng,
    pixel: Point2i,
    sample_index: i32,
    dimension: i32,
}

impl StratifiedSampler {
    pub fn new(x_samples: i32, y_samples: i32, jitter: bool, seed: u64) -> Self {
        StratifiedSampler {
            x_samples,
            y_samples,
            jitter,
            seed,
            rng: Rng::new(seed, 0),
            pixel: Point2i::default(),
            sample_index: 0,
            dimension: 0,
        }
    }
}

impl Sampler for StratifiedSampler {
    fn samples_per_pixel(&self) -> i32 {
        self.x_samples * self.y_samples
    }
    fn start_pixel_sample(&mut self, pixel: Point2i, sample_index: i32) {
        self.pixel = pixel;
        self.sample_index = sample_index;
        self.dimension = 0;
        self.rng.set_sequence(
            hash_u64(&[pixel.x as u64, pixel.y as u64, self.seed]),
            sample_index as u64,
        );
    }
    fn get_1d(&mut self) -> Float {
        // permute the stratum assignment so consecutive sample indices
        // don't walk the strata in order
        let hash: u64 = hash_u64(&[
            self.seed,
            self.pixel.x as u64,
            self.pixel.y as u64,
            self.dimension as u64,
        ]);
        let stratum: u32 = permutation_element(
            self.sample_index as u32,
            self.samples_per_pixel() as u32,
            hash as u32,
        );
        self.dimension += 1;
        let delta: Float = if self.jitter {
            self.rng.uniform_float()
        } else {
            0.5
        };
        (stratum as Float + delta) / self.samples_per_pixel() as Float
    }
    fn get_2d(&mut self) -> Point2f {
        let hash: u64 = hash_u64(&[
            self.seed,
            self.pixel.x as u64,
            self.pixel.y as u64,
            self.dimension as u64,
        ]);
        let stratum: u32 = permutation_element(
            self.sample_index as u32,
            self.samples_per_pixel() as u32,
            hash as u32,
        );
        self.dimension += 2;
        let x: i32 = stratum as i32 % self.x_samples;
        let y: i32 = stratum as i32 / self.x_samples;
        let dx: Float = if self.jitter {
            self.rng.uniform_float()
        } else {
            0.5
        };
        let dy: Float = if self.jitter {
            self.rng.uniform_float()
        } else {
            0.5
        };
        Point2f {
            x: (x as Float + dx) / self.x_samples as Float,
            y: (y as Float + dy) / self.y_samples as Float,
        }
    }
    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler> {
        Box::new(StratifiedSampler::new(
            self.x_samples,
            self.y_samples,
            self.jitter,
            hash_u64(&[self.seed, seed]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_dimension_covers_all_strata() {
        let mut s = StratifiedSampler::new(4, 4, true, 0);
        let spp: i32 = s.samples_per_pixel();
        let mut seen: Vec<bool> = vec![false; spp as usize];
        for i in 0..spp {
            s.start_pixel_sample(Point2i::new(1, 2), i);
            let u: Float = s.get_1d();
            let stratum: usize = (u * spp as Float) as usize;
            assert!(!seen[stratum]);
            seen[stratum] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }

    #[test]
    fn test_2d_strata_cover_grid() {
        let mut s = StratifiedSampler::new(4, 4, true, 0);
        let mut seen: Vec<bool> = vec![false; 16];
        for i in 0..16 {
            s.start_pixel_sample(Point2i::new(0, 0), i);
            let u: Point2f = s.get_2d();
            let cell: usize = (u.y * 4.0) as usize * 4 + (u.x * 4.0) as usize;
            seen[cell] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }
}
