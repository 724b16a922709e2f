//! Reconstruction filters: box, tent, and gaussian.

// lumen
use crate::core::filter::Filter;
use crate::core::geometry::Point2f;
use crate::core::lumen::{sqr, Float};
use crate::core::sampling::{gaussian, Distribution2D};

pub struct BoxFilter {
    pub extent: Float,
}

impl BoxFilter {
    pub fn new(extent: Float) -> Self {
        BoxFilter { extent }
    }
}

impl Filter for BoxFilter {
    fn extent(&self) -> Float {
        self.extent
    }
    fn evaluate(&self, p: &Point2f) -> Float {
        let half_extent: Float = self.extent / 2.0;
        if p.x.abs() <= half_extent && p.y.abs() <= half_extent {
            1.0 as Float / sqr(self.extent)
        } else {
            0.0
        }
    }
    fn sample(&self, u: &Point2f) -> Point2f {
        // remap [0,1]^2 to [-half_extent, half_extent]^2
        Point2f {
            x: (2.0 as Float * u.x - 1.0) * self.extent / 2.0,
            y: (2.0 as Float * u.y - 1.0) * self.extent / 2.0,
        }
    }
}

pub struct TentFilter {
    pub extent: Float,
}

impl TentFilter {
    pub fn new(extent: Float) -> Self {
        TentFilter { extent }
    }
    fn sample_1d(&self, u: Float) -> Float {
        let half_extent: Float = self.extent / 2.0;
        if u < 0.5 {
            half_extent * ((2.0 as Float * u).sqrt() - 1.0)
        } else {
            half_extent * (1.0 as Float - (1.0 as Float - 2.0 as Float * (u - 0.5)).sqrt())
        }
    }
}

impl Filter for TentFilter {
    fn extent(&self) -> Float {
        self.extent
    }
    fn evaluate(&self, p: &Point2f) -> Float {
        let half_extent: Float = self.extent / 2.0;
        let dist_x: Float = p.x.abs();
        let dist_y: Float = p.y.abs();
        if dist_x > half_extent || dist_y > half_extent {
            return 0.0;
        }
        let inv_r: Float = 1.0 as Float / half_extent;
        (half_extent - dist_x) * (half_extent - dist_y) * sqr(sqr(inv_r))
    }
    fn sample(&self, u: &Point2f) -> Point2f {
        Point2f {
            x: self.sample_1d(u.x),
            y: self.sample_1d(u.y),
        }
    }
}

pub struct GaussianFilter {
    pub sigma: Float,
    pub extent: Float,
    dist: Distribution2D,
}

impl GaussianFilter {
    pub fn new(sigma: Float, extent: Float) -> Self {
        // tabulate the truncated gaussian for inverse-CDF sampling
        let samples: i32 = 32;
        let mut values: Vec<Float> = Vec::with_capacity((samples * samples) as usize);
        let half_extent: Float = extent / 2.0;
        for y in 0..samples {
            for x in 0..samples {
                let p: Point2f = Point2f {
                    x: (x as Float + 0.5) / samples as Float * extent - half_extent,
                    y: (y as Float + 0.5) / samples as Float * extent - half_extent,
                };
                values.push(gaussian(p.x, 0.0, sigma) * gaussian(p.y, 0.0, sigma));
            }
        }
        GaussianFilter {
            sigma,
            extent,
            dist: Distribution2D::new(values, samples, samples),
        }
    }
}

impl Filter for GaussianFilter {
    fn extent(&self) -> Float {
        self.extent
    }
    fn evaluate(&self, p: &Point2f) -> Float {
        let half_extent: Float = self.extent / 2.0;
        if p.x.abs() > half_extent || p.y.abs() > half_extent {
            return 0.0;
        }
        let unit: Point2f = Point2f {
            x: p.x / self.extent + 0.5,
            y: p.y / self.extent + 0.5,
        };
        self.dist.pdf(unit) / sqr(self.extent)
    }
    fn sample(&self, u: &Point2f) -> Point2f {
        let mut pdf: Float = 0.0;
        let s: Point2f = self.dist.sample_continuous(*u, &mut pdf);
        Point2f {
            x: s.x * self.extent - self.extent / 2.0,
            y: s.y * self.extent - self.extent / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrates_to_one(filter: &dyn Filter) -> Float {
        let n: i32 = 128;
        let extent: Float = filter.extent();
        let mut sum: Float = 0.0;
        for y in 0..n {
            for x in 0..n {
                let p = Point2f {
                    x: (x as Float + 0.5) / n as Float * extent - extent / 2.0,
                    y: (y as Float + 0.5) / n as Float * extent - extent / 2.0,
                };
                sum += filter.evaluate(&p);
            }
        }
        sum * sqr(extent / n as Float)
    }

    #[test]
    fn test_partition_of_unity() {
        assert!((integrates_to_one(&BoxFilter::new(1.0)) - 1.0).abs() < 1e-3);
        assert!((integrates_to_one(&TentFilter::new(2.0)) - 1.0).abs() < 1e-2);
        assert!((integrates_to_one(&GaussianFilter::new(0.5, 3.0)) - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_samples_stay_in_support() {
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(BoxFilter::new(1.0)),
            Box::new(TentFilter::new(2.0)),
            Box::new(GaussianFilter::new(0.5, 3.0)),
        ];
        for f in &filters {
            for i in 0..64 {
                let u = Point2f::new(
                    (i as Float + 0.5) / 64.0,
                    ((i * 13 % 64) as Float + 0.5) / 64.0,
                );
                let p = f.sample(&u);
                assert!(p.x.abs() <= f.extent() / 2.0 + 1e-4);
                assert!(p.y.abs() <= f.extent() / 2.0 + 1e-4);
                assert!(f.evaluate(&p) >= 0.0);
            }
        }
    }
}
