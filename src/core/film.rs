//! The film accumulates filtered radiance samples per pixel, plus an
//! atomic splat plane for contributions arriving from light tracing.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
// others
use atomic::Atomic;
// lumen
use crate::core::filter::Filter;
use crate::core::geometry::{Bounds2i, Point2f, Point2i};
use crate::core::lumen::{clamp_t, Float, Spectrum};

#[derive(Debug, Default, Copy, Clone)]
pub struct FilmPixel {
    pub rgb_sum: [Float; 3],
    pub weight_sum: Float,
}

/// A worker-owned rectangle of pixels; merged into the film when the
/// tile finishes.
pub struct FilmTile {
    pub bounds: Bounds2i,
    pub pixels: Vec<FilmPixel>,
}

impl FilmTile {
    pub fn new(bounds: Bounds2i) -> Self {
        FilmTile {
            bounds,
            pixels: vec![FilmPixel::default(); bounds.area().max(0) as usize],
        }
    }
    /// Record one filtered radiance sample for a pixel the tile owns.
    pub fn add_sample(&mut self, pixel: Point2i, l: Spectrum, weight: Float) {
        if !self.bounds.inside(pixel) {
            return;
        }
        let width: i32 = self.bounds.diagonal().x;
        let index: usize =
            ((pixel.y - self.bounds.p_min.y) * width + (pixel.x - self.bounds.p_min.x)) as usize;
        let p: &mut FilmPixel = &mut self.pixels[index];
        p.rgb_sum[0] += l.c[0];
        p.rgb_sum[1] += l.c[1];
        p.rgb_sum[2] += l.c[2];
        p.weight_sum += weight;
    }
}

pub struct Film {
    pub resolution: Point2i,
    pub filter: Arc<dyn Filter>,
    pixels: Mutex<Vec<FilmPixel>>,
    splats: Vec<[Atomic<f32>; 3]>,
    /// Non-finite sample count, reported after the render.
    saturation_count: AtomicUsize,
}

impl Film {
    pub fn new(resolution: Point2i, filter: Arc<dyn Filter>) -> Self {
        let n: usize = (resolution.x * resolution.y) as usize;
        let mut splats: Vec<[Atomic<f32>; 3]> = Vec::with_capacity(n);
        for _ in 0..n {
            splats.push([Atomic::new(0.0), Atomic::new(0.0), Atomic::new(0.0)]);
        }
        Film {
            resolution,
            filter,
            pixels: Mutex::new(vec![FilmPixel::default(); n]),
            splats,
            saturation_count: AtomicUsize::new(0),
        }
    }
    pub fn full_bounds(&self) -> Bounds2i {
        Bounds2i::new(Point2i::new(0, 0), self.resolution)
    }
    pub fn get_tile(&self, bounds: Bounds2i) -> FilmTile {
        FilmTile::new(bounds)
    }
    /// Record a non-finite radiance sample; the offending value is
    /// dropped.
    pub fn note_saturation(&self) {
        self.saturation_count.fetch_add(1, Ordering::Relaxed);
    }
    pub fn saturation_count(&self) -> usize {
        self.saturation_count.load(Ordering::Relaxed)
    }
    pub fn merge_tile(&self, tile: &FilmTile) {
        let mut pixels = self.pixels.lock().unwrap();
        let width: i32 = tile.bounds.diagonal().x;
        for p in tile.bounds.points() {
            let src: &FilmPixel =
                &tile.pixels[((p.y - tile.bounds.p_min.y) * width + (p.x - tile.bounds.p_min.x))
                    as usize];
            let dst: &mut FilmPixel = &mut pixels[(p.y * self.resolution.x + p.x) as usize];
            dst.rgb_sum[0] += src.rgb_sum[0];
            dst.rgb_sum[1] += src.rgb_sum[1];
            dst.rgb_sum[2] += src.rgb_sum[2];
            dst.weight_sum += src.weight_sum;
        }
    }
    fn atomic_add(slot: &Atomic<f32>, value: f32) {
        let mut current: f32 = slot.load(Ordering::Relaxed);
        loop {
            match slot.compare_exchange_weak(
                current,
                current + value,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
    /// Splat a light-tracing contribution at a raster position; the
    /// filter is evaluated directly over its footprint.
    pub fn add_splat(&self, p_raster: &Point2f, l: Spectrum) {
        if l.has_nans() {
            self.note_saturation();
            return;
        }
        let half_extent: Float = self.filter.extent() / 2.0;
        let x0: i32 = (p_raster.x - half_extent).floor() as i32;
        let x1: i32 = (p_raster.x + half_extent).ceil() as i32;
        let y0: i32 = (p_raster.y - half_extent).floor() as i32;
        let y1: i32 = (p_raster.y + half_extent).ceil() as i32;
        for y in y0.max(0)..y1.min(self.resolution.y) {
            for x in x0.max(0)..x1.min(self.resolution.x) {
                let offset: Point2f = Point2f {
                    x: x as Float + 0.5 - p_raster.x,
                    y: y as Float + 0.5 - p_raster.y,
                };
                let weight: Float = self.filter.evaluate(&offset);
                if weight <= 0.0 as Float {
                    continue;
                }
                let slot: &[Atomic<f32>; 3] =
                    &self.splats[(y * self.resolution.x + x) as usize];
                Film::atomic_add(&slot[0], l.c[0] * weight);
                Film::atomic_add(&slot[1], l.c[1] * weight);
                Film::atomic_add(&slot[2], l.c[2] * weight);
            }
        }
    }
    /// Resolved radiance at a pixel; splats are normalized by the
    /// total pixel sample count.
    pub fn pixel_radiance(&self, x: i32, y: i32, spp: i32) -> Spectrum {
        let pixels = self.pixels.lock().unwrap();
        let index: usize = (y * self.resolution.x + x) as usize;
        let p: &FilmPixel = &pixels[index];
        let mut rgb: [Float; 3] = [0.0; 3];
        for ch in 0..3 {
            let mut v: Float = 0.0;
            if p.weight_sum > 0.0 as Float {
                v = p.rgb_sum[ch] / p.weight_sum;
            }
            v += self.splats[index][ch].load(Ordering::Relaxed) / spp as Float;
            rgb[ch] = if v.is_finite() { v } else { 0.0 };
        }
        Spectrum { c: rgb }
    }
    pub fn mean_radiance(&self, spp: i32) -> Spectrum {
        let mut sum: Spectrum = Spectrum::default();
        for y in 0..self.resolution.y {
            for x in 0..self.resolution.x {
                sum += self.pixel_radiance(x, y, spp);
            }
        }
        sum / (self.resolution.x * self.resolution.y) as Float
    }
    /// Write the image; `.hdr` names get raw radiance, everything else
    /// is sRGB-encoded LDR.
    pub fn write(&self, filename: &str, spp: i32) -> Result<(), String> {
        let width: u32 = self.resolution.x as u32;
        let height: u32 = self.resolution.y as u32;
        if filename.ends_with(".hdr") {
            let mut data: Vec<image::Rgb<f32>> = Vec::with_capacity((width * height) as usize);
            for y in (0..self.resolution.y).rev() {
                for x in 0..self.resolution.x {
                    let c: Spectrum = self.pixel_radiance(x, y, spp);
                    data.push(image::Rgb([c.c[0], c.c[1], c.c[2]]));
                }
            }
            let file = std::fs::File::create(filename).map_err(|e| e.to_string())?;
            let encoder = image::hdr::HDREncoder::new(std::io::BufWriter::new(file));
            encoder
                .encode(&data, width as usize, height as usize)
                .map_err(|e| e.to_string())?;
            return Ok(());
        }
        let mut data: Vec<u8> = Vec::with_capacity((width * height * 3) as usize);
        for y in (0..self.resolution.y).rev() {
            for x in 0..self.resolution.x {
                let c: Spectrum = self.pixel_radiance(x, y, spp);
                for ch in 0..3 {
                    data.push((srgb_encode(c.c[ch]) * 255.0 + 0.5) as u8);
                }
            }
        }
        image::save_buffer(filename, &data, width, height, image::ColorType::Rgb8)
            .map_err(|e| e.to_string())
    }
}

/// The sRGB opto-electronic transfer function.
pub fn srgb_encode(v: Float) -> Float {
    let v: Float = clamp_t(v, 0.0, 1.0);
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::BoxFilter;

    #[test]
    fn test_tile_merge_accumulates() {
        let film = Film::new(Point2i::new(4, 4), Arc::new(BoxFilter::new(1.0)));
        let mut tile = film.get_tile(Bounds2i::new(Point2i::new(0, 0), Point2i::new(2, 2)));
        tile.add_sample(Point2i::new(1, 1), Spectrum::new(2.0), 1.0);
        tile.add_sample(Point2i::new(1, 1), Spectrum::new(4.0), 1.0);
        film.merge_tile(&tile);
        let c = film.pixel_radiance(1, 1, 1);
        assert!((c.c[0] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_splat_normalized_by_spp() {
        let film = Film::new(Point2i::new(4, 4), Arc::new(BoxFilter::new(1.0)));
        film.add_splat(&Point2f::new(2.5, 2.5), Spectrum::new(8.0));
        let c = film.pixel_radiance(2, 2, 4);
        assert!((c.c[0] - 2.0).abs() < 1e-5, "got {}", c.c[0]);
        // other pixels untouched
        assert!(film.pixel_radiance(0, 0, 4).is_black());
    }

    #[test]
    fn test_two_films_same_samples_agree() {
        let film_a = Film::new(Point2i::new(2, 2), Arc::new(BoxFilter::new(1.0)));
        let film_b = Film::new(Point2i::new(2, 2), Arc::new(BoxFilter::new(1.0)));
        for film in &[&film_a, &film_b] {
            let mut tile = film.get_tile(film.full_bounds());
            tile.add_sample(Point2i::new(0, 0), Spectrum::new(1.5), 1.0);
            film.merge_tile(&tile);
        }
        assert_eq!(
            film_a.pixel_radiance(0, 0, 1).c,
            film_b.pixel_radiance(0, 0, 1).c
        );
    }
}
