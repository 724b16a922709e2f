//! Texture implementations: constants, a checkerboard, and image maps
//! loaded through the `image` crate.

// std
use std::sync::Arc;
// lumen
use crate::core::geometry::Point2f;
use crate::core::lumen::{clamp_t, Float, Spectrum};
use crate::core::texture::{FloatTexture, SpectrumTexture};

pub struct ConstantSpectrumTexture {
    pub value: Spectrum,
}

impl ConstantSpectrumTexture {
    pub fn new(value: Spectrum) -> Self {
        ConstantSpectrumTexture { value }
    }
    pub fn shared(value: Spectrum) -> Arc<dyn SpectrumTexture> {
        Arc::new(ConstantSpectrumTexture { value })
    }
}

impl SpectrumTexture for ConstantSpectrumTexture {
    fn evaluate(&self, _uv: &Point2f) -> Spectrum {
        self.value
    }
    fn average(&self) -> Spectrum {
        self.value
    }
}

pub struct ConstantFloatTexture {
    pub value: Float,
}

impl ConstantFloatTexture {
    pub fn new(value: Float) -> Self {
        ConstantFloatTexture { value }
    }
    pub fn shared(value: Float) -> Arc<dyn FloatTexture> {
        Arc::new(ConstantFloatTexture { value })
    }
}

impl FloatTexture for ConstantFloatTexture {
    fn evaluate(&self, _uv: &Point2f) -> Float {
        self.value
    }
}

pub struct CheckerTexture {
    pub a: Arc<dyn SpectrumTexture>,
    pub b: Arc<dyn SpectrumTexture>,
    pub scale: Point2f,
}

impl CheckerTexture {
    pub fn new(a: Arc<dyn SpectrumTexture>, b: Arc<dyn SpectrumTexture>, scale: Point2f) -> Self {
        CheckerTexture { a, b, scale }
    }
}

impl SpectrumTexture for CheckerTexture {
    fn evaluate(&self, uv: &Point2f) -> Spectrum {
        let iu: i32 = (uv.x * self.scale.x).floor() as i32;
        let iv: i32 = (uv.y * self.scale.y).floor() as i32;
        if (iu + iv) % 2 == 0 {
            self.a.evaluate(uv)
        } else {
            self.b.evaluate(uv)
        }
    }
    fn average(&self) -> Spectrum {
        (self.a.average() + self.b.average()) * 0.5
    }
}

/// An RGB image sampled with bilinear filtering and repeat wrapping.
pub struct ImageTexture {
    pub width: i32,
    pub height: i32,
    pub texels: Vec<Spectrum>,
    average: Spectrum,
}

impl ImageTexture {
    pub fn new(width: i32, height: i32, texels: Vec<Spectrum>) -> Self {
        assert_eq!((width * height) as usize, texels.len());
        let mut average: Spectrum = Spectrum::default();
        for t in &texels {
            average += *t;
        }
        average /= texels.len() as Float;
        ImageTexture {
            width,
            height,
            texels,
            average,
        }
    }
    /// Load from any format the image crate can decode; LDR data is
    /// linearized from sRGB, .hdr stays radiometric.
    pub fn load(path: &str) -> Result<Self, String> {
        let img = image::open(path).map_err(|e| e.to_string())?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let linearize: bool = !path.ends_with(".hdr");
        let mut texels: Vec<Spectrum> = Vec::with_capacity((width * height) as usize);
        for p in rgb.pixels() {
            let decode = |v: u8| -> Float {
                let f: Float = v as Float / 255.0;
                if linearize {
                    f.powf(2.2)
                } else {
                    f
                }
            };
            texels.push(Spectrum::rgb(decode(p[0]), decode(p[1]), decode(p[2])));
        }
        Ok(ImageTexture::new(width as i32, height as i32, texels))
    }
    fn texel(&self, x: i32, y: i32) -> Spectrum {
        let x: i32 = x.rem_euclid(self.width);
        let y: i32 = y.rem_euclid(self.height);
        self.texels[(y * self.width + x) as usize]
    }
}

impl SpectrumTexture for ImageTexture {
    fn evaluate(&self, uv: &Point2f) -> Spectrum {
        let x: Float = uv.x * self.width as Float - 0.5;
        // image rows run top-down while v runs bottom-up
        let y: Float = (1.0 as Float - uv.y) * self.height as Float - 0.5;
        let x0: i32 = x.floor() as i32;
        let y0: i32 = y.floor() as i32;
        let dx: Float = clamp_t(x - x0 as Float, 0.0, 1.0);
        let dy: Float = clamp_t(y - y0 as Float, 0.0, 1.0);
        let t00: Spectrum = self.texel(x0, y0);
        let t10: Spectrum = self.texel(x0 + 1, y0);
        let t01: Spectrum = self.texel(x0, y0 + 1);
        let t11: Spectrum = self.texel(x0 + 1, y0 + 1);
        (t00 * (1.0 as Float - dx) + t10 * dx) * (1.0 as Float - dy)
            + (t01 * (1.0 as Float - dx) + t11 * dx) * dy
    }
    fn average(&self) -> Spectrum {
        self.average
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_alternates() {
        let checker = CheckerTexture::new(
            ConstantSpectrumTexture::shared(Spectrum::new(1.0)),
            ConstantSpectrumTexture::shared(Spectrum::new(0.0)),
            Point2f::new(2.0, 2.0),
        );
        let a = checker.evaluate(&Point2f::new(0.1, 0.1));
        let b = checker.evaluate(&Point2f::new(0.6, 0.1));
        assert_ne!(a.c[0], b.c[0]);
    }

    #[test]
    fn test_image_bilinear_interpolates() {
        let tex = ImageTexture::new(
            2,
            1,
            vec![Spectrum::new(0.0), Spectrum::new(1.0)],
        );
        let mid = tex.evaluate(&Point2f::new(0.5, 0.5));
        assert!(mid.c[0] > 0.2 && mid.c[0] < 0.8);
        assert!((tex.average().c[0] - 0.5).abs() < 1e-6);
    }
}
