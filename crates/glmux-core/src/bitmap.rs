//! CPU-side images exchanged with the GPU layers.

use crate::error::{GlError, GlResult};
use crate::geom::IntPoint;
use crate::pixel_format::PixelFormat;

const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Row-major, tightly packed pixel buffer tagged with its format.
///
/// Row 0 is the first row uploaded to a texture, which is also the first
/// row read back from a framebuffer; no flipping happens anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    size: IntPoint,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Zero-filled bitmap.
    pub fn new(size: IntPoint, format: PixelFormat) -> Self {
        let len = size.area() * format.bytes_per_pixel();
        Self {
            size,
            format,
            pixels: vec![0; len],
        }
    }

    /// Wrap existing pixel data. The length must match `size` and `format`.
    pub fn from_pixels(size: IntPoint, format: PixelFormat, pixels: Vec<u8>) -> GlResult<Self> {
        let expected = size.area() * format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(GlError::InvalidBitmap {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            size,
            format,
            pixels,
        })
    }

    pub fn size(&self) -> IntPoint {
        self.size
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.size.x.max(0) as usize * self.format.bytes_per_pixel()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        debug_assert!(x >= 0 && y >= 0 && x < self.size.x && y < self.size.y);
        y as usize * self.stride() + x as usize * self.format.bytes_per_pixel()
    }

    /// Read one pixel as normalized RGBA.
    pub fn pixel(&self, x: i32, y: i32) -> [f32; 4] {
        let off = self.offset(x, y);
        let p = &self.pixels[off..off + self.format.bytes_per_pixel()];
        let n = |b: u8| f32::from(b) / 255.0;
        match self.format {
            PixelFormat::B8G8R8A8 => [n(p[2]), n(p[1]), n(p[0]), n(p[3])],
            PixelFormat::B8G8R8X8 => [n(p[2]), n(p[1]), n(p[0]), 1.0],
            PixelFormat::R8G8B8A8 => [n(p[0]), n(p[1]), n(p[2]), n(p[3])],
            PixelFormat::R8G8B8X8 => [n(p[0]), n(p[1]), n(p[2]), 1.0],
            PixelFormat::B8G8R8 => [n(p[2]), n(p[1]), n(p[0]), 1.0],
            PixelFormat::R8G8B8 => [n(p[0]), n(p[1]), n(p[2]), 1.0],
            PixelFormat::I8 => {
                let v = n(p[0]);
                [v, v, v, 1.0]
            }
            PixelFormat::A8 => [0.0, 0.0, 0.0, n(p[0])],
            PixelFormat::R32G32B32A32F => {
                let f = |i: usize| read_f32(&p[i * 4..i * 4 + 4]);
                [f(0), f(1), f(2), f(3)]
            }
            PixelFormat::I32F => {
                let v = read_f32(p);
                [v, v, v, 1.0]
            }
        }
    }

    /// Write one pixel from normalized RGBA. Integer formats clamp to
    /// `[0, 1]` and round.
    pub fn set_pixel(&mut self, x: i32, y: i32, rgba: [f32; 4]) {
        let off = self.offset(x, y);
        let bpp = self.format.bytes_per_pixel();
        let q = |v: f32| (num::clamp(v, 0.0, 1.0) * 255.0).round() as u8;
        let luma = rgba[0] * LUMA_R + rgba[1] * LUMA_G + rgba[2] * LUMA_B;
        let p = &mut self.pixels[off..off + bpp];
        match self.format {
            PixelFormat::B8G8R8A8 => p.copy_from_slice(&[q(rgba[2]), q(rgba[1]), q(rgba[0]), q(rgba[3])]),
            PixelFormat::B8G8R8X8 => p.copy_from_slice(&[q(rgba[2]), q(rgba[1]), q(rgba[0]), 255]),
            PixelFormat::R8G8B8A8 => p.copy_from_slice(&[q(rgba[0]), q(rgba[1]), q(rgba[2]), q(rgba[3])]),
            PixelFormat::R8G8B8X8 => p.copy_from_slice(&[q(rgba[0]), q(rgba[1]), q(rgba[2]), 255]),
            PixelFormat::B8G8R8 => p.copy_from_slice(&[q(rgba[2]), q(rgba[1]), q(rgba[0])]),
            PixelFormat::R8G8B8 => p.copy_from_slice(&[q(rgba[0]), q(rgba[1]), q(rgba[2])]),
            PixelFormat::I8 => p[0] = q(luma),
            PixelFormat::A8 => p[0] = q(rgba[3]),
            PixelFormat::R32G32B32A32F => {
                for (i, v) in rgba.iter().enumerate() {
                    p[i * 4..i * 4 + 4].copy_from_slice(&v.to_ne_bytes());
                }
            }
            PixelFormat::I32F => p.copy_from_slice(&luma.to_ne_bytes()),
        }
    }

    /// Fill every pixel with one colour.
    pub fn fill(&mut self, rgba: [f32; 4]) {
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                self.set_pixel(x, y, rgba);
            }
        }
    }

    /// Copy `other` into `self`, converting pixel formats as needed.
    pub fn copy_pixels(&mut self, other: &Bitmap) -> GlResult<()> {
        if other.size != self.size {
            return Err(GlError::SizeMismatch {
                op: "Bitmap::copy_pixels",
                expected: self.size,
                actual: other.size,
            });
        }
        if other.format == self.format {
            self.pixels.copy_from_slice(&other.pixels);
            return Ok(());
        }
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                self.set_pixel(x, y, other.pixel(x, y));
            }
        }
        Ok(())
    }

    /// Copy of this bitmap in another format.
    pub fn converted(&self, format: PixelFormat) -> Bitmap {
        if format == self.format {
            return self.clone();
        }
        let mut out = Bitmap::new(self.size, format);
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                out.set_pixel(x, y, self.pixel(x, y));
            }
        }
        out
    }

    /// Copy `src` into this bitmap with its top-left corner at `at`.
    /// Pixels falling outside are clipped.
    pub fn blit(&mut self, src: &Bitmap, at: IntPoint) {
        for y in 0..src.size.y {
            let dy = at.y + y;
            if dy < 0 || dy >= self.size.y {
                continue;
            }
            for x in 0..src.size.x {
                let dx = at.x + x;
                if dx < 0 || dx >= self.size.x {
                    continue;
                }
                self.set_pixel(dx, dy, src.pixel(x, y));
            }
        }
    }
}

fn read_f32(bytes: &[u8]) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    f32::from_ne_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_pixels_validates_length() {
        let err = Bitmap::from_pixels(IntPoint::new(2, 2), PixelFormat::R8G8B8A8, vec![0; 15])
            .unwrap_err();
        assert_eq!(
            err,
            GlError::InvalidBitmap {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn bgra_and_rgba_swap_channels() {
        let mut bgra = Bitmap::new(IntPoint::new(1, 1), PixelFormat::B8G8R8A8);
        bgra.set_pixel(0, 0, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(bgra.pixels(), &[0, 0, 255, 255]);

        let mut rgba = Bitmap::new(IntPoint::new(1, 1), PixelFormat::R8G8B8A8);
        rgba.copy_pixels(&bgra).unwrap();
        assert_eq!(rgba.pixels(), &[255, 0, 0, 255]);
    }

    #[test]
    fn float_pixels_round_trip_exactly() {
        let mut bmp = Bitmap::new(IntPoint::new(2, 1), PixelFormat::R32G32B32A32F);
        bmp.set_pixel(1, 0, [0.25, -1.5, 3.0, 0.125]);
        assert_eq!(bmp.pixel(1, 0), [0.25, -1.5, 3.0, 0.125]);
        assert_eq!(bmp.pixel(0, 0), [0.0; 4]);
    }

    #[test]
    fn opaque_formats_read_full_alpha() {
        let bmp = Bitmap::new(IntPoint::new(1, 1), PixelFormat::B8G8R8X8);
        assert_eq!(bmp.pixel(0, 0)[3], 1.0);
        let grey = Bitmap::new(IntPoint::new(1, 1), PixelFormat::I8);
        assert_eq!(grey.pixel(0, 0), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn copy_pixels_rejects_size_mismatch() {
        let mut a = Bitmap::new(IntPoint::new(2, 2), PixelFormat::I8);
        let b = Bitmap::new(IntPoint::new(3, 2), PixelFormat::I8);
        assert!(matches!(
            a.copy_pixels(&b),
            Err(GlError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn blit_clips_to_destination() {
        let mut dst = Bitmap::new(IntPoint::new(3, 3), PixelFormat::I8);
        let mut src = Bitmap::new(IntPoint::new(2, 2), PixelFormat::I8);
        src.fill([1.0, 1.0, 1.0, 1.0]);
        dst.blit(&src, IntPoint::new(2, 2));
        assert_eq!(dst.pixel(2, 2)[0], 1.0);
        assert_eq!(dst.pixel(1, 1)[0], 0.0);
    }
}
