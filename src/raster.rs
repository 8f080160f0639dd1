//! In-memory RGBA bitmaps passed between the encoder, decoders and compositor.

use image::{DynamicImage, RgbaImage};

/// An immutable RGBA8 bitmap.
///
/// Every stage that draws allocates a new `RasterImage`; inputs are only ever
/// borrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Longest side, used as the working canvas side when compositing.
    pub fn side(&self) -> u32 {
        self.width().max(self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// Raw RGBA bytes in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

impl From<RgbaImage> for RasterImage {
    fn from(pixels: RgbaImage) -> Self {
        Self::new(pixels)
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image.into_rgba8())
    }
}
