//! Image acquisition for logos and encoder output.
//!
//! Raster formats go through the `image` crate, SVG documents are rasterized
//! at their intrinsic size with `resvg`. Two decoding strategies exist, a
//! one-shot in-memory decode and a streaming reader with format sniffing. They
//! return the same pixels for the same bytes; [`DecoderKind::probe`] picks one
//! at startup and nothing downstream knows which was used.

use std::borrow::Cow;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::error::{LimitError, LimitErrorKind};
use image::{ImageError, ImageFormat, ImageReader, Limits, Rgba, RgbaImage};
use percent_encoding::percent_decode_str;
use resvg::{tiny_skia, usvg};
use tracing::debug;

use crate::error::{ConfigError, DecodeError};
use crate::raster::RasterImage;

/// Turns encoded image bytes into a [`RasterImage`].
pub trait DecodeImage: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError>;

    /// Short strategy name, for logs.
    fn name(&self) -> &'static str;
}

/// Decodes the whole buffer in one call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapDecoder;

impl DecodeImage for BitmapDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        if let Some(document) = svg_document(bytes) {
            return rasterize_svg(&document, &Limits::default());
        }
        let image = image::load_from_memory(bytes).map_err(classify)?;
        finish(image.into(), self.name())
    }

    fn name(&self) -> &'static str {
        "bitmap"
    }
}

/// Sniffs the format from the leading bytes and decodes through a reader
/// with allocation limits. SVG documents are held to the same limits.
#[derive(Debug, Clone, Default)]
pub struct ReaderDecoder {
    limits: Limits,
}

impl ReaderDecoder {
    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }
}

impl DecodeImage for ReaderDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        if let Some(document) = svg_document(bytes) {
            return rasterize_svg(&document, &self.limits);
        }
        let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        if reader.format().is_none() {
            return Err(DecodeError::UnsupportedFormat);
        }
        reader.limits(self.limits.clone());
        let image = reader.decode().map_err(classify)?;
        finish(image.into(), self.name())
    }

    fn name(&self) -> &'static str {
        "reader"
    }
}

/// Which decoding strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    Bitmap,
    Reader,
}

impl DecoderKind {
    /// Uses the one-shot decoder when the common logo formats are compiled
    /// in, and the streaming reader otherwise.
    pub fn probe() -> Self {
        let formats = [ImageFormat::Png, ImageFormat::Jpeg];
        if formats.iter().all(|format| format.reading_enabled()) {
            DecoderKind::Bitmap
        } else {
            DecoderKind::Reader
        }
    }

    pub fn decoder(self) -> Arc<dyn DecodeImage> {
        match self {
            DecoderKind::Bitmap => Arc::new(BitmapDecoder),
            DecoderKind::Reader => Arc::new(ReaderDecoder::default()),
        }
    }
}

impl FromStr for DecoderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bitmap" => Ok(DecoderKind::Bitmap),
            "reader" => Ok(DecoderKind::Reader),
            _ => Err(ConfigError::UnknownDecoder(s.to_string())),
        }
    }
}

/// Decodes an embedded `data:` URL such as `data:image/png;base64,iVBOR...`.
///
/// # Errors
///
/// Returns [`DecodeError::DataUrl`] when the URL is malformed, or whatever
/// `decoder` reports for the embedded bytes.
pub fn decode_data_url(url: &str, decoder: &dyn DecodeImage) -> Result<RasterImage, DecodeError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| DecodeError::DataUrl("missing data: scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| DecodeError::DataUrl("missing ',' separator".to_string()))?;

    let bytes = if meta.to_ascii_lowercase().ends_with(";base64") {
        BASE64.decode(payload.trim()).map_err(|e| DecodeError::DataUrl(e.to_string()))?
    } else {
        check_escapes(payload)?;
        percent_decode_str(payload).collect()
    };
    decoder.decode(&bytes)
}

// `percent_decode_str` passes malformed escapes through untouched.
fn check_escapes(text: &str) -> Result<(), DecodeError> {
    let bytes = text.as_bytes();
    for (i, _) in text.match_indices('%') {
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(DecodeError::DataUrl(format!("bad escape at byte {}", i)));
        }
    }
    Ok(())
}

fn classify(err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(_) => DecodeError::UnsupportedFormat,
        other => DecodeError::Image(other),
    }
}

fn finish(raster: RasterImage, strategy: &str) -> Result<RasterImage, DecodeError> {
    if raster.is_empty() {
        return Err(DecodeError::Empty);
    }
    debug!(strategy, width = raster.width(), height = raster.height(), "decoded image");
    Ok(raster)
}

/// Detects SVG text, optionally behind a BOM, XML prolog or comments.
pub fn is_svg(bytes: &[u8]) -> bool {
    let text = match bytes.strip_prefix(b"\xef\xbb\xbf") {
        Some(rest) => rest,
        None => bytes,
    };
    text.trim_ascii_start().starts_with(b"<") && text.windows(4).any(|window| window == b"<svg")
}

/// Returns the SVG document in `bytes`, inflating gzip-compressed SVGZ.
fn svg_document(bytes: &[u8]) -> Option<Cow<'_, [u8]>> {
    if bytes.starts_with(&[0x1f, 0x8b]) {
        let inflated = usvg::decompress_svgz(bytes).ok()?;
        return is_svg(&inflated).then_some(Cow::Owned(inflated));
    }
    is_svg(bytes).then_some(Cow::Borrowed(bytes))
}

fn rasterize_svg(bytes: &[u8], limits: &Limits) -> Result<RasterImage, DecodeError> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())?;
    let size = tree.size().to_int_size();
    check_limits(size.width(), size.height(), limits)?;

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(DecodeError::Empty)?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha.
    let mut rgba = RgbaImage::new(size.width(), size.height());
    for (pixel, source) in rgba.pixels_mut().zip(pixmap.pixels()) {
        let color = source.demultiply();
        *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    finish(RasterImage::new(rgba), "svg")
}

// The intrinsic size is checked before the pixmap is allocated.
fn check_limits(width: u32, height: u32, limits: &Limits) -> Result<(), DecodeError> {
    let too_wide = limits.max_image_width.is_some_and(|max| width > max);
    let too_tall = limits.max_image_height.is_some_and(|max| height > max);
    if too_wide || too_tall {
        let err = LimitError::from_kind(LimitErrorKind::DimensionError);
        return Err(DecodeError::Image(ImageError::Limits(err)));
    }
    let bytes = u64::from(width) * u64::from(height) * 4;
    if limits.max_alloc.is_some_and(|max| bytes > max) {
        let err = LimitError::from_kind(LimitErrorKind::InsufficientMemory);
        return Err(DecodeError::Image(ImageError::Limits(err)));
    }
    Ok(())
}
