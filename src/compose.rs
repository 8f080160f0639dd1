//! Logo composition over a finished QR raster.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::backdrop::paint_backdrop;
use crate::error::CompositionError;
use crate::layout::{compute_layout, CompositionParams};
use crate::raster::RasterImage;

/// Largest canvas side the compositor will allocate.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Draws `logo` centered over `qr` on an opaque backdrop.
///
/// The canvas is `S`×`S` with `S = max(qr.width, qr.height)`; the QR raster is
/// stretched to fill it (a plain copy when it is already `S`×`S`). Neither
/// input is modified. The same inputs always produce the same pixels.
///
/// # Errors
///
/// Returns a [`CompositionError`] when either raster is empty or the canvas
/// would be larger than [`MAX_CANVAS_SIDE`]. Callers should then show the
/// plain QR raster instead.
///
/// # Example
///
/// ```rust
/// use image::{Rgba, RgbaImage};
/// use pixelqr::compose::compose;
/// use pixelqr::layout::CompositionParams;
/// use pixelqr::raster::RasterImage;
///
/// let qr = RasterImage::new(RgbaImage::from_pixel(256, 256, Rgba([0, 0, 0, 255])));
/// let logo = RasterImage::new(RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255])));
///
/// let out = compose(&qr, &logo, &CompositionParams::default()).unwrap();
/// assert_eq!((out.width(), out.height()), (256, 256));
/// ```
pub fn compose(
    qr: &RasterImage,
    logo: &RasterImage,
    params: &CompositionParams,
) -> Result<RasterImage, CompositionError> {
    if qr.is_empty() {
        return Err(CompositionError::EmptyQr);
    }
    if logo.is_empty() {
        return Err(CompositionError::EmptyLogo);
    }
    let side = qr.side();
    if side > MAX_CANVAS_SIDE {
        return Err(CompositionError::CanvasTooLarge(side));
    }

    let mut canvas: RgbaImage = if qr.width() == side && qr.height() == side {
        qr.as_rgba().clone()
    } else {
        imageops::resize(qr.as_rgba(), side, side, FilterType::Nearest)
    };

    let layout = compute_layout(side, logo.width(), logo.height(), params);
    paint_backdrop(&mut canvas, &layout);

    let target = layout.logo;
    let scaled = if logo.width() == target.width && logo.height() == target.height {
        logo.as_rgba().clone()
    } else {
        imageops::resize(logo.as_rgba(), target.width, target.height, FilterType::Triangle)
    };
    imageops::overlay(&mut canvas, &scaled, target.x, target.y);

    debug!(
        side,
        backdrop = layout.backdrop.width,
        radius = layout.corner_radius,
        logo_width = target.width,
        logo_height = target.height,
        "composited logo",
    );
    Ok(RasterImage::new(canvas))
}
