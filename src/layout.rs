//! Backdrop and logo geometry.
//!
//! Every measurement is rounded to a whole pixel as soon as it is computed,
//! with round-half-up semantics, so results are reproducible pixel for pixel.

use crate::backdrop;

pub const MIN_SIZE_RATIO: f64 = 0.10;
pub const MAX_SIZE_RATIO: f64 = 0.30;
pub const DEFAULT_SIZE_RATIO: f64 = 0.18;

pub const MIN_PADDING_RATIO: f64 = 0.0;
pub const MAX_PADDING_RATIO: f64 = 0.08;
pub const DEFAULT_PADDING_RATIO: f64 = 0.04;

/// User-tunable logo parameters.
///
/// Ratios are fractions of the QR canvas side and are clamped on
/// construction, so a `CompositionParams` value is always within range.
///
/// # Example
///
/// ```rust
/// use pixelqr::layout::CompositionParams;
///
/// let params = CompositionParams::new(0.5, -1.0, true);
/// assert_eq!(params.size_ratio(), 0.30);
/// assert_eq!(params.padding_ratio(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionParams {
    size_ratio: f64,
    padding_ratio: f64,
    rounded: bool,
}

impl CompositionParams {
    pub fn new(size_ratio: f64, padding_ratio: f64, rounded: bool) -> Self {
        Self {
            size_ratio: clamp_ratio(size_ratio, MIN_SIZE_RATIO, MAX_SIZE_RATIO, DEFAULT_SIZE_RATIO),
            padding_ratio: clamp_ratio(
                padding_ratio,
                MIN_PADDING_RATIO,
                MAX_PADDING_RATIO,
                DEFAULT_PADDING_RATIO,
            ),
            rounded,
        }
    }

    /// Fraction of the canvas side taken by the backdrop box.
    pub fn size_ratio(&self) -> f64 {
        self.size_ratio
    }

    /// Fraction of the canvas side kept clear between backdrop edge and logo.
    pub fn padding_ratio(&self) -> f64 {
        self.padding_ratio
    }

    pub fn rounded(&self) -> bool {
        self.rounded
    }

    pub fn with_size_ratio(self, size_ratio: f64) -> Self {
        Self::new(size_ratio, self.padding_ratio, self.rounded)
    }

    pub fn with_padding_ratio(self, padding_ratio: f64) -> Self {
        Self::new(self.size_ratio, padding_ratio, self.rounded)
    }

    pub fn with_rounded(self, rounded: bool) -> Self {
        Self { rounded, ..self }
    }
}

impl Default for CompositionParams {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_RATIO, DEFAULT_PADDING_RATIO, true)
    }
}

fn clamp_ratio(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() { fallback } else { value.clamp(min, max) }
}

/// Rounds half up, the way the reference renderer rounds pixel positions.
pub(crate) fn round_px(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// An axis-aligned pixel rectangle. The origin may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }
}

/// Geometry of one composition, derived from the canvas side, the logo
/// dimensions and the [`CompositionParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutResult {
    pub canvas_side: u32,
    pub backdrop: Rect,
    /// Effective inner padding after clamping to leave at least one pixel for the logo.
    pub padding: u32,
    /// Zero for a square backdrop.
    pub corner_radius: u32,
    pub logo: Rect,
}

/// Computes backdrop and logo placement on a `side`×`side` canvas.
///
/// # Arguments
///
/// * `side` - Canvas side length in pixels.
/// * `logo_width`, `logo_height` - Source logo dimensions, used only for their aspect ratio.
/// * `params` - Size, padding and shape parameters.
///
/// # Example
///
/// ```rust
/// use pixelqr::layout::{compute_layout, CompositionParams};
///
/// let layout = compute_layout(256, 100, 50, &CompositionParams::new(0.18, 0.04, true));
/// assert_eq!(layout.backdrop.width, 46);
/// assert_eq!((layout.logo.width, layout.logo.height), (26, 13));
/// ```
pub fn compute_layout(
    side: u32,
    logo_width: u32,
    logo_height: u32,
    params: &CompositionParams,
) -> LayoutResult {
    let s = f64::from(side);

    let box_size = round_px(s * params.size_ratio()).max(1) as u32;
    let mut padding = round_px(s * params.padding_ratio()).max(0) as u32;
    if box_size < 2 * padding + 1 {
        padding = (box_size - 1) / 2;
    }

    let box_origin = round_px(s / 2.0 - f64::from(box_size) / 2.0);
    let backdrop = Rect {
        x: box_origin,
        y: box_origin,
        width: box_size,
        height: box_size,
    };

    let available = box_size - 2 * padding;
    let (draw_width, draw_height) = fit_within(available, available, logo_width, logo_height);

    // Centered on the canvas, not on the backdrop box.
    let logo = Rect {
        x: round_px(s / 2.0 - f64::from(draw_width) / 2.0),
        y: round_px(s / 2.0 - f64::from(draw_height) / 2.0),
        width: draw_width,
        height: draw_height,
    };

    let corner_radius = if params.rounded() {
        backdrop::corner_radius(box_size, box_size)
    } else {
        0
    };

    LayoutResult {
        canvas_side: side,
        backdrop,
        padding,
        corner_radius,
        logo,
    }
}

/// Contain-fit scaling: width first, then height if the width fit overflows.
fn fit_within(max_width: u32, max_height: u32, width: u32, height: u32) -> (u32, u32) {
    let width = f64::from(width.max(1));
    let height = f64::from(height.max(1));

    let draw_height = round_px(f64::from(max_width) * height / width).max(1) as u32;
    if draw_height <= max_height {
        return (max_width, draw_height);
    }

    let draw_width = round_px(f64::from(max_height) * width / height).max(1) as u32;
    (draw_width.min(max_width), max_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_clamp_to_bounds() {
        let low = CompositionParams::new(0.01, -0.5, false);
        assert_eq!(low.size_ratio(), MIN_SIZE_RATIO);
        assert_eq!(low.padding_ratio(), MIN_PADDING_RATIO);

        let high = CompositionParams::new(3.0, 0.5, false);
        assert_eq!(high.size_ratio(), MAX_SIZE_RATIO);
        assert_eq!(high.padding_ratio(), MAX_PADDING_RATIO);

        let inside = CompositionParams::new(0.2, 0.05, true);
        assert_eq!(inside.size_ratio(), 0.2);
        assert_eq!(inside.padding_ratio(), 0.05);
    }

    #[test]
    fn test_non_finite_ratios() {
        let nan = CompositionParams::new(f64::NAN, f64::NAN, true);
        assert_eq!(nan.size_ratio(), DEFAULT_SIZE_RATIO);
        assert_eq!(nan.padding_ratio(), DEFAULT_PADDING_RATIO);

        let inf = CompositionParams::new(f64::INFINITY, f64::NEG_INFINITY, true);
        assert_eq!(inf.size_ratio(), MAX_SIZE_RATIO);
        assert_eq!(inf.padding_ratio(), MIN_PADDING_RATIO);
    }

    #[test]
    fn test_round_px_rounds_half_up() {
        assert_eq!(round_px(89.5), 90);
        assert_eq!(round_px(121.5), 122);
        assert_eq!(round_px(46.08), 46);
        assert_eq!(round_px(10.24), 10);
        assert_eq!(round_px(-0.5), 0);
    }

    #[test]
    fn test_wide_logo_layout() {
        let layout = compute_layout(256, 100, 50, &CompositionParams::new(0.18, 0.04, true));

        assert_eq!(layout.backdrop, Rect { x: 105, y: 105, width: 46, height: 46 });
        assert_eq!((layout.backdrop.right(), layout.backdrop.bottom()), (151, 151));
        assert_eq!(layout.padding, 10);
        assert_eq!(layout.logo, Rect { x: 115, y: 122, width: 26, height: 13 });
        assert_eq!(layout.corner_radius, 6);
    }

    #[test]
    fn test_max_size_without_padding_fills_box() {
        let layout = compute_layout(256, 500, 500, &CompositionParams::new(0.30, 0.0, true));

        assert_eq!(layout.backdrop.width, 77);
        assert_eq!(layout.backdrop.x, 90);
        assert_eq!(layout.logo, layout.backdrop);
    }

    #[test]
    fn test_tall_logo_fits_height() {
        let layout = compute_layout(256, 50, 100, &CompositionParams::new(0.18, 0.04, false));

        assert_eq!((layout.logo.width, layout.logo.height), (13, 26));
        assert_eq!(layout.corner_radius, 0);
    }

    #[test]
    fn test_backdrop_is_always_centered() {
        let params = CompositionParams::new(0.23, 0.03, true);
        for side in 1..=600u32 {
            let layout = compute_layout(side, 64, 64, &params);
            let expected = round_px(f64::from(side) / 2.0 - f64::from(layout.backdrop.width) / 2.0);
            assert_eq!(layout.backdrop.x, layout.backdrop.y);
            assert_eq!(layout.backdrop.x, expected);
        }
    }

    #[test]
    fn test_aspect_ratio_within_one_pixel() {
        let params = CompositionParams::new(0.30, 0.02, true);
        for logo_width in (1..=400u32).step_by(7) {
            for logo_height in (1..=400u32).step_by(11) {
                let layout = compute_layout(256, logo_width, logo_height, &params);
                let LayoutResult { logo, backdrop, padding, .. } = layout;
                assert!(logo.width <= backdrop.width - 2 * padding);
                assert!(logo.height <= backdrop.height - 2 * padding);

                let w = f64::from(logo.width);
                let h = f64::from(logo.height);
                let ratio = f64::from(logo_height) / f64::from(logo_width);
                let height_err = (h - w * ratio).abs();
                let width_err = (w - h / ratio).abs();
                assert!(
                    height_err <= 1.0 || width_err <= 1.0,
                    "{}x{} drawn as {}x{}",
                    logo_width,
                    logo_height,
                    logo.width,
                    logo.height,
                );
            }
        }
    }

    #[test]
    fn test_padding_shrinks_on_tiny_canvas() {
        let layout = compute_layout(10, 3, 3, &CompositionParams::new(0.10, 0.08, true));

        assert_eq!(layout.backdrop.width, 1);
        assert_eq!(layout.padding, 0);
        assert_eq!((layout.logo.width, layout.logo.height), (1, 1));
    }

    #[test]
    fn test_draw_size_never_zero() {
        let layout = compute_layout(1, 1000, 1, &CompositionParams::default());
        assert!(layout.backdrop.width >= 1);
        assert!(layout.logo.width >= 1 && layout.logo.height >= 1);
    }
}
