//! QR symbol rendering.
//!
//! Symbol construction is delegated to the `qrcode` crate. This module only
//! chooses the error correction level and paints the modules into a raster of
//! the requested pixel size, spreading the symbol plus its quiet-zone margin
//! over the full width with a fractional module scale.

use std::str::FromStr;

use image::{ImageBuffer, Rgba};
use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

use crate::error::EncodeError;
use crate::raster::RasterImage;

pub const DEFAULT_SIDE: u32 = 256;
pub const DEFAULT_MARGIN: u32 = 2;
pub const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Error correction level of the QR symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCorrection {
    Low,
    Medium,
    Quartile,
    High,
}

impl ErrorCorrection {
    /// `High` when a logo will cover part of the symbol, `Medium` otherwise.
    pub fn for_logo(has_logo: bool) -> Self {
        if has_logo { ErrorCorrection::High } else { ErrorCorrection::Medium }
    }

    fn ec_level(self) -> EcLevel {
        match self {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

impl FromStr for ErrorCorrection {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "L" | "LOW" => Ok(ErrorCorrection::Low),
            "M" | "MEDIUM" => Ok(ErrorCorrection::Medium),
            "Q" | "QUARTILE" => Ok(ErrorCorrection::Quartile),
            "H" | "HIGH" => Ok(ErrorCorrection::High),
            _ => Err(EncodeError::UnsupportedLevel(s.to_string())),
        }
    }
}

/// Rendering parameters for one QR raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub width: u32,
    pub height: u32,
    /// Quiet zone around the symbol, in modules.
    pub margin: u32,
    pub dark: Rgba<u8>,
    pub light: Rgba<u8>,
    pub level: ErrorCorrection,
}

impl EncodeOptions {
    /// The fixed 256×256 black-on-white rendering, at the level matching logo presence.
    pub fn for_logo(has_logo: bool) -> Self {
        Self {
            level: ErrorCorrection::for_logo(has_logo),
            ..Self::default()
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIDE,
            height: DEFAULT_SIDE,
            margin: DEFAULT_MARGIN,
            dark: DARK,
            light: LIGHT,
            level: ErrorCorrection::Medium,
        }
    }
}

/// Produces a QR raster from a payload.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, payload: &str, options: &EncodeOptions) -> Result<RasterImage, EncodeError>;
}

/// [`QrEncoder`] backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleEncoder;

impl QrEncoder for ModuleEncoder {
    /// Encodes `payload` and paints it at exactly `options.width`×`options.height`.
    ///
    /// # Errors
    ///
    /// * [`EncodeError::EmptyPayload`] if `payload` is empty.
    /// * [`EncodeError::InvalidSize`] if the raster cannot give every module at least one pixel.
    /// * [`EncodeError::Qr`] if the payload does not fit any symbol version.
    fn encode(&self, payload: &str, options: &EncodeOptions) -> Result<RasterImage, EncodeError> {
        if payload.is_empty() {
            return Err(EncodeError::EmptyPayload);
        }
        let code = QrCode::with_error_correction_level(payload, options.level.ec_level())?;
        let modules = code.width() as u32;
        let total = modules + 2 * options.margin;
        if options.width < total || options.height < total {
            return Err(EncodeError::InvalidSize {
                width: options.width,
                height: options.height,
            });
        }

        let scale_x = f64::from(options.width) / f64::from(total);
        let scale_y = f64::from(options.height) / f64::from(total);
        let margin_x = f64::from(options.margin) * scale_x;
        let margin_y = f64::from(options.margin) * scale_y;
        let last = code.width() - 1;

        let mut img = ImageBuffer::from_pixel(options.width, options.height, options.light);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let px = f64::from(x);
            let py = f64::from(y);
            let inside = px >= margin_x
                && py >= margin_y
                && px < f64::from(options.width) - margin_x
                && py < f64::from(options.height) - margin_y;
            if !inside {
                continue;
            }
            let mx = (((px - margin_x) / scale_x).floor() as usize).min(last);
            let my = (((py - margin_y) / scale_y).floor() as usize).min(last);
            if code[(mx, my)] == Color::Dark {
                *pixel = options.dark;
            }
        }

        debug!(
            modules,
            level = ?options.level,
            width = options.width,
            height = options.height,
            "encoded qr symbol",
        );
        Ok(RasterImage::new(img))
    }
}
