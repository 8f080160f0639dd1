//! Error types for each stage of QR generation.
//!
//! Encoding failures are fatal to a generation run, decoding failures only
//! disable the logo, and composition failures fall back to the plain QR raster.

use thiserror::Error;

/// The image bytes could not be turned into a [`RasterImage`](crate::raster::RasterImage).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    UnsupportedFormat,

    #[error("image has zero width or height")]
    Empty,

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse svg: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("invalid data url: {0}")]
    DataUrl(String),
}

/// The QR encoder rejected the payload or its rendering options.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("payload is empty")]
    EmptyPayload,

    #[error("unsupported error correction level: {0}")]
    UnsupportedLevel(String),

    #[error("invalid render size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("qr encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),
}

/// Drawing the logo over the QR raster failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompositionError {
    #[error("qr raster is empty")]
    EmptyQr,

    #[error("logo raster is empty")]
    EmptyLogo,

    #[error("canvas side {0} exceeds the maximum of {max}", max = crate::compose::MAX_CANVAS_SIDE)]
    CanvasTooLarge(u32),
}

/// Saving, encoding or copying a finished result failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode png: {0}")]
    Png(#[from] image::ImageError),

    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

/// Loading or persisting configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] serde_env::Error),

    #[error("failed to access preferences: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preferences: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown decoder strategy: {0}")]
    UnknownDecoder(String),
}

/// A generation run produced no image.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("generation task failed: {0}")]
    Task(String),
}
