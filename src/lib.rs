//! # pixelqr
//!
//! A Rust library for generating QR codes with a logo composited in the middle.
//!
//! `pixelqr` renders a payload into a QR raster (symbol encoding is delegated to the
//! `qrcode` crate), then draws a user-supplied logo over its center on an opaque white
//! backdrop. The backdrop hides the modules under the logo so the symbol stays readable
//! thanks to the higher error correction level picked whenever a logo is present.
//!
//! ## Features
//!
//! - Render 256×256 black-on-white QR rasters, level `M` by default and `H` with a logo.
//! - Decode PNG, JPEG and SVG logos, from raw bytes or `data:` URLs.
//! - Place the logo with clamped size and padding ratios, on a square or rounded backdrop.
//! - Keep the aspect ratio of the logo (contain scaling, never stretched or cropped).
//! - Export PNG bytes, data URLs or timestamped `qrcode-<millis>.png` files.
//! - Run an interactive session that debounces parameter changes.
//!
//! ## Example
//!
//! Generate a QR code with a logo:
//!
//! ```rust,no_run
//! use pixelqr::generate::{GenerateRequest, Generator};
//! use pixelqr::helper::save_png;
//! use pixelqr::layout::CompositionParams;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let logo = std::fs::read("logo.png")?;
//! let request = GenerateRequest::new("https://example.com")
//!     .with_logo(logo, CompositionParams::new(0.18, 0.04, true));
//!
//! let generation = Generator::default().run(request).await?;
//! save_png(&generation.image, None, None)?;
//! # Ok(())
//! # }
//! ```
//!
//! Compose an existing QR raster and logo directly:
//!
//! ```rust
//! use image::{Rgba, RgbaImage};
//! use pixelqr::{compose::compose, layout::CompositionParams, raster::RasterImage};
//!
//! let qr = RasterImage::new(RgbaImage::from_pixel(256, 256, Rgba([0, 0, 0, 255])));
//! let logo = RasterImage::new(RgbaImage::from_pixel(64, 64, Rgba([255, 0, 0, 255])));
//! let out = compose(&qr, &logo, &CompositionParams::default()).unwrap();
//! assert_eq!(out.width(), 256);
//! ```
//!
//! ## Modules
//!
//! - [`encoder`]: QR raster rendering.
//! - [`decode`]: Logo and raster decoding.
//! - [`layout`]: Backdrop and logo geometry.
//! - [`backdrop`]: Backdrop shapes and filling.
//! - [`compose`]: Logo composition.
//! - [`generate`]: A single generation run and its state machine.
//! - [`debounce`]: Keyed debouncing of delayed work.
//! - [`session`]: Debounced interactive generation.
//! - [`helper`]: PNG, data URL, file and clipboard export.
//! - [`config`]: Environment configuration and theme preference.

#![forbid(unsafe_code)]

pub mod backdrop;
pub mod compose;
pub mod config;
pub mod debounce;
pub mod decode;
pub mod encoder;
pub mod error;
pub mod generate;
pub mod helper;
pub mod layout;
pub mod raster;
pub mod session;

pub use compose::compose;
pub use error::{CompositionError, DecodeError, EncodeError};
pub use layout::{CompositionParams, LayoutResult};
pub use raster::RasterImage;
