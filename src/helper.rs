use crate::error::ExportError;
use crate::raster::RasterImage;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/*---- Export ----*/

/// Encodes a raster as PNG bytes.
///
/// # Errors
///
/// Returns an `ExportError::Png` if the PNG encoder fails.
pub fn to_png_bytes(raster: &RasterImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    raster.as_rgba().write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Encodes a raster as a `data:image/png;base64,...` URL.
///
/// # Example
///
/// ```rust
/// use image::RgbaImage;
/// use pixelqr::helper::to_data_url;
/// use pixelqr::raster::RasterImage;
///
/// let url = to_data_url(&RasterImage::new(RgbaImage::new(2, 2))).unwrap();
/// assert!(url.starts_with("data:image/png;base64,"));
/// ```
pub fn to_data_url(raster: &RasterImage) -> Result<String, ExportError> {
    let png = to_png_bytes(raster)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}

/// Milliseconds since the Unix epoch, or zero if the clock is before it.
pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// Download name for a result saved at `millis`.
pub fn download_filename(millis: u128) -> String {
    format!("qrcode-{}.png", millis)
}

/// Saves a raster as PNG and returns the written path.
///
/// # Arguments
///
/// * `raster` - The image to save.
/// * `directory_path` - Optional. The directory to save into, created if missing.
///   Defaults to "generated".
/// * `filename` - Optional. The file name. Defaults to `qrcode-<unix-millis>.png`.
///
/// # Errors
///
/// Returns an `ExportError` if encoding fails or the file cannot be written.
pub fn save_png(
    raster: &RasterImage,
    directory_path: Option<&Path>,
    filename: Option<&str>,
) -> Result<PathBuf, ExportError> {
    let directory_path = directory_path.unwrap_or_else(|| Path::new("generated"));
    let filename = match filename {
        Some(name) => name.to_string(),
        None => download_filename(unix_millis()),
    };

    // Check if the directory exists, create it if it doesn't
    if !directory_path.exists() {
        fs::create_dir_all(directory_path)?;
    }

    let file_path = directory_path.join(filename);
    fs::write(&file_path, to_png_bytes(raster)?)?;
    info!(path = %file_path.display(), "saved qr code");
    Ok(file_path)
}

/*---- Clipboard ----*/

/// Somewhere the payload text can be copied to.
pub trait TextSink {
    fn set_text(&mut self, text: &str) -> Result<(), ExportError>;
}

/// The system clipboard.
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, ExportError> {
        let inner = arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "clipboard")]
impl TextSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ExportError> {
        self.inner.set_text(text).map_err(|e| ExportError::Clipboard(e.to_string()))
    }
}

/// Keeps the last copied text in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub contents: Option<String>,
}

impl TextSink for MemorySink {
    fn set_text(&mut self, text: &str) -> Result<(), ExportError> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Copies the original payload text, not the image.
pub fn copy_payload(sink: &mut dyn TextSink, payload: &str) -> Result<(), ExportError> {
    sink.set_text(payload)?;
    debug!(len = payload.len(), "copied payload");
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> RasterImage {
        RasterImage::new(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])))
    }

    #[test]
    fn test_png_bytes_decode_back() {
        let png = to_png_bytes(&sample()).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded, *sample().as_rgba());
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename(1_700_000_000_123), "qrcode-1700000000123.png");
        assert!(unix_millis() > 0);
    }

    #[test]
    fn test_save_png_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("codes");

        let path = save_png(&sample(), Some(&nested), None).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("qrcode-") && name.ends_with(".png"));
        assert_eq!(fs::read(&path).unwrap(), to_png_bytes(&sample()).unwrap());
    }

    #[test]
    fn test_save_png_with_explicit_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_png(&sample(), Some(dir.path()), Some("mine.png")).unwrap();
        assert_eq!(path, dir.path().join("mine.png"));
        assert!(path.exists());
    }

    #[test]
    fn test_copy_payload_copies_text() {
        let mut sink = MemorySink::default();
        copy_payload(&mut sink, "https://example.com").unwrap();
        assert_eq!(sink.contents.as_deref(), Some("https://example.com"));
    }
}
