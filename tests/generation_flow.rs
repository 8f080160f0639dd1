use image::{Rgba, RgbaImage};
use pixelqr::config::{ColorScheme, Preferences, Theme};
use pixelqr::decode::{decode_data_url, DecoderKind};
use pixelqr::encoder::ErrorCorrection;
use pixelqr::generate::{GenerateRequest, Generator};
use pixelqr::helper::{save_png, to_data_url, to_png_bytes};
use pixelqr::{CompositionParams, RasterImage};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn red_logo(width: u32, height: u32) -> Vec<u8> {
    to_png_bytes(&RasterImage::new(RgbaImage::from_pixel(width, height, RED))).unwrap()
}

#[tokio::test]
async fn plain_code_saved_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let request = GenerateRequest::new("https://example.com");
    let generation = Generator::default().run(request).await.unwrap();
    assert_eq!(generation.level, ErrorCorrection::Medium);

    let path = save_png(&generation.image, Some(dir.path()), None).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("qrcode-") && name.ends_with(".png"));

    let reloaded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(reloaded.dimensions(), (256, 256));
}

#[tokio::test]
async fn padded_logo_sits_on_rounded_backdrop() {
    let request = GenerateRequest::new("https://example.com")
        .with_logo(red_logo(100, 50), CompositionParams::new(0.18, 0.04, true));
    let generation = Generator::with_decoder(DecoderKind::Reader).run(request).await.unwrap();
    assert!(generation.composited);
    assert_eq!(generation.level, ErrorCorrection::High);

    let image = generation.image.as_rgba();
    // Backdrop 46x46 at 105, logo 26x13 at (115, 122).
    assert_eq!(*image.get_pixel(115, 122), RED);
    assert_eq!(*image.get_pixel(140, 134), RED);
    assert_eq!(*image.get_pixel(110, 110), WHITE);
    assert_eq!(*image.get_pixel(128, 140), WHITE);
    let red = image.pixels().filter(|p| **p == RED).count();
    assert_eq!(red, 26 * 13);
}

#[tokio::test]
async fn data_url_export_decodes_back() {
    let request = GenerateRequest::new("hello")
        .with_logo(red_logo(64, 64), CompositionParams::new(0.30, 0.0, false));
    let generation = Generator::default().run(request).await.unwrap();

    let url = to_data_url(&generation.image).unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
    let decoded = decode_data_url(&url, DecoderKind::Bitmap.decoder().as_ref()).unwrap();
    assert_eq!(decoded.as_rgba(), generation.image.as_rgba());
    // The logo fills the whole 77x77 box at 90.
    assert_eq!(*decoded.as_rgba().get_pixel(90, 90), RED);
    assert_eq!(*decoded.as_rgba().get_pixel(166, 166), RED);
}

#[test]
fn theme_preference_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs").join("preferences.json");

    let mut preferences = Preferences::load(&path, ColorScheme::Light).unwrap();
    assert_eq!(preferences.theme(), Theme::Light);
    assert!(!path.exists());

    preferences.toggle_theme().unwrap();
    let reloaded = Preferences::load(&path, ColorScheme::Light).unwrap();
    assert_eq!(reloaded.theme(), Theme::Dark);
}
