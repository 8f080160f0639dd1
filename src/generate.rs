//! One generation run and the state machine around it.
//!
//! A run encodes the payload, decodes the logo if there is one, and composes
//! them. Only an encoder failure fails the run: a logo that cannot be decoded
//! or composed leaves the plain QR raster as the result, with the error kept
//! alongside it for the caller to report.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::compose::compose;
use crate::decode::{DecodeImage, DecoderKind};
use crate::encoder::{EncodeOptions, ErrorCorrection, ModuleEncoder, QrEncoder};
use crate::error::{CompositionError, DecodeError, EncodeError, GenerateError};
use crate::layout::CompositionParams;
use crate::raster::RasterImage;

/// Inputs of one run, snapshotted when the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub payload: String,
    /// Encoded logo file (PNG, JPEG or SVG), read fully into memory.
    pub logo: Option<Arc<[u8]>>,
    pub params: CompositionParams,
}

impl GenerateRequest {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            logo: None,
            params: CompositionParams::default(),
        }
    }

    pub fn with_logo(mut self, logo: impl Into<Arc<[u8]>>, params: CompositionParams) -> Self {
        self.logo = Some(logo.into());
        self.params = params;
        self
    }
}

/// The image produced by a successful run.
#[derive(Debug)]
pub struct Generation {
    pub payload: String,
    pub image: RasterImage,
    pub level: ErrorCorrection,
    /// Whether `image` carries the logo.
    pub composited: bool,
    pub logo_error: Option<DecodeError>,
    pub composition_error: Option<CompositionError>,
}

impl Generation {
    fn plain(payload: &str, image: RasterImage, level: ErrorCorrection) -> Self {
        Self {
            payload: payload.to_string(),
            image,
            level,
            composited: false,
            logo_error: None,
            composition_error: None,
        }
    }
}

pub type Outcome = Result<Generation, GenerateError>;

/// Encoder, decoder and compositor wired together.
#[derive(Clone)]
pub struct Generator {
    encoder: Arc<dyn QrEncoder>,
    decoder: Arc<dyn DecodeImage>,
}

impl Generator {
    pub fn new(encoder: Arc<dyn QrEncoder>, decoder: Arc<dyn DecodeImage>) -> Self {
        Self { encoder, decoder }
    }

    pub fn with_decoder(kind: DecoderKind) -> Self {
        Self::new(Arc::new(ModuleEncoder), kind.decoder())
    }

    pub fn decoder(&self) -> &dyn DecodeImage {
        self.decoder.as_ref()
    }

    /// Runs encode, logo decode and composition in order, yielding to the
    /// scheduler between steps.
    ///
    /// # Errors
    ///
    /// Fails only when the payload is blank or the encoder rejects it.
    pub async fn run(&self, request: GenerateRequest) -> Result<Generation, EncodeError> {
        if request.payload.trim().is_empty() {
            return Err(EncodeError::EmptyPayload);
        }
        let options = EncodeOptions::for_logo(request.logo.is_some());
        let qr = self.encoder.encode(&request.payload, &options)?;
        debug!(level = ?options.level, "qr raster ready");

        let Some(logo_bytes) = request.logo else {
            return Ok(Generation::plain(&request.payload, qr, options.level));
        };
        tokio::task::yield_now().await;

        let logo = match self.decoder.decode(&logo_bytes) {
            Ok(logo) => logo,
            Err(err) => {
                warn!(error = %err, decoder = self.decoder.name(), "logo could not be decoded");
                let mut generation = Generation::plain(&request.payload, qr, options.level);
                generation.logo_error = Some(err);
                return Ok(generation);
            }
        };
        tokio::task::yield_now().await;

        match compose(&qr, &logo, &request.params) {
            Ok(image) => {
                info!(
                    width = image.width(),
                    height = image.height(),
                    "generated qr code with logo"
                );
                Ok(Generation {
                    payload: request.payload,
                    image,
                    level: options.level,
                    composited: true,
                    logo_error: None,
                    composition_error: None,
                })
            }
            Err(err) => {
                warn!(error = %err, "composition failed, using plain qr code");
                let mut generation = Generation::plain(&request.payload, qr, options.level);
                generation.composition_error = Some(err);
                Ok(generation)
            }
        }
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::with_decoder(DecoderKind::probe())
    }
}

/// Where the generation flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Generating,
    Ready,
    Failed,
}

/// What observers see: the current state and the latest completed outcome.
///
/// While a run is in flight `outcome` still holds the previous result.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: FlowState,
    /// Number of completed runs.
    pub runs: u64,
    pub outcome: Option<Arc<Outcome>>,
}

/// `Idle → Generating → {Ready | Failed}`, with at most one run in flight.
#[derive(Debug)]
pub struct GenerationFlow {
    state: FlowState,
    runs: u64,
    latest: Option<Arc<Outcome>>,
}

impl GenerationFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Idle,
            runs: 0,
            latest: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_generating(&self) -> bool {
        self.state == FlowState::Generating
    }

    pub fn has_result(&self) -> bool {
        self.latest.is_some()
    }

    /// Enters `Generating`. Returns `false`, changing nothing, if a run is
    /// already in flight.
    pub fn try_begin(&mut self) -> bool {
        if self.is_generating() {
            return false;
        }
        self.state = FlowState::Generating;
        true
    }

    /// Records the outcome of the in-flight run.
    pub fn complete(&mut self, outcome: Outcome) {
        self.state = if outcome.is_ok() { FlowState::Ready } else { FlowState::Failed };
        self.runs += 1;
        self.latest = Some(Arc::new(outcome));
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            runs: self.runs,
            outcome: self.latest.clone(),
        }
    }
}

impl Default for GenerationFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::BitmapDecoder;
    use crate::helper::to_png_bytes;
    use image::{Rgba, RgbaImage};

    struct EmptyEncoder;

    impl QrEncoder for EmptyEncoder {
        fn encode(
            &self,
            _payload: &str,
            _options: &EncodeOptions,
        ) -> Result<RasterImage, EncodeError> {
            Ok(RasterImage::new(RgbaImage::new(0, 0)))
        }
    }

    fn png_logo(width: u32, height: u32) -> Vec<u8> {
        let logo = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        to_png_bytes(&RasterImage::new(logo)).unwrap()
    }

    #[tokio::test]
    async fn test_plain_run_uses_medium_level() {
        let request = GenerateRequest::new("https://example.com");
        let generation = Generator::default().run(request).await.unwrap();

        assert_eq!((generation.image.width(), generation.image.height()), (256, 256));
        assert_eq!(generation.level, ErrorCorrection::Medium);
        assert!(!generation.composited);
        assert!(generation.logo_error.is_none());
    }

    #[tokio::test]
    async fn test_logo_run_uses_high_level() {
        let request = GenerateRequest::new("https://example.com")
            .with_logo(png_logo(100, 50), CompositionParams::new(0.18, 0.04, true));
        let generation = Generator::default().run(request).await.unwrap();

        assert_eq!(generation.level, ErrorCorrection::High);
        assert!(generation.composited);
        assert_eq!(*generation.image.as_rgba().get_pixel(128, 128), Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn test_blank_payload_fails() {
        let err = Generator::default().run(GenerateRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, EncodeError::EmptyPayload));
    }

    #[tokio::test]
    async fn test_bad_logo_falls_back_to_plain() {
        let request = GenerateRequest::new("https://example.com")
            .with_logo(b"not an image".to_vec(), CompositionParams::default());
        let generation = Generator::default().run(request).await.unwrap();

        assert!(!generation.composited);
        assert!(matches!(generation.logo_error, Some(DecodeError::UnsupportedFormat)));
        assert_eq!(generation.level, ErrorCorrection::High);
        assert_eq!(generation.image.width(), 256);
    }

    #[tokio::test]
    async fn test_composition_failure_keeps_qr() {
        let generator = Generator::new(Arc::new(EmptyEncoder), Arc::new(BitmapDecoder));
        let request =
            GenerateRequest::new("payload").with_logo(png_logo(4, 4), CompositionParams::default());
        let generation = generator.run(request).await.unwrap();

        assert!(!generation.composited);
        assert_eq!(generation.composition_error, Some(CompositionError::EmptyQr));
        assert_eq!(generation.payload, "payload");
    }

    #[test]
    fn test_flow_transitions() {
        let mut flow = GenerationFlow::new();
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(!flow.has_result());

        assert!(flow.try_begin());
        assert!(!flow.try_begin());
        flow.complete(Err(GenerateError::Encode(EncodeError::EmptyPayload)));
        assert_eq!(flow.state(), FlowState::Failed);

        assert!(flow.try_begin());
        let snapshot = flow.snapshot();
        assert_eq!(snapshot.state, FlowState::Generating);
        assert_eq!(snapshot.runs, 1);
        assert!(matches!(snapshot.outcome.as_deref(), Some(Err(_))));
    }
}
