use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pixelqr::config::{Config, Preferences};
use pixelqr::generate::{GenerateRequest, Generator};
use pixelqr::helper::{save_png, to_data_url};
use pixelqr::layout::{CompositionParams, DEFAULT_PADDING_RATIO, DEFAULT_SIZE_RATIO};

#[derive(Debug, Parser)]
#[command(name = "pixelqr", version, about = "Generate QR codes with a centered logo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a payload and save it as qrcode-<millis>.png
    Generate {
        /// Text or URL to encode
        payload: String,

        /// PNG, JPEG or SVG logo to place in the center
        #[arg(long)]
        logo: Option<PathBuf>,

        /// Backdrop side as a fraction of the code side (0.10 to 0.30)
        #[arg(long, default_value_t = DEFAULT_SIZE_RATIO)]
        size_ratio: f64,

        /// Padding around the logo as a fraction of the code side (0.00 to 0.08)
        #[arg(long, default_value_t = DEFAULT_PADDING_RATIO)]
        padding_ratio: f64,

        /// Use a square backdrop instead of a rounded one
        #[arg(long)]
        square: bool,

        /// Output directory, overrides PIXELQR_OUTPUT_DIR
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the image as a data URL as well
        #[arg(long)]
        data_url: bool,

        /// Copy the payload text to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Show or toggle the stored theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid PIXELQR_* configuration")?;

    match cli.command {
        Command::Generate {
            payload,
            logo,
            size_ratio,
            padding_ratio,
            square,
            out,
            data_url,
            copy,
        } => {
            let mut request = GenerateRequest::new(payload);
            if let Some(path) = logo {
                let bytes = fs::read(&path)
                    .with_context(|| format!("failed to read logo {}", path.display()))?;
                let params = CompositionParams::new(size_ratio, padding_ratio, !square);
                request = request.with_logo(bytes, params);
            }

            let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
            let generator = Generator::with_decoder(config.decoder);
            let generation = runtime.block_on(generator.run(request))?;

            if let Some(err) = &generation.logo_error {
                warn!(error = %err, "logo ignored");
            }
            if let Some(err) = &generation.composition_error {
                warn!(error = %err, "logo not composited");
            }
            let directory = out.unwrap_or(config.output_dir);
            let path = save_png(&generation.image, Some(&directory), None)?;
            println!("{}", path.display());

            if data_url {
                println!("{}", to_data_url(&generation.image)?);
            }
            if copy {
                copy_to_clipboard(&generation.payload)?;
            }
        }
        Command::Theme { toggle } => {
            let mut preferences = Preferences::load(&config.preferences_path, config.color_scheme)?;
            if toggle {
                preferences.toggle_theme()?;
                info!(path = %preferences.path().display(), "theme saved");
            }
            println!("{}", preferences.theme().as_str());
        }
    }

    Ok(())
}

#[cfg(feature = "clipboard")]
fn copy_to_clipboard(payload: &str) -> Result<()> {
    let mut clipboard = pixelqr::helper::SystemClipboard::new()?;
    pixelqr::helper::copy_payload(&mut clipboard, payload)?;
    info!("payload copied to clipboard");
    Ok(())
}

#[cfg(not(feature = "clipboard"))]
fn copy_to_clipboard(_payload: &str) -> Result<()> {
    anyhow::bail!("built without clipboard support")
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pixelqr=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
