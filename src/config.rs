//! Process configuration and persisted user preferences.
//!
//! [`Config`] is read once from `PIXELQR_*` environment variables.
//! [`Preferences`] holds the theme choice, loaded at startup and written back
//! on every toggle.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::DecoderKind;
use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "PIXELQR_";

/// Light or dark UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// The platform's color-scheme preference, when it expresses one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Dark,
    Light,
    Unknown,
}

impl ColorScheme {
    /// Reads an explicit `dark`/`light` override, falling back to the
    /// terminal's `COLORFGBG` (`"<fg>;<bg>"`, dark when the background is one
    /// of the dark ANSI colors).
    pub fn from_signals(explicit: Option<&str>, colorfgbg: Option<&str>) -> Self {
        match explicit.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("dark") => return ColorScheme::Dark,
            Some("light") => return ColorScheme::Light,
            _ => {}
        }
        let background = colorfgbg
            .and_then(|value| value.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());
        match background {
            Some(0..=6 | 8) => ColorScheme::Dark,
            Some(_) => ColorScheme::Light,
            None => ColorScheme::Unknown,
        }
    }

    /// Theme used when no preference has been stored yet.
    pub fn default_theme(self) -> Theme {
        match self {
            ColorScheme::Dark => Theme::Dark,
            ColorScheme::Light | ColorScheme::Unknown => Theme::Light,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<Theme>,
}

/// User preferences backed by a small JSON file (`{"theme":"dark"}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    path: PathBuf,
    theme: Theme,
}

impl Preferences {
    /// Loads preferences from `path`. A missing file or missing `theme` key
    /// resolves to the ambient color scheme; nothing is written until the
    /// first toggle.
    pub fn load(path: impl Into<PathBuf>, ambient: ColorScheme) -> Result<Self, ConfigError> {
        let path = path.into();
        let stored = if path.exists() {
            serde_json::from_str::<StoredPreferences>(&fs::read_to_string(&path)?)?
        } else {
            StoredPreferences::default()
        };
        let theme = stored.theme.unwrap_or_else(|| ambient.default_theme());
        debug!(path = %path.display(), theme = theme.as_str(), "loaded preferences");
        Ok(Self { path, theme })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flips the theme and persists it.
    pub fn toggle_theme(&mut self) -> Result<Theme, ConfigError> {
        self.theme = self.theme.toggled();
        self.save()?;
        Ok(self.theme)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let stored = StoredPreferences { theme: Some(self.theme) };
        fs::write(&self.path, serde_json::to_string(&stored)?)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    output_dir: Option<String>,
    preferences: Option<String>,
    decoder: Option<String>,
    color_scheme: Option<String>,
}

/// Settings resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output_dir: PathBuf,
    pub preferences_path: PathBuf,
    pub decoder: DecoderKind,
    pub color_scheme: ColorScheme,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Builds the configuration from `(name, value)` pairs.
    ///
    /// Only `PIXELQR_*` names are read, plus `COLORFGBG`, `XDG_CONFIG_HOME`
    /// and `HOME` for defaults.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let lookup = |name: &str| {
            vars.iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let prefixed = vars.iter().filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX).map(|rest| (rest.to_string(), value.clone()))
        });
        let raw: RawConfig = serde_env::from_iter(prefixed)?;

        let decoder = match raw.decoder.as_deref() {
            None | Some("auto") => DecoderKind::probe(),
            Some(name) => name.parse()?,
        };
        let preferences_path = match raw.preferences {
            Some(path) => PathBuf::from(path),
            None => default_preferences_path(lookup("XDG_CONFIG_HOME"), lookup("HOME")),
        };

        Ok(Self {
            output_dir: PathBuf::from(raw.output_dir.unwrap_or_else(|| "generated".to_string())),
            preferences_path,
            decoder,
            color_scheme: ColorScheme::from_signals(
                raw.color_scheme.as_deref(),
                lookup("COLORFGBG"),
            ),
        })
    }
}

fn default_preferences_path(xdg_config_home: Option<&str>, home: Option<&str>) -> PathBuf {
    let base = match (xdg_config_home, home) {
        (Some(xdg), _) if !xdg.is_empty() => PathBuf::from(xdg),
        (_, Some(home)) if !home.is_empty() => Path::new(home).join(".config"),
        _ => return PathBuf::from("pixelqr-preferences.json"),
    };
    base.join("pixelqr").join("preferences.json")
}
