//! Generation parameters and their defaults.
//!
//! All structs here are plain immutable values. [GeneratorConfig] bundles the defaults used when a
//! caller does not provide a [SymbolSpec] or [CompositionOptions] of its own and can be stored as
//! JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Color, Ecl, Version};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_box_size() -> u32 {
    20
}

fn default_border() -> u32 {
    4
}

fn default_foreground() -> Color {
    Color::BLACK
}

fn default_background() -> Color {
    Color::WHITE
}

/// How to encode and rasterize a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Smallest version to use, `None` for automatic selection.
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub ecl: Ecl,
    /// Pixels per module, at least 1.
    #[serde(default = "default_box_size")]
    pub box_size: u32,
    /// Quiet zone around the symbol, in modules.
    #[serde(default = "default_border")]
    pub border: u32,
    #[serde(default = "default_foreground")]
    pub foreground: Color,
    #[serde(default = "default_background")]
    pub background: Color,
}

impl Default for SymbolSpec {
    fn default() -> Self {
        Self {
            version: None,
            ecl: Ecl::default(),
            box_size: default_box_size(),
            border: default_border(),
            foreground: default_foreground(),
            background: default_background(),
        }
    }
}

fn default_title_background() -> Color {
    Color::Hex([0x42, 0xf5, 0x93])
}

fn default_title_color() -> Color {
    Color::WHITE
}

fn default_font_size() -> f32 {
    30.0
}

/// Styling applied on top of the rasterized symbol. The title banner is always
/// [crate::qrstandard::TITLE_BANNER_HEIGHT] pixels high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionOptions {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_title_background")]
    pub title_background: Color,
    #[serde(default = "default_title_color")]
    pub title_color: Color,
    /// Font size of the title, in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Font files to try in order for the title. `None` uses the built-in system list. The
    /// embedded bitmap font is always the last resort.
    #[serde(default)]
    pub fonts: Option<Vec<PathBuf>>,
}

impl CompositionOptions {
    /// Get the title, treating an empty string as no title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            title: None,
            title_background: default_title_background(),
            title_color: default_title_color(),
            font_size: default_font_size(),
            fonts: None,
        }
    }
}

fn default_logo_size() -> f32 {
    0.2
}

/// A logo to overlay at the center of the symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoOptions {
    pub source: PathBuf,
    /// Longest side of the logo as a fraction of the shorter image side, in `(0, 1)`.
    #[serde(default = "default_logo_size")]
    pub size_fraction: f32,
}

impl LogoOptions {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            size_fraction: default_logo_size(),
        }
    }

    pub fn with_size_fraction(mut self, size_fraction: f32) -> Self {
        self.size_fraction = size_fraction;
        self
    }
}

/// Default parameters of a generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub symbol: SymbolSpec,
    #[serde(default)]
    pub composition: CompositionOptions,
}

impl GeneratorConfig {
    /// Load a JSON config from disk. Missing fields take their default values.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Serialize this config as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.symbol.version, None);
        assert_eq!(config.symbol.ecl, Ecl::M);
        assert_eq!(config.symbol.box_size, 20);
        assert_eq!(config.symbol.border, 4);
        assert_eq!(config.symbol.foreground, Color::BLACK);
        assert_eq!(config.symbol.background, Color::WHITE);
        assert_eq!(config.composition.font_size, 30.0);
        assert_eq!(config.composition.title(), None);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: GeneratorConfig = serde_json::from_str(
            r##"{"symbol": {"box_size": 5, "foreground": "#102030"}, "composition": {"title": "Hi"}}"##,
        )
        .unwrap();
        assert_eq!(config.symbol.box_size, 5);
        assert_eq!(config.symbol.border, 4);
        assert_eq!(config.symbol.foreground, Color::Hex([0x10, 0x20, 0x30]));
        assert_eq!(config.composition.title(), Some("Hi"));
        assert_eq!(config.composition.font_size, 30.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = GeneratorConfig::default();
        config.symbol.version = Some(Version::V05);
        config.composition = config.composition.with_title("Menu");
        let json = config.to_json().unwrap();
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_banner_height_is_not_configurable() {
        let json = GeneratorConfig::default().to_json().unwrap();
        assert!(!json.contains("banner_height"));
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"composition": {"banner_height": 200}}"#).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_empty_title_is_no_title() {
        let options = CompositionOptions::default().with_title("");
        assert_eq!(options.title(), None);
    }

    #[test]
    fn test_load_json_missing_file() {
        let err = GeneratorConfig::load_json("/nonexistent/qrstamp.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
