use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid options file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize options: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: usize,
    pub height: usize,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self { width: 80, height: 24 }
    }
}

/// Feature switches of a parser session. Each flag gates one scanner branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub enable_mxp: bool,
    pub enable_msp: bool,
    pub enable_url_detection: bool,
    /// Keep blink attributes; when off they are stripped from emitted fragments.
    pub enable_flashing: bool,
    /// Map control codes and 128-254 through the CP437 glyph table.
    pub emulate_terminal: bool,
    /// Interpret ESC, BEL, BS, TAB and CR instead of treating them as plain control codes.
    pub emulate_control_codes: bool,
    /// Show unhandled control codes as Unicode control pictures.
    pub display_control_codes: bool,
    /// Echo rejected or unknown MXP tags as literal text.
    pub show_invalid_mxp_tags: bool,
    pub enable_bell: bool,
    /// Emit link fragments for MXP `<A>` and `<SEND>`.
    pub enable_links: bool,
    pub enable_debug: bool,
    pub tab_width: usize,
    pub default_image_url: String,
    /// Completed lines kept for link expiry, 0 keeps everything.
    pub max_lines: usize,
    pub window: WindowSize,
    /// Color table overrides, keyed by color code.
    pub colors: BTreeMap<String, String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            enable_mxp: true,
            enable_msp: true,
            enable_url_detection: true,
            enable_flashing: false,
            emulate_terminal: false,
            emulate_control_codes: true,
            display_control_codes: false,
            show_invalid_mxp_tags: false,
            enable_bell: true,
            enable_links: true,
            enable_debug: false,
            tab_width: 8,
            default_image_url: "themes/general".to_string(),
            max_lines: 5000,
            window: WindowSize::default(),
            colors: BTreeMap::new(),
        }
    }
}

impl ParserOptions {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads options from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn store(&self, path: &Path) -> Result<(), ConfigError> {
        let mut write_name = path.to_path_buf();
        write_name.set_extension("new");
        fs::write(&write_name, self.to_toml()?)?;
        fs::rename(&write_name, path)?;
        Ok(())
    }

    /// Color overrides with their codes parsed; malformed keys are skipped.
    pub fn color_overrides(&self) -> impl Iterator<Item = (i32, &str)> {
        self.colors.iter().filter_map(|(code, color)| code.trim().parse::<i32>().ok().map(|c| (c, color.as_str())))
    }
}
