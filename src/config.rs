//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! calendar-config.toml file. It covers the physical panel (resolution,
//! mounting rotation, ink threshold), the calendar layout, the headless
//! browser used for compositing, and where output artifacts go.

use crate::error::{RenderError, Result};
use crate::glyphs::{self, AllDayCategory, GlyphRule};
use crate::logging::Logger;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "calendar-config.toml";

/// Application configuration loaded from calendar-config.toml
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Physical panel settings
    #[serde(default)]
    pub display: DisplaySettings,
    /// Calendar layout settings; required in a config file
    pub calendar: DisplayConfig,
    /// Headless browser settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Output artifact settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Physical panel configuration, set once per display integration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Panel width in pixels (before rotation)
    pub width: u32,
    /// Panel height in pixels (before rotation)
    pub height: u32,
    /// Counter-clockwise rotation in degrees, any multiple of 90
    pub rotation: i32,
    /// Luminance below this is ink, at or above is background
    pub threshold: u8,
}

/// How the battery icon is shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryDisplayMode {
    Hidden,
    #[default]
    Always,
    LowOnly,
}

/// Calendar layout configuration
///
/// The label arrays have no fallback: a config file must spell them out.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Events shown per day before the "N more" marker
    #[serde(default = "default_max_events_per_day")]
    pub max_events_per_day: u32,
    #[serde(default)]
    pub battery_display_mode: BatteryDisplayMode,
    /// Seven labels, Monday first
    pub day_of_week_labels: Vec<String>,
    /// First column of the grid, 0 = Monday ... 6 = Sunday
    #[serde(default)]
    pub week_start_day: u32,
    #[serde(default)]
    pub use_24_hour_clock: bool,
    /// Twelve labels, January first
    pub month_labels: Vec<String>,
    /// Keyword → glyph substitutions applied to every summary
    #[serde(default = "glyphs::default_glyph_rules")]
    pub glyph_rules: Vec<GlyphRule>,
    /// Decorations for all-day events
    #[serde(default = "glyphs::default_all_day_categories")]
    pub all_day_categories: Vec<AllDayCategory>,
}

fn default_max_events_per_day() -> u32 {
    3
}

/// Headless browser configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Browser executable (name on PATH or absolute path)
    pub program: String,
    /// Hard wall-clock budget for one capture
    pub timeout_secs: u64,
    /// Virtual time given to client-side scripts before the capture
    pub settle_delay_ms: u64,
    /// Extra flags passed before the page URL
    pub extra_args: Vec<String>,
}

/// Output artifact configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving black/red plane files
    pub directory: PathBuf,
    /// Page template; the built-in template is used when unset
    pub template: Option<PathBuf>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            width: 1304,  // Waveshare 12.48" B
            height: 984,  // Waveshare 12.48" B
            rotation: 0,  // Landscape mount
            threshold: 128,
        }
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            max_events_per_day: default_max_events_per_day(),
            battery_display_mode: BatteryDisplayMode::Always,
            day_of_week_labels: labels(&["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]),
            week_start_day: 0,
            use_24_hour_clock: false,
            month_labels: labels(&[
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]),
            glyph_rules: glyphs::default_glyph_rules(),
            all_day_categories: glyphs::default_all_day_categories(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            program: "chromium".to_string(),
            timeout_secs: 30,
            settle_delay_ms: 1000,
            extra_args: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("."),
            template: None,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DisplaySettings {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::data(format!(
                "display size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.rotation % 90 != 0 {
            return Err(RenderError::data(format!(
                "rotation {} is not a multiple of 90",
                self.rotation
            )));
        }
        Ok(())
    }
}

impl DisplayConfig {
    /// Reject config arrays the layout cannot index safely.
    pub fn validate(&self) -> Result<()> {
        if self.day_of_week_labels.len() != 7 {
            return Err(RenderError::data(format!(
                "expected 7 day-of-week labels, got {}",
                self.day_of_week_labels.len()
            )));
        }
        if self.month_labels.len() != 12 {
            return Err(RenderError::data(format!(
                "expected 12 month labels, got {}",
                self.month_labels.len()
            )));
        }
        if self.week_start_day > 6 {
            return Err(RenderError::data(format!(
                "week start day {} is outside 0-6",
                self.week_start_day
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from calendar-config.toml in the working directory
    pub fn load(logger: &Logger) -> Result<Self> {
        Self::load_from_path(CONFIG_FILE, logger)
    }

    /// Load configuration from specified path
    ///
    /// Only a missing file falls back to the default configuration. A file
    /// that exists but does not parse, or leaves out a required field, is a
    /// data error; nothing in it is silently replaced.
    pub fn load_from_path<P: AsRef<Path>>(path: P, logger: &Logger) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                logger.info(format_args!(
                    "No config file at {}, using default configuration",
                    path.display()
                ));
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&contents).map_err(|e| {
            RenderError::data(format!("invalid config file {}: {}", path.display(), e))
        })?;
        logger.info(format_args!(
            "Loaded configuration for {}x{} panel from {}",
            config.display.width,
            config.display.height,
            path.display()
        ));
        Ok(config)
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Validate everything a render pass relies on
    pub fn validate(&self) -> Result<()> {
        self.display.validate()?;
        self.calendar.validate()?;
        if self.engine.timeout_secs == 0 {
            return Err(RenderError::data("engine timeout must be non-zero"));
        }
        Ok(())
    }
}
