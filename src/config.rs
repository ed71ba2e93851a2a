// Configuration management
//
// Display settings are read once at start-up. The LCD section is fixed for
// the lifetime of the compositor; nothing here is mutated at runtime.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Default configuration file path
pub const CONFIG_FILE: &str = "lcd_config.toml";

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed TOML
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Values that parse but cannot be used
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// LCD panel settings
    #[serde(default)]
    pub lcd: LcdConfig,

    /// Window settings
    #[serde(default)]
    pub video: VideoConfig,
}

/// LCD panel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcdConfig {
    /// Panel width in pixels
    pub width: usize,

    /// Panel height in pixels
    pub height: usize,

    /// Emulate passive-matrix ghosting
    pub blend: bool,
}

/// Video configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Window scale (1-8)
    pub scale: u32,

    /// Target FPS (usually 60)
    pub fps: u32,

    /// Enable VSync
    pub vsync: bool,
}

impl Default for LcdConfig {
    fn default() -> Self {
        LcdConfig {
            width: 160,
            height: 144,
            blend: true,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            scale: 3,
            fps: 60,
            vsync: true,
        }
    }
}

impl DisplayConfig {
    /// Load configuration from `path` or fall back to defaults
    ///
    /// If the file doesn't exist, the defaults are written to it. A file that
    /// exists but cannot be parsed is reported and left untouched.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                // Try to save the default config, but don't fail if we can't
                if let Err(e) = config.save(path) {
                    log::warn!("could not write default config to {}: {}", path.display(), e);
                }
                config
            }
            Err(e) => {
                log::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load and validate configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the display cannot be built from
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lcd.width == 0 || self.lcd.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "LCD size must be non-zero, got {}x{}",
                self.lcd.width, self.lcd.height
            )));
        }
        if self.video.fps == 0 {
            return Err(ConfigError::Invalid("fps must be non-zero".to_string()));
        }
        Ok(())
    }
}
