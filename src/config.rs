//! Application configuration.
//!
//! Loads settings from config.json at startup. Provides OCR preprocessing
//! parameters, the name-correction table, parse policy constants and the
//! roster source.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::stats::{CorrectionTable, ParsePolicy, RecordBuilder};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// A rectangle in absolute screenshot pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Stats table of the battle report on a 2560x1440 screenshot.
    pub const BATTLE_REPORT: PixelRect = PixelRect {
        x: 1240,
        y: 500,
        width: 1015,
        height: 605,
    };
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Grayscale binarization threshold (pixels brighter than it become white)
    #[serde(default = "default_ocr_threshold")]
    pub ocr_threshold: u8,
    /// Region to crop before OCR; the whole screenshot when absent
    #[serde(default)]
    pub crop: Option<PixelRect>,
    /// Explicit tesseract executable
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
    /// Extra misread-name corrections on top of the built-in ones
    #[serde(default = "CorrectionTable::empty")]
    pub corrections: CorrectionTable,
    #[serde(default)]
    pub policy: ParsePolicy,
    /// Guild profile page; `guildName` and `region` are added as query parameters
    #[serde(default = "default_roster_url")]
    pub roster_url: String,
    #[serde(default = "default_roster_region")]
    pub roster_region: String,
}

fn default_ocr_threshold() -> u8 {
    100
}

fn default_roster_url() -> String {
    "https://www.naeu.playblackdesert.com/en-US/Adventure/Guild/GuildProfile".to_string()
}

fn default_roster_region() -> String {
    "EU".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ocr_threshold: default_ocr_threshold(),
            crop: None,
            tesseract_path: None,
            corrections: CorrectionTable::empty(),
            policy: ParsePolicy::default(),
            roster_url: default_roster_url(),
            roster_region: default_roster_region(),
        }
    }
}

impl AppConfig {
    /// Record builder using the built-in corrections plus configured extras.
    pub fn record_builder(&self) -> RecordBuilder {
        let mut corrections = CorrectionTable::default();
        corrections.extend(&self.corrections);
        RecordBuilder::new(self.policy.clone(), corrections)
    }
}

/// Loads configuration from `path`, falling back to defaults on any problem.
pub fn load_config_from(config_path: &Path) -> AppConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    AppConfig::default()
}

/// Looks for config.json in the same directory as the executable.
fn load_config() -> AppConfig {
    let config_path = crate::paths::get_exe_dir().join("config.json");
    load_config_from(&config_path)
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns the global configuration, loading it on first use.
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(load_config)
}
