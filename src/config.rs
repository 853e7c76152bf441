//! Application configuration.
//!
//! Loads settings from config.json at startup. Provides the OCR endpoint,
//! rasterization and compression limits, and interaction thresholds.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Environment variable that overrides `ocr_api_key`.
pub const API_KEY_ENV: &str = "OCR_SPACE_API_KEY";

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR.space parse endpoint
    #[serde(default = "default_ocr_endpoint")]
    pub ocr_endpoint: String,
    /// OCR.space API key (sent as the `apikey` header)
    #[serde(default = "default_ocr_api_key")]
    pub ocr_api_key: String,
    /// Recognition language code
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// OCR.space engine number
    #[serde(default = "default_ocr_engine")]
    pub ocr_engine: u8,
    /// Request timeout for a single recognition call (seconds)
    #[serde(default = "default_ocr_timeout_secs")]
    pub ocr_timeout_secs: u64,
    /// Forces a display pixel density instead of the one the window reports
    #[serde(default)]
    pub device_pixel_ratio: Option<f32>,
    /// Oversampling factor applied on top of the pixel density
    #[serde(default = "default_render_oversample")]
    pub render_oversample: f32,
    /// Upper bound for the raster scale
    #[serde(default = "default_max_render_scale")]
    pub max_render_scale: f32,
    /// Crops wider or taller than this are downsampled before upload
    #[serde(default = "default_max_dimension")]
    pub max_crop_dimension: u32,
    /// Crops with more pixels than this are downsampled before upload
    #[serde(default = "default_max_pixels")]
    pub max_crop_pixels: u64,
    /// JPEG quality (1-100) for uploaded crops
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Selections narrower or shorter than this (display px) are ignored
    #[serde(default = "default_min_selection")]
    pub min_selection_size: f32,
    /// Accumulated wheel delta needed to turn a page
    #[serde(default = "default_wheel_threshold")]
    pub wheel_threshold: f32,
    /// Optional path to a custom form definition (JSON)
    #[serde(default)]
    pub form_path: Option<PathBuf>,
}

fn default_ocr_endpoint() -> String {
    "https://api.ocr.space/parse/image".to_string()
}

fn default_ocr_api_key() -> String {
    "helloworld".to_string() // OCR.space public demo key
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_ocr_engine() -> u8 {
    2
}

fn default_ocr_timeout_secs() -> u64 {
    60
}

fn default_render_oversample() -> f32 {
    2.0
}

fn default_max_render_scale() -> f32 {
    3.0
}

fn default_max_dimension() -> u32 {
    2000
}

fn default_max_pixels() -> u64 {
    4_000_000
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_min_selection() -> f32 {
    5.0
}

fn default_wheel_threshold() -> f32 {
    150.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ocr_endpoint: default_ocr_endpoint(),
            ocr_api_key: default_ocr_api_key(),
            ocr_language: default_ocr_language(),
            ocr_engine: default_ocr_engine(),
            ocr_timeout_secs: default_ocr_timeout_secs(),
            device_pixel_ratio: None,
            render_oversample: default_render_oversample(),
            max_render_scale: default_max_render_scale(),
            max_crop_dimension: default_max_dimension(),
            max_crop_pixels: default_max_pixels(),
            jpeg_quality: default_jpeg_quality(),
            min_selection_size: default_min_selection(),
            wheel_threshold: default_wheel_threshold(),
            form_path: None,
        }
    }
}

/// Reads a config file, falling back to defaults when it is missing or invalid.
pub fn load_config_from(config_path: &Path) -> AppConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if !config_path.exists() {
        crate::log("config.json not found. Using default config.");
        return AppConfig::default();
    }

    match fs::read_to_string(config_path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                crate::log(&format!("Config loaded from {}", config_path.display()));
                config
            }
            Err(e) => {
                crate::log(&format!(
                    "Failed to parse config.json: {}. Using defaults.",
                    e
                ));
                AppConfig::default()
            }
        },
        Err(e) => {
            crate::log(&format!(
                "Failed to read config.json: {}. Using defaults.",
                e
            ));
            AppConfig::default()
        }
    }
}

/// Loads configuration from the first existing candidate location.
fn load_config() -> AppConfig {
    let candidates = crate::paths::config_candidates();
    let config_path = candidates
        .iter()
        .find(|p| p.exists())
        .or(candidates.first())
        .cloned()
        .unwrap_or_else(|| PathBuf::from("config.json"));

    let mut config = load_config_from(&config_path);
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            crate::log(&format!("Using OCR API key from {}", API_KEY_ENV));
            config.ocr_api_key = key.trim().to_string();
        }
    }
    config
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns the global configuration, or defaults if `init_config` was never called.
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::default)
}
