//! Configuration types for capture and detection.
//!
//! Loads settings from config.json at startup. Provides the board detection
//! thresholds, OCR tiling parameters, and the default capture target.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<SnapConfig> = OnceLock::new();

/// Thresholds and sizing parameters for the board detector.
///
/// The defaults match the values tuned against the game's dark board theme;
/// other themes can override them via config.json.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum HSV saturation (0-255) for a pixel to count as board background
    #[serde(default = "default_saturation_max")]
    pub saturation_max: u8,
    /// Maximum HSV value (0-255) for a pixel to count as board background
    #[serde(default = "default_value_max")]
    pub value_max: u8,
    /// Candidates smaller than this fraction of the image area are discarded
    #[serde(default = "default_min_area_fraction")]
    pub min_area_fraction: f32,
    /// Lower bound of the accepted width/height ratio
    #[serde(default = "default_aspect_min")]
    pub aspect_min: f32,
    /// Upper bound of the accepted width/height ratio
    #[serde(default = "default_aspect_max")]
    pub aspect_max: f32,
    /// Morphology kernel size as a fraction of the shorter image dimension
    #[serde(default = "default_kernel_fraction")]
    pub kernel_fraction: f32,
    /// Minimum morphology kernel size in pixels
    #[serde(default = "default_kernel_min")]
    pub kernel_min: u32,
    /// Outward expansion of the winning rectangle, as a fraction of its shorter side
    #[serde(default = "default_pad_fraction")]
    pub pad_fraction: f32,
}

fn default_saturation_max() -> u8 {
    90
}

fn default_value_max() -> u8 {
    110
}

fn default_min_area_fraction() -> f32 {
    0.05
}

fn default_aspect_min() -> f32 {
    0.85
}

fn default_aspect_max() -> f32 {
    1.15
}

fn default_kernel_fraction() -> f32 {
    0.006
}

fn default_kernel_min() -> u32 {
    3
}

fn default_pad_fraction() -> f32 {
    0.02
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            saturation_max: default_saturation_max(),
            value_max: default_value_max(),
            min_area_fraction: default_min_area_fraction(),
            aspect_min: default_aspect_min(),
            aspect_max: default_aspect_max(),
            kernel_fraction: default_kernel_fraction(),
            kernel_min: default_kernel_min(),
            pad_fraction: default_pad_fraction(),
        }
    }
}

/// Parameters for the per-cell digit recognition pass.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Inward margin per tile in pixels, keeps grid lines out of the OCR input
    #[serde(default = "default_tile_margin")]
    pub tile_margin: u32,
    /// Tiles whose foreground fraction is below this are treated as empty
    /// without invoking Tesseract
    #[serde(default = "default_blank_threshold")]
    pub blank_threshold: f32,
}

fn default_tile_margin() -> u32 {
    5
}

fn default_blank_threshold() -> f32 {
    0.02
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tile_margin: default_tile_margin(),
            blank_threshold: default_blank_threshold(),
        }
    }
}

/// Complete tool configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Window title to capture when no target is given on the command line
    /// (substring match, case-insensitive)
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

fn default_window_title() -> String {
    "BRA-AL00".to_string()
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            detection: DetectionConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

/// Loads configuration from config.json or returns defaults.
/// Looks for config.json in the same directory as the executable.
fn load_config() -> SnapConfig {
    let config_path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf());

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
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
    }

    SnapConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static SnapConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuned_constants() {
        let cfg = DetectionConfig::default();
        assert_eq!(cfg.saturation_max, 90);
        assert_eq!(cfg.value_max, 110);
        assert_eq!(cfg.kernel_min, 3);
        assert!((cfg.min_area_fraction - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: SnapConfig =
            serde_json::from_str(r#"{"detection": {"value_max": 140}}"#).unwrap();
        assert_eq!(cfg.detection.value_max, 140);
        assert_eq!(cfg.detection.saturation_max, 90);
        assert_eq!(cfg.ocr.tile_margin, 5);
        assert_eq!(cfg.window_title, "BRA-AL00");
    }
}
