//! Application Configuration
//!
//! Pipeline constants, OCR settings and the character palette, stored in
//! TOML format. Loaded once at startup and never changed afterwards.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::vision::CharacterPalette;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bubble geometry and color quantization
    pub pipeline: PipelineSettings,
    /// External OCR engine settings
    pub ocr: OcrSettings,
    /// Character palette entries
    pub characters: Vec<CharacterEntry>,
}

impl AppConfig {
    /// Build the validated palette from the configured characters
    pub fn palette(&self) -> Result<CharacterPalette, PipelineError> {
        CharacterPalette::new(
            self.characters
                .iter()
                .map(|entry| (entry.name.clone(), entry.color)),
        )
    }
}

/// Bubble geometry and color quantization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Padding around text blocks, also the side of a marker square (pixels)
    pub padding: u32,
    /// Significant bits kept per color channel before palette lookup
    pub posterize_bits: u8,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            padding: 8,
            posterize_bits: 3,
        }
    }
}

impl PipelineSettings {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.padding == 0 {
            return Err(PipelineError::InvalidSettings(
                "padding must be at least 1 pixel".to_string(),
            ));
        }
        if !(1..=8).contains(&self.posterize_bits) {
            return Err(PipelineError::InvalidSettings(format!(
                "posterize_bits must be between 1 and 8, got {}",
                self.posterize_bits
            )));
        }
        Ok(())
    }
}

/// External OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language code
    pub language: String,
    /// Tesseract executable
    pub tesseract_path: PathBuf,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "jpn".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
        }
    }
}

/// One character of the palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEntry {
    /// Character name, emitted with each attributed bubble
    pub name: String,
    /// Posterized marker color as `[r, g, b]`
    pub color: [u8; 3],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineSettings::default(),
            ocr: OcrSettings::default(),
            characters: vec![CharacterEntry {
                name: "井上トロ".to_string(),
                color: [224, 224, 192],
            }],
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
