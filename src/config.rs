//! Pass configuration.
//!
//! Reclassification settings can come from a YAML file; CLI flags are laid
//! over whatever the file (or the built-in defaults) provide.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::PrepError;

/// Default JPEG quality for re-encoded images.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Filename keywords that mark a label file as a drink can.
pub const DEFAULT_CAN_KEYWORDS: [&str; 14] = [
    "lata",
    "can",
    "coca",
    "cola",
    "pepsi",
    "refrigerante",
    "soda",
    "crushed",
    "crumpled",
    "amassada",
    "esmagada",
    "drink-can",
    "schweppes",
    "tonica",
];

/// Options for the format normalizer.
#[derive(Clone, Debug)]
pub struct NormalizeOptions {
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    /// Classify and report without touching the dataset.
    pub dry_run: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            dry_run: false,
        }
    }
}

impl NormalizeOptions {
    pub fn validate(&self) -> Result<(), PrepError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PrepError::InvalidConfig {
                message: format!(
                    "JPEG quality must be in 1..=100, got {}",
                    self.jpeg_quality
                ),
            });
        }
        Ok(())
    }
}

/// Settings for the label reclassifier.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReclassifyConfig {
    /// Case-insensitive filename substrings selecting the target category.
    pub keywords: Vec<String>,
    /// Class index to replace.
    pub source_class: u32,
    /// Class index written in its place.
    pub target_class: u32,
}

impl Default for ReclassifyConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_CAN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            source_class: 0,
            target_class: 1,
        }
    }
}

impl ReclassifyConfig {
    /// Load a config from YAML. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, PrepError> {
        let data = fs::read_to_string(path).map_err(|source| PrepError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&data).map_err(|source| PrepError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(data: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }

    pub fn validate(&self) -> Result<(), PrepError> {
        if self.source_class == self.target_class {
            return Err(PrepError::InvalidConfig {
                message: format!(
                    "source and target class are both {}; nothing would change",
                    self.source_class
                ),
            });
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(PrepError::InvalidConfig {
                message: "at least one non-empty keyword is required".to_string(),
            });
        }
        Ok(())
    }
}
