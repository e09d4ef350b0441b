use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::answer_key::DEFAULT_KEY_DELIMITER;
use crate::bubbles::DEFAULT_FILL_THRESHOLD;
use crate::error::Error;
use crate::grid::{EdgeThresholds, DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW};
use crate::image_utils::DEFAULT_BLUR_SIGMA;

/// Tuning for sheet evaluation. Every field has a default, so a config file
/// only needs to name what it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Cells with a mean intensity below this read as filled.
    pub fill_threshold: f64,
    /// Gaussian sigma applied before binarization and edge detection.
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub key_delimiter: char,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fill_threshold: DEFAULT_FILL_THRESHOLD,
            blur_sigma: DEFAULT_BLUR_SIGMA,
            canny_low: DEFAULT_CANNY_LOW,
            canny_high: DEFAULT_CANNY_HIGH,
            key_delimiter: DEFAULT_KEY_DELIMITER,
        }
    }
}

impl Options {
    pub fn edge_thresholds(&self) -> EdgeThresholds {
        EdgeThresholds {
            blur_sigma: self.blur_sigma,
            low: self.canny_low,
            high: self.canny_high,
        }
    }

    /// Checks that every setting can be handed to the pipeline as is.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.edge_thresholds().is_valid() {
            return Err(ConfigError::Invalid(format!(
                "cannyLow ({}) and cannyHigh ({}) must be finite with cannyLow <= cannyHigh",
                self.canny_low, self.canny_high
            )));
        }
        if !self.blur_sigma.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "blurSigma must be finite, got {}",
                self.blur_sigma
            )));
        }
        if !self.fill_threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "fillThreshold must be finite, got {}",
                self.fill_threshold
            )));
        }
        Ok(())
    }

    /// Reads options from a JSON file and validates them.
    pub fn from_json_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::Read(Error::Io {
                path: path.to_path_buf(),
                source,
            })
        })?;
        let options: Self = serde_json::from_str(&json)?;
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Read(Error),

    #[error("invalid options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid options: {0}")]
    Invalid(String),
}
