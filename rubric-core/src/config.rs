//! Engine configuration, loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::PipelineConfig;
use rubric_judge::JudgeConfig;

/// Top-level configuration for the correctness engine.
///
/// ```toml
/// validate_schema = true
///
/// [judge]
/// base_url = "https://judge.example.com/api"
/// api_key = "API_TESTER"
/// api_secret = "..."
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Toggles the Validating stage for every request.
    pub validate_schema: ValidateSchema,
    /// Connection settings for the remote code judge.
    pub judge: JudgeConfig,
}

/// Newtype so the toggle defaults to on rather than bool's default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidateSchema(pub bool);

impl Default for ValidateSchema {
    fn default() -> Self {
        Self(true)
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The pipeline switches this configuration selects.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            validate_schema: self.validate_schema.0,
        }
    }
}

/// Errors loading engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid engine configuration: {0}")]
    Parse(String),
}
