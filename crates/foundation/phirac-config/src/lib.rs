//! # phirac-config
//!
//! Codec configuration: a YAML or JSON file, then environment overrides.
//!
//! ```text
//!   defaults ──▶ ~/.config/phirac/config.yaml ──▶ PHIRAC_* env ──▶ validate()
//! ```

use phirac_core::{ModelScope, SymbolOrder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default symbols per batch
pub const DEFAULT_HORIZON: usize = 4096;

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidError(String),
}

impl From<ConfigError> for phirac_core::Error {
    fn from(e: ConfigError) -> Self {
        phirac_core::Error::ConfigError(e.to_string())
    }
}

/// How input files become symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tokenizer {
    /// One symbol per byte
    #[default]
    Bytes,
    /// Alternating word and separator runs of UTF-8 text
    Words,
}

impl std::str::FromStr for Tokenizer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bytes" | "byte" => Ok(Tokenizer::Bytes),
            "words" | "word" => Ok(Tokenizer::Words),
            other => Err(ConfigError::InvalidError(format!("unknown tokenizer '{}'", other))),
        }
    }
}

/// Codec settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum symbols per batch
    pub horizon: usize,

    /// One shared model, or one per batch
    pub model_scope: ModelScope,

    /// Symbol order of counted models
    pub symbol_order: SymbolOrder,

    /// Input tokenization used by the CLI
    pub tokenizer: Tokenizer,

    /// Code batches on the rayon pool
    pub parallel: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            model_scope: ModelScope::Global,
            symbol_order: SymbolOrder::FirstSeen,
            tokenizer: Tokenizer::Bytes,
            parallel: true,
        }
    }
}

impl CodecConfig {
    /// Default config file (~/.config/phirac/config.yaml)
    pub fn default_location() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phirac")
            .join("config.yaml")
    }

    /// Read a config file; `.json` is parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default file if present, defaults otherwise, then environment
    pub fn load_default() -> Result<Self> {
        let path = Self::default_location();
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `PHIRAC_HORIZON`, `PHIRAC_MODEL_SCOPE` and `PHIRAC_PARALLEL`
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key → value lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PHIRAC_HORIZON") {
            self.horizon = v.trim().parse().map_err(|_| {
                ConfigError::InvalidError(format!("PHIRAC_HORIZON '{}' is not a number", v))
            })?;
        }
        if let Some(v) = lookup("PHIRAC_MODEL_SCOPE") {
            self.model_scope = v
                .parse()
                .map_err(|e: phirac_core::Error| ConfigError::InvalidError(e.to_string()))?;
        }
        if let Some(v) = lookup("PHIRAC_PARALLEL") {
            self.parallel = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::InvalidError(format!(
                        "PHIRAC_PARALLEL '{}' is not a boolean",
                        other
                    )))
                }
            };
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ConfigError::InvalidError("horizon must be at least 1".into()));
        }
        if self.horizon > u32::MAX as usize {
            return Err(ConfigError::InvalidError(format!(
                "horizon {} exceeds {}",
                self.horizon,
                u32::MAX
            )));
        }
        Ok(())
    }

    /// YAML rendering of the effective configuration
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
