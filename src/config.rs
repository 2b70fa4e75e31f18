//! Configuration loading and management for briefly.
//!
//! Loads settings from `briefly.toml` with environment variable overrides for
//! the model selection. Every section has defaults, so running without a config
//! file is supported.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Slider range for the maximum summary length, in tokens.
pub const MAX_LENGTH_RANGE: (usize, usize) = (50, 200);
/// Slider range for the minimum summary length, in tokens.
pub const MIN_LENGTH_RANGE: (usize, usize) = (20, 100);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Which device the model runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    /// CUDA device 0 when available, CPU otherwise
    Cuda,
}

/// Pretrained model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Hugging Face hub repository id
    pub repo: String,
    /// Repository revision (branch, tag or commit)
    pub revision: String,
    pub device: DeviceKind,
    /// Instruction prefix prepended to every input
    pub prefix: String,
}

/// Decoding parameters shared by every request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Default upper bound on summary length, in tokens
    pub max_length: usize,
    /// Default lower bound on summary length, in tokens
    pub min_length: usize,
    pub num_beams: usize,
    /// Exponent applied to the sequence length when ranking hypotheses
    pub length_penalty: f32,
    pub early_stopping: bool,
    /// Forbid repeating any n-gram of this size (0 disables)
    pub no_repeat_ngram_size: usize,
    /// Encoder context length; longer inputs are truncated
    pub max_input_tokens: usize,
}

/// HTTP settings for article extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_redirects: usize,
}

/// Where UI sessions write their log output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub generation: GenerationConfig,
    pub scraper: ScraperConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location (briefly.toml in cwd or home).
    ///
    /// Falls back to defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::parse_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override model selection from environment variables
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(repo) = var("BRIEFLY_MODEL") {
            self.model.repo = repo;
        }
        match var("BRIEFLY_DEVICE").as_deref() {
            Some("cuda") => self.model.device = DeviceKind::Cuda,
            Some("cpu") => self.model.device = DeviceKind::Cpu,
            Some(other) => log::warn!("ignoring unknown BRIEFLY_DEVICE value: {}", other),
            None => {}
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from("briefly.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("briefly")
            .join("briefly.toml");
        home_config.exists().then_some(home_config)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            repo: "t5-small".to_string(),
            revision: "main".to_string(),
            device: DeviceKind::Cpu,
            prefix: "summarize: ".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: 130,
            min_length: 30,
            num_beams: 4,
            length_penalty: 2.0,
            early_stopping: true,
            no_repeat_ngram_size: 3,
            max_input_tokens: 1024,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("briefly/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            file: dir.join("briefly.log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_slider_defaults() {
        let config = Config::default();
        assert_eq!(config.generation.max_length, 130);
        assert_eq!(config.generation.min_length, 30);
        assert_eq!(config.generation.num_beams, 4);
        assert_eq!(config.generation.max_input_tokens, 1024);
        assert_eq!(config.model.prefix, "summarize: ");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[generation]\nnum_beams = 2\n\n[model]\nrepo = \"google/flan-t5-base\"\ndevice = \"cuda\""
        )
        .unwrap();

        let config = Config::parse_file(file.path()).unwrap();
        assert_eq!(config.generation.num_beams, 2);
        assert_eq!(config.generation.max_length, 130);
        assert_eq!(config.model.repo, "google/flan-t5-base");
        assert_eq!(config.model.device, DeviceKind::Cuda);
        assert_eq!(config.model.revision, "main");
        assert_eq!(config.scraper.timeout_secs, 30);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation\nnum_beams = ").unwrap();
        assert!(matches!(
            Config::parse_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn env_overrides_model_selection() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "BRIEFLY_MODEL" => Some("t5-base".to_string()),
            "BRIEFLY_DEVICE" => Some("cuda".to_string()),
            _ => None,
        });
        assert_eq!(config.model.repo, "t5-base");
        assert_eq!(config.model.device, DeviceKind::Cuda);
    }

    #[test]
    fn toml_round_trip_of_defaults() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("[generation]"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.generation.length_penalty, 2.0);
    }

    #[test]
    fn default_user_agent_is_name_and_version() {
        let agent = ScraperConfig::default().user_agent;
        assert_eq!(agent, format!("briefly/{}", env!("CARGO_PKG_VERSION")));
    }
}
