use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use incubator_core::ChunkingConfig;
use incubator_ml::HfInferenceConfig;
use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 43101;
pub const TOKEN_ENV: &str = "HF_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub chunking: ChunkingConfig,
    pub recognizer: HfInferenceConfig,
}

impl Config {
    /// `<config_dir>/incubator/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("incubator").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("invalid configuration")?;
        config.chunking.validate()?;
        Ok(config)
    }

    /// Reads `path` when given. Otherwise the default location is tried and
    /// skipped when nothing is there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|path| path.is_file()) {
                Some(path) => path,
                None => {
                    tracing::debug!("no configuration file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config =
            Self::from_toml(&content).with_context(|| format!("failed to load {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn set_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            self.recognizer.token = Some(SecretString::from(token));
        }
    }
}
