//! Desired configuration file (`spaces.toml` / `spaces.json`)

use declarative::SpaceSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid {format} in {}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        format: ConfigFormat,
        message: String,
    },

    #[error("unsupported config file '{}' (expected .toml or .json)", .0.display())]
    UnknownFormat(PathBuf),

    #[error("{field}: environment variable '{var}' is not set")]
    UnsetVariable { field: String, var: String },

    #[error("invalid space address '{0}': use letters, digits, '-' or '_'")]
    InvalidAddress(String),
}

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toml => write!(f, "TOML"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

/// Connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Hub endpoint; defaults to the public hub
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access token; `${VAR}` references are expanded
    #[serde(default)]
    pub token: Option<String>,
}

/// Top-level desired configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpacesConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Desired spaces keyed by resource address
    #[serde(default)]
    pub spaces: BTreeMap<String, SpaceSpec>,
}

impl SpacesConfig {
    /// Load, expand and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format =
            ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnknownFormat(path.into()))?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.into(),
            source,
        })?;
        let config = Self::parse(&content, format).map_err(|message| ConfigError::Parse {
            path: path.into(),
            format,
            message,
        })?;
        log::debug!("Loaded {} space(s) from {}", config.spaces.len(), path.display());
        config.expanded()
    }

    fn parse(content: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Expand `${VAR}` in the token and in every secret and variable value,
    /// then check addresses.
    fn expanded(mut self) -> Result<Self, ConfigError> {
        if let Some(token) = &self.provider.token {
            self.provider.token = Some(expand_env("provider.token", token)?);
        }
        for (address, spec) in &mut self.spaces {
            if !is_valid_address(address) {
                return Err(ConfigError::InvalidAddress(address.clone()));
            }
            for (noun, values) in [("secrets", &mut spec.secrets), ("variables", &mut spec.variables)] {
                for (key, value) in values.iter_mut() {
                    *value = expand_env(&format!("spaces.{address}.{noun}.{key}"), value)?;
                }
            }
        }
        Ok(self)
    }

    /// Token to use: command line (or `HF_TOKEN`) first, then the config file.
    pub fn token(&self, cli: Option<&str>) -> Option<String> {
        cli.filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| self.provider.token.clone().filter(|t| !t.is_empty()))
    }

    pub fn endpoint(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.provider.endpoint.clone())
            .unwrap_or_else(|| hubkit::DEFAULT_ENDPOINT.to_string())
    }
}

fn expand_env(field: &str, value: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(|v| v.into_owned())
        .map_err(|e| ConfigError::UnsetVariable {
            field: field.to_string(),
            var: e.var_name,
        })
}

pub fn is_valid_address(address: &str) -> bool {
    !address.is_empty()
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
