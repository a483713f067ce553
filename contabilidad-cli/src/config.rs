use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const API_URL_ENV: &str = "CONTABILIDAD_API_URL";
const API_TOKEN_ENV: &str = "CONTABILIDAD_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the movements backend, e.g. "http://localhost:8000"
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Where local data (recurring expenses, dismissals, notifications) lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// How many days of movements to fetch for listings and detection
    #[serde(default = "default_movement_limit")]
    pub movement_limit: u32,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_movement_limit() -> u32 {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
            data_dir: None,
            movement_limit: default_movement_limit(),
        }
    }
}

fn root_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Cannot determine config directory")?
        .join("contabilidad"))
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(root_path()?.join("config.toml"))
    }

    /// Load config from disk and apply environment overrides. Returns the
    /// default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            Self::parse(&raw)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = var(API_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    /// Directory of the local store: `data_dir` if set, otherwise the
    /// platform data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .context("Cannot determine data directory")?
                .join("contabilidad")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = AppConfig::parse("api_token = \"abc\"").unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.movement_limit, 100);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            API_URL_ENV => Some("https://finanzas.example.com".to_string()),
            API_TOKEN_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_url, "https://finanzas.example.com");
        assert!(config.api_token.is_none());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/tmp/contabilidad")),
            movement_limit: 30,
            ..AppConfig::default()
        };
        let raw = toml::to_string_pretty(&config).unwrap();
        assert_eq!(AppConfig::parse(&raw).unwrap(), config);
    }
}
