use crate::error::{Result, TapError};
use serde::Deserialize;
use std::fs;

pub const DEFAULT_BASE_URL: &str = "https://api2.autopilothq.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_key: String,
    pub user_agent: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// When true, a record with validation problems fails the sync run
    /// instead of being emitted with its problems logged.
    #[serde(default)]
    pub strict: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_per_page() -> usize {
    100
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            TapError::Config(format!("Failed to read config file '{}': {}", config_path, e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        if config.api_key.trim().is_empty() {
            return Err(TapError::Config("api_key must not be empty".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"secret\"").unwrap();
        writeln!(file, "user_agent = \"tap-autopilot test\"").unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.max_retries, 5);
        assert!(!config.strict);
    }

    #[test]
    fn test_load_rejects_empty_api_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"\"").unwrap();
        writeln!(file, "user_agent = \"tap-autopilot test\"").unwrap();

        let result = Config::load(file.path().to_str().unwrap());
        assert!(matches!(result, Err(TapError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = Config::load("/nonexistent/config.toml");
        assert!(matches!(result, Err(TapError::Config(_))));
    }
}
