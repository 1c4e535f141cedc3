//! `gallery.toml`

use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use crate::core::Result;

pub const DEFAULT_CONFIG_FILE: &str = "gallery.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// e.g. `http://localhost:3000`, `/api/images` is appended
    pub api_base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub image_host: Option<ImageHostConfig>,
}

/// 图床配置 (imgbb 兼容)
#[derive(Deserialize, Debug, Clone)]
pub struct ImageHostConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl Config {
    pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
        let config_str = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Config> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = Config::from_toml(r#"api_base_url = "http://localhost:3000""#).unwrap();
        assert!(config.api_base_url.starts_with("http"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.image_host.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(r#"
            api_base_url = "https://gallery.test"
            request_timeout_secs = 5

            [image_host]
            endpoint = "https://api.imgbb.com/1/upload"
            api_key = "secret"
        "#).unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        let host = config.image_host.unwrap();
        assert_eq!(host.endpoint, "https://api.imgbb.com/1/upload");
        assert_eq!(host.api_key, "secret");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Config::load_config("does-not-exist.toml").is_err());
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(Config::from_toml("api_base_url = ").is_err());
    }
}
