//! Runtime settings: defaults, optional YAML file, then CLI/env overrides.
//!
//! ```yaml
//! # config.yaml
//! base_url: https://proxy.example.com/api/
//! timeout_secs: 15
//! user_agent: newsdesk/0.1
//! # api_key is accepted but a proxy that injects the key is preferred
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::query::ApiEndpoint;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Local proxy prefix, as served by the development server in front of the API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173/api/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Contents of the optional YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    pub fn from_yaml(path: &str, text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        Self::from_yaml(path, &text)
    }
}

/// Fully resolved settings.
pub struct Settings {
    pub endpoint: ApiEndpoint,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("endpoint", &self.endpoint.base().as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Settings {
    /// Merge CLI/env values over file values over defaults.
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let base_url = cli
            .base_url
            .clone()
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint = ApiEndpoint::parse(&base_url)?;
        let api_key = cli
            .api_key
            .clone()
            .or(file.api_key)
            .filter(|k| !k.trim().is_empty());
        let timeout_secs = cli
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);
        let user_agent = file.user_agent.unwrap_or_else(|| {
            format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        });
        Ok(Settings {
            endpoint,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            user_agent,
        })
    }

    /// Load the config file named on the command line, if any, and merge.
    pub async fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path).await?,
            None => FileConfig::default(),
        };
        let settings = Self::merge(cli, file)?;
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["newsdesk"];
        full.extend_from_slice(args);
        full.push("articles");
        Cli::parse_from(full)
    }

    #[test]
    fn test_defaults() {
        let s = Settings::merge(&cli(&[]), FileConfig::default()).unwrap();
        assert_eq!(s.endpoint.base().as_str(), DEFAULT_BASE_URL);
        assert_eq!(s.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(s.user_agent.starts_with("newsdesk/"));
    }

    #[test]
    fn test_file_values_apply() {
        let file = FileConfig::from_yaml(
            "config.yaml",
            "base_url: https://proxy.example.com/news\ntimeout_secs: 3\nuser_agent: test-agent\n",
        )
        .unwrap();
        let s = Settings::merge(&cli(&[]), file).unwrap();
        assert_eq!(s.endpoint.base().as_str(), "https://proxy.example.com/news/");
        assert_eq!(s.timeout, Duration::from_secs(3));
        assert_eq!(s.user_agent, "test-agent");
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            base_url: Some("https://from-file.example.com/".into()),
            timeout_secs: Some(3),
            ..Default::default()
        };
        let s = Settings::merge(
            &cli(&["--base-url", "http://from-cli.local/api", "--timeout-secs", "20"]),
            file,
        )
        .unwrap();
        assert_eq!(s.endpoint.base().as_str(), "http://from-cli.local/api/");
        assert_eq!(s.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FileConfig::from_yaml("config.yaml", "base_uri: http://x\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_page_size_is_not_configurable() {
        let err = FileConfig::from_yaml("config.yaml", "page_size: 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_bad_base_url() {
        let file = FileConfig {
            base_url: Some("::not-a-url".into()),
            ..Default::default()
        };
        assert!(matches!(
            Settings::merge(&cli(&[]), file),
            Err(ConfigError::BaseUrl { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let file = FileConfig {
            api_key: Some("secret-key".into()),
            ..Default::default()
        };
        let s = Settings::merge(&cli(&[]), file).unwrap();
        let shown = format!("{:?}", s);
        assert!(!shown.contains("secret-key"));
        assert!(shown.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = FileConfig::load("/nonexistent/newsdesk/config.yaml").await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
