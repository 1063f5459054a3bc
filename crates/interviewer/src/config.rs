//! Configuration file support for interviewer.
//!
//! Loads configuration from `interviewer.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use interviewer_oracle::{OracleConfig, OracleType};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "interviewer.toml";

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration loaded from `interviewer.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub oracle: OracleSection,
    #[serde(default)]
    pub approval: ApprovalSection,
    #[serde(default)]
    pub server: ServerSection,
}

/// `[oracle]`: which completion backend to use
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OracleSection {
    /// "openai" or "command"
    pub kind: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Binary for the command backend
    pub binary: Option<PathBuf>,
    /// Per-request timeout, e.g. "45s"
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// `[approval]`: human review of final reports
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ApprovalSection {
    /// "auto" or "console"
    pub mode: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// `[server]`: HTTP API settings
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
}

/// Command-line overrides for the oracle section
#[derive(Debug, Default, Clone)]
pub struct OracleOverrides {
    pub kind: Option<OracleType>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_file(&working_dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from an explicit path; missing file is not an error
    pub fn load_file(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Load a config file named on the command line; it must exist
    pub fn load_required(config_path: &Path) -> Result<Self> {
        Self::load_file(config_path)?
            .with_context(|| format!("Config file {} not found", config_path.display()))
    }

    /// Resolve the oracle configuration.
    /// Priority: command-line flag > config file > default
    pub fn oracle_config(&self, overrides: &OracleOverrides) -> Result<OracleConfig> {
        let kind = match overrides.kind {
            Some(kind) => kind,
            None => match self.oracle.kind.as_deref() {
                Some(kind) => kind.parse::<OracleType>().map_err(|e| anyhow::anyhow!(e))?,
                None => OracleType::OpenAi,
            },
        };

        let mut config = OracleConfig::new(kind).with_timeout(
            self.oracle
                .timeout
                .unwrap_or(DEFAULT_ORACLE_TIMEOUT),
        );

        if let Some(model) = overrides.model.clone().or_else(|| self.oracle.model.clone()) {
            config = config.with_model(model);
        }
        if let Some(url) = overrides
            .base_url
            .clone()
            .or_else(|| self.oracle.base_url.clone())
        {
            config = config.with_base_url(url);
        }
        if let Some(ref binary) = self.oracle.binary {
            config = config.with_binary_path(binary.clone());
        }

        if kind == OracleType::OpenAi {
            let key_env = self.api_key_env();
            if let Ok(key) = std::env::var(key_env) {
                config = config.with_api_key(key);
            }
        }

        Ok(config)
    }

    pub fn api_key_env(&self) -> &str {
        self.oracle
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }

    pub fn approval_mode(&self) -> Option<&str> {
        self.approval.mode.as_deref()
    }

    pub fn approval_timeout(&self) -> Option<Duration> {
        self.approval.timeout
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.server.database.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_named_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("elsewhere.toml");
        let err = AppConfig::load_required(&missing).unwrap_err();
        assert!(err.to_string().contains("not found"));

        std::fs::write(&missing, "[server]\nport = 9200\n").unwrap();
        assert_eq!(AppConfig::load_required(&missing).unwrap().port(), 9200);
    }

    #[test]
    fn test_full_config_parses() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
[oracle]
kind = "command"
model = "sonnet"
binary = "/usr/local/bin/claude"
timeout = "45s"

[approval]
mode = "console"
timeout = "2m"

[server]
port = 9100
database = "/tmp/interviews.db"
"#,
        )
        .unwrap();

        let config = AppConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.approval_mode(), Some("console"));
        assert_eq!(config.approval_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.port(), 9100);
        assert_eq!(
            config.database_path(),
            Some(Path::new("/tmp/interviews.db"))
        );

        let oracle = config.oracle_config(&OracleOverrides::default()).unwrap();
        assert_eq!(oracle.oracle_type, OracleType::Command);
        assert_eq!(oracle.model.as_deref(), Some("sonnet"));
        assert_eq!(oracle.timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_cli_overrides_file() {
        let config: AppConfig = toml::from_str(
            r#"
[oracle]
kind = "command"
model = "sonnet"
"#,
        )
        .unwrap();

        let overrides = OracleOverrides {
            kind: Some(OracleType::OpenAi),
            model: Some("gpt-4o".to_string()),
            base_url: None,
        };
        let oracle = config.oracle_config(&overrides).unwrap();
        assert_eq!(oracle.oracle_type, OracleType::OpenAi);
        assert_eq!(oracle.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_unknown_field_is_hard_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[oracle]\nflavour = \"spicy\"\n",
        )
        .unwrap();
        assert!(AppConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_bad_oracle_kind_is_error() {
        let config: AppConfig = toml::from_str("[oracle]\nkind = \"carrier-pigeon\"\n").unwrap();
        assert!(config.oracle_config(&OracleOverrides::default()).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.api_key_env(), DEFAULT_API_KEY_ENV);
        let oracle = config.oracle_config(&OracleOverrides::default()).unwrap();
        assert_eq!(oracle.oracle_type, OracleType::OpenAi);
        assert_eq!(oracle.timeout, Some(DEFAULT_ORACLE_TIMEOUT));
    }
}
