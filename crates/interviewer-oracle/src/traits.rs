use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while asking the oracle for a completion
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to spawn oracle process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Oracle request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle request failed: {0}")]
    RequestFailed(String),

    #[error("Oracle returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Oracle returned an empty completion")]
    EmptyCompletion,

    #[error("Oracle configuration error: {0}")]
    ConfigError(String),
}

/// Configuration for building an oracle client
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub oracle_type: OracleType,
    /// Model to request (if the backend supports it)
    pub model: Option<String>,
    /// Base URL of a chat-completions endpoint
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Binary for command-line backends
    pub binary_path: Option<PathBuf>,
    /// Per-request timeout (None = no limit)
    pub timeout: Option<Duration>,
    /// Additional environment variables for spawned processes
    pub env_vars: HashMap<String, String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            oracle_type: OracleType::OpenAi,
            model: None,
            base_url: None,
            api_key: None,
            binary_path: None,
            timeout: None,
            env_vars: HashMap::new(),
        }
    }
}

impl OracleConfig {
    pub fn new(oracle_type: OracleType) -> Self {
        Self {
            oracle_type,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_binary_path(mut self, path: PathBuf) -> Self {
        self.binary_path = Some(path);
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.env_vars.insert(key, value);
        self
    }
}

/// Supported oracle backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleType {
    /// OpenAI-compatible chat-completions HTTP API
    OpenAi,
    /// A command-line LLM agent invoked once per prompt
    Command,
}

impl std::fmt::Display for OracleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleType::OpenAi => write!(f, "openai"),
            OracleType::Command => write!(f, "command"),
        }
    }
}

impl std::str::FromStr for OracleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open-ai" | "chat" => Ok(OracleType::OpenAi),
            "command" | "cli" => Ok(OracleType::Command),
            _ => Err(format!("Unknown oracle type: {}", s)),
        }
    }
}

/// A text-completion service treated as an unreliable black box
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Human-readable name of the backend
    fn name(&self) -> &str;

    fn oracle_type(&self) -> OracleType;

    /// Send a rendered prompt and return the raw completion text
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;

    /// Check whether the backend looks usable (binary present, key configured)
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_type_parse() {
        assert_eq!("openai".parse::<OracleType>().unwrap(), OracleType::OpenAi);
        assert_eq!("CLI".parse::<OracleType>().unwrap(), OracleType::Command);
        assert!("gemini".parse::<OracleType>().is_err());
    }

    #[test]
    fn test_oracle_type_display_roundtrips() {
        for t in [OracleType::OpenAi, OracleType::Command] {
            assert_eq!(t.to_string().parse::<OracleType>().unwrap(), t);
        }
    }
}
