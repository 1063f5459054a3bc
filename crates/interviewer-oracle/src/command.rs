use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::{Oracle, OracleConfig, OracleError, OracleType, ProcessSpawner};

/// Oracle backed by a command-line LLM agent (e.g. `claude --print`).
///
/// The prompt is passed as the final positional argument after `--`.
pub struct CommandOracle {
    binary_path: PathBuf,
    args: Vec<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    env_vars: HashMap<String, String>,
}

impl CommandOracle {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("claude"),
            args: vec!["--print".to_string()],
            model: None,
            timeout: None,
            env_vars: HashMap::new(),
        }
    }

    pub fn from_config(config: &OracleConfig) -> Self {
        let mut oracle = Self::new();
        if let Some(ref path) = config.binary_path {
            oracle.binary_path = path.clone();
        }
        oracle.model = config.model.clone();
        oracle.timeout = config.timeout;
        oracle.env_vars = config.env_vars.clone();
        oracle
    }

    pub fn with_binary_path(mut self, path: PathBuf) -> Self {
        self.binary_path = path;
        self
    }

    /// Replace the leading arguments placed before the prompt
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl Default for CommandOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Oracle for CommandOracle {
    fn name(&self) -> &str {
        "Command"
    }

    fn oracle_type(&self) -> OracleType {
        OracleType::Command
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        debug!(
            oracle = self.name(),
            prompt_len = prompt.len(),
            "Requesting completion"
        );

        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        if let Some(ref model) = self.model {
            args.push("--model");
            args.push(model);
        }
        // Keep prompts starting with '-' from being read as options
        args.push("--");
        args.push(prompt);

        let output =
            ProcessSpawner::spawn(&self.binary_path, &args, &self.env_vars, self.timeout).await?;

        if !output.success() {
            return Err(OracleError::RequestFailed(format!(
                "{} exited with code {}: {}",
                self.binary_path.display(),
                output.exit_code,
                output.stderr.trim()
            )));
        }

        let text = output.stdout.trim();
        if text.is_empty() {
            return Err(OracleError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_captures_stdout() {
        let oracle = CommandOracle::new()
            .with_binary_path(PathBuf::from("echo"))
            .with_args(vec![]);

        let text = oracle.complete("What is VLOOKUP?").await.unwrap();
        assert!(text.ends_with("What is VLOOKUP?"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_request_failure() {
        let oracle = CommandOracle::new()
            .with_binary_path(PathBuf::from("false"))
            .with_args(vec![]);

        let result = oracle.complete("anything").await;
        assert!(matches!(result, Err(OracleError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let oracle = CommandOracle::new()
            .with_binary_path(PathBuf::from("/nonexistent/interviewer-oracle-bin"));

        let result = oracle.complete("anything").await;
        assert!(matches!(result, Err(OracleError::SpawnFailed(_))));
        assert!(!oracle.is_available().await);
    }
}
