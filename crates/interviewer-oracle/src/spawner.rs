use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

use crate::OracleError;

/// Output captured from a spawned oracle process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Utility for spawning command-line oracle processes
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn a process, wait for it to exit, and capture its output.
    ///
    /// The child is killed if `timeout` elapses first.
    pub async fn spawn(
        binary: &Path,
        args: &[&str],
        env_vars: &HashMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, OracleError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            arg_count = args.len(),
            "Spawning oracle process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null()) // Non-interactive
            .kill_on_drop(true);

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let child = cmd.spawn()?;

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| OracleError::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        let duration = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(
            exit_code,
            duration_ms = duration.as_millis(),
            "Oracle process completed"
        );

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
            duration,
        })
    }
}
