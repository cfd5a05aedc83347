//! Runner for the Steampipe command line.
//!
//! Used by connection discovery and by tools that read plugin details the
//! database does not expose. Every invocation disables the CLI's update check
//! and is bounded by a timeout.

use crate::error::{DbError, DbResult};
use serde_json::Value as JsonValue;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PlatformCli {
    program: String,
    timeout: Duration,
}

impl PlatformCli {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the CLI and parse its stdout as JSON.
    pub async fn run_json(&self, args: &[String]) -> DbResult<JsonValue> {
        let stdout = self.run(args).await?;
        serde_json::from_str(stdout.trim()).map_err(|e| {
            DbError::command(&self.program, format!("output is not valid JSON: {}", e))
        })
    }

    /// Run the CLI and return its stdout.
    pub async fn run(&self, args: &[String]) -> DbResult<String> {
        debug!(program = %self.program, args = ?args, "Running CLI command");

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .env("STEAMPIPE_UPDATE_CHECK", "false")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(DbError::command(
                    &self.program,
                    format!("could not be started: {}", e),
                ));
            }
            Err(_) => {
                return Err(DbError::command(
                    &self.program,
                    format!("did not finish within {}s", self.timeout.as_secs()),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("exited with {}", output.status)
            } else {
                format!("exited with {}: {}", output.status, detail)
            };
            return Err(DbError::command(&self.program, message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_run_json_parses_stdout() {
        let cli = PlatformCli::new("sh", Duration::from_secs(5));
        let value = cli.run_json(&sh(r#"echo '{"a": 1}'"#)).await.unwrap();
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn test_update_check_is_disabled() {
        let cli = PlatformCli::new("sh", Duration::from_secs(5));
        let out = cli.run(&sh("echo $STEAMPIPE_UPDATE_CHECK")).await.unwrap();
        assert_eq!(out.trim(), "false");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_command_error() {
        let cli = PlatformCli::new("sh", Duration::from_secs(5));
        let err = cli.run(&sh("echo boom >&2; exit 3")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandFailed);
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_command_error() {
        let cli = PlatformCli::new("sh", Duration::from_secs(5));
        let err = cli.run_json(&sh("echo not-json")).await.unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let cli = PlatformCli::new("definitely-not-a-real-binary-xyz", Duration::from_secs(5));
        let err = cli.run(&[]).await.unwrap_err();
        assert!(err.to_string().contains("could not be started"));
    }
}
