//! Async executor for AppleScript
//!
//! The [`ScriptRunner`] trait is the seam between script generation and the
//! host process. [`OsascriptRunner`] is the production implementation; tests
//! substitute an in-process double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, instrument};

use crate::config::ExecutorConfig;

/// Raw outcome of one script invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl ScriptOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stderr: stderr.into(),
            exit_code,
            ..Default::default()
        }
    }
}

/// Something that can run an AppleScript and report what happened.
///
/// Implementations never return an error: spawn failures and timeouts are
/// reported as unsuccessful [`ScriptOutput`]s.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &str) -> ScriptOutput;

    /// Seconds after which a script is abandoned
    fn timeout_secs(&self) -> u64;
}

/// Runs scripts through `osascript -e`
#[derive(Debug, Clone)]
pub struct OsascriptRunner {
    program: String,
    timeout: Duration,
}

impl OsascriptRunner {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            program: config.program.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

fn preview(script: &str) -> String {
    script.chars().take(100).collect()
}

#[async_trait]
impl ScriptRunner for OsascriptRunner {
    #[instrument(skip(self, script), fields(program = %self.program, bytes = script.len()))]
    async fn run(&self, script: &str) -> ScriptOutput {
        debug!(script = %preview(script), "executing AppleScript");

        let child = Command::new(&self.program)
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                error!(error = %e, "failed to spawn {}", self.program);
                return ScriptOutput::failed(-1, format!("failed to spawn {}: {}", self.program, e));
            }
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let exit_code = output.status.code().unwrap_or(-1);
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if output.status.success() {
                    debug!(output = %preview(&stdout), "AppleScript succeeded");
                    ScriptOutput {
                        success: true,
                        stdout,
                        stderr,
                        exit_code,
                        timed_out: false,
                    }
                } else {
                    error!(exit_code, stderr = %stderr, "AppleScript failed");
                    ScriptOutput {
                        success: false,
                        stdout,
                        stderr,
                        exit_code,
                        timed_out: false,
                    }
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, "AppleScript execution error");
                ScriptOutput::failed(-1, e.to_string())
            }
            Err(_elapsed) => {
                // The child is killed when its future is dropped
                let secs = self.timeout.as_secs();
                error!("AppleScript timeout after {}s", secs);
                ScriptOutput {
                    timed_out: true,
                    ..ScriptOutput::failed(
                        -1,
                        format!("Script execution timed out after {} seconds", secs),
                    )
                }
            }
        }
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(program: &str, timeout_secs: u64) -> OsascriptRunner {
        OsascriptRunner::new(&ExecutorConfig {
            program: program.to_string(),
            timeout_secs,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_missing_program_is_reported_not_raised() {
        let output = runner("/nonexistent/osascript-binary", 5).run("return 1").await;
        assert!(!output.success);
        assert_eq!(output.exit_code, -1);
        assert!(output.stderr.contains("failed to spawn"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_trimmed() {
        // `echo -e <script>` stands in for `osascript -e <script>`
        let output = runner("echo", 5).run("A1,B2").await;
        assert!(output.success);
        assert!(output.stdout.ends_with("A1,B2"));
        assert!(!output.stdout.ends_with('\n'));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_reported() {
        // `sh -e <file>` runs the file with errexit set
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("slow.sh");
        std::fs::write(&script_path, "sleep 5\n").unwrap();

        let output = OsascriptRunner {
            program: "sh".into(),
            timeout: Duration::from_millis(200),
        }
        .run(script_path.to_str().unwrap())
        .await;
        assert!(!output.success);
        assert!(output.timed_out);
    }
}
