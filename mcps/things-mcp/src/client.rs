//! Things 3 client
//!
//! Pairs a [`ScriptRunner`] with a [`ScriptBuilder`] and turns raw script
//! outputs into `Result`s. Callers branch on the result variant instead of
//! inspecting exit codes.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::executor::{OsascriptRunner, ScriptOutput, ScriptRunner};
use crate::script::ScriptBuilder;
use crate::types::{ConnectionStatus, ThingsError, When};

/// Client for driving Things 3 through AppleScript
#[derive(Clone)]
pub struct ThingsClient {
    runner: Arc<dyn ScriptRunner>,
    scripts: ScriptBuilder,
}

impl ThingsClient {
    pub fn new(runner: Arc<dyn ScriptRunner>, scripts: ScriptBuilder) -> Self {
        Self { runner, scripts }
    }

    /// Client backed by `osascript`
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(
            Arc::new(OsascriptRunner::new(config)),
            ScriptBuilder::new(config.app_name.clone()),
        )
    }

    pub fn scripts(&self) -> &ScriptBuilder {
        &self.scripts
    }

    /// Run a script and return its raw output
    pub async fn execute(&self, script: &str) -> ScriptOutput {
        self.runner.run(script).await
    }

    /// Run a script, mapping unsuccessful outputs to [`ThingsError`]
    pub async fn run(&self, script: &str) -> Result<String, ThingsError> {
        let output = self.runner.run(script).await;
        if output.timed_out {
            return Err(ThingsError::Timeout(self.runner.timeout_secs()));
        }
        if !output.success {
            return Err(ThingsError::ScriptFailed {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    pub async fn is_running(&self) -> bool {
        let output = self.execute(&self.scripts.is_running_script()).await;
        output.success && output.stdout.trim().eq_ignore_ascii_case("true")
    }

    /// Launch Things 3 if it is not already running
    pub async fn ensure_running(&self) -> Result<(), ThingsError> {
        if self.is_running().await {
            return Ok(());
        }
        debug!("Things 3 not running, activating");
        self.run(&self.scripts.activate_script())
            .await
            .map(|_| ())
            .map_err(|e| ThingsError::NotRunning(e.to_string()))
    }

    pub async fn test_connection(&self) -> ConnectionStatus {
        match self.run(&self.scripts.app_name_script()).await {
            Ok(name) => ConnectionStatus {
                connected: true,
                app_running: true,
                app_name: Some(name),
                error: None,
            },
            Err(e) => ConnectionStatus {
                connected: false,
                app_running: self.is_running().await,
                app_name: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn schedule(&self, todo_id: &str, when: When) -> Result<(), ThingsError> {
        match self.scripts.schedule_script(todo_id, when) {
            Some(script) => self.run(&script).await.map(|_| ()),
            None => self.move_to_list(todo_id, "Someday").await,
        }
    }

    pub async fn add_tag(&self, todo_id: &str, tag: &str) -> Result<(), ThingsError> {
        self.run(&self.scripts.add_tag_script(todo_id, tag))
            .await
            .map(|_| ())
    }

    pub async fn move_to_list(&self, todo_id: &str, list: &str) -> Result<(), ThingsError> {
        self.run(&self.scripts.move_to_list_script(todo_id, list))
            .await
            .map(|_| ())
    }

    /// Best-effort start-date step: scheduling, or a move to Someday.
    /// Failures are logged and do not fail the caller.
    pub async fn apply_when(&self, todo_id: &str, when: When) {
        if let Err(e) = self.schedule(todo_id, when).await {
            warn!(todo_id, error = %e, "Failed to schedule todo");
        }
    }

    /// Best-effort tagging, one script per tag
    pub async fn apply_tags(&self, todo_id: &str, tags: &[String]) {
        for tag in tags {
            if let Err(e) = self.add_tag(todo_id, tag).await {
                warn!(todo_id, tag = %tag, error = %e, "Failed to add tag");
            }
        }
    }
}
