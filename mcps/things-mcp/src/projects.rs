//! Project and tag changes

use tracing::{info, instrument, warn};

use crate::client::ThingsClient;
use crate::reads::parse_tags;
use crate::todos::non_empty;
use crate::types::{NewProject, TagSummary, ThingsError};

impl ThingsClient {
    /// Create a project and return its id. Scheduling is best-effort.
    #[instrument(skip(self, project), fields(title = %project.title))]
    pub async fn create_project(&self, project: &NewProject) -> Result<String, ThingsError> {
        self.ensure_running().await?;
        let output = self.run(&self.scripts().create_project_script(project)).await?;
        let project_id = non_empty(output, "project id")?;

        if let Some(script) = project
            .when
            .and_then(|when| self.scripts().schedule_project_script(&project_id, when))
        {
            if let Err(e) = self.run(&script).await {
                warn!(project_id = %project_id, error = %e, "Failed to schedule project");
            }
        }

        info!(project_id = %project_id, "Created project");
        Ok(project_id)
    }

    pub async fn cancel_project(&self, project_id: &str) -> Result<String, ThingsError> {
        self.ensure_running().await?;
        let output = self
            .run(&self.scripts().cancel_project_script(project_id))
            .await?;
        non_empty(output, "project name")
    }

    /// Move a project to the Trash
    pub async fn delete_project(&self, project_id: &str) -> Result<String, ThingsError> {
        self.ensure_running().await?;
        let output = self
            .run(&self.scripts().delete_project_script(project_id))
            .await?;
        non_empty(output, "project name")
    }

    #[instrument(skip(self))]
    pub async fn create_tag(&self, name: &str, parent: Option<&str>) -> Result<TagSummary, ThingsError> {
        self.ensure_running().await?;
        let output = self.run(&self.scripts().create_tag_script(name, parent)).await?;
        let tag = parse_tags(&output)?
            .into_iter()
            .next()
            .ok_or_else(|| ThingsError::UnexpectedOutput("empty tag record".to_string()))?;
        if parent.is_some() && tag.parent.is_none() {
            warn!(tag = %tag.name, "Parent tag not found; created as top-level tag");
        }
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::ScriptOutput;
    use crate::testing::ScriptedRunner;
    use crate::types::{NewProject, When};

    #[tokio::test]
    async fn test_create_project_schedules_after_creation() {
        let runner = ScriptedRunner::running(|script| {
            if script.contains("make new project") {
                ScriptOutput::ok("P1")
            } else {
                ScriptOutput::failed(1, "schedule failed")
            }
        });
        let project = NewProject {
            title: "Launch".into(),
            when: Some(When::Tomorrow),
            ..Default::default()
        };
        let id = runner.client().create_project(&project).await.unwrap();
        assert_eq!(id, "P1");

        let calls = runner.host_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains(r#"schedule project id "P1" for (current date) + 1 * days"#));
    }

    #[tokio::test]
    async fn test_create_someday_project_is_not_scheduled() {
        let runner = ScriptedRunner::running(|_| ScriptOutput::ok("P2"));
        let project = NewProject {
            title: "Later".into(),
            when: Some(When::Someday),
            ..Default::default()
        };
        runner.client().create_project(&project).await.unwrap();
        assert_eq!(runner.host_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_create_tag_reports_parent() {
        let runner = ScriptedRunner::running(|_| ScriptOutput::ok("G1\u{1f}errand\u{1f}home\u{1e}"));
        let tag = runner
            .client()
            .create_tag("errand", Some("home"))
            .await
            .unwrap();
        assert_eq!(tag.id, "G1");
        assert_eq!(tag.parent.as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn test_project_status_scripts() {
        let runner = ScriptedRunner::running(|_| ScriptOutput::ok("Launch"));
        let client = runner.client();
        assert_eq!(client.cancel_project("P1").await.unwrap(), "Launch");
        assert_eq!(client.delete_project("P1").await.unwrap(), "Launch");

        let calls = runner.host_calls();
        assert!(calls[0].contains("set status of targetProject to canceled"));
        assert!(calls[1].contains(r#"to list "Trash""#));
    }
}
