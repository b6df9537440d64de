//! Single-item todo operations
//!
//! Each call makes one host round-trip for the main change, plus the
//! best-effort scheduling and tagging steps for create and update. These back
//! the single-item tools and the bulk fallback path.

use tracing::{info, instrument};

use crate::client::ThingsClient;
use crate::script::single::StatusChange;
use crate::types::{NewTodo, ThingsError, TodoMove, TodoUpdate};

pub(crate) fn non_empty(output: String, what: &str) -> Result<String, ThingsError> {
    if output.is_empty() {
        Err(ThingsError::UnexpectedOutput(format!("empty {}", what)))
    } else {
        Ok(output)
    }
}

impl ThingsClient {
    /// Create a todo and return its id
    #[instrument(skip(self, todo), fields(title = %todo.title))]
    pub async fn create_todo(&self, todo: &NewTodo) -> Result<String, ThingsError> {
        self.ensure_running().await?;
        let output = self.run(&self.scripts().create_todo_script(todo)).await?;
        let todo_id = non_empty(output, "todo id")?;

        // Someday is handled by the list the todo was created in
        if let Some(when) = todo.when.filter(|w| !w.is_someday()) {
            self.apply_when(&todo_id, when).await;
        }
        self.apply_tags(&todo_id, &todo.tags).await;

        info!(todo_id = %todo_id, "Created todo");
        Ok(todo_id)
    }

    /// Apply an update and return the todo's name
    #[instrument(skip(self, update), fields(todo_id = %update.todo_id))]
    pub async fn update_todo(&self, update: &TodoUpdate) -> Result<String, ThingsError> {
        if update.is_empty() {
            return Err(ThingsError::InvalidInput("No updates specified".to_string()));
        }
        self.ensure_running().await?;

        let script = if update.has_property_changes() {
            self.scripts().update_todo_script(update)
        } else {
            self.scripts().todo_name_script(&update.todo_id)
        };
        let name = non_empty(self.run(&script).await?, "todo name")?;

        if let Some(when) = update.when {
            self.apply_when(&update.todo_id, when).await;
        }
        self.apply_tags(&update.todo_id, &update.tags).await;
        Ok(name)
    }

    pub async fn move_todo(&self, mv: &TodoMove) -> Result<String, ThingsError> {
        self.ensure_running().await?;
        let output = self.run(&self.scripts().move_todo_script(mv)).await?;
        non_empty(output, "todo name")
    }

    pub async fn complete_todo(&self, todo_id: &str) -> Result<String, ThingsError> {
        self.set_status(todo_id, StatusChange::Completed).await
    }

    pub async fn cancel_todo(&self, todo_id: &str) -> Result<String, ThingsError> {
        self.set_status(todo_id, StatusChange::Canceled).await
    }

    /// Move a todo to the Trash
    pub async fn delete_todo(&self, todo_id: &str) -> Result<String, ThingsError> {
        self.ensure_running().await?;
        let output = self.run(&self.scripts().delete_todo_script(todo_id)).await?;
        non_empty(output, "todo name")
    }

    async fn set_status(&self, todo_id: &str, status: StatusChange) -> Result<String, ThingsError> {
        self.ensure_running().await?;
        let output = self
            .run(&self.scripts().set_status_script(todo_id, status))
            .await?;
        non_empty(output, "todo name")
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::ScriptOutput;
    use crate::testing::ScriptedRunner;
    use crate::types::{DestinationType, NewTodo, ThingsError, TodoMove, TodoUpdate, When};

    #[tokio::test]
    async fn test_create_runs_secondary_steps() {
        let runner = ScriptedRunner::running(|script| {
            if script.contains("make new to do") {
                ScriptOutput::ok("NEW1")
            } else {
                ScriptOutput::ok("")
            }
        });
        let todo = NewTodo {
            when: Some(When::Today),
            tags: vec!["home".into(), "urgent".into()],
            ..NewTodo::titled("Buy milk")
        };

        let id = runner.client().create_todo(&todo).await.unwrap();
        assert_eq!(id, "NEW1");

        let calls = runner.host_calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[1].contains(r#"schedule to do id "NEW1" for (current date)"#));
        assert!(calls[2].contains(r#""home""#));
        assert!(calls[3].contains(r#""urgent""#));
    }

    #[tokio::test]
    async fn test_create_someday_skips_schedule() {
        let runner = ScriptedRunner::running(|_| ScriptOutput::ok("NEW2"));
        let todo = NewTodo {
            when: Some(When::Someday),
            ..NewTodo::titled("Learn piano")
        };
        runner.client().create_todo(&todo).await.unwrap();

        let calls = runner.host_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(r#"at list "Someday""#));
    }

    #[tokio::test]
    async fn test_create_tag_failure_still_succeeds() {
        let runner = ScriptedRunner::running(|script| {
            if script.contains("tag names") {
                ScriptOutput::failed(1, "tag error")
            } else {
                ScriptOutput::ok("NEW3")
            }
        });
        let todo = NewTodo {
            tags: vec!["broken".into()],
            ..NewTodo::titled("Call mom")
        };
        assert_eq!(runner.client().create_todo(&todo).await.unwrap(), "NEW3");
    }

    #[tokio::test]
    async fn test_update_without_changes_is_rejected() {
        let runner = ScriptedRunner::running(|_| ScriptOutput::ok("x"));
        let update = TodoUpdate {
            todo_id: "T1".into(),
            ..Default::default()
        };
        let err = runner.client().update_todo(&update).await.unwrap_err();
        assert_eq!(err.to_string(), "No updates specified");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_only_when_checks_todo_exists() {
        let runner = ScriptedRunner::running(|_| ScriptOutput::ok("Report"));
        let update = TodoUpdate {
            todo_id: "T1".into(),
            when: Some(When::Someday),
            ..Default::default()
        };
        let name = runner.client().update_todo(&update).await.unwrap();
        assert_eq!(name, "Report");

        let calls = runner.host_calls();
        assert!(calls[0].contains(r#"return name of to do id "T1""#));
        assert!(calls[1].contains(r#"to list "Someday""#));
    }

    #[tokio::test]
    async fn test_missing_todo_is_an_error() {
        let runner =
            ScriptedRunner::running(|_| ScriptOutput::failed(1, "Can't get to do id \"nope\""));
        let err = runner.client().complete_todo("nope").await.unwrap_err();
        assert!(matches!(err, ThingsError::ScriptFailed { .. }));
    }

    #[tokio::test]
    async fn test_status_and_trash_scripts() {
        let runner = ScriptedRunner::running(|_| ScriptOutput::ok("Name"));
        let client = runner.client();
        client.cancel_todo("C1").await.unwrap();
        client.delete_todo("D1").await.unwrap();
        client
            .move_todo(&TodoMove {
                todo_id: "M1".into(),
                destination_type: DestinationType::Area,
                destination_name: "Work".into(),
            })
            .await
            .unwrap();

        let calls = runner.host_calls();
        assert!(calls[0].contains("set status of targetToDo to canceled"));
        assert!(calls[1].contains(r#"to list "Trash""#));
        assert!(calls[2].contains(r#"to area "Work""#));
    }
}
