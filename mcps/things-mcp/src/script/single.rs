//! Single-item scripts
//!
//! Used by the per-item operations, by the fallback path, and for the
//! secondary steps (scheduling, tagging, list moves) that a batch script
//! cannot express.

use super::{applescript_date, quote, ScriptBuilder};
use crate::types::{DestinationType, NewTodo, TodoMove, TodoUpdate, When};

/// Terminal status a todo can be set to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Completed,
    Canceled,
}

impl StatusChange {
    pub fn keyword(&self) -> &'static str {
        match self {
            StatusChange::Completed => "completed",
            StatusChange::Canceled => "canceled",
        }
    }
}

impl ScriptBuilder {
    /// Probe whether the application process is up
    pub fn is_running_script(&self) -> String {
        format!(
            "tell application \"System Events\"\n    return (name of processes) contains {}\nend tell",
            quote(self.app())
        )
    }

    pub fn activate_script(&self) -> String {
        self.tell("activate\nreturn \"launched\"")
    }

    pub fn app_name_script(&self) -> String {
        self.tell("return name")
    }

    /// Property record for a new todo. Tags are left to the tag step.
    pub(crate) fn todo_properties(todo: &NewTodo) -> String {
        let mut properties = vec![format!("name:{}", quote(&todo.title))];
        if let Some(notes) = todo.notes.as_deref().filter(|n| !n.is_empty()) {
            properties.push(format!("notes:{}", quote(notes)));
        }
        if let Some(deadline) = todo.deadline {
            properties.push(format!("due date:(date {})", quote(&applescript_date(deadline))));
        }
        format!("{{{}}}", properties.join(", "))
    }

    /// Create one todo, returning its id
    pub fn create_todo_script(&self, todo: &NewTodo) -> String {
        let properties = Self::todo_properties(todo);
        let body = match todo.target_list() {
            Some(list) => format!(
                "set newToDo to make new to do at list {} with properties {}\nreturn id of newToDo",
                quote(list),
                properties
            ),
            None => format!(
                "set newToDo to make new to do with properties {}\nreturn id of newToDo",
                properties
            ),
        };
        self.tell(&body)
    }

    /// `set` statements for the directly settable fields of an update
    pub(crate) fn update_statements(update: &TodoUpdate, target: &str) -> Vec<String> {
        let mut statements = Vec::new();
        if let Some(title) = &update.title {
            statements.push(format!("set name of {} to {}", target, quote(title)));
        }
        if let Some(notes) = &update.notes {
            statements.push(format!("set notes of {} to {}", target, quote(notes)));
        }
        if let Some(deadline) = update.deadline {
            statements.push(format!(
                "set due date of {} to (date {})",
                target,
                quote(&applescript_date(deadline))
            ));
        }
        statements
    }

    /// Apply property changes to one todo, returning its name
    pub fn update_todo_script(&self, update: &TodoUpdate) -> String {
        let mut lines = vec![format!("set targetToDo to to do id {}", quote(&update.todo_id))];
        lines.extend(Self::update_statements(update, "targetToDo"));
        lines.push("return name of targetToDo".to_string());
        self.tell(&lines.join("\n"))
    }

    pub fn todo_name_script(&self, todo_id: &str) -> String {
        self.tell(&format!("return name of to do id {}", quote(todo_id)))
    }

    /// Statements moving `target` into a destination container
    pub(crate) fn move_statements(mv: &TodoMove, target: &str) -> Vec<String> {
        let name = quote(&mv.destination_name);
        match mv.destination_type {
            DestinationType::Area => vec![format!("move {} to area {}", target, name)],
            DestinationType::Project => {
                vec![format!("set project of {} to project {}", target, name)]
            }
            DestinationType::List => vec![format!("move {} to list {}", target, name)],
        }
    }

    pub fn move_todo_script(&self, mv: &TodoMove) -> String {
        let mut lines = vec![format!("set targetToDo to to do id {}", quote(&mv.todo_id))];
        lines.extend(Self::move_statements(mv, "targetToDo"));
        lines.push("return name of targetToDo".to_string());
        self.tell(&lines.join("\n"))
    }

    pub fn set_status_script(&self, todo_id: &str, status: StatusChange) -> String {
        self.tell(&format!(
            "set targetToDo to to do id {}\nset status of targetToDo to {}\nreturn name of targetToDo",
            quote(todo_id),
            status.keyword()
        ))
    }

    /// Things has no hard delete; deleting moves the todo to the Trash list
    pub fn delete_todo_script(&self, todo_id: &str) -> String {
        self.tell(&format!(
            "set targetToDo to to do id {}\nset todoName to name of targetToDo\nmove targetToDo to list \"Trash\"\nreturn todoName",
            quote(todo_id)
        ))
    }

    /// Schedule a todo's start date. `Someday` is a list move, not a schedule.
    pub fn schedule_script(&self, todo_id: &str, when: When) -> Option<String> {
        self.schedule_item_script("to do", todo_id, when)
    }

    /// `schedule <class> id ... for ...`, shared by todos and projects
    pub(crate) fn schedule_item_script(&self, class: &str, id: &str, when: When) -> Option<String> {
        let target = match when {
            When::Today => "(current date)".to_string(),
            When::Tomorrow => "(current date) + 1 * days".to_string(),
            When::On(date) => format!("(date {})", quote(&applescript_date(date))),
            When::Someday => return None,
        };
        Some(self.tell(&format!(
            "schedule {} id {} for {}",
            class,
            quote(id),
            target
        )))
    }

    /// Append one tag to a todo's comma-separated `tag names`
    pub fn add_tag_script(&self, todo_id: &str, tag: &str) -> String {
        let tag = quote(tag);
        self.tell(&format!(
            "set targetToDo to to do id {id}\n\
             set currentTags to tag names of targetToDo\n\
             if currentTags is \"\" then\n    \
             set tag names of targetToDo to {tag}\n\
             else\n    \
             set tag names of targetToDo to currentTags & \", \" & {tag}\n\
             end if",
            id = quote(todo_id),
            tag = tag
        ))
    }

    pub fn move_to_list_script(&self, todo_id: &str, list: &str) -> String {
        self.tell(&format!(
            "move to do id {} to list {}",
            quote(todo_id),
            quote(list)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    #[test]
    fn test_create_script_escapes_and_targets_list() {
        let todo = NewTodo {
            notes: Some("with \"quotes\"".into()),
            list_name: Some("Errands".into()),
            deadline: NaiveDate::from_ymd_opt(2024, 7, 10),
            ..NewTodo::titled("Buy \"milk\"")
        };
        let script = builder().create_todo_script(&todo);
        assert!(script.contains(r#"name:"Buy \"milk\"""#));
        assert!(script.contains(r#"notes:"with \"quotes\"""#));
        assert!(script.contains(r#"due date:(date "July 10, 2024 00:00:00")"#));
        assert!(script.contains(r#"make new to do at list "Errands""#));
        assert!(script.contains("return id of newToDo"));
    }

    #[test]
    fn test_create_script_keeps_multiline_notes_intact() {
        let todo = NewTodo {
            notes: Some("line1\nline2".into()),
            ..NewTodo::titled("Two\r\nlines")
        };
        let script = builder().create_todo_script(&todo);
        assert!(script.contains(r#"notes:"line1\nline2""#));
        assert!(script.contains(r#"name:"Two\r\nlines""#));
        assert!(!script.lines().any(|line| line.trim_start().starts_with("line2")));
    }

    #[test]
    fn test_create_script_someday_uses_someday_list() {
        let todo = NewTodo {
            when: Some(When::Someday),
            ..NewTodo::titled("Later")
        };
        assert!(builder()
            .create_todo_script(&todo)
            .contains(r#"at list "Someday""#));
    }

    #[test]
    fn test_update_script_only_sets_given_fields() {
        let update = TodoUpdate {
            todo_id: "ABC".into(),
            notes: Some(String::new()),
            ..Default::default()
        };
        let script = builder().update_todo_script(&update);
        assert!(script.contains(r#"set notes of targetToDo to """#));
        assert!(!script.contains("set name of"));
        assert!(!script.contains("due date"));
    }

    #[test]
    fn test_move_script_per_destination() {
        let mv = TodoMove {
            todo_id: "T1".into(),
            destination_type: DestinationType::Project,
            destination_name: "Launch".into(),
        };
        assert!(builder()
            .move_todo_script(&mv)
            .contains(r#"set project of targetToDo to project "Launch""#));

        let mv = TodoMove {
            destination_type: DestinationType::Area,
            ..mv
        };
        assert!(builder()
            .move_todo_script(&mv)
            .contains(r#"move targetToDo to area "Launch""#));
    }

    #[test]
    fn test_schedule_script() {
        let b = builder();
        assert!(b
            .schedule_script("T1", When::Tomorrow)
            .unwrap()
            .contains("(current date) + 1 * days"));
        let date = When::On(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert!(b
            .schedule_script("T1", date)
            .unwrap()
            .contains(r#"for (date "January 02, 2025 00:00:00")"#));
        assert!(b.schedule_script("T1", When::Someday).is_none());
    }

    #[test]
    fn test_status_and_delete_scripts() {
        let b = builder();
        assert!(b
            .set_status_script("T1", StatusChange::Canceled)
            .contains("set status of targetToDo to canceled"));
        assert!(b.delete_todo_script("T1").contains(r#"to list "Trash""#));
    }

    #[test]
    fn test_running_probe_uses_app_name() {
        let script = ScriptBuilder::new("Things3 Beta").is_running_script();
        assert!(script.contains(r#"contains "Things3 Beta""#));
        assert!(script.contains("System Events"));
    }
}
