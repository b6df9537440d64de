//! Native batch scripts
//!
//! A batch script performs N operations in one `osascript` round-trip and
//! returns N tokens joined by the family delimiter, in input order. Each item
//! runs inside its own `try` block with an empty default token, so a missing
//! todo leaves an empty token at its position rather than aborting the batch.
//! Work done before a failing statement inside an item is not rolled back.

use super::single::StatusChange;
use super::{quote, ScriptBuilder};
use crate::types::{BulkFamily, NewTodo, TodoMove, TodoUpdate};

impl ScriptBuilder {
    /// Assemble per-item statement blocks into one token-collecting script.
    ///
    /// Each block must assign `itemToken` on success.
    fn batch_script(&self, family: BulkFamily, blocks: Vec<String>) -> String {
        let mut body = vec!["set resultTokens to {}".to_string()];
        for (index, block) in blocks.iter().enumerate() {
            body.push(format!("-- item {}", index));
            body.push("set itemToken to \"\"".to_string());
            body.push("try".to_string());
            body.extend(block.lines().map(|line| format!("    {}", line)));
            body.push("end try".to_string());
            body.push("set end of resultTokens to itemToken".to_string());
        }
        body.push(format!(
            "set AppleScript's text item delimiters to {}",
            quote(&family.delimiter().to_string())
        ));
        body.push("set resultText to resultTokens as text".to_string());
        body.push("set AppleScript's text item delimiters to \"\"".to_string());
        body.push("return resultText".to_string());
        self.tell(&body.join("\n"))
    }

    /// Create every todo, returning their ids joined with `,`
    pub fn batch_create_script(&self, todos: &[NewTodo]) -> String {
        let blocks = todos
            .iter()
            .map(|todo| {
                let properties = Self::todo_properties(todo);
                let make = match todo.target_list() {
                    Some(list) => format!(
                        "set newToDo to make new to do at list {} with properties {}",
                        quote(list),
                        properties
                    ),
                    None => format!("set newToDo to make new to do with properties {}", properties),
                };
                format!("{}\nset itemToken to id of newToDo", make)
            })
            .collect();
        self.batch_script(BulkFamily::Create, blocks)
    }

    /// Apply property changes, returning todo names joined with `|`
    pub fn batch_update_script(&self, updates: &[TodoUpdate]) -> String {
        let blocks = updates
            .iter()
            .map(|update| {
                let mut lines = vec![format!(
                    "set targetToDo to to do id {}",
                    quote(&update.todo_id)
                )];
                lines.extend(Self::update_statements(update, "targetToDo"));
                lines.push("set itemToken to name of targetToDo".to_string());
                lines.join("\n")
            })
            .collect();
        self.batch_script(BulkFamily::Update, blocks)
    }

    /// Move todos, returning their names joined with `|`
    pub fn batch_move_script(&self, moves: &[TodoMove]) -> String {
        let blocks = moves
            .iter()
            .map(|mv| {
                let mut lines = vec![format!("set targetToDo to to do id {}", quote(&mv.todo_id))];
                lines.extend(Self::move_statements(mv, "targetToDo"));
                lines.push("set itemToken to name of targetToDo".to_string());
                lines.join("\n")
            })
            .collect();
        self.batch_script(BulkFamily::Move, blocks)
    }

    pub fn batch_complete_script(&self, todo_ids: &[String]) -> String {
        self.batch_status_script(BulkFamily::Complete, todo_ids, StatusChange::Completed)
    }

    pub fn batch_cancel_script(&self, todo_ids: &[String]) -> String {
        self.batch_status_script(BulkFamily::Cancel, todo_ids, StatusChange::Canceled)
    }

    fn batch_status_script(
        &self,
        family: BulkFamily,
        todo_ids: &[String],
        status: StatusChange,
    ) -> String {
        let blocks = todo_ids
            .iter()
            .map(|id| {
                format!(
                    "set targetToDo to to do id {}\nset todoName to name of targetToDo\nset status of targetToDo to {}\nset itemToken to todoName",
                    quote(id),
                    status.keyword()
                )
            })
            .collect();
        self.batch_script(family, blocks)
    }

    /// Move todos to the Trash list, returning their names joined with `|`
    pub fn batch_delete_script(&self, todo_ids: &[String]) -> String {
        let blocks = todo_ids
            .iter()
            .map(|id| {
                format!(
                    "set targetToDo to to do id {}\nset todoName to name of targetToDo\nmove targetToDo to list \"Trash\"\nset itemToken to todoName",
                    quote(id)
                )
            })
            .collect();
        self.batch_script(BulkFamily::Delete, blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DestinationType, When};

    fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    #[test]
    fn test_batch_create_keeps_item_order() {
        let todos = vec![
            NewTodo::titled("First"),
            NewTodo {
                when: Some(When::Someday),
                ..NewTodo::titled("Second")
            },
        ];
        let script = builder().batch_create_script(&todos);

        let first = script.find(r#"name:"First""#).unwrap();
        let second = script.find(r#"name:"Second""#).unwrap();
        assert!(first < second);
        assert_eq!(script.matches("set end of resultTokens to itemToken").count(), 2);
        assert!(script.contains(r#"set AppleScript's text item delimiters to ",""#));
        assert!(script.contains(r#"make new to do at list "Someday""#));
        assert!(!script.contains("tag names"));
    }

    #[test]
    fn test_batch_scripts_keep_multiline_text_intact() {
        let todos = vec![NewTodo {
            notes: Some("line1\nline2".into()),
            ..NewTodo::titled("Notes")
        }];
        let script = builder().batch_create_script(&todos);
        assert!(script.contains(r#"notes:"line1\nline2""#));
        assert!(!script.lines().any(|line| line.trim_start().starts_with("line2")));

        let updates = vec![TodoUpdate {
            todo_id: "T1".into(),
            title: Some("tab\there".into()),
            notes: Some("line1\nline2".into()),
            ..Default::default()
        }];
        let script = builder().batch_update_script(&updates);
        assert!(script.contains(r#"set notes of targetToDo to "line1\nline2""#));
        assert!(script.contains(r#"set name of targetToDo to "tab\there""#));
        assert!(!script.lines().any(|line| line.trim_start().starts_with("line2")));
    }

    #[test]
    fn test_batch_scripts_use_pipe_for_names() {
        let ids = vec!["a".to_string(), "b".to_string()];
        for script in [
            builder().batch_complete_script(&ids),
            builder().batch_cancel_script(&ids),
            builder().batch_delete_script(&ids),
        ] {
            assert!(script.contains(r#"text item delimiters to "|""#));
            assert_eq!(script.matches("end try").count(), 2);
        }
    }

    #[test]
    fn test_batch_status_keyword() {
        let ids = vec!["x\"y".to_string()];
        let script = builder().batch_cancel_script(&ids);
        assert!(script.contains("set status of targetToDo to canceled"));
        assert!(script.contains(r#"to do id "x\"y""#));
    }

    #[test]
    fn test_batch_update_and_move() {
        let updates = vec![TodoUpdate {
            todo_id: "T1".into(),
            title: Some("Renamed".into()),
            ..Default::default()
        }];
        let script = builder().batch_update_script(&updates);
        assert!(script.contains(r#"set name of targetToDo to "Renamed""#));

        let moves = vec![TodoMove {
            todo_id: "T1".into(),
            destination_type: DestinationType::List,
            destination_name: "Anytime".into(),
        }];
        let script = builder().batch_move_script(&moves);
        assert!(script.contains(r#"move targetToDo to list "Anytime""#));
        assert!(script.contains("set itemToken to name of targetToDo"));
    }
}
