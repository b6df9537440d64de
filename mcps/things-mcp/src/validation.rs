//! Input validation for bulk and single-item tools
//!
//! Bulk items arrive as raw JSON so that a non-list `items` value can be
//! reported with a plain message instead of a deserialization failure. Every
//! check here runs before any script is built; the first problem found is
//! returned and nothing is executed.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::types::{
    parse_date, DestinationType, NewTodo, SearchQuery, TodoMove, TodoStatus, TodoUpdate, When,
};

/// Upper bound on items in one batch
pub const MAX_BATCH_ITEMS: usize = 1000;

/// Shape checks shared by every bulk family
pub fn validate_batch<'a>(items: &'a Value, idempotency_key: &str) -> Result<&'a [Value], String> {
    let items = items
        .as_array()
        .ok_or_else(|| "`items` must be a list".to_string())?;
    if items.is_empty() {
        return Err("`items` list cannot be empty".to_string());
    }
    if items.len() > MAX_BATCH_ITEMS {
        return Err(format!(
            "Batch exceeds maximum of {} items",
            MAX_BATCH_ITEMS
        ));
    }
    if idempotency_key.is_empty() {
        return Err("`idempotency_key` is required".to_string());
    }
    Ok(items)
}

/// Optional `deadline` field; blank means absent
pub fn parse_deadline(value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid deadline format: {}. Expected YYYY-MM-DD", raw)),
    }
}

/// Optional `when` field; blank means absent
pub fn parse_when(value: Option<&str>) -> Result<Option<When>, String> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => raw.parse::<When>().map(Some).map_err(|e| e.to_string()),
    }
}

/// Required identifier
pub fn require_todo_id(value: Option<&str>) -> Result<String, String> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| "todo_id is required and cannot be empty".to_string())
}

/// Optional `YYYY-MM-DD` search bound named `field`
pub fn parse_date_filter(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid {} format: {}. Expected YYYY-MM-DD", field, raw)),
    }
}

pub fn parse_status(value: Option<&str>) -> Result<Option<TodoStatus>, String> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => raw.parse::<TodoStatus>().map(Some).map_err(|e| e.to_string()),
    }
}

/// Search result limit; absent means the default of 10
pub fn parse_limit(value: Option<usize>) -> Result<usize, String> {
    match value {
        None => Ok(SearchQuery::default().limit),
        Some(0) => Err("limit must be at least 1".to_string()),
        Some(limit) => Ok(limit),
    }
}

/// Trimmed text, or `None` when blank
pub fn optional_text(value: Option<&str>) -> Option<String> {
    non_blank(value).map(|v| v.trim().to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn clean_tags(tags: Option<Vec<String>>) -> Vec<String> {
    tags.unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn item_error(index: usize, message: impl std::fmt::Display) -> String {
    format!("Item {}: {}", index, message)
}

fn decode<T: for<'de> Deserialize<'de>>(index: usize, item: &Value) -> Result<T, String> {
    if !item.is_object() {
        return Err(item_error(index, "must be an object"));
    }
    serde_json::from_value(item.clone()).map_err(|e| item_error(index, e))
}

// ============================================================================
// Per-family Item Parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawNewTodo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    when: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    list_name: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
}

pub fn parse_new_todos(items: &[Value]) -> Result<Vec<NewTodo>, String> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw: RawNewTodo = decode(index, item)?;
            let title = non_blank(raw.title.as_deref())
                .ok_or_else(|| item_error(index, "title is required"))?
                .to_string();
            Ok(NewTodo {
                title,
                notes: raw.notes.filter(|n| !n.is_empty()),
                when: parse_when(raw.when.as_deref()).map_err(|e| item_error(index, e))?,
                deadline: parse_deadline(raw.deadline.as_deref())
                    .map_err(|e| item_error(index, e))?,
                tags: clean_tags(raw.tags),
                list_name: non_blank(raw.list_name.as_deref()).map(str::to_string),
                client_id: non_blank(raw.client_id.as_deref()).map(str::to_string),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawTodoUpdate {
    #[serde(default)]
    todo_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    when: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub fn parse_updates(items: &[Value]) -> Result<Vec<TodoUpdate>, String> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw: RawTodoUpdate = decode(index, item)?;
            Ok(TodoUpdate {
                todo_id: require_todo_id(raw.todo_id.as_deref())
                    .map_err(|e| item_error(index, e))?,
                title: non_blank(raw.title.as_deref()).map(str::to_string),
                notes: raw.notes,
                when: parse_when(raw.when.as_deref()).map_err(|e| item_error(index, e))?,
                deadline: parse_deadline(raw.deadline.as_deref())
                    .map_err(|e| item_error(index, e))?,
                tags: clean_tags(raw.tags),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawTodoMove {
    #[serde(default)]
    todo_id: Option<String>,
    #[serde(default)]
    destination_type: Option<String>,
    #[serde(default)]
    destination_name: Option<String>,
}

/// Build a move from loose fields; shared with the single-item tool
pub fn parse_move(
    todo_id: Option<&str>,
    destination_type: Option<&str>,
    destination_name: Option<&str>,
) -> Result<TodoMove, String> {
    let todo_id = require_todo_id(todo_id)?;
    let (Some(kind), Some(name)) = (non_blank(destination_type), non_blank(destination_name))
    else {
        return Err("destination_type and destination_name are required".to_string());
    };
    let destination_type = kind.parse::<DestinationType>().map_err(|e| e.to_string())?;
    Ok(TodoMove {
        todo_id,
        destination_type,
        destination_name: name.to_string(),
    })
}

pub fn parse_moves(items: &[Value]) -> Result<Vec<TodoMove>, String> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw: RawTodoMove = decode(index, item)?;
            parse_move(
                raw.todo_id.as_deref(),
                raw.destination_type.as_deref(),
                raw.destination_name.as_deref(),
            )
            .map_err(|e| item_error(index, e))
        })
        .collect()
}

/// Identifier-only items: bare strings or objects carrying `todo_id`
pub fn parse_todo_ids(items: &[Value]) -> Result<Vec<String>, String> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let id = match item {
                Value::String(id) => Some(id.as_str()),
                Value::Object(map) => map.get("todo_id").and_then(Value::as_str),
                _ => None,
            };
            require_todo_id(id).map_err(|e| item_error(index, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_shape_errors() {
        assert_eq!(
            validate_batch(&json!("not-a-list"), "k").unwrap_err(),
            "`items` must be a list"
        );
        assert_eq!(
            validate_batch(&json!([]), "").unwrap_err(),
            "`items` list cannot be empty"
        );
        let too_many = Value::Array(vec![json!("id"); MAX_BATCH_ITEMS + 1]);
        assert_eq!(
            validate_batch(&too_many, "k").unwrap_err(),
            "Batch exceeds maximum of 1000 items"
        );
        assert_eq!(
            validate_batch(&json!(["a"]), "").unwrap_err(),
            "`idempotency_key` is required"
        );
        assert_eq!(validate_batch(&json!(["a"]), "k").unwrap().len(), 1);
    }

    #[test]
    fn test_exactly_max_items_is_accepted() {
        let items = Value::Array(vec![json!("id"); MAX_BATCH_ITEMS]);
        assert!(validate_batch(&items, "k").is_ok());
    }

    #[test]
    fn test_new_todo_requires_title() {
        let items = vec![json!({"title": "ok"}), json!({"notes": "no title"})];
        assert_eq!(
            parse_new_todos(&items).unwrap_err(),
            "Item 1: title is required"
        );
        let items = vec![json!({"title": "   "})];
        assert_eq!(
            parse_new_todos(&items).unwrap_err(),
            "Item 0: title is required"
        );
    }

    #[test]
    fn test_new_todo_fields() {
        let items = vec![json!({
            "title": "Pay rent",
            "notes": "",
            "when": "tomorrow",
            "deadline": "2024-07-10",
            "tags": ["home", " ", "money"],
            "list_name": "Finance",
            "client_id": "c1"
        })];
        let todos = parse_new_todos(&items).unwrap();
        let todo = &todos[0];
        assert_eq!(todo.notes, None);
        assert_eq!(todo.when, Some(When::Tomorrow));
        assert_eq!(todo.deadline, NaiveDate::from_ymd_opt(2024, 7, 10));
        assert_eq!(todo.tags, vec!["home", "money"]);
        assert_eq!(todo.client_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_invalid_dates_are_indexed() {
        let items = vec![json!({"title": "a"}), json!({"title": "b", "deadline": "07/10/2024"})];
        assert_eq!(
            parse_new_todos(&items).unwrap_err(),
            "Item 1: Invalid deadline format: 07/10/2024. Expected YYYY-MM-DD"
        );

        let items = vec![json!({"todo_id": "T1", "when": "2024-13-01"})];
        assert!(parse_updates(&items)
            .unwrap_err()
            .starts_with("Item 0: Invalid when format: 2024-13-01"));
    }

    #[test]
    fn test_updates_keep_empty_notes() {
        let items = vec![json!({"todo_id": "T1", "notes": "", "title": ""})];
        let updates = parse_updates(&items).unwrap();
        assert_eq!(updates[0].notes.as_deref(), Some(""));
        assert_eq!(updates[0].title, None);
    }

    #[test]
    fn test_update_requires_todo_id() {
        let items = vec![json!({"title": "x"})];
        assert_eq!(
            parse_updates(&items).unwrap_err(),
            "Item 0: todo_id is required and cannot be empty"
        );
    }

    #[test]
    fn test_moves() {
        let items = vec![json!({
            "todo_id": "T1",
            "destination_type": "Project",
            "destination_name": "Launch"
        })];
        let moves = parse_moves(&items).unwrap();
        assert_eq!(moves[0].destination_type, DestinationType::Project);

        let items = vec![json!({"todo_id": "T1", "destination_type": "folder", "destination_name": "x"})];
        assert_eq!(
            parse_moves(&items).unwrap_err(),
            "Item 0: Invalid destination type: folder. Use 'area', 'project', or 'list'"
        );

        let items = vec![json!({"todo_id": "T1", "destination_type": "area"})];
        assert_eq!(
            parse_moves(&items).unwrap_err(),
            "Item 0: destination_type and destination_name are required"
        );
    }

    #[test]
    fn test_todo_ids_accept_strings_and_objects() {
        let items = vec![json!("A"), json!({"todo_id": "B"})];
        assert_eq!(parse_todo_ids(&items).unwrap(), vec!["A", "B"]);

        let items = vec![json!("A"), json!("  ")];
        assert_eq!(
            parse_todo_ids(&items).unwrap_err(),
            "Item 1: todo_id is required and cannot be empty"
        );

        let items = vec![json!(42)];
        assert!(parse_todo_ids(&items).unwrap_err().starts_with("Item 0:"));
    }

    #[test]
    fn test_search_filters() {
        assert_eq!(parse_limit(None).unwrap(), 10);
        assert_eq!(parse_limit(Some(0)).unwrap_err(), "limit must be at least 1");
        assert_eq!(parse_status(Some(" ")).unwrap(), None);
        assert_eq!(parse_status(Some("Completed")).unwrap(), Some(TodoStatus::Completed));
        assert!(parse_status(Some("later")).is_err());
        assert_eq!(
            parse_date_filter("due_start", Some("2024-02-30")).unwrap_err(),
            "Invalid due_start format: 2024-02-30. Expected YYYY-MM-DD"
        );
        assert_eq!(parse_date_filter("due_end", Some("")).unwrap(), None);
        assert_eq!(optional_text(Some("  Work ")).as_deref(), Some("Work"));
    }

    #[test]
    fn test_non_object_item() {
        let items = vec![json!("just a string")];
        assert_eq!(
            parse_new_todos(&items).unwrap_err(),
            "Item 0: must be an object"
        );
    }
}
