//! Parameter definitions for things-mcp tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::BulkFamily;

// ============================================================================
// Bulk Operations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BulkParams {
    /// Caller-chosen key; repeating a call with the same key returns the first result
    #[serde(default)]
    pub idempotency_key: String,
    /// Items to process, in order. Create items are objects with `title`;
    /// other families take todo id strings or objects with `todo_id`.
    #[serde(default)]
    pub items: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LookupClientParams {
    /// Key of a previous create_todo_bulk call
    pub idempotency_key: String,
    /// `client_id` supplied on one of that call's items
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClearCacheParams {
    /// Family whose stored results are dropped
    pub family: BulkFamily,
}

// ============================================================================
// Single-item Operations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTodoParams {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// today, tomorrow, someday or YYYY-MM-DD
    #[serde(default)]
    pub when: Option<String>,
    /// YYYY-MM-DD
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub list_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTodoParams {
    pub todo_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Empty string clears the notes
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    /// Tags to add
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MoveTodoParams {
    pub todo_id: String,
    /// area, project or list
    pub destination_type: String,
    pub destination_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TodoIdParams {
    pub todo_id: String,
}

// ============================================================================
// Search and Listings
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchTodoParams {
    /// Substring of the todo name; empty matches every todo
    #[serde(default)]
    pub query: String,
    /// Maximum number of results (default 10)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Only todos in this project
    #[serde(default)]
    pub project: Option<String>,
    /// Only todos in this area; takes precedence over `project`
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    /// open, completed or canceled
    #[serde(default)]
    pub status: Option<String>,
    /// Due on or after this date (YYYY-MM-DD)
    #[serde(default)]
    pub due_start: Option<String>,
    /// Due on or before this date (YYYY-MM-DD)
    #[serde(default)]
    pub due_end: Option<String>,
    /// Scheduled on or after this date (YYYY-MM-DD)
    #[serde(default)]
    pub scheduled_start: Option<String>,
    /// Scheduled on or before this date (YYYY-MM-DD)
    #[serde(default)]
    pub scheduled_end: Option<String>,
}

// ============================================================================
// Projects and Tags
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// today, tomorrow, someday or YYYY-MM-DD
    #[serde(default)]
    pub when: Option<String>,
    /// YYYY-MM-DD
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Area to create the project in
    #[serde(default)]
    pub area: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProjectIdParams {
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTagParams {
    pub name: String,
    /// Existing tag to nest the new tag under
    #[serde(default)]
    pub parent_tag: Option<String>,
}
