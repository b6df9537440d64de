//! Type definitions for things-mcp

use chrono::{Days, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Bulk Families
// ============================================================================

/// Operation family of a bulk call. Each family has its own idempotency keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BulkFamily {
    Create,
    Update,
    Move,
    Complete,
    Cancel,
    Delete,
}

impl BulkFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkFamily::Create => "create",
            BulkFamily::Update => "update",
            BulkFamily::Move => "move",
            BulkFamily::Complete => "complete",
            BulkFamily::Cancel => "cancel",
            BulkFamily::Delete => "delete",
        }
    }

    /// Separator the batch script puts between result tokens.
    ///
    /// Creation returns identifiers joined with `,`; every other family
    /// returns todo names joined with `|`.
    pub fn delimiter(&self) -> char {
        match self {
            BulkFamily::Create => ',',
            _ => '|',
        }
    }

    /// Per-item message used when the host returned no token for an item
    pub fn failure_message(&self) -> String {
        format!("Failed to {} todo", self.as_str())
    }
}

impl fmt::Display for BulkFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Scheduling and Destinations
// ============================================================================

/// Error type for parsing `when` values
#[derive(Debug, Clone)]
pub struct ParseWhenError(String);

impl fmt::Display for ParseWhenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid when format: {}. Expected today, tomorrow, someday or YYYY-MM-DD",
            self.0
        )
    }
}

impl std::error::Error for ParseWhenError {}

/// Start date of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Today,
    Tomorrow,
    Someday,
    On(NaiveDate),
}

impl When {
    pub fn is_someday(&self) -> bool {
        matches!(self, When::Someday)
    }
}

impl FromStr for When {
    type Err = ParseWhenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(When::Today),
            "tomorrow" => Ok(When::Tomorrow),
            "someday" => Ok(When::Someday),
            other => parse_date(other)
                .map(When::On)
                .ok_or_else(|| ParseWhenError(s.to_string())),
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Error type for parsing DestinationType from string
#[derive(Debug, Clone)]
pub struct ParseDestinationError(String);

impl fmt::Display for ParseDestinationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid destination type: {}. Use 'area', 'project', or 'list'",
            self.0
        )
    }
}

impl std::error::Error for ParseDestinationError {}

/// Container kinds a todo can be moved into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    Area,
    Project,
    List,
}

impl FromStr for DestinationType {
    type Err = ParseDestinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "area" => Ok(DestinationType::Area),
            "project" => Ok(DestinationType::Project),
            "list" => Ok(DestinationType::List),
            _ => Err(ParseDestinationError(s.to_string())),
        }
    }
}

// ============================================================================
// Validated Item Payloads
// ============================================================================

/// A todo to create
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub notes: Option<String>,
    pub when: Option<When>,
    pub deadline: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub list_name: Option<String>,
    pub client_id: Option<String>,
}

impl NewTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// List the creation script should target, if any
    pub fn target_list(&self) -> Option<&str> {
        if self.when.map(|w| w.is_someday()).unwrap_or(false) {
            return Some("Someday");
        }
        self.list_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Field changes for an existing todo. `None` keeps the current value;
/// `notes: Some("")` clears the notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoUpdate {
    pub todo_id: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub when: Option<When>,
    pub deadline: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl TodoUpdate {
    /// True when the update changes a property the update script sets directly
    pub fn has_property_changes(&self) -> bool {
        self.title.is_some() || self.notes.is_some() || self.deadline.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_property_changes() && self.when.is_none() && self.tags.is_empty()
    }
}

/// Move request for a single todo
#[derive(Debug, Clone, PartialEq)]
pub struct TodoMove {
    pub todo_id: String,
    pub destination_type: DestinationType,
    pub destination_name: String,
}

// ============================================================================
// Bulk Results
// ============================================================================

/// Outcome of one item in a batch: `{index, id}` or `{index, error}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ItemOutcome {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn success(index: usize, id: impl Into<String>) -> Self {
        Self {
            index,
            id: Some(id.into()),
            error: None,
        }
    }

    pub fn failure(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a processed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchResult {
    pub results: Vec<ItemOutcome>,
    pub batch_id: String,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchResult {
    /// Tally outcomes under a freshly generated batch id
    pub fn from_outcomes(results: Vec<ItemOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let processed = results.len();
        Self {
            batch_id: uuid::Uuid::new_v4().simple().to_string(),
            failed: processed - succeeded,
            processed,
            succeeded,
            results,
        }
    }
}

/// Body returned by every bulk tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkResponse {
    Batch(BatchResult),
    Rejected { error: String },
}

impl BulkResponse {
    pub fn rejected(message: impl Into<String>) -> Self {
        BulkResponse::Rejected {
            error: message.into(),
        }
    }

    pub fn batch(&self) -> Option<&BatchResult> {
        match self {
            BulkResponse::Batch(batch) => Some(batch),
            BulkResponse::Rejected { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BulkResponse::Batch(_) => None,
            BulkResponse::Rejected { error } => Some(error),
        }
    }
}

/// Create-family side record: what a caller-supplied `client_id` resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClientRecord {
    pub id: Option<String>,
    pub error: Option<String>,
}

/// Stored idempotency entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedBatch {
    pub batch: BatchResult,
    #[serde(default)]
    pub clients: BTreeMap<String, ClientRecord>,
}

impl CachedBatch {
    pub fn new(batch: BatchResult) -> Self {
        Self {
            batch,
            clients: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Read Models
// ============================================================================

/// Error type for parsing TodoStatus from string
#[derive(Debug, Clone)]
pub struct ParseStatusError(String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status: {}. Use 'open', 'completed', or 'canceled'",
            self.0
        )
    }
}

impl std::error::Error for ParseStatusError {}

/// Lifecycle status of a todo or project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Open,
    Completed,
    Canceled,
}

impl TodoStatus {
    /// AppleScript enumeration value
    pub fn keyword(&self) -> &'static str {
        match self {
            TodoStatus::Open => "open",
            TodoStatus::Completed => "completed",
            TodoStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for TodoStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TodoStatus::Open),
            "completed" => Ok(TodoStatus::Completed),
            "canceled" | "cancelled" => Ok(TodoStatus::Canceled),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// Built-in Things lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingsList {
    Inbox,
    Today,
    Anytime,
    Upcoming,
    Someday,
    Logbook,
}

impl ThingsList {
    pub fn name(&self) -> &'static str {
        match self {
            ThingsList::Inbox => "Inbox",
            ThingsList::Today => "Today",
            ThingsList::Anytime => "Anytime",
            ThingsList::Upcoming => "Upcoming",
            ThingsList::Someday => "Someday",
            ThingsList::Logbook => "Logbook",
        }
    }
}

/// A todo as returned by list and search tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Start date shown as "scheduled" in Things
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Filters for a todo search. Every set filter must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Substring of the todo name
    pub text: Option<String>,
    pub limit: usize,
    /// Area scope; wins over `project` when both are set
    pub area: Option<String>,
    pub project: Option<String>,
    pub tag: Option<String>,
    pub status: Option<TodoStatus>,
    pub due_start: Option<NaiveDate>,
    pub due_end: Option<NaiveDate>,
    pub scheduled_start: Option<NaiveDate>,
    pub scheduled_end: Option<NaiveDate>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            limit: 10,
            area: None,
            project: None,
            tag: None,
            status: None,
            due_start: None,
            due_end: None,
            scheduled_start: None,
            scheduled_end: None,
        }
    }
}

impl SearchQuery {
    /// Limit used by the week and overdue shortcuts
    pub const SHORTCUT_LIMIT: usize = 50;

    /// Todos due from `today` through seven days later
    pub fn due_this_week(today: NaiveDate) -> Self {
        Self {
            limit: Self::SHORTCUT_LIMIT,
            due_start: Some(today),
            due_end: Some(today + Days::new(7)),
            ..Default::default()
        }
    }

    /// Todos whose start date falls from `today` through seven days later
    pub fn scheduled_this_week(today: NaiveDate) -> Self {
        Self {
            limit: Self::SHORTCUT_LIMIT,
            scheduled_start: Some(today),
            scheduled_end: Some(today + Days::new(7)),
            ..Default::default()
        }
    }

    /// Open todos due before `today`
    pub fn overdue(today: NaiveDate) -> Self {
        Self {
            limit: Self::SHORTCUT_LIMIT,
            due_end: today.pred_opt(),
            status: Some(TodoStatus::Open),
            ..Default::default()
        }
    }
}

/// A project to create
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub notes: Option<String>,
    pub when: Option<When>,
    pub deadline: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub app_name: String,
}

// ============================================================================
// Host Status
// ============================================================================

/// Response for the connection probe
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub app_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Failures talking to Things 3
#[derive(Error, Debug)]
pub enum ThingsError {
    #[error("Failed to launch Things 3: {0}")]
    NotRunning(String),

    #[error("AppleScript failed (exit code {code}): {stderr}")]
    ScriptFailed { code: i32, stderr: String },

    #[error("AppleScript timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Unexpected output from Things 3: {0}")]
    UnexpectedOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_when_parsing() {
        assert_eq!("Today".parse::<When>().unwrap(), When::Today);
        assert_eq!("someday".parse::<When>().unwrap(), When::Someday);
        assert_eq!(
            "2024-07-01".parse::<When>().unwrap(),
            When::On(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
        );
        let err = "next week".parse::<When>().unwrap_err();
        assert!(err.to_string().contains("next week"));
    }

    #[test]
    fn test_destination_type_is_case_insensitive() {
        assert_eq!(
            "Project".parse::<DestinationType>().unwrap(),
            DestinationType::Project
        );
        assert!("folder".parse::<DestinationType>().is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Open".parse::<TodoStatus>().unwrap(), TodoStatus::Open);
        assert_eq!(
            "cancelled".parse::<TodoStatus>().unwrap(),
            TodoStatus::Canceled
        );
        assert_eq!(
            "done".parse::<TodoStatus>().unwrap_err().to_string(),
            "Invalid status: done. Use 'open', 'completed', or 'canceled'"
        );
    }

    #[test]
    fn test_search_shortcuts() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 28).unwrap();

        let due = SearchQuery::due_this_week(today);
        assert_eq!(due.due_start, Some(today));
        assert_eq!(due.due_end, NaiveDate::from_ymd_opt(2025, 1, 4));
        assert_eq!(due.limit, 50);

        let scheduled = SearchQuery::scheduled_this_week(today);
        assert_eq!(scheduled.scheduled_end, NaiveDate::from_ymd_opt(2025, 1, 4));
        assert_eq!(scheduled.due_start, None);

        let overdue = SearchQuery::overdue(today);
        assert_eq!(overdue.due_end, NaiveDate::from_ymd_opt(2024, 12, 27));
        assert_eq!(overdue.status, Some(TodoStatus::Open));
        assert_eq!(overdue.text, None);
    }

    #[test]
    fn test_todo_summary_omits_empty_fields() {
        let todo = TodoSummary {
            id: "T1".into(),
            name: "Pay rent".into(),
            notes: String::new(),
            status: TodoStatus::Open,
            due_date: NaiveDate::from_ymd_opt(2024, 7, 1),
            activation_date: None,
        };
        assert_eq!(
            serde_json::to_value(&todo).unwrap(),
            serde_json::json!({"id": "T1", "name": "Pay rent", "status": "open", "due_date": "2024-07-01"})
        );
    }

    #[test]
    fn test_outcome_serialization_omits_absent_fields() {
        let ok = serde_json::to_value(ItemOutcome::success(0, "A1")).unwrap();
        assert_eq!(ok, serde_json::json!({"index": 0, "id": "A1"}));

        let failed = serde_json::to_value(ItemOutcome::failure(1, "Failed to move todo")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"index": 1, "error": "Failed to move todo"})
        );
    }

    #[test]
    fn test_batch_counts() {
        let batch = BatchResult::from_outcomes(vec![
            ItemOutcome::success(0, "a"),
            ItemOutcome::failure(1, "nope"),
            ItemOutcome::success(2, "c"),
        ]);
        assert_eq!(batch.processed, 3);
        assert_eq!(batch.succeeded, 2);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.batch_id.len(), 32);
    }

    #[test]
    fn test_rejected_response_shape() {
        let body = serde_json::to_value(BulkResponse::rejected("bad")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "bad"}));
    }

    #[test]
    fn test_someday_overrides_list_name() {
        let todo = NewTodo {
            when: Some(When::Someday),
            list_name: Some("Errands".into()),
            ..NewTodo::titled("x")
        };
        assert_eq!(todo.target_list(), Some("Someday"));
        assert_eq!(NewTodo::titled("y").target_list(), None);
    }
}
