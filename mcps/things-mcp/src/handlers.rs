//! Handler implementations for things-mcp tools
//!
//! Bulk handlers always answer with a JSON body: either the batch result or
//! `{"error": ...}` for a rejected request. Single-item, search, listing and
//! project handlers report failures as MCP errors. Resource reads share the
//! listing code and return the same JSON.

use rmcp::{
    model::{CallToolResult, Content},
    ErrorData as McpError,
};
use serde::Serialize;
use serde_json::json;

use crate::bulk::BulkOrchestrator;
use crate::catalog::Catalog;
use crate::client::ThingsClient;
use crate::params::*;
use crate::types::{
    BulkFamily, NewProject, NewTodo, SearchQuery, ThingsError, ThingsList, TodoSummary, TodoUpdate,
};
use crate::validation::{
    optional_text, parse_date_filter, parse_deadline, parse_limit, parse_move, parse_status,
    parse_when, require_todo_id,
};

// ============================================================================
// Response Helpers
// ============================================================================

pub fn json_success<T: Serialize>(data: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(data).map_err(|e| internal_error(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

pub fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}

fn host_error(e: ThingsError) -> McpError {
    match e {
        ThingsError::InvalidInput(message) => invalid_params(message),
        other => internal_error(other.to_string()),
    }
}

fn tags(tags: Option<Vec<String>>) -> Vec<String> {
    tags.unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ============================================================================
// Bulk Operations
// ============================================================================

pub async fn run_bulk(
    bulk: &BulkOrchestrator,
    family: BulkFamily,
    params: BulkParams,
) -> Result<CallToolResult, McpError> {
    let key = params.idempotency_key.as_str();
    let response = match family {
        BulkFamily::Create => bulk.create_todo_bulk(key, &params.items).await,
        BulkFamily::Update => bulk.update_todo_bulk(key, &params.items).await,
        BulkFamily::Move => bulk.move_todo_bulk(key, &params.items).await,
        BulkFamily::Complete => bulk.complete_todo_bulk(key, &params.items).await,
        BulkFamily::Cancel => bulk.cancel_todo_bulk(key, &params.items).await,
        BulkFamily::Delete => bulk.delete_todo_bulk(key, &params.items).await,
    };
    json_success(&response)
}

pub async fn lookup_bulk_client(
    bulk: &BulkOrchestrator,
    params: LookupClientParams,
) -> Result<CallToolResult, McpError> {
    match bulk.lookup_client(&params.idempotency_key, &params.client_id) {
        Some(record) => json_success(&record),
        None => Err(invalid_params(format!(
            "No record for client_id '{}' under idempotency key '{}'",
            params.client_id, params.idempotency_key
        ))),
    }
}

pub async fn clear_bulk_cache(
    bulk: &BulkOrchestrator,
    params: ClearCacheParams,
) -> Result<CallToolResult, McpError> {
    bulk.clear_cache(params.family)
        .map_err(|e| internal_error(e.to_string()))?;
    json_success(&json!({ "family": params.family, "cleared": true }))
}

// ============================================================================
// Single-item Operations
// ============================================================================

pub async fn create_todo(
    client: &ThingsClient,
    params: CreateTodoParams,
) -> Result<CallToolResult, McpError> {
    if params.title.trim().is_empty() {
        return Err(invalid_params("title is required"));
    }
    let todo = NewTodo {
        title: params.title,
        notes: params.notes.filter(|n| !n.is_empty()),
        when: parse_when(params.when.as_deref()).map_err(invalid_params)?,
        deadline: parse_deadline(params.deadline.as_deref()).map_err(invalid_params)?,
        tags: tags(params.tags),
        list_name: params.list_name.filter(|l| !l.is_empty()),
        client_id: None,
    };

    let id = client.create_todo(&todo).await.map_err(host_error)?;
    json_success(&json!({ "id": id, "title": todo.title }))
}

pub async fn update_todo(
    client: &ThingsClient,
    params: UpdateTodoParams,
) -> Result<CallToolResult, McpError> {
    let update = TodoUpdate {
        todo_id: require_todo_id(Some(params.todo_id.as_str())).map_err(invalid_params)?,
        title: params.title.filter(|t| !t.trim().is_empty()),
        notes: params.notes,
        when: parse_when(params.when.as_deref()).map_err(invalid_params)?,
        deadline: parse_deadline(params.deadline.as_deref()).map_err(invalid_params)?,
        tags: tags(params.tags),
    };

    let name = client.update_todo(&update).await.map_err(host_error)?;
    json_success(&json!({ "id": update.todo_id, "name": name, "updated": true }))
}

pub async fn move_todo(
    client: &ThingsClient,
    params: MoveTodoParams,
) -> Result<CallToolResult, McpError> {
    let mv = parse_move(
        Some(params.todo_id.as_str()),
        Some(params.destination_type.as_str()),
        Some(params.destination_name.as_str()),
    )
    .map_err(invalid_params)?;

    let name = client.move_todo(&mv).await.map_err(host_error)?;
    json_success(&json!({
        "id": mv.todo_id,
        "name": name,
        "destination_type": mv.destination_type,
        "destination_name": mv.destination_name,
    }))
}

pub async fn complete_todo(
    client: &ThingsClient,
    params: TodoIdParams,
) -> Result<CallToolResult, McpError> {
    let todo_id = require_todo_id(Some(params.todo_id.as_str())).map_err(invalid_params)?;
    let name = client.complete_todo(&todo_id).await.map_err(host_error)?;
    json_success(&json!({ "id": todo_id, "name": name, "status": "completed" }))
}

pub async fn cancel_todo(
    client: &ThingsClient,
    params: TodoIdParams,
) -> Result<CallToolResult, McpError> {
    let todo_id = require_todo_id(Some(params.todo_id.as_str())).map_err(invalid_params)?;
    let name = client.cancel_todo(&todo_id).await.map_err(host_error)?;
    json_success(&json!({ "id": todo_id, "name": name, "status": "canceled" }))
}

pub async fn delete_todo(
    client: &ThingsClient,
    params: TodoIdParams,
) -> Result<CallToolResult, McpError> {
    let todo_id = require_todo_id(Some(params.todo_id.as_str())).map_err(invalid_params)?;
    let name = client.delete_todo(&todo_id).await.map_err(host_error)?;
    json_success(&json!({ "id": todo_id, "name": name, "status": "trashed" }))
}

pub async fn things_status(client: &ThingsClient) -> Result<CallToolResult, McpError> {
    json_success(&client.test_connection().await)
}

// ============================================================================
// Search and Listings
// ============================================================================

fn todo_list(todos: &[TodoSummary]) -> serde_json::Value {
    json!({ "count": todos.len(), "todos": todos })
}

/// Validate search filters; a bad filter rejects the whole search
pub fn search_query(params: &SearchTodoParams) -> Result<SearchQuery, McpError> {
    Ok(SearchQuery {
        text: optional_text(Some(params.query.as_str())),
        limit: parse_limit(params.limit).map_err(invalid_params)?,
        area: optional_text(params.area.as_deref()),
        project: optional_text(params.project.as_deref()),
        tag: optional_text(params.tag.as_deref()),
        status: parse_status(params.status.as_deref()).map_err(invalid_params)?,
        due_start: parse_date_filter("due_start", params.due_start.as_deref())
            .map_err(invalid_params)?,
        due_end: parse_date_filter("due_end", params.due_end.as_deref()).map_err(invalid_params)?,
        scheduled_start: parse_date_filter("scheduled_start", params.scheduled_start.as_deref())
            .map_err(invalid_params)?,
        scheduled_end: parse_date_filter("scheduled_end", params.scheduled_end.as_deref())
            .map_err(invalid_params)?,
    })
}

pub async fn search_todo(
    client: &ThingsClient,
    params: SearchTodoParams,
) -> Result<CallToolResult, McpError> {
    let query = search_query(&params)?;
    run_search(client, &query).await
}

/// Run a prepared query, used by the search shortcuts
pub async fn run_search(
    client: &ThingsClient,
    query: &SearchQuery,
) -> Result<CallToolResult, McpError> {
    let todos = client.search_todos(query).await.map_err(host_error)?;
    json_success(&todo_list(&todos))
}

pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn list_todos(
    client: &ThingsClient,
    list: ThingsList,
) -> Result<CallToolResult, McpError> {
    let todos = client.list_todos(list).await.map_err(host_error)?;
    let mut body = todo_list(&todos);
    body["list"] = json!(list.name());
    json_success(&body)
}

pub async fn list_areas(catalog: &Catalog) -> Result<CallToolResult, McpError> {
    let areas = catalog.areas().await.map_err(host_error)?;
    json_success(&json!({ "count": areas.len(), "areas": areas }))
}

pub async fn list_projects(catalog: &Catalog) -> Result<CallToolResult, McpError> {
    let projects = catalog.projects().await.map_err(host_error)?;
    json_success(&json!({ "count": projects.len(), "projects": projects }))
}

pub async fn list_tags(catalog: &Catalog) -> Result<CallToolResult, McpError> {
    let tags = catalog.tags().await.map_err(host_error)?;
    json_success(&json!({ "count": tags.len(), "tags": tags }))
}

// ============================================================================
// Projects and Tags
// ============================================================================

pub async fn create_project(
    catalog: &Catalog,
    params: CreateProjectParams,
) -> Result<CallToolResult, McpError> {
    if params.title.trim().is_empty() {
        return Err(invalid_params("title is required"));
    }
    let project = NewProject {
        title: params.title,
        notes: params.notes.filter(|n| !n.is_empty()),
        when: parse_when(params.when.as_deref()).map_err(invalid_params)?,
        deadline: parse_deadline(params.deadline.as_deref()).map_err(invalid_params)?,
        tags: tags(params.tags),
        area: optional_text(params.area.as_deref()),
    };

    let id = catalog.create_project(&project).await.map_err(host_error)?;
    json_success(&json!({ "id": id, "title": project.title }))
}

fn require_project_id(value: &str) -> Result<&str, McpError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid_params("project_id is required and cannot be empty"));
    }
    Ok(value)
}

pub async fn cancel_project(
    catalog: &Catalog,
    params: ProjectIdParams,
) -> Result<CallToolResult, McpError> {
    let project_id = require_project_id(&params.project_id)?;
    let name = catalog.cancel_project(project_id).await.map_err(host_error)?;
    json_success(&json!({ "id": project_id, "name": name, "status": "canceled" }))
}

pub async fn delete_project(
    catalog: &Catalog,
    params: ProjectIdParams,
) -> Result<CallToolResult, McpError> {
    let project_id = require_project_id(&params.project_id)?;
    let name = catalog.delete_project(project_id).await.map_err(host_error)?;
    json_success(&json!({ "id": project_id, "name": name, "status": "trashed" }))
}

pub async fn create_tag(
    catalog: &Catalog,
    params: CreateTagParams,
) -> Result<CallToolResult, McpError> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(invalid_params("tag name is required and cannot be empty"));
    }
    let parent = optional_text(params.parent_tag.as_deref());
    let tag = catalog
        .create_tag(name, parent.as_deref())
        .await
        .map_err(host_error)?;
    json_success(&tag)
}

pub async fn get_version_info(client: &ThingsClient) -> Result<CallToolResult, McpError> {
    let info = client.version_info().await.map_err(host_error)?;
    json_success(&info)
}

// ============================================================================
// Resources
// ============================================================================

pub const AREAS_URI: &str = "things://areas";
pub const PROJECTS_URI: &str = "things://projects";
pub const TODAY_URI: &str = "things://today";
pub const INBOX_URI: &str = "things://inbox";

/// `(uri, name, description)` of every resource
pub const RESOURCES: [(&str, &str, &str); 4] = [
    (AREAS_URI, "Things Areas", "List of available areas in Things 3"),
    (PROJECTS_URI, "Things Projects", "List of available projects in Things 3"),
    (TODAY_URI, "Today's Tasks", "Today's scheduled tasks in Things 3"),
    (INBOX_URI, "Inbox Items", "Items in Things 3 inbox"),
];

/// JSON body of a resource. Areas and projects come from the listing cache.
pub async fn resource_json(
    catalog: &Catalog,
    client: &ThingsClient,
    uri: &str,
) -> Result<String, McpError> {
    let body = match uri {
        AREAS_URI => json!(catalog.areas().await.map_err(host_error)?),
        PROJECTS_URI => json!(catalog.projects().await.map_err(host_error)?),
        TODAY_URI => json!(client.list_todos(ThingsList::Today).await.map_err(host_error)?),
        INBOX_URI => json!(client.list_todos(ThingsList::Inbox).await.map_err(host_error)?),
        other => {
            return Err(McpError::resource_not_found(
                format!("Unknown resource: {}", other),
                None,
            ))
        }
    };
    serde_json::to_string_pretty(&body).map_err(|e| internal_error(e.to_string()))
}
