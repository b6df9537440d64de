//! MCP Server implementation for Things 3
//!
//! This module defines the MCP server that exposes bulk and single-item todo
//! operations, searches, listings and project/tag changes as tools, plus four
//! read-only JSON resources. Handler implementations are in the handlers
//! module.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, ListResourcesResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::bulk::BulkOrchestrator;
use crate::cache::{IdempotencyStore, MemoryStore, SqliteStore};
use crate::catalog::Catalog;
use crate::client::ThingsClient;
use crate::config::Config;
use crate::handlers;
use crate::params::*;
use crate::types::{BulkFamily, SearchQuery, ThingsList};

/// The main Things MCP Server
#[derive(Clone)]
pub struct ThingsMcpServer {
    bulk: BulkOrchestrator,
    catalog: Catalog,
    stores: Vec<Arc<dyn IdempotencyStore>>,
    tool_router: ToolRouter<Self>,
}

/// Store for create-family entries: durable when configured, in-memory otherwise
fn create_store(config: &Config) -> Arc<dyn IdempotencyStore> {
    if !config.cache.durable {
        return Arc::new(MemoryStore::new());
    }
    let path = config.cache.resolved_path();
    match SqliteStore::open(&path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                "Could not open durable cache at {}: {}; using in-memory cache",
                path.display(),
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl ThingsMcpServer {
    pub fn new(config: &Config) -> Self {
        let client = ThingsClient::from_config(&config.executor);
        let create_cache = create_store(config);
        let cache: Arc<dyn IdempotencyStore> = Arc::new(MemoryStore::new());
        Self::with_parts(client, create_cache, cache, config.cache.listing_ttl())
    }

    /// Build a server around an explicit client and caches
    pub fn with_parts(
        client: ThingsClient,
        create_cache: Arc<dyn IdempotencyStore>,
        cache: Arc<dyn IdempotencyStore>,
        listing_ttl: Duration,
    ) -> Self {
        Self {
            catalog: Catalog::new(client.clone(), listing_ttl),
            bulk: BulkOrchestrator::new(client, create_cache.clone(), cache.clone()),
            stores: vec![create_cache, cache],
            tool_router: Self::tool_router(),
        }
    }

    pub fn orchestrator(&self) -> &BulkOrchestrator {
        &self.bulk
    }

    fn client(&self) -> &ThingsClient {
        self.bulk.client()
    }

    /// Release cache resources on shutdown
    pub fn close(&self) {
        for store in &self.stores {
            if let Err(e) = store.close() {
                warn!("Failed to close idempotency cache: {}", e);
            }
        }
        info!("Idempotency caches closed");
    }

    // ========================================================================
    // Bulk Operations
    // ========================================================================

    #[tool(
        description = "Create many todos in one round-trip. Items: {title, notes?, when?, deadline?, tags?, list_name?, client_id?}. Repeating an idempotency_key returns the first result."
    )]
    async fn create_todo_bulk(
        &self,
        Parameters(params): Parameters<BulkParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_bulk(&self.bulk, BulkFamily::Create, params).await
    }

    #[tool(
        description = "Update many todos. Items: {todo_id, title?, notes?, when?, deadline?, tags?}"
    )]
    async fn update_todo_bulk(
        &self,
        Parameters(params): Parameters<BulkParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_bulk(&self.bulk, BulkFamily::Update, params).await
    }

    #[tool(
        description = "Move many todos. Items: {todo_id, destination_type: area|project|list, destination_name}"
    )]
    async fn move_todo_bulk(
        &self,
        Parameters(params): Parameters<BulkParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_bulk(&self.bulk, BulkFamily::Move, params).await
    }

    #[tool(description = "Complete many todos. Items: todo ids or {todo_id}")]
    async fn complete_todo_bulk(
        &self,
        Parameters(params): Parameters<BulkParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_bulk(&self.bulk, BulkFamily::Complete, params).await
    }

    #[tool(description = "Cancel many todos. Items: todo ids or {todo_id}")]
    async fn cancel_todo_bulk(
        &self,
        Parameters(params): Parameters<BulkParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_bulk(&self.bulk, BulkFamily::Cancel, params).await
    }

    #[tool(description = "Move many todos to the Trash. Items: todo ids or {todo_id}")]
    async fn delete_todo_bulk(
        &self,
        Parameters(params): Parameters<BulkParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_bulk(&self.bulk, BulkFamily::Delete, params).await
    }

    #[tool(description = "Resolve a client_id from a previous create_todo_bulk call to its todo id")]
    async fn lookup_bulk_client(
        &self,
        Parameters(params): Parameters<LookupClientParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::lookup_bulk_client(&self.bulk, params).await
    }

    #[tool(
        description = "Drop stored bulk results of one family so their idempotency keys run again"
    )]
    async fn clear_bulk_cache(
        &self,
        Parameters(params): Parameters<ClearCacheParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::clear_bulk_cache(&self.bulk, params).await
    }

    // ========================================================================
    // Single-item Operations
    // ========================================================================

    #[tool(description = "Create a todo")]
    async fn create_todo(
        &self,
        Parameters(params): Parameters<CreateTodoParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::create_todo(self.client(), params).await
    }

    #[tool(description = "Update a todo's title, notes, start date, deadline or tags")]
    async fn update_todo(
        &self,
        Parameters(params): Parameters<UpdateTodoParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::update_todo(self.client(), params).await
    }

    #[tool(description = "Move a todo to an area, project or list")]
    async fn move_todo(
        &self,
        Parameters(params): Parameters<MoveTodoParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::move_todo(self.client(), params).await
    }

    #[tool(description = "Mark a todo as completed")]
    async fn complete_todo(
        &self,
        Parameters(params): Parameters<TodoIdParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::complete_todo(self.client(), params).await
    }

    #[tool(description = "Mark a todo as canceled")]
    async fn cancel_todo(
        &self,
        Parameters(params): Parameters<TodoIdParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::cancel_todo(self.client(), params).await
    }

    #[tool(description = "Move a todo to the Trash")]
    async fn delete_todo(
        &self,
        Parameters(params): Parameters<TodoIdParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::delete_todo(self.client(), params).await
    }

    #[tool(description = "Check whether Things 3 is running and reachable")]
    async fn things_status(&self) -> Result<CallToolResult, McpError> {
        handlers::things_status(self.client()).await
    }

    #[tool(description = "Get the Things 3 version")]
    async fn get_version_info(&self) -> Result<CallToolResult, McpError> {
        handlers::get_version_info(self.client()).await
    }

    // ========================================================================
    // Search
    // ========================================================================

    #[tool(
        description = "Search todos by name with optional project, area, tag, status and due/scheduled date range filters (YYYY-MM-DD)"
    )]
    async fn search_todo(
        &self,
        Parameters(params): Parameters<SearchTodoParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::search_todo(self.client(), params).await
    }

    #[tool(description = "Todos due in the next 7 days")]
    async fn search_due_this_week(&self) -> Result<CallToolResult, McpError> {
        let query = SearchQuery::due_this_week(handlers::today());
        handlers::run_search(self.client(), &query).await
    }

    #[tool(description = "Todos scheduled to start in the next 7 days")]
    async fn search_scheduled_this_week(&self) -> Result<CallToolResult, McpError> {
        let query = SearchQuery::scheduled_this_week(handlers::today());
        handlers::run_search(self.client(), &query).await
    }

    #[tool(description = "Open todos whose deadline has passed")]
    async fn search_overdue(&self) -> Result<CallToolResult, McpError> {
        let query = SearchQuery::overdue(handlers::today());
        handlers::run_search(self.client(), &query).await
    }

    // ========================================================================
    // Lists
    // ========================================================================

    #[tool(description = "Todos in the Today list")]
    async fn list_today_tasks(&self) -> Result<CallToolResult, McpError> {
        handlers::list_todos(self.client(), ThingsList::Today).await
    }

    #[tool(description = "Todos in the Inbox")]
    async fn list_inbox_items(&self) -> Result<CallToolResult, McpError> {
        handlers::list_todos(self.client(), ThingsList::Inbox).await
    }

    #[tool(description = "Todos in the Anytime list")]
    async fn list_anytime_tasks(&self) -> Result<CallToolResult, McpError> {
        handlers::list_todos(self.client(), ThingsList::Anytime).await
    }

    #[tool(description = "Todos in the Someday list")]
    async fn list_someday_tasks(&self) -> Result<CallToolResult, McpError> {
        handlers::list_todos(self.client(), ThingsList::Someday).await
    }

    #[tool(description = "Todos in the Upcoming list")]
    async fn list_upcoming_tasks(&self) -> Result<CallToolResult, McpError> {
        handlers::list_todos(self.client(), ThingsList::Upcoming).await
    }

    #[tool(description = "Completed todos from the Logbook")]
    async fn list_logbook_items(&self) -> Result<CallToolResult, McpError> {
        handlers::list_todos(self.client(), ThingsList::Logbook).await
    }

    #[tool(description = "All areas (cached for a few minutes)")]
    async fn list_areas(&self) -> Result<CallToolResult, McpError> {
        handlers::list_areas(&self.catalog).await
    }

    #[tool(description = "All projects with their area (cached for a few minutes)")]
    async fn list_projects(&self) -> Result<CallToolResult, McpError> {
        handlers::list_projects(&self.catalog).await
    }

    #[tool(description = "All tags with their parent tag (cached for a few minutes)")]
    async fn list_tags(&self) -> Result<CallToolResult, McpError> {
        handlers::list_tags(&self.catalog).await
    }

    // ========================================================================
    // Projects and Tags
    // ========================================================================

    #[tool(description = "Create a project, optionally in an area")]
    async fn create_project(
        &self,
        Parameters(params): Parameters<CreateProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::create_project(&self.catalog, params).await
    }

    #[tool(description = "Mark a project as canceled")]
    async fn cancel_project(
        &self,
        Parameters(params): Parameters<ProjectIdParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::cancel_project(&self.catalog, params).await
    }

    #[tool(description = "Move a project to the Trash")]
    async fn delete_project(
        &self,
        Parameters(params): Parameters<ProjectIdParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::delete_project(&self.catalog, params).await
    }

    #[tool(description = "Create a tag, optionally nested under an existing parent tag")]
    async fn create_tag(
        &self,
        Parameters(params): Parameters<CreateTagParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::create_tag(&self.catalog, params).await
    }
}

/// Resource descriptors advertised by `resources/list`
pub fn resources() -> Vec<Resource> {
    handlers::RESOURCES
        .iter()
        .map(|(uri, name, description)| {
            let mut resource = RawResource::new(*uri, *name);
            resource.description = Some(description.to_string());
            resource.mime_type = Some("application/json".to_string());
            resource.no_annotation()
        })
        .collect()
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for ThingsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Things 3 MCP server. Bulk tools run many todo changes in one AppleScript \
                 round-trip and are idempotent per (operation, idempotency_key); a failed batch \
                 is retried item by item. Single-item tools cover create, update, move, \
                 complete, cancel and delete. Search and list tools return JSON todos; \
                 areas, projects, today and inbox are also available as resources."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(resources()))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        debug!(uri = %request.uri, "Reading resource");
        let text = handlers::resource_json(&self.catalog, self.client(), &request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: request.uri,
                mime_type: Some("application/json".to_string()),
                text,
                meta: None,
            }],
        })
    }
}
