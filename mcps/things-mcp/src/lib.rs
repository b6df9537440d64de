//! Things MCP Library
//!
//! Drives Things 3 through AppleScript and exposes it as MCP tools. The core
//! is the bulk layer: one generated script per batch, positional result
//! alignment, an item-by-item fallback, and an idempotency cache that can
//! persist create batches across restarts. Around it sit single-item edits,
//! searches and list reads, project and tag changes, and a short-lived cache
//! of area, project and tag listings that also backs the MCP resources.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use things_mcp::{Config, ThingsMcpServer};
//!
//! let server = ThingsMcpServer::new(&Config::load(None));
//! // Serve via stdio or call the orchestrator directly
//! let response = server
//!     .orchestrator()
//!     .complete_todo_bulk("retry-key", &serde_json::json!(["id1", "id2"]))
//!     .await;
//! ```

pub mod bulk;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod executor;
pub mod handlers;
pub mod params;
pub mod projects;
pub mod reads;
pub mod script;
pub mod server;
pub mod telemetry;
pub mod todos;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

pub use bulk::BulkOrchestrator;
pub use config::Config;
pub use server::ThingsMcpServer;

// Re-export parameter types for direct API usage
pub use params::*;
