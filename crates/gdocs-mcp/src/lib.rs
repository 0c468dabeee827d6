//! MCP (Model Context Protocol) server for Google Docs.
//!
//! This crate implements the MCP server that exposes document operations
//! to AI assistants as a fixed set of `google_docs_*` tools.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::ToolHandler;
pub use server::McpServer;
pub use tools::ToolKind;
