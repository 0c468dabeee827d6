//! MCP tool catalog.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::protocol::ToolDefinition;

/// The fixed set of tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Create,
    Get,
    Update,
    List,
    Delete,
    Export,
    Share,
    Search,
    VerifyConnection,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Create,
        ToolKind::Get,
        ToolKind::Update,
        ToolKind::List,
        ToolKind::Delete,
        ToolKind::Export,
        ToolKind::Share,
        ToolKind::Search,
        ToolKind::VerifyConnection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Create => "google_docs_create",
            ToolKind::Get => "google_docs_get",
            ToolKind::Update => "google_docs_update",
            ToolKind::List => "google_docs_list",
            ToolKind::Delete => "google_docs_delete",
            ToolKind::Export => "google_docs_export",
            ToolKind::Share => "google_docs_share",
            ToolKind::Search => "google_docs_search",
            ToolKind::VerifyConnection => "google_docs_verify_connection",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Create => "Create a new Google Docs document, optionally with initial text",
            ToolKind::Get => "Get the full structure of a Google Docs document",
            ToolKind::Update => {
                "Insert text at the start of a document, optionally replacing all existing content"
            }
            ToolKind::List => "List Google Docs documents",
            ToolKind::Delete => "Delete a Google Docs document",
            ToolKind::Export => "Export a document to another format (base64-encoded content)",
            ToolKind::Share => "Share a document with a user by email address",
            ToolKind::Search => "Search documents by name or full text",
            ToolKind::VerifyConnection => "Verify connectivity and credentials for the Google APIs",
        }
    }

    /// JSON Schema of the tool's arguments.
    pub fn input_schema(&self) -> Value {
        match self {
            ToolKind::Create => json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Title of the new document"
                    },
                    "content": {
                        "type": "string",
                        "description": "Initial plain-text content"
                    }
                },
                "required": ["title"]
            }),
            ToolKind::Get | ToolKind::Delete => json!({
                "type": "object",
                "properties": {
                    "documentId": document_id_schema()
                },
                "required": ["documentId"]
            }),
            ToolKind::Update => json!({
                "type": "object",
                "properties": {
                    "documentId": document_id_schema(),
                    "content": {
                        "type": "string",
                        "description": "Text to insert at the start of the document"
                    },
                    "replaceAll": {
                        "type": "boolean",
                        "description": "Remove existing content first (default: false)"
                    }
                },
                "required": ["documentId", "content"]
            }),
            ToolKind::List => json!({
                "type": "object",
                "properties": {
                    "pageSize": page_size_schema(),
                    "pageToken": page_token_schema()
                }
            }),
            ToolKind::Export => json!({
                "type": "object",
                "properties": {
                    "documentId": document_id_schema(),
                    "mimeType": {
                        "type": "string",
                        "description": "Export MIME type (default: application/pdf)"
                    }
                },
                "required": ["documentId"]
            }),
            ToolKind::Share => json!({
                "type": "object",
                "properties": {
                    "documentId": document_id_schema(),
                    "emailAddress": {
                        "type": "string",
                        "description": "Email address to share with"
                    },
                    "role": {
                        "type": "string",
                        "enum": ["reader", "commenter", "writer"],
                        "description": "Permission role (default: reader)"
                    }
                },
                "required": ["documentId", "emailAddress"]
            }),
            ToolKind::Search => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Text to match against document names and contents"
                    },
                    "pageSize": page_size_schema(),
                    "pageToken": page_token_schema()
                },
                "required": ["query"]
            }),
            ToolKind::VerifyConnection => json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

fn document_id_schema() -> Value {
    json!({
        "type": "string",
        "description": "ID of the document"
    })
}

fn page_size_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Maximum number of documents to return (default: 10)",
        "minimum": 1
    })
}

fn page_token_schema() -> Value {
    json!({
        "type": "string",
        "description": "Continuation token from a previous response"
    })
}

/// Catalog advertised by `tools/list`.
pub fn available_tools() -> Vec<ToolDefinition> {
    ToolKind::ALL.iter().map(ToolKind::definition).collect()
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}
