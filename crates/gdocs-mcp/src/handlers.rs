//! Tool handlers for the MCP server.
//!
//! Each tool call is decoded into a typed parameter record and forwarded to
//! the document service. Failures never escape as JSON-RPC errors: they are
//! shaped into an `isError` tool result.

use std::sync::Arc;

use gdocs_core::{
    CreateDocumentInput, DeleteResult, DocumentService, Error, ExportInput, ListFilter, Result,
    SearchFilter, ShareInput, UpdateDocumentInput,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::tools::{self, ToolKind};

/// Prefix of every tool error message.
const ERROR_PREFIX: &str = "Google Docs error";

/// Tool handler that executes tools against a document service.
pub struct ToolHandler {
    service: Arc<dyn DocumentService>,
}

impl ToolHandler {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self { service }
    }

    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        tools::available_tools()
    }

    /// Execute a tool with raw JSON arguments.
    pub async fn execute(&self, tool: ToolKind, arguments: Option<Value>) -> ToolCallResult {
        tracing::info!(
            tool = %tool,
            service = self.service.service_name(),
            "Executing tool"
        );

        let outcome = match tool {
            ToolKind::Create => self.handle_create(arguments).await,
            ToolKind::Get => self.handle_get(arguments).await,
            ToolKind::Update => self.handle_update(arguments).await,
            ToolKind::List => self.handle_list(arguments).await,
            ToolKind::Delete => self.handle_delete(arguments).await,
            ToolKind::Export => self.handle_export(arguments).await,
            ToolKind::Share => self.handle_share(arguments).await,
            ToolKind::Search => self.handle_search(arguments).await,
            ToolKind::VerifyConnection => {
                Ok(ToolCallResult::json(&self.service.verify_connection().await))
            }
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!(tool = %tool, error = %e, "Tool call failed");
            ToolCallResult::error(format!("{}: {}", ERROR_PREFIX, e.message()))
        })
    }

    async fn handle_create(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: CreateParams = parse_args(arguments)?;
        require("title", &params.title)?;

        let created = self
            .service
            .create_document(CreateDocumentInput {
                title: params.title,
                content: params.content.filter(|c| !c.is_empty()),
            })
            .await?;
        Ok(ToolCallResult::json(&created))
    }

    async fn handle_get(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: DocumentParams = parse_args(arguments)?;
        require("documentId", &params.document_id)?;

        let document = self.service.get_document(&params.document_id).await?;
        Ok(ToolCallResult::json(&document))
    }

    async fn handle_update(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: UpdateParams = parse_args(arguments)?;
        require("documentId", &params.document_id)?;

        let document = self
            .service
            .update_document(
                &params.document_id,
                UpdateDocumentInput {
                    content: params.content,
                    replace_all: params.replace_all,
                },
            )
            .await?;
        Ok(ToolCallResult::json(&document))
    }

    async fn handle_list(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: PageParams = parse_args(arguments)?;

        let list = self
            .service
            .list_documents(ListFilter {
                page_size: params.page_size,
                page_token: params.page_token,
            })
            .await?;
        Ok(ToolCallResult::json(&list))
    }

    /// Delete reports failure inside its own result record.
    async fn handle_delete(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: DocumentParams = parse_args(arguments)?;
        require("documentId", &params.document_id)?;

        let result = match self.service.delete_document(&params.document_id).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(document_id = %params.document_id, error = %e, "Delete failed");
                DeleteResult::failed(&params.document_id, e.message())
            }
        };
        Ok(ToolCallResult::json(&result))
    }

    async fn handle_export(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: ExportParams = parse_args(arguments)?;
        require("documentId", &params.document_id)?;

        let exported = self
            .service
            .export_document(
                &params.document_id,
                ExportInput {
                    mime_type: params.mime_type,
                },
            )
            .await?;
        Ok(ToolCallResult::json(&exported))
    }

    async fn handle_share(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: ShareParams = parse_args(arguments)?;
        require("documentId", &params.document_id)?;
        require("emailAddress", &params.email_address)?;

        let shared = self
            .service
            .share_document(
                &params.document_id,
                ShareInput {
                    email_address: params.email_address,
                    role: params.role.filter(|r| !r.is_empty()),
                },
            )
            .await?;
        Ok(ToolCallResult::json(&shared))
    }

    async fn handle_search(&self, arguments: Option<Value>) -> Result<ToolCallResult> {
        let params: SearchParams = parse_args(arguments)?;
        require("query", &params.query)?;

        let list = self
            .service
            .search_documents(SearchFilter {
                query: params.query,
                page_size: params.page_size,
                page_token: params.page_token,
            })
            .await?;
        Ok(ToolCallResult::json(&list))
    }
}

/// Decode tool arguments; absent arguments decode as an empty object.
fn parse_args<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T> {
    let value = arguments.unwrap_or_else(|| Value::Object(Default::default()));
    Ok(serde_json::from_value(value)?)
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidData(format!("{} is required", field)));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateParams {
    title: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentParams {
    document_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    document_id: String,
    content: String,
    #[serde(default)]
    replace_all: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    page_size: Option<u32>,
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportParams {
    document_id: String,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareParams {
    document_id: String,
    email_address: String,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    query: String,
    page_size: Option<u32>,
    page_token: Option<String>,
}
