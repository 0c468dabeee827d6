//! Unified document types used across the client and the MCP layer.
//!
//! Remote responses are deserialized into these records. The document record
//! keeps the fields the tools reason about as typed members and carries every
//! other remote field through a flattened map, so `get` still returns the full
//! structure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MIME type Drive uses for native Google Docs.
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Default export format.
pub const DEFAULT_EXPORT_MIME_TYPE: &str = "application/pdf";

/// Default permission role granted by `share`.
pub const DEFAULT_SHARE_ROLE: &str = "reader";

/// Default page size for list and search.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Docs API version reported by connection checks.
pub const API_VERSION: &str = "v1";

// =============================================================================
// Documents
// =============================================================================

/// A Google Docs document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A top-level content block (paragraph, table, section break, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    #[serde(default)]
    pub end_index: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Top-level content blocks of the body, empty when the body is absent.
    pub fn content_blocks(&self) -> &[StructuralElement] {
        self.body
            .as_ref()
            .map(|b| b.content.as_slice())
            .unwrap_or(&[])
    }

    /// Browser URL for editing this document.
    pub fn edit_url(&self) -> String {
        document_url(&self.document_id)
    }
}

/// Browser URL for editing a document by ID.
pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

/// A file entry as returned by Drive listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
}

/// A permission grant on a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub permission_type: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

// =============================================================================
// Operation inputs
// =============================================================================

/// Input for creating a document.
#[derive(Debug, Clone, Default)]
pub struct CreateDocumentInput {
    pub title: String,
    pub content: Option<String>,
}

/// Input for updating a document body.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentInput {
    pub content: String,
    /// Clear the existing body before inserting.
    pub replace_all: bool,
}

/// Pagination for document listings.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

impl ListFilter {
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Full-text and name search over documents.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub query: String,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

impl SearchFilter {
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Input for sharing a document with a user.
#[derive(Debug, Clone, Default)]
pub struct ShareInput {
    pub email_address: String,
    pub role: Option<String>,
}

impl ShareInput {
    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_SHARE_ROLE)
    }
}

/// Target format for an export.
#[derive(Debug, Clone, Default)]
pub struct ExportInput {
    pub mime_type: Option<String>,
}

impl ExportInput {
    pub fn mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_EXPORT_MIME_TYPE)
    }
}

// =============================================================================
// Operation results
// =============================================================================

/// Result of `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDocument {
    pub document_id: String,
    pub title: String,
    pub url: String,
    pub document: Document,
}

/// Result of `list` and `search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentList {
    pub documents: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Result of `delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub success: bool,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteResult {
    pub fn deleted(document_id: impl Into<String>) -> Self {
        let document_id = document_id.into();
        Self {
            success: true,
            message: Some(format!("Document {} deleted successfully", document_id)),
            document_id,
            error: None,
        }
    }

    pub fn failed(document_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            document_id: document_id.into(),
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Result of `export`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub document_id: String,
    pub mime_type: String,
    /// Base64-encoded file content.
    pub content: String,
}

/// Result of `share`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResult {
    pub success: bool,
    pub document_id: String,
    pub permission: Permission,
}

// =============================================================================
// Connection verification
// =============================================================================

/// Which credential strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    ApiKey,
    ServiceAccount,
    #[serde(rename = "oauth2")]
    OAuth2,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::ApiKey => "api_key",
            AuthType::ServiceAccount => "service_account",
            AuthType::OAuth2 => "oauth2",
        }
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic result of a connection check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub project_id: String,
    /// RFC 3339 UTC time of the check.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ConnectionDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ConnectionError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub auth_type: AuthType,
    pub api_version: String,
    pub document_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConnectionStatus {
    /// Whether the failure was a permission/scope rejection.
    pub fn is_permission_denied(&self) -> bool {
        self.error
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == "403")
    }
}
