//! Google Docs and Drive API request/response types.
//!
//! These types represent the raw JSON bodies exchanged with the Google APIs.
//! Documents themselves deserialize straight into `gdocs_core::Document`.

use gdocs_core::DriveFile;
use serde::{Deserialize, Serialize};

// =============================================================================
// Docs batchUpdate
// =============================================================================

/// Body of `documents.batchUpdate`. Requests are applied in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<DocsRequest>,
}

/// A single edit inside a batch update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocsRequest {
    InsertText(InsertTextRequest),
    DeleteContentRange(DeleteContentRangeRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertTextRequest {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteContentRangeRequest {
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: i64,
    pub end_index: i64,
}

impl DocsRequest {
    pub fn insert_text(index: i64, text: impl Into<String>) -> Self {
        DocsRequest::InsertText(InsertTextRequest {
            location: Location { index },
            text: text.into(),
        })
    }

    pub fn delete_range(start_index: i64, end_index: i64) -> Self {
        DocsRequest::DeleteContentRange(DeleteContentRangeRequest {
            range: Range {
                start_index,
                end_index,
            },
        })
    }
}

// =============================================================================
// Drive
// =============================================================================

/// Body of `files.create` (metadata only).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    pub name: String,
    pub mime_type: String,
}

/// Response of `files.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body of `permissions.create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionRequest {
    #[serde(rename = "type")]
    pub permission_type: String,
    pub role: String,
    pub email_address: String,
}
