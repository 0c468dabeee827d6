//! Service trait for document backends.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ConnectionStatus, CreateDocumentInput, CreatedDocument, DeleteResult, Document, DocumentList,
    ExportInput, ExportedDocument, ListFilter, SearchFilter, ShareInput, ShareResult,
    UpdateDocumentInput,
};

/// Document operations exposed as MCP tools.
///
/// Implementations hold an immutable, already-resolved credential handle and
/// may be shared across tasks.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Backend name used in logs (e.g., "google").
    fn service_name(&self) -> &'static str;

    /// Create a document, optionally seeded with text.
    async fn create_document(&self, input: CreateDocumentInput) -> Result<CreatedDocument>;

    /// Fetch the full document structure.
    async fn get_document(&self, document_id: &str) -> Result<Document>;

    /// Insert text at the start of the body, optionally clearing it first.
    async fn update_document(
        &self,
        document_id: &str,
        input: UpdateDocumentInput,
    ) -> Result<Document>;

    /// List documents visible to the caller.
    async fn list_documents(&self, filter: ListFilter) -> Result<DocumentList>;

    /// Delete the underlying file.
    async fn delete_document(&self, document_id: &str) -> Result<DeleteResult>;

    /// Export the document in another format, base64-encoded.
    async fn export_document(
        &self,
        document_id: &str,
        input: ExportInput,
    ) -> Result<ExportedDocument>;

    /// Grant a user access to the document.
    async fn share_document(&self, document_id: &str, input: ShareInput) -> Result<ShareResult>;

    /// Search documents by name or full text.
    async fn search_documents(&self, filter: SearchFilter) -> Result<DocumentList>;

    /// Check connectivity with one cheap read. Never fails; the outcome is
    /// reported inside the status.
    async fn verify_connection(&self) -> ConnectionStatus;
}
