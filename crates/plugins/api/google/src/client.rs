//! Google Docs/Drive API client implementation.

use async_trait::async_trait;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use gdocs_core::{
    document_url, ConnectionDetails, ConnectionError, ConnectionStatus, CreateDocumentInput,
    CreatedDocument, DeleteResult, Document, DocumentList, DocumentService, DriveFile, Error,
    ExportInput, ExportedDocument, ListFilter, Permission, ResolvedConfig, Result, SearchFilter,
    ShareInput, ShareResult, UpdateDocumentInput, API_VERSION, DOCUMENT_MIME_TYPE,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::types::{
    BatchUpdateRequest, CreateFileRequest, CreatePermissionRequest, DocsRequest, DriveFileList,
};
use crate::{DEFAULT_DOCS_URL, DEFAULT_DRIVE_URL};

/// Fields requested from `files.list`.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, createdTime, modifiedTime, webViewLink)";

/// First writable index of a document body.
const BODY_START_INDEX: i64 = 1;

/// Google Docs API client.
pub struct GoogleDocsClient {
    docs_url: String,
    drive_url: String,
    project_id: String,
    auth: Authenticator,
    client: reqwest::Client,
}

impl GoogleDocsClient {
    /// Create a client from resolved configuration.
    pub fn new(config: &ResolvedConfig) -> Result<Self> {
        Self::with_base_urls(DEFAULT_DOCS_URL, DEFAULT_DRIVE_URL, config)
    }

    /// Create a client with custom API base URLs (for testing).
    pub fn with_base_urls(
        docs_url: impl Into<String>,
        drive_url: impl Into<String>,
        config: &ResolvedConfig,
    ) -> Result<Self> {
        let client = build_http_client()?;
        let auth = Authenticator::from_credentials(&config.credentials, client.clone())?;
        Ok(Self::from_parts(
            docs_url,
            drive_url,
            config.project_id.clone(),
            auth,
            client,
        ))
    }

    /// Assemble a client from an already-built authenticator.
    pub fn from_parts(
        docs_url: impl Into<String>,
        drive_url: impl Into<String>,
        project_id: impl Into<String>,
        auth: Authenticator,
        client: reqwest::Client,
    ) -> Self {
        let client = Self {
            docs_url: docs_url.into().trim_end_matches('/').to_string(),
            drive_url: drive_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            auth,
            client,
        };
        info!(
            project_id = %client.project_id,
            auth_type = %client.auth.auth_type(),
            "Google Docs client ready"
        );
        client
    }

    /// Project this client reports in connection checks.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Build an authorized request.
    async fn request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::RequestBuilder> {
        self.auth.authorize(self.client.request(method, url)).await
    }

    /// Make an authenticated GET request.
    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, url: &str, query: &Q) -> Result<T> {
        debug!(url = url, "Google GET request");

        let response = self
            .request(reqwest::Method::GET, url)
            .await?
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated GET request returning the raw body.
    async fn get_bytes<Q: Serialize + ?Sized>(&self, url: &str, query: &Q) -> Result<Vec<u8>> {
        debug!(url = url, "Google GET (bytes) request");

        let response = self
            .request(reqwest::Method::GET, url)
            .await?
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let response = self.check_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Make an authenticated POST request.
    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        debug!(url = url, "Google POST request");

        let response = self
            .request(reqwest::Method::POST, url)
            .await?
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated DELETE request.
    async fn delete(&self, url: &str) -> Result<()> {
        debug!(url = url, "Google DELETE request");

        let response = self
            .request(reqwest::Method::DELETE, url)
            .await?
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.check_status(response).await.map(|_| ())
    }

    /// Map non-success statuses to errors.
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Google API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        Ok(response)
    }

    /// Handle response and map errors.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}", self.docs_url, document_id)
    }

    fn file_url(&self, document_id: &str) -> String {
        format!("{}/files/{}", self.drive_url, document_id)
    }

    /// Apply edits to a document in one `batchUpdate` call.
    async fn batch_update(&self, document_id: &str, requests: Vec<DocsRequest>) -> Result<()> {
        let url = format!("{}:batchUpdate", self.document_url(document_id));
        let _: serde_json::Value = self.post(&url, &BatchUpdateRequest { requests }).await?;
        Ok(())
    }

    /// Run a Drive file listing restricted to Google Docs.
    async fn list_files(
        &self,
        query: String,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<DocumentList> {
        let url = format!("{}/files", self.drive_url);
        let mut params = vec![
            ("q", query),
            ("pageSize", page_size.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let list: DriveFileList = self.get(&url, &params).await?;
        Ok(DocumentList {
            documents: list.files,
            next_page_token: list.next_page_token,
        })
    }
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("gdocs-mcp")
        .build()
        .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))
}

// =============================================================================
// Query and edit planning
// =============================================================================

/// Escape a user string for a single-quoted Drive query literal.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn documents_query() -> String {
    format!("mimeType='{}'", DOCUMENT_MIME_TYPE)
}

fn search_query(text: &str) -> String {
    let escaped = escape_query_literal(text);
    format!(
        "{} and (name contains '{}' or fullText contains '{}')",
        documents_query(),
        escaped,
        escaped
    )
}

/// Plan the edits for an update.
///
/// `current` is the document as it is now, given only when the body should be
/// replaced. The body always ends with a trailing newline the API refuses to
/// delete, so the range stops one short of the last block's end. A body with
/// only its sentinel block has nothing to clear.
fn plan_update(current: Option<&Document>, content: &str) -> Vec<DocsRequest> {
    let mut requests = Vec::new();

    if let Some(document) = current {
        let blocks = document.content_blocks();
        if blocks.len() > 1 {
            if let Some(last) = blocks.last() {
                let end_index = last.end_index - 1;
                if end_index > BODY_START_INDEX {
                    requests.push(DocsRequest::delete_range(BODY_START_INDEX, end_index));
                }
            }
        }
    }

    if !content.is_empty() {
        requests.push(DocsRequest::insert_text(BODY_START_INDEX, content));
    }

    requests
}

#[async_trait]
impl DocumentService for GoogleDocsClient {
    fn service_name(&self) -> &'static str {
        "google"
    }

    async fn create_document(&self, input: CreateDocumentInput) -> Result<CreatedDocument> {
        let url = format!("{}/files", self.drive_url);
        let file: DriveFile = self
            .post(
                &url,
                &CreateFileRequest {
                    name: input.title.clone(),
                    mime_type: DOCUMENT_MIME_TYPE.to_string(),
                },
            )
            .await?;

        info!(document_id = %file.id, "Created document");

        if let Some(content) = input.content.as_deref().filter(|c| !c.is_empty()) {
            self.batch_update(&file.id, plan_update(None, content))
                .await?;
        }

        let document = self.get_document(&file.id).await?;
        let title = if file.name.is_empty() {
            input.title
        } else {
            file.name
        };

        Ok(CreatedDocument {
            url: document_url(&file.id),
            document_id: file.id,
            title,
            document,
        })
    }

    async fn get_document(&self, document_id: &str) -> Result<Document> {
        self.get(&self.document_url(document_id), &[] as &[(&str, &str)])
            .await
    }

    async fn update_document(
        &self,
        document_id: &str,
        input: UpdateDocumentInput,
    ) -> Result<Document> {
        let current = if input.replace_all {
            Some(self.get_document(document_id).await?)
        } else {
            None
        };

        let requests = plan_update(current.as_ref(), &input.content);
        debug!(
            document_id = document_id,
            requests = requests.len(),
            "Applying document update"
        );
        if !requests.is_empty() {
            self.batch_update(document_id, requests).await?;
        }

        self.get_document(document_id).await
    }

    async fn list_documents(&self, filter: ListFilter) -> Result<DocumentList> {
        self.list_files(
            documents_query(),
            filter.page_size(),
            filter.page_token.as_deref(),
        )
        .await
    }

    async fn delete_document(&self, document_id: &str) -> Result<DeleteResult> {
        self.delete(&self.file_url(document_id)).await?;
        info!(document_id = document_id, "Deleted document");
        Ok(DeleteResult::deleted(document_id))
    }

    async fn export_document(
        &self,
        document_id: &str,
        input: ExportInput,
    ) -> Result<ExportedDocument> {
        let mime_type = input.mime_type();
        let url = format!("{}/export", self.file_url(document_id));
        let bytes = self.get_bytes(&url, &[("mimeType", mime_type)]).await?;

        Ok(ExportedDocument {
            document_id: document_id.to_string(),
            mime_type: mime_type.to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }

    async fn share_document(&self, document_id: &str, input: ShareInput) -> Result<ShareResult> {
        let url = format!("{}/permissions", self.file_url(document_id));
        let permission: Permission = self
            .post(
                &url,
                &CreatePermissionRequest {
                    permission_type: "user".to_string(),
                    role: input.role().to_string(),
                    email_address: input.email_address.clone(),
                },
            )
            .await?;

        info!(document_id = document_id, role = %permission.role, "Shared document");

        Ok(ShareResult {
            success: true,
            document_id: document_id.to_string(),
            permission,
        })
    }

    async fn search_documents(&self, filter: SearchFilter) -> Result<DocumentList> {
        self.list_files(
            search_query(&filter.query),
            filter.page_size(),
            filter.page_token.as_deref(),
        )
        .await
    }

    async fn verify_connection(&self) -> ConnectionStatus {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let filter = ListFilter {
            page_size: Some(1),
            page_token: None,
        };

        match self.list_documents(filter).await {
            Ok(list) => {
                info!(project_id = %self.project_id, "Google Docs connection verified");
                ConnectionStatus {
                    connected: true,
                    project_id: self.project_id.clone(),
                    timestamp,
                    details: Some(ConnectionDetails {
                        auth_type: self.auth.auth_type(),
                        api_version: API_VERSION.to_string(),
                        document_count: list.documents.len(),
                    }),
                    error: None,
                }
            }
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, "Google Docs connection check failed");
                ConnectionStatus {
                    connected: false,
                    project_id: self.project_id.clone(),
                    timestamp,
                    details: None,
                    error: Some(ConnectionError {
                        message: e.message(),
                        code: e.status_code().map(|c| c.to_string()),
                        details: e.details(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdocs_core::StructuralElement;

    fn document_with_blocks(end_indexes: &[i64]) -> Document {
        let content = end_indexes
            .iter()
            .map(|&end_index| StructuralElement {
                start_index: None,
                end_index,
                extra: Default::default(),
            })
            .collect();
        Document {
            document_id: "doc1".to_string(),
            title: "Doc".to_string(),
            body: Some(gdocs_core::Body {
                content,
                extra: Default::default(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_update_append() {
        let requests = plan_update(None, "Hello");
        assert_eq!(requests, vec![DocsRequest::insert_text(1, "Hello")]);
    }

    #[test]
    fn test_plan_update_replace_single_block_skips_delete() {
        let doc = document_with_blocks(&[1]);
        let requests = plan_update(Some(&doc), "Hello");
        assert_eq!(requests, vec![DocsRequest::insert_text(1, "Hello")]);
    }

    #[test]
    fn test_plan_update_replace_deletes_then_inserts() {
        let doc = document_with_blocks(&[1, 20, 42]);
        let requests = plan_update(Some(&doc), "Hello");
        assert_eq!(
            requests,
            vec![
                DocsRequest::delete_range(1, 41),
                DocsRequest::insert_text(1, "Hello"),
            ]
        );
    }

    #[test]
    fn test_plan_update_replace_empty_paragraph_skips_empty_range() {
        // Fresh document: section break + one empty paragraph ending at 2.
        let doc = document_with_blocks(&[1, 2]);
        let requests = plan_update(Some(&doc), "Hello");
        assert_eq!(requests, vec![DocsRequest::insert_text(1, "Hello")]);
    }

    #[test]
    fn test_plan_update_empty_content_only_clears() {
        let doc = document_with_blocks(&[1, 10]);
        assert_eq!(
            plan_update(Some(&doc), ""),
            vec![DocsRequest::delete_range(1, 9)]
        );
        assert!(plan_update(None, "").is_empty());
    }

    #[test]
    fn test_search_query_escapes_quotes() {
        assert_eq!(
            search_query("O'Brien \\ notes"),
            "mimeType='application/vnd.google-apps.document' and \
             (name contains 'O\\'Brien \\\\ notes' or fullText contains 'O\\'Brien \\\\ notes')"
        );
    }

    #[test]
    fn test_documents_query() {
        assert_eq!(
            documents_query(),
            "mimeType='application/vnd.google-apps.document'"
        );
    }

    // =========================================================================
    // Integration tests with httpmock
    // =========================================================================

    mod integration {
        use super::*;
        use crate::auth::RefreshTokenAuth;
        use gdocs_core::{AuthType, Credentials};
        use httpmock::prelude::*;

        const API_KEY: &str = "AIzaSyTestKey";

        fn create_test_client(server: &MockServer) -> GoogleDocsClient {
            let config = ResolvedConfig {
                project_id: "test-project".to_string(),
                credentials: Credentials::ApiKey(API_KEY.to_string()),
            };
            GoogleDocsClient::with_base_urls(server.url("/docs/v1"), server.url("/drive/v3"), &config)
                .unwrap()
        }

        fn sample_document_json(id: &str, end_indexes: &[i64]) -> serde_json::Value {
            let content: Vec<serde_json::Value> = end_indexes
                .iter()
                .map(|end| serde_json::json!({"endIndex": end, "paragraph": {"elements": []}}))
                .collect();
            serde_json::json!({
                "documentId": id,
                "title": "Meeting Notes",
                "revisionId": "rev-1",
                "body": {"content": content},
                "documentStyle": {"marginTop": {"magnitude": 72, "unit": "PT"}}
            })
        }

        fn sample_files_json() -> serde_json::Value {
            serde_json::json!({
                "nextPageToken": "page-2",
                "files": [
                    {
                        "id": "doc1",
                        "name": "Meeting Notes",
                        "createdTime": "2024-01-01T00:00:00.000Z",
                        "modifiedTime": "2024-01-02T00:00:00.000Z",
                        "webViewLink": "https://docs.google.com/document/d/doc1/edit"
                    },
                    {"id": "doc2", "name": "Roadmap"}
                ]
            })
        }

        #[tokio::test]
        async fn test_create_document_with_content() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(POST)
                    .path("/drive/v3/files")
                    .query_param("key", API_KEY)
                    .body_includes("\"name\":\"Meeting Notes\"")
                    .body_includes("\"mimeType\":\"application/vnd.google-apps.document\"");
                then.status(200)
                    .json_body(serde_json::json!({"id": "doc1", "name": "Meeting Notes"}));
            });
            server.mock(|when, then| {
                when.method(POST)
                    .path("/docs/v1/documents/doc1:batchUpdate")
                    .body_includes("\"insertText\"")
                    .body_includes("\"index\":1")
                    .body_includes("\"text\":\"Agenda\"");
                then.status(200)
                    .json_body(serde_json::json!({"documentId": "doc1", "replies": [{}]}));
            });
            server.mock(|when, then| {
                when.method(GET).path("/docs/v1/documents/doc1");
                then.status(200)
                    .json_body(sample_document_json("doc1", &[1, 8]));
            });

            let client = create_test_client(&server);
            let created = client
                .create_document(CreateDocumentInput {
                    title: "Meeting Notes".to_string(),
                    content: Some("Agenda".to_string()),
                })
                .await
                .unwrap();

            assert_eq!(created.document_id, "doc1");
            assert_eq!(created.title, "Meeting Notes");
            assert_eq!(created.url, "https://docs.google.com/document/d/doc1/edit");
            assert_eq!(created.document.content_blocks().len(), 2);
        }

        #[tokio::test]
        async fn test_create_document_without_content_skips_batch_update() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(POST).path("/drive/v3/files");
                then.status(200)
                    .json_body(serde_json::json!({"id": "doc9", "name": "Blank"}));
            });
            server.mock(|when, then| {
                when.method(GET).path("/docs/v1/documents/doc9");
                then.status(200).json_body(sample_document_json("doc9", &[1]));
            });

            let client = create_test_client(&server);
            let created = client
                .create_document(CreateDocumentInput {
                    title: "Blank".to_string(),
                    content: None,
                })
                .await
                .unwrap();

            // No batchUpdate mock exists; reaching here means none was sent.
            assert_eq!(created.document_id, "doc9");
        }

        #[tokio::test]
        async fn test_get_document_preserves_structure() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/docs/v1/documents/doc1")
                    .query_param("key", API_KEY);
                then.status(200)
                    .json_body(sample_document_json("doc1", &[1, 12]));
            });

            let client = create_test_client(&server);
            let doc = client.get_document("doc1").await.unwrap();

            assert_eq!(doc.title, "Meeting Notes");
            assert_eq!(doc.revision_id.as_deref(), Some("rev-1"));
            assert!(doc.extra.contains_key("documentStyle"));
        }

        #[tokio::test]
        async fn test_get_document_not_found() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/docs/v1/documents/missing");
                then.status(404).json_body(serde_json::json!({
                    "error": {
                        "code": 404,
                        "message": "Requested entity was not found.",
                        "status": "NOT_FOUND"
                    }
                }));
            });

            let client = create_test_client(&server);
            let err = client.get_document("missing").await.unwrap_err();

            assert_eq!(err.status_code(), Some(404));
            assert_eq!(err.message(), "Requested entity was not found.");
        }

        #[tokio::test]
        async fn test_update_replace_all_on_empty_document_only_inserts() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/docs/v1/documents/doc1");
                then.status(200).json_body(sample_document_json("doc1", &[1]));
            });
            let batch = server.mock(|when, then| {
                when.method(POST)
                    .path("/docs/v1/documents/doc1:batchUpdate")
                    .body_includes("\"insertText\"")
                    .body_excludes("deleteContentRange");
                then.status(200).json_body(serde_json::json!({"documentId": "doc1"}));
            });

            let client = create_test_client(&server);
            let doc = client
                .update_document(
                    "doc1",
                    UpdateDocumentInput {
                        content: "Fresh text".to_string(),
                        replace_all: true,
                    },
                )
                .await
                .unwrap();

            batch.assert();
            assert_eq!(doc.document_id, "doc1");
        }

        #[tokio::test]
        async fn test_update_replace_all_deletes_existing_body() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/docs/v1/documents/doc1");
                then.status(200)
                    .json_body(sample_document_json("doc1", &[1, 15, 30]));
            });
            let batch = server.mock(|when, then| {
                when.method(POST)
                    .path("/docs/v1/documents/doc1:batchUpdate")
                    .json_body(serde_json::json!({
                        "requests": [
                            {"deleteContentRange": {"range": {"startIndex": 1, "endIndex": 29}}},
                            {"insertText": {"location": {"index": 1}, "text": "Fresh text"}}
                        ]
                    }));
                then.status(200).json_body(serde_json::json!({"documentId": "doc1"}));
            });

            let client = create_test_client(&server);
            client
                .update_document(
                    "doc1",
                    UpdateDocumentInput {
                        content: "Fresh text".to_string(),
                        replace_all: true,
                    },
                )
                .await
                .unwrap();

            batch.assert();
        }

        #[tokio::test]
        async fn test_update_append_does_not_clear() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/docs/v1/documents/doc1");
                then.status(200)
                    .json_body(sample_document_json("doc1", &[1, 15, 30]));
            });
            let batch = server.mock(|when, then| {
                when.method(POST)
                    .path("/docs/v1/documents/doc1:batchUpdate")
                    .body_excludes("deleteContentRange");
                then.status(200).json_body(serde_json::json!({"documentId": "doc1"}));
            });

            let client = create_test_client(&server);
            client
                .update_document(
                    "doc1",
                    UpdateDocumentInput {
                        content: "More".to_string(),
                        replace_all: false,
                    },
                )
                .await
                .unwrap();

            batch.assert();
        }

        #[tokio::test]
        async fn test_list_documents() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files")
                    .query_param("q", "mimeType='application/vnd.google-apps.document'")
                    .query_param("pageSize", "10")
                    .query_param("fields", LIST_FIELDS)
                    .query_param("key", API_KEY);
                then.status(200).json_body(sample_files_json());
            });

            let client = create_test_client(&server);
            let list = client.list_documents(ListFilter::default()).await.unwrap();

            assert_eq!(list.documents.len(), 2);
            assert_eq!(list.documents[0].id, "doc1");
            assert_eq!(
                list.documents[0].web_view_link.as_deref(),
                Some("https://docs.google.com/document/d/doc1/edit")
            );
            assert_eq!(list.next_page_token.as_deref(), Some("page-2"));
        }

        #[tokio::test]
        async fn test_list_documents_passes_page_token() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files")
                    .query_param("pageSize", "5")
                    .query_param("pageToken", "page-2");
                then.status(200).json_body(serde_json::json!({"files": []}));
            });

            let client = create_test_client(&server);
            let list = client
                .list_documents(ListFilter {
                    page_size: Some(5),
                    page_token: Some("page-2".to_string()),
                })
                .await
                .unwrap();

            assert!(list.documents.is_empty());
            assert!(list.next_page_token.is_none());
        }

        #[tokio::test]
        async fn test_search_documents() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/drive/v3/files").query_param(
                    "q",
                    "mimeType='application/vnd.google-apps.document' and \
                     (name contains 'roadmap' or fullText contains 'roadmap')",
                );
                then.status(200).json_body(sample_files_json());
            });

            let client = create_test_client(&server);
            let list = client
                .search_documents(SearchFilter {
                    query: "roadmap".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();

            assert_eq!(list.documents.len(), 2);
        }

        #[tokio::test]
        async fn test_delete_document() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(DELETE).path("/drive/v3/files/doc1");
                then.status(204);
            });

            let client = create_test_client(&server);
            let result = client.delete_document("doc1").await.unwrap();

            assert!(result.success);
            assert_eq!(result.document_id, "doc1");
            assert!(result.message.is_some());
        }

        #[tokio::test]
        async fn test_delete_document_forbidden() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(DELETE).path("/drive/v3/files/doc1");
                then.status(403).json_body(serde_json::json!({
                    "error": {"code": 403, "message": "Insufficient permissions", "status": "PERMISSION_DENIED"}
                }));
            });

            let client = create_test_client(&server);
            let err = client.delete_document("doc1").await.unwrap_err();
            assert_eq!(err.status_code(), Some(403));
        }

        #[tokio::test]
        async fn test_export_document_base64() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files/doc1/export")
                    .query_param("mimeType", "text/plain");
                then.status(200).body("Hello, Docs!");
            });

            let client = create_test_client(&server);
            let exported = client
                .export_document(
                    "doc1",
                    ExportInput {
                        mime_type: Some("text/plain".to_string()),
                    },
                )
                .await
                .unwrap();

            assert_eq!(exported.document_id, "doc1");
            assert_eq!(exported.mime_type, "text/plain");
            assert_eq!(exported.content, "SGVsbG8sIERvY3Mh");
        }

        #[tokio::test]
        async fn test_share_document() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(POST)
                    .path("/drive/v3/files/doc1/permissions")
                    .body_includes("\"type\":\"user\"")
                    .body_includes("\"role\":\"reader\"")
                    .body_includes("\"emailAddress\":\"alice@example.com\"");
                then.status(200).json_body(serde_json::json!({
                    "id": "perm-1",
                    "type": "user",
                    "role": "reader",
                    "emailAddress": "alice@example.com"
                }));
            });

            let client = create_test_client(&server);
            let shared = client
                .share_document(
                    "doc1",
                    ShareInput {
                        email_address: "alice@example.com".to_string(),
                        role: None,
                    },
                )
                .await
                .unwrap();

            assert!(shared.success);
            assert_eq!(shared.permission.id.as_deref(), Some("perm-1"));
            assert_eq!(shared.permission.role, "reader");
        }

        #[tokio::test]
        async fn test_verify_connection_success() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files")
                    .query_param("pageSize", "1");
                then.status(200).json_body(serde_json::json!({
                    "files": [{"id": "doc1", "name": "Meeting Notes"}]
                }));
            });

            let client = create_test_client(&server);
            let status = client.verify_connection().await;

            assert!(status.connected);
            assert_eq!(status.project_id, "test-project");
            assert!(status.error.is_none());
            let details = status.details.unwrap();
            assert_eq!(details.auth_type, AuthType::ApiKey);
            assert_eq!(details.api_version, "v1");
            assert_eq!(details.document_count, 1);
            assert!(chrono::DateTime::parse_from_rfc3339(&status.timestamp).is_ok());
        }

        #[tokio::test]
        async fn test_verify_connection_empty_drive() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/drive/v3/files");
                then.status(200).json_body(serde_json::json!({"files": []}));
            });

            let client = create_test_client(&server);
            let status = client.verify_connection().await;

            assert!(status.connected);
            assert_eq!(status.details.unwrap().document_count, 0);
        }

        #[tokio::test]
        async fn test_verify_connection_permission_denied() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/drive/v3/files");
                then.status(403).json_body(serde_json::json!({
                    "error": {
                        "code": 403,
                        "message": "Request had insufficient authentication scopes.",
                        "status": "PERMISSION_DENIED"
                    }
                }));
            });

            let client = create_test_client(&server);
            let status = client.verify_connection().await;

            assert!(!status.connected);
            assert!(status.details.is_none());
            assert!(status.is_permission_denied());
            let error = status.error.unwrap();
            assert_eq!(error.code.as_deref(), Some("403"));
            assert_eq!(error.details.as_deref(), Some("PERMISSION_DENIED"));
            assert!(error.message.contains("insufficient authentication scopes"));
        }

        #[tokio::test]
        async fn test_oauth_bearer_token_is_sent() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(serde_json::json!({
                    "access_token": "ya29.oauth",
                    "expires_in": 3599
                }));
            });
            server.mock(|when, then| {
                when.method(GET)
                    .path("/docs/v1/documents/doc1")
                    .header("authorization", "Bearer ya29.oauth");
                then.status(200).json_body(sample_document_json("doc1", &[1]));
            });

            let http = reqwest::Client::new();
            let auth = Authenticator::OAuth2(
                RefreshTokenAuth::new("client", "secret", "refresh", http.clone())
                    .with_token_uri(server.url("/token")),
            );
            let client = GoogleDocsClient::from_parts(
                server.url("/docs/v1"),
                server.url("/drive/v3"),
                "test-project",
                auth,
                http,
            );

            let doc = client.get_document("doc1").await.unwrap();
            assert_eq!(doc.document_id, "doc1");
        }

        #[tokio::test]
        async fn test_token_failure_surfaces_as_auth_error() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(POST).path("/token");
                then.status(401)
                    .json_body(serde_json::json!({"error": "invalid_client"}));
            });

            let http = reqwest::Client::new();
            let auth = Authenticator::OAuth2(
                RefreshTokenAuth::new("client", "secret", "refresh", http.clone())
                    .with_token_uri(server.url("/token")),
            );
            let client = GoogleDocsClient::from_parts(
                server.url("/docs/v1"),
                server.url("/drive/v3"),
                "test-project",
                auth,
                http,
            );

            let status = client.verify_connection().await;
            assert!(!status.connected);
            assert!(status.error.unwrap().message.contains("invalid_client"));
        }
    }
}
