//! Google Docs provider implementation for gdocs-mcp.
//!
//! This crate talks to the Google Docs v1 API for document content and the
//! Drive v3 API for everything file-level (creation, listing, export,
//! permissions, deletion). Authentication is handled by [`Authenticator`],
//! which covers API keys, service accounts, and OAuth2 refresh tokens.

mod auth;
mod client;
mod types;

pub use auth::{Authenticator, RefreshTokenAuth, ServiceAccountAuth, GOOGLE_TOKEN_URI, SCOPES};
pub use client::GoogleDocsClient;
pub use types::*;

/// Default Google Docs API URL.
pub const DEFAULT_DOCS_URL: &str = "https://docs.googleapis.com/v1";

/// Default Google Drive API URL.
pub const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com/drive/v3";
