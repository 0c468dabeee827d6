//! Core traits, types, and error handling for gdocs-mcp.
//!
//! This crate provides the foundational abstractions used across all gdocs components.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{mask_secret, Config, Credentials, GoogleSettings, ResolvedConfig};
pub use error::{Error, Result};
pub use provider::DocumentService;
pub use types::*;
