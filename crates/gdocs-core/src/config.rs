//! Configuration management for gdocs-mcp.
//!
//! Google settings come from three layers, highest precedence first:
//!
//! 1. explicit values (command-line flags)
//! 2. environment variables (`GOOGLE_CLOUD_PROJECT_ID`, `GOOGLE_API_KEY`, ...)
//! 3. the TOML config file
//!
//! The config file lives in a platform-specific location:
//!
//! - **macOS/Linux**: `~/.config/gdocs-mcp/config.toml`
//! - **Windows**: `%APPDATA%\gdocs-mcp\config.toml`
//!
//! Layers are merged into [`GoogleSettings`], which [`GoogleSettings::resolve`]
//! turns into exactly one credential strategy.
//!
//! # Example
//!
//! ```ignore
//! use gdocs_core::config::{Config, GoogleSettings};
//!
//! let file = Config::load()?.google.unwrap_or_default();
//! let settings = GoogleSettings::from_env().overlay(file);
//! let resolved = settings.resolve()?;
//! ```

use crate::types::AuthType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "gdocs-mcp";

/// Environment variable names.
pub const ENV_PROJECT_ID: &str = "GOOGLE_CLOUD_PROJECT_ID";
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_SERVICE_ACCOUNT_KEY: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "GOOGLE_REFRESH_TOKEN";

// =============================================================================
// Configuration structures
// =============================================================================

/// Contents of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Google settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleSettings>,
}

/// Unresolved Google settings. Every field is optional at this stage.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// The single credential strategy selected at startup.
#[derive(Clone, PartialEq)]
pub enum Credentials {
    /// Static API key sent with every request.
    ApiKey(String),
    /// Service-account JSON key file.
    ServiceAccount { key_file: PathBuf },
    /// OAuth2 installed-app credentials with a long-lived refresh token.
    OAuth2 {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

/// Fully resolved configuration: a project plus one credential strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub project_id: String,
    pub credentials: Credentials,
}

// =============================================================================
// Secret masking
// =============================================================================

/// Truncate a secret to a short prefix for logs.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}...", prefix)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// GoogleSettings
// =============================================================================

impl GoogleSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            project_id: lookup(ENV_PROJECT_ID),
            api_key: lookup(ENV_API_KEY),
            service_account_key_file: lookup(ENV_SERVICE_ACCOUNT_KEY),
            client_id: lookup(ENV_CLIENT_ID),
            client_secret: lookup(ENV_CLIENT_SECRET),
            refresh_token: lookup(ENV_REFRESH_TOKEN),
        }
    }

    /// Fill every unset (or blank) field of `self` from `fallback`.
    pub fn overlay(self, fallback: GoogleSettings) -> Self {
        fn pick(primary: Option<String>, fallback: Option<String>) -> Option<String> {
            non_empty(&primary).or_else(|| non_empty(&fallback))
        }

        Self {
            project_id: pick(self.project_id, fallback.project_id),
            api_key: pick(self.api_key, fallback.api_key),
            service_account_key_file: pick(
                self.service_account_key_file,
                fallback.service_account_key_file,
            ),
            client_id: pick(self.client_id, fallback.client_id),
            client_secret: pick(self.client_secret, fallback.client_secret),
            refresh_token: pick(self.refresh_token, fallback.refresh_token),
        }
    }

    /// Select exactly one credential strategy.
    ///
    /// Order: API key, then service-account key file, then the OAuth2 triple.
    /// The project ID is required regardless of strategy. No network access
    /// happens here.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let project_id = non_empty(&self.project_id).ok_or_else(|| {
            Error::Config(format!(
                "Google Cloud project ID is required (use --project-id or {})",
                ENV_PROJECT_ID
            ))
        })?;

        let credentials = if let Some(api_key) = non_empty(&self.api_key) {
            Credentials::ApiKey(api_key)
        } else if let Some(path) = non_empty(&self.service_account_key_file) {
            let key_file = PathBuf::from(path);
            if !key_file.is_file() {
                return Err(Error::Config(format!(
                    "Service account key file not found: {}",
                    key_file.display()
                )));
            }
            Credentials::ServiceAccount { key_file }
        } else if let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            non_empty(&self.client_id),
            non_empty(&self.client_secret),
            non_empty(&self.refresh_token),
        ) {
            Credentials::OAuth2 {
                client_id,
                client_secret,
                refresh_token,
            }
        } else {
            return Err(Error::Config(format!(
                "No usable credential set: provide {}, {}, or {} + {} + {}",
                ENV_API_KEY,
                ENV_SERVICE_ACCOUNT_KEY,
                ENV_CLIENT_ID,
                ENV_CLIENT_SECRET,
                ENV_REFRESH_TOKEN
            )));
        };

        info!(
            project_id = %project_id,
            auth_type = %credentials.auth_type(),
            credential = %credentials.redacted(),
            "Resolved Google credentials"
        );

        Ok(ResolvedConfig {
            project_id,
            credentials,
        })
    }
}

impl fmt::Debug for GoogleSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |v: &Option<String>| v.as_deref().map(mask_secret);
        f.debug_struct("GoogleSettings")
            .field("project_id", &self.project_id)
            .field("api_key", &masked(&self.api_key))
            .field("service_account_key_file", &self.service_account_key_file)
            .field("client_id", &self.client_id)
            .field("client_secret", &masked(&self.client_secret))
            .field("refresh_token", &masked(&self.refresh_token))
            .finish()
    }
}

// =============================================================================
// Credentials
// =============================================================================

impl Credentials {
    pub fn auth_type(&self) -> AuthType {
        match self {
            Credentials::ApiKey(_) => AuthType::ApiKey,
            Credentials::ServiceAccount { .. } => AuthType::ServiceAccount,
            Credentials::OAuth2 { .. } => AuthType::OAuth2,
        }
    }

    /// Short human-readable description with secrets truncated.
    pub fn redacted(&self) -> String {
        match self {
            Credentials::ApiKey(key) => format!("api key {}", mask_secret(key)),
            Credentials::ServiceAccount { key_file } => {
                format!("service account key {}", key_file.display())
            }
            Credentials::OAuth2 { client_id, .. } => {
                format!("oauth2 client {}", mask_secret(client_id))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials({})", self.redacted())
    }
}

// =============================================================================
// Config file
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Google settings from the file, empty when the section is missing.
    pub fn google_settings(&self) -> GoogleSettings {
        self.google.clone().unwrap_or_default()
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `google.field` (e.g., `google.project_id`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let field = Self::google_field(key)?;
        let google = self.google.get_or_insert_with(GoogleSettings::default);
        *Self::field_mut(google, field)? = Some(value.to_string());
        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `google.field` (e.g., `google.project_id`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let field = Self::google_field(key)?;
        let Some(google) = &self.google else {
            return Ok(None);
        };
        let value = match field {
            "project_id" | "project" => &google.project_id,
            "api_key" => &google.api_key,
            "service_account_key_file" | "service_account_key" => {
                &google.service_account_key_file
            }
            "client_id" => &google.client_id,
            "client_secret" => &google.client_secret,
            "refresh_token" => &google.refresh_token,
            _ => {
                return Err(Error::Config(format!(
                    "Unknown Google config field: {}",
                    field
                )))
            }
        };
        Ok(value.clone())
    }

    fn google_field(key: &str) -> Result<&str> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() != 2 {
            return Err(Error::Config(format!(
                "Invalid config key '{}'. Expected format: google.field",
                key
            )));
        }
        if parts[0] != "google" {
            return Err(Error::Config(format!("Unknown section: {}", parts[0])));
        }
        Ok(parts[1])
    }

    fn field_mut<'a>(google: &'a mut GoogleSettings, field: &str) -> Result<&'a mut Option<String>> {
        match field {
            "project_id" | "project" => Ok(&mut google.project_id),
            "api_key" => Ok(&mut google.api_key),
            "service_account_key_file" | "service_account_key" => {
                Ok(&mut google.service_account_key_file)
            }
            "client_id" => Ok(&mut google.client_id),
            "client_secret" => Ok(&mut google.client_secret),
            "refresh_token" => Ok(&mut google.refresh_token),
            _ => Err(Error::Config(format!(
                "Unknown Google config field: {}",
                field
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
