//! gdocs CLI - Google Docs tools over the Model Context Protocol.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gdocs_core::{mask_secret, Config, ConnectionStatus, DocumentService, GoogleSettings};
use gdocs_google::GoogleDocsClient;
use gdocs_mcp::McpServer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gdocs")]
#[command(author, version, about = "Google Docs MCP server", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout
    Serve(CredentialArgs),

    /// Check connectivity and credentials
    Verify(CredentialArgs),

    /// Inspect or edit the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Overrides for the environment and the config file.
#[derive(Args, Default)]
struct CredentialArgs {
    /// Google Cloud project ID
    #[arg(long)]
    project_id: Option<String>,

    /// API key
    #[arg(long)]
    api_key: Option<String>,

    /// Path to a service-account JSON key file
    #[arg(long)]
    service_account_key: Option<String>,

    /// OAuth2 client ID
    #[arg(long)]
    client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long)]
    client_secret: Option<String>,

    /// OAuth2 refresh token
    #[arg(long)]
    refresh_token: Option<String>,
}

impl CredentialArgs {
    /// Flags first, then environment, then the config file.
    fn settings(self, env: GoogleSettings, file: GoogleSettings) -> GoogleSettings {
        GoogleSettings {
            project_id: self.project_id,
            api_key: self.api_key,
            service_account_key_file: self.service_account_key,
            client_id: self.client_id,
            client_secret: self.client_secret,
            refresh_token: self.refresh_token,
        }
        .overlay(env)
        .overlay(file)
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (secrets masked)
    Show,

    /// Set a value, e.g. `gdocs config set google.project_id my-project`
    Set { key: String, value: String },

    /// Print a single value
    Get { key: String },

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON-RPC stream.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Serve(args)) => {
            let client = build_client(args)?;
            let mut server = McpServer::new(Arc::new(client));
            server.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Verify(args)) => {
            let client = match build_client(args) {
                Ok(client) => client,
                Err(e) => {
                    eprintln!("Configuration error: {:#}", e);
                    return Ok(ExitCode::FAILURE);
                }
            };
            let status = client.verify_connection().await;
            let (report, connected) = verify_report(&status);
            println!("{}", report);
            Ok(if connected {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(Commands::Config { command }) => {
            run_config(command)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("gdocs - Google Docs tools for MCP clients");
            println!("Run with --help for usage information");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_client(args: CredentialArgs) -> anyhow::Result<GoogleDocsClient> {
    let file = Config::load().context("failed to load config file")?;
    let resolved = args
        .settings(GoogleSettings::from_env(), file.google_settings())
        .resolve()?;
    Ok(GoogleDocsClient::new(&resolved)?)
}

/// Human-readable verification outcome and whether it succeeded.
fn verify_report(status: &ConnectionStatus) -> (String, bool) {
    if status.connected {
        let details = status
            .details
            .as_ref()
            .map(|d| {
                format!(
                    " (auth: {}, API {}, documents visible: {})",
                    d.auth_type, d.api_version, d.document_count
                )
            })
            .unwrap_or_default();
        return (
            format!(
                "Connected to Google Docs for project {}{}",
                status.project_id, details
            ),
            true,
        );
    }

    let message = status
        .error
        .as_ref()
        .map(|e| e.message.as_str())
        .unwrap_or("unknown error");

    let report = if status.is_permission_denied() {
        format!(
            "Permission denied: {}\n\
             Enable the Google Docs and Drive APIs for project {} and grant the \
             credentials the documents and drive scopes.",
            message, status.project_id
        )
    } else {
        format!("Connection failed: {}", message)
    };
    (report, false)
}

fn run_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load()?;
            println!("# {}", Config::config_path()?.display());
            for (key, value) in describe_settings(&config.google_settings()) {
                println!("{} = {}", key, value);
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            let shown = if is_secret_key(&key) {
                mask_secret(&value)
            } else {
                value
            };
            println!("Set {} = {}", key, shown);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load()?;
            match config.get(&key)? {
                Some(value) if is_secret_key(&key) => println!("{}", mask_secret(&value)),
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            }
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

fn is_secret_key(key: &str) -> bool {
    matches!(
        key.rsplit('.').next(),
        Some("api_key" | "client_secret" | "refresh_token")
    )
}

/// Config file entries with secrets masked.
fn describe_settings(settings: &GoogleSettings) -> Vec<(&'static str, String)> {
    let plain = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
    let secret = |v: &Option<String>| {
        v.as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "(not set)".to_string())
    };

    vec![
        ("google.project_id", plain(&settings.project_id)),
        ("google.api_key", secret(&settings.api_key)),
        (
            "google.service_account_key_file",
            plain(&settings.service_account_key_file),
        ),
        ("google.client_id", plain(&settings.client_id)),
        ("google.client_secret", secret(&settings.client_secret)),
        ("google.refresh_token", secret(&settings.refresh_token)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdocs_core::{AuthType, ConnectionDetails, ConnectionError};

    fn status(connected: bool, code: Option<&str>) -> ConnectionStatus {
        ConnectionStatus {
            connected,
            project_id: "my-project".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            details: connected.then(|| ConnectionDetails {
                auth_type: AuthType::ServiceAccount,
                api_version: "v1".to_string(),
                document_count: 1,
            }),
            error: (!connected).then(|| ConnectionError {
                message: "The caller does not have permission".to_string(),
                code: code.map(str::to_string),
                details: None,
            }),
        }
    }

    #[test]
    fn test_verify_report_connected() {
        let (report, ok) = verify_report(&status(true, None));
        assert!(ok);
        assert!(report.contains("my-project"));
        assert!(report.contains("service_account"));
    }

    #[test]
    fn test_verify_report_permission_hint() {
        let (report, ok) = verify_report(&status(false, Some("403")));
        assert!(!ok);
        assert!(report.starts_with("Permission denied"));
        assert!(report.contains("Enable the Google Docs and Drive APIs"));
    }

    #[test]
    fn test_verify_report_generic_failure() {
        let (report, ok) = verify_report(&status(false, Some("500")));
        assert!(!ok);
        assert_eq!(
            report,
            "Connection failed: The caller does not have permission"
        );

        let (report, ok) = verify_report(&status(false, None));
        assert!(!ok);
        assert!(report.starts_with("Connection failed"));
    }

    #[test]
    fn test_flags_then_env_then_file() {
        let args = CredentialArgs {
            project_id: Some("from-flag".to_string()),
            ..Default::default()
        };
        let env = GoogleSettings::from_lookup(|name| match name {
            "GOOGLE_CLOUD_PROJECT_ID" => Some("from-env".to_string()),
            "GOOGLE_CLIENT_ID" => Some("env-client".to_string()),
            _ => None,
        });
        let file = GoogleSettings {
            project_id: Some("from-file".to_string()),
            client_id: Some("file-client".to_string()),
            refresh_token: Some("file-token".to_string()),
            ..Default::default()
        };

        let settings = args.settings(env, file);
        assert_eq!(settings.project_id.as_deref(), Some("from-flag"));
        assert_eq!(settings.client_id.as_deref(), Some("env-client"));
        assert_eq!(settings.refresh_token.as_deref(), Some("file-token"));
        assert_eq!(settings.api_key, None);
    }

    #[test]
    fn test_describe_settings_masks_secrets() {
        let settings = GoogleSettings {
            project_id: Some("my-project".to_string()),
            api_key: Some("AIzaSyExample".to_string()),
            ..Default::default()
        };

        let entries = describe_settings(&settings);
        assert!(entries.contains(&("google.project_id", "my-project".to_string())));
        assert!(entries.contains(&("google.api_key", "AIza...".to_string())));
        assert!(entries.contains(&("google.refresh_token", "(not set)".to_string())));
    }

    #[test]
    fn test_is_secret_key() {
        assert!(is_secret_key("google.api_key"));
        assert!(is_secret_key("google.refresh_token"));
        assert!(!is_secret_key("google.project_id"));
    }

    #[test]
    fn test_cli_parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "gdocs",
            "serve",
            "--project-id",
            "p",
            "--api-key",
            "k",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert_eq!(args.project_id.as_deref(), Some("p"));
                assert_eq!(args.api_key.as_deref(), Some("k"));
            }
            _ => panic!("Expected serve"),
        }
    }
}
