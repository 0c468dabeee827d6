//! Google authentication.
//!
//! Three strategies, matching [`gdocs_core::Credentials`]:
//!
//! - **API key**: appended as the `key` query parameter on every request.
//! - **Service account**: an RS256-signed JWT assertion is exchanged at the
//!   key file's `token_uri` for a short-lived access token.
//! - **OAuth2**: a long-lived refresh token is exchanged at the Google token
//!   endpoint for a short-lived access token.
//!
//! Access tokens are cached and refreshed transparently shortly before they
//! expire, so callers only ever see an authorized request.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use gdocs_core::{AuthType, Credentials, Error, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Google OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for service accounts.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/drive",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Requested assertion lifetime; Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Assumed token lifetime when the endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Refresh tokens this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

// =============================================================================
// Token exchange plumbing
// =============================================================================

/// Response from a Google token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Access token cache shared by the token-based strategies.
#[derive(Default)]
struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    async fn valid_token(&self) -> Option<String> {
        let cached = self.inner.read().await;
        cached
            .as_ref()
            .filter(|t| t.expires_at > Instant::now() + REFRESH_MARGIN)
            .map(|t| t.access_token.clone())
    }

    async fn store(&self, token: &TokenResponse) {
        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let mut cached = self.inner.write().await;
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
    }
}

/// POST a form to a token endpoint and parse the token response.
async fn exchange(
    http: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse> {
    debug!(token_uri = token_uri, "Requesting access token");

    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Auth(format!("Token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Token exchange rejected");
        return Err(Error::Auth(format!(
            "Token exchange failed ({}): {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| Error::Auth(format!("Invalid token response: {}", e)))
}

// =============================================================================
// Service account
// =============================================================================

/// Fields of a service-account JSON key file.
#[derive(Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// JWT claims for the service-account assertion.
#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

/// Service-account token source.
pub struct ServiceAccountAuth {
    client_email: String,
    token_uri: String,
    scope: String,
    signing_key: EncodingKey,
    http: reqwest::Client,
    cache: TokenCache,
}

impl fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    /// Load a service-account key file.
    pub fn from_file(path: &Path, http: reqwest::Client) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read service account key file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content, http).map_err(|e| {
            Error::Config(format!(
                "Invalid service account key file {}: {}",
                path.display(),
                e.message()
            ))
        })
    }

    /// Build from the JSON content of a key file.
    pub fn from_json(json: &str, http: reqwest::Client) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Malformed key JSON: {}", e)))?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| Error::Config(format!("Unusable private key: {}", e)))?;

        Ok(Self {
            client_email: key.client_email,
            token_uri: key.token_uri,
            scope: SCOPES.join(" "),
            signing_key,
            http,
            cache: TokenCache::default(),
        })
    }

    /// Service account email.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cache.valid_token().await {
            return Ok(token);
        }

        let assertion = self.signed_assertion()?;
        let token = exchange(
            &self.http,
            &self.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
        )
        .await?;

        self.cache.store(&token).await;
        Ok(token.access_token)
    }

    fn signed_assertion(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Auth(format!("System clock error: {}", e)))?
            .as_secs();

        let claims = JwtClaims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| Error::Auth(format!("Failed to sign JWT: {}", e)))
    }
}

// =============================================================================
// OAuth2 refresh token
// =============================================================================

/// OAuth2 refresh-token token source.
pub struct RefreshTokenAuth {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_uri: String,
    http: reqwest::Client,
    cache: TokenCache,
}

impl RefreshTokenAuth {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            http,
            cache: TokenCache::default(),
        }
    }

    /// Use a different token endpoint (for testing).
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cache.valid_token().await {
            return Ok(token);
        }

        let token = exchange(
            &self.http,
            &self.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
            ],
        )
        .await?;

        self.cache.store(&token).await;
        Ok(token.access_token)
    }
}

// =============================================================================
// Authenticator
// =============================================================================

/// The active authentication strategy.
pub enum Authenticator {
    ApiKey(String),
    ServiceAccount(ServiceAccountAuth),
    OAuth2(RefreshTokenAuth),
}

impl Authenticator {
    /// Build the token source for resolved credentials.
    ///
    /// Service-account key files are read and their private key parsed here,
    /// so a broken key fails at startup rather than on the first call.
    pub fn from_credentials(credentials: &Credentials, http: reqwest::Client) -> Result<Self> {
        match credentials {
            Credentials::ApiKey(key) => Ok(Authenticator::ApiKey(key.clone())),
            Credentials::ServiceAccount { key_file } => Ok(Authenticator::ServiceAccount(
                ServiceAccountAuth::from_file(key_file, http)?,
            )),
            Credentials::OAuth2 {
                client_id,
                client_secret,
                refresh_token,
            } => Ok(Authenticator::OAuth2(RefreshTokenAuth::new(
                client_id.clone(),
                client_secret.clone(),
                refresh_token.clone(),
                http,
            ))),
        }
    }

    pub fn auth_type(&self) -> AuthType {
        match self {
            Authenticator::ApiKey(_) => AuthType::ApiKey,
            Authenticator::ServiceAccount(_) => AuthType::ServiceAccount,
            Authenticator::OAuth2(_) => AuthType::OAuth2,
        }
    }

    /// Attach credentials to an outgoing request.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self {
            Authenticator::ApiKey(key) => Ok(request.query(&[("key", key.as_str())])),
            Authenticator::ServiceAccount(auth) => Ok(request.bearer_auth(auth.access_token().await?)),
            Authenticator::OAuth2(auth) => Ok(request.bearer_auth(auth.access_token().await?)),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::ApiKey(key) => {
                write!(f, "Authenticator::ApiKey({})", gdocs_core::mask_secret(key))
            }
            Authenticator::ServiceAccount(auth) => {
                write!(f, "Authenticator::ServiceAccount({})", auth.client_email)
            }
            Authenticator::OAuth2(auth) => write!(
                f,
                "Authenticator::OAuth2({})",
                gdocs_core::mask_secret(&auth.client_id)
            ),
        }
    }
}
