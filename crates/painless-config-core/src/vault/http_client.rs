//! Key Vault REST client
//!
//! Requests start unauthenticated. The vault answers `401` with a
//! `WWW-Authenticate: Bearer authorization="<authority>", resource="<resource>"`
//! challenge; a token is then acquired with the client-credentials grant at
//! `<authority>/oauth2/token` and the request is retried once. Tokens are
//! cached until shortly before they expire.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};

use super::client::{SecretBundle, SecretClient, SecretClientError};
use super::credentials::{ClientCredentials, CredentialSource};
use super::uri::canonical_secret_uri;
use crate::config::KeyVaultSettings;
use crate::logging::{default_logger, SharedLogger};
use crate::{log_debug, log_warn};

/// Default Key Vault REST API version
pub const DEFAULT_API_VERSION: &str = "7.4";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Parameters of a `WWW-Authenticate: Bearer` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Token authority, e.g. `https://login.windows.net/<tenant>`
    pub authorization: String,
    /// Resource the token is requested for
    pub resource: String,
}

impl Challenge {
    /// Parse a `WWW-Authenticate` header value
    ///
    /// Accepts `authorization` or `authorization_uri` for the authority and
    /// `resource`, or failing that `scope` without its `/.default` suffix.
    pub fn parse(header: &str) -> Option<Challenge> {
        let header = header.trim();
        let params = match header.split_once(' ') {
            Some((scheme, params)) if scheme.eq_ignore_ascii_case("bearer") => params,
            _ => return None,
        };

        let mut authorization = None;
        let mut resource = None;
        let mut scope = None;
        for part in params.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "authorization" | "authorization_uri" => authorization = Some(value),
                "resource" => resource = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let resource = resource.or_else(|| scope.map(|s| s.trim_end_matches("/.default").to_string()))?;
        Some(Challenge {
            authorization: authorization?,
            resource,
        })
    }

    fn token_endpoint(&self) -> String {
        format!("{}/oauth2/token", self.authorization.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: Option<String>,
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

impl TokenResponse {
    fn lifetime(&self) -> Option<Duration> {
        let seconds = match self.expires_in.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64()?,
            serde_json::Value::String(s) => s.parse().ok()?,
            _ => return None,
        };
        Some(Duration::from_secs(seconds))
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    authorization: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() < at)
    }
}

#[derive(Debug, Deserialize)]
struct VaultErrorBody {
    error: VaultErrorDetail,
}

#[derive(Debug, Deserialize)]
struct VaultErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Secret client speaking the Key Vault REST API
pub struct KeyVaultHttpClient {
    http: reqwest::Client,
    source: Arc<dyn CredentialSource>,
    credentials: OnceCell<ClientCredentials>,
    token: Mutex<Option<CachedToken>>,
    api_version: String,
    logger: SharedLogger,
}

impl KeyVaultHttpClient {
    /// Create a client; credentials are only requested when first needed
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            source,
            credentials: OnceCell::new(),
            token: Mutex::new(None),
            api_version: DEFAULT_API_VERSION.to_string(),
            logger: default_logger("painless_config::vault"),
        }
    }

    /// Create a client using the API version from key vault settings
    pub fn from_settings(source: Arc<dyn CredentialSource>, settings: &KeyVaultSettings) -> Self {
        Self::new(source).with_api_version(settings.api_version.clone())
    }

    /// Use an existing `reqwest` client (timeouts, proxies)
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Set the REST API version
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    async fn client_credentials(&self) -> Result<&ClientCredentials, SecretClientError> {
        self.credentials
            .get_or_try_init(|| async {
                self.source
                    .credentials()
                    .await
                    .map_err(|e| SecretClientError::Credentials(Box::new(e)))
            })
            .await
    }

    async fn cached_authorization(&self) -> Option<String> {
        let token = self.token.lock().await;
        token
            .as_ref()
            .filter(|t| t.is_fresh())
            .map(|t| t.authorization.clone())
    }

    /// Answer a challenge, reusing a fresh cached token if there is one
    async fn authorize(&self, challenge: &Challenge, force: bool) -> Result<String, SecretClientError> {
        let mut token = self.token.lock().await;
        if !force {
            if let Some(cached) = token.as_ref().filter(|t| t.is_fresh()) {
                return Ok(cached.authorization.clone());
            }
        }

        let credentials = self.client_credentials().await?;
        log_debug!(
            self.logger,
            "Acquiring token for {} from {}",
            challenge.resource,
            challenge.authorization
        );

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &credentials.client_id)
            .append_pair("client_secret", &credentials.client_secret)
            .append_pair("resource", &challenge.resource)
            .finish();

        let response = self
            .http
            .post(challenge.token_endpoint())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SecretClientError::challenge(format!(
                "token request failed ({}): {}",
                status, text
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&response.text().await?)?;
        let authorization = format!(
            "{} {}",
            parsed.token_type.as_deref().unwrap_or("Bearer"),
            parsed.access_token
        );
        let expires_at = parsed
            .lifetime()
            .map(|lifetime| Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN));

        *token = Some(CachedToken {
            authorization: authorization.clone(),
            expires_at,
        });
        Ok(authorization)
    }

    async fn send(&self, url: &str, authorization: Option<&str>) -> Result<Response, SecretClientError> {
        let mut request = self
            .http
            .get(url)
            .query(&[("api-version", self.api_version.as_str())]);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        Ok(request.send().await?)
    }

    fn challenge_of(response: &Response) -> Result<Challenge, SecretClientError> {
        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| SecretClientError::challenge("401 without a WWW-Authenticate header"))?;
        Challenge::parse(header)
            .ok_or_else(|| SecretClientError::challenge(format!("unsupported challenge: {}", header)))
    }

    async fn read_bundle(&self, uri: String, response: Response) -> Result<SecretBundle, SecretClientError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(SecretClientError::NotFound(uri));
        }

        let message = match serde_json::from_str::<VaultErrorBody>(&text) {
            Ok(body) => format!("{}: {}", body.error.code, body.error.message),
            Err(_) => text,
        };
        log_warn!(self.logger, "Key vault returned {} for {}", status, uri);
        Err(SecretClientError::status(status.as_u16(), message))
    }
}

#[async_trait]
impl SecretClient for KeyVaultHttpClient {
    async fn get_secret(
        &self,
        vault_base_url: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<SecretBundle, SecretClientError> {
        let uri = canonical_secret_uri(vault_base_url, name, version);

        let cached = self.cached_authorization().await;
        let mut response = self.send(&uri, cached.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = Self::challenge_of(&response)?;
            // A rejected cached token must not be handed out again
            let authorization = self.authorize(&challenge, cached.is_some()).await?;
            response = self.send(&uri, Some(&authorization)).await?;
        }

        self.read_bundle(uri, response).await
    }
}

impl std::fmt::Debug for KeyVaultHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVaultHttpClient")
            .field("api_version", &self.api_version)
            .finish()
    }
}
