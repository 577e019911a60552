//! HTTP client for the password-grant token endpoint.
//!
//! The endpoint follows the OAuth2 password-flow convention: credentials go
//! out as an url-encoded form, a bearer token comes back as JSON.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;

// ============================================================================
// Constants
// ============================================================================

/// Base address used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Username and password as typed, sent verbatim.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Exchanges credentials for a bearer token.
pub trait TokenEndpoint {
    fn request_token(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<TokenResponse, AuthError>> + Send;
}

/// Asks the server whether a stored token is still accepted.
pub trait TokenVerifier {
    fn verify_token(&self, token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Client for the authentication service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: Url,
}

impl AuthClient {
    /// Create a new client for the service rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Self::with_http_client(base_url, client)
    }

    /// Create a client around an already configured `reqwest::Client`.
    pub fn with_http_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Base URL cannot carry a path: {}", base_url);
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Check if response is successful, returning a rejection built from the body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %AuthError::truncate_body(&body), "Request rejected");
            Err(AuthError::from_status(status, &body))
        }
    }

    /// `POST /token` with an url-encoded `username`/`password` form.
    pub async fn request_token(&self, credentials: &Credentials) -> Result<TokenResponse, AuthError> {
        let url = self.endpoint(&["token"]);
        debug!(%url, username = %credentials.username, "Requesting token");

        let response = self
            .client
            .post(url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let body = response.text().await?;

        serde_json::from_str::<TokenResponse>(&body).map_err(|e| {
            AuthError::InvalidResponse(format!(
                "{} in token response: {}",
                e,
                AuthError::truncate_body(&body)
            ))
        })
    }

    /// `GET /verify_token/{token}`; any success status means the token is accepted.
    pub async fn verify_token(&self, token: &str) -> Result<(), AuthError> {
        let url = self.endpoint(&["verify_token", token]);
        debug!("Verifying stored token");

        let response = self.client.get(url).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// `POST /register` with a JSON body.
    pub async fn register(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let url = self.endpoint(&["register"]);
        debug!(%url, username = %credentials.username, "Registering user");

        let response = self.client.post(url).json(credentials).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }
}

impl TokenEndpoint for AuthClient {
    async fn request_token(&self, credentials: &Credentials) -> Result<TokenResponse, AuthError> {
        AuthClient::request_token(self, credentials).await
    }
}

impl TokenVerifier for AuthClient {
    async fn verify_token(&self, token: &str) -> Result<(), AuthError> {
        AuthClient::verify_token(self, token).await
    }
}
