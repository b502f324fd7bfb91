//! HTTP client for the Tesy cloud API.
//!
//! Mimics the vendor web app's requests: browser-like default headers,
//! form-encoded login, and session artifacts echoed as custom headers.

use crate::api::{CommandReply, DeviceRecord, WaterHeaterApi};
use crate::session::{Credentials, Session};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, COOKIE, REFERER, USER_AGENT,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;
use tesy_bridge_core::DeviceCommand;
use url::Url;

/// Default vendor API base.
pub const DEFAULT_BASE_URL: &str = "https://www.mytesy.com/v3/";

const API_PATH: &str = "api.php";
const WEB_VERSION: &str = "100";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/113.0";

/// Tesy HTTP client configuration.
#[derive(Debug, Clone)]
pub struct TesyClientConfig {
    /// Base URL of the vendor API (e.g., <https://www.mytesy.com/v3/>)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TesyClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the Tesy cloud.
#[derive(Debug, Clone)]
pub struct TesyClient {
    client: Client,
    api_url: Url,
    referer: String,
}

impl TesyClient {
    /// Create a new Tesy client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(config: &TesyClientConfig) -> Result<Self, ClientError> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::Init(format!("invalid base URL {}: {e}", config.base_url)))?;
        // A base without a trailing slash would have its last segment
        // replaced by `join`.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let api_url = base
            .join(API_PATH)
            .map_err(|e| ClientError::Init(format!("invalid base URL {}: {e}", config.base_url)))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers(base.as_str())?)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            referer: base.to_string(),
        })
    }

    /// Attach session artifacts to an authenticated request.
    fn authenticated(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .header("X-ACC-ALT", session.acc_alt())
            .header("X-ACC-SESSION", session.acc_session())
            .header(COOKIE, session.cookie_header())
            .header("X-WEB-VER", WEB_VERSION)
    }

    /// Log in with account credentials.
    ///
    /// # Errors
    ///
    /// Returns error on network failure, a non-200 status, or if any of the
    /// three session artifacts is missing from the response.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        tracing::debug!(url = %self.api_url, username = %credentials.username, "POST login");

        let response = self
            .client
            .post(self.api_url.clone())
            .query(&[("do", "login")])
            .form(&[
                ("user", credentials.username.as_str()),
                ("pass", credentials.password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let response = ensure_ok(response).await?;
        Session::from_headers(response.headers())
    }

    /// Fetch the account's device list.
    ///
    /// # Errors
    ///
    /// Returns error on network failure, a non-200 status, or a body that is
    /// not JSON.
    pub async fn devices(&self, session: &Session) -> Result<Vec<DeviceRecord>, ClientError> {
        tracing::debug!(url = %self.api_url, "GET devices");

        let request = self
            .client
            .get(self.api_url.clone())
            .query(&[("do", "get_dev")]);

        let response = self
            .authenticated(request, session)
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let body = read_json(ensure_ok(response).await?).await?;
        let devices = DeviceRecord::list_from_json(&body);
        if devices.is_empty() {
            tracing::debug!(body = %body, "Device list reply without devices");
        }
        Ok(devices)
    }

    /// Set one field on a device.
    ///
    /// # Errors
    ///
    /// Returns error on network failure, a non-200 status, or a body that is
    /// not JSON. A well-formed rejection is returned as a reply, not an error.
    pub async fn send_command(
        &self,
        session: &Session,
        device_id: &str,
        command: &DeviceCommand,
    ) -> Result<CommandReply, ClientError> {
        tracing::debug!(url = %self.api_url, device_id, %command, "GET command");

        let request = self.client.get(self.api_url.clone()).query(&[
            ("cmd", "apiv1"),
            ("name", command.name.as_str()),
            ("set", command.value.as_str()),
            ("id", device_id),
        ]);

        let response = self
            .authenticated(request, session)
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let body = read_json(ensure_ok(response).await?).await?;
        Ok(CommandReply { body })
    }

    /// Referer sent with every request (the API base).
    #[must_use]
    pub fn referer(&self) -> &str {
        &self.referer
    }
}

#[async_trait]
impl WaterHeaterApi for TesyClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        TesyClient::login(self, credentials).await
    }

    async fn devices(&self, session: &Session) -> Result<Vec<DeviceRecord>, ClientError> {
        TesyClient::devices(self, session).await
    }

    async fn send_command(
        &self,
        session: &Session,
        device_id: &str,
        command: &DeviceCommand,
    ) -> Result<CommandReply, ClientError> {
        TesyClient::send_command(self, session, device_id, command).await
    }
}

fn default_headers(referer: &str) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("bg-BG,en-US;q=0.7,en;q=0.3"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        REFERER,
        HeaderValue::from_str(referer)
            .map_err(|e| ClientError::Init(format!("invalid referer {referer}: {e}")))?,
    );
    Ok(headers)
}

/// Reject anything but `200 OK`.
async fn ensure_ok(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }
    Err(ClientError::ApiError {
        status: status.as_u16(),
        message: response.text().await.unwrap_or_default(),
    })
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    response
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

/// Errors that can occur with the Tesy client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// HTTP request failed
    #[error("request error: {0}")]
    Request(String),
    /// API returned a non-200 status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// Response parsing failed
    #[error("parse error: {0}")]
    Parse(String),
    /// Login answered 200 but a session artifact was absent or empty
    #[error("login response missing {0}")]
    MissingSessionArtifact(String),
}
