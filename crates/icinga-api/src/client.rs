// Icinga2 API client
//
// Holds the immutable connection configuration (base URL, credentials and
// the shared `reqwest::Client`). Endpoint groups (objects, checks, events)
// are implemented as inherent methods in their own modules.

use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::response;
use crate::transport::{self, Transport, TransportConfig};

/// Everything needed to reach one Icinga2 API endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://icinga.example.com:5665`.
    pub url: Url,
    /// ApiUser name.
    pub username: String,
    /// ApiUser password.
    pub password: SecretString,
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Config for `address` (`host`, `host:port` or a full URL) with
    /// default transport settings.
    pub fn new(address: &str, username: &str, password: SecretString) -> Result<Self, Error> {
        Ok(Self {
            url: transport::base_url(address)?,
            username: username.to_owned(),
            password,
            transport: TransportConfig::default(),
        })
    }
}

/// Identity and permissions of the authenticated ApiUser, from `GET /v1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

#[derive(Deserialize)]
struct PermissionsResponse {
    #[serde(default)]
    results: Vec<Permissions>,
}

/// Async client for the Icinga2 HTTP API.
///
/// Cheap to clone and safe to share between tasks: the only state is the
/// immutable connection configuration. Every call is one round trip with no
/// retries.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) transport: Transport,
}

impl Client {
    /// Build a client from `config` without contacting the server.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        let transport = Transport::new(
            http,
            config.url.clone(),
            config.username.clone(),
            config.password.clone(),
        )
        .with_timeout(config.transport.timeout);
        Ok(Self { transport })
    }

    /// Wrap an existing `reqwest::Client` (caller manages TLS and timeouts).
    pub fn with_http(
        http: reqwest::Client,
        base_url: Url,
        username: &str,
        password: SecretString,
    ) -> Self {
        Self {
            transport: Transport::new(http, base_url, username.to_owned(), password),
        }
    }

    /// Build a client and verify the server accepts its credentials.
    pub async fn connect(config: &ClientConfig) -> Result<Self, Error> {
        let client = Self::new(config)?;
        client
            .permissions()
            .await
            .map_err(|e| e.context("connect", config.url.as_str()))?;
        Ok(client)
    }

    /// The API base URL (without the version prefix).
    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    /// Fetch the authenticated ApiUser's identity and permissions.
    ///
    /// `GET /v1`
    pub async fn permissions(&self) -> Result<Permissions, Error> {
        debug!("checking API permissions");
        let resp = self.transport.get("", "").await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if status != reqwest::StatusCode::OK {
            return Err(response::failure(status, &body));
        }
        let parsed: PermissionsResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::decode(format!("malformed permissions response: {e}")))?;
        Ok(parsed.results.into_iter().next().unwrap_or_default())
    }
}
