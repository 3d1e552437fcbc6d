// Shared transport configuration and request construction.
//
// Builds one authenticated, versioned request per call and hands back the
// raw `reqwest::Response`. Status codes are interpreted upstream.

use std::path::PathBuf;
use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Path prefix of every API endpoint.
pub const VERSION_PREFIX: &str = "/v1";

/// Default Icinga2 API port.
pub const DEFAULT_PORT: u16 = 5665;

const JSON: &str = "application/json";

// Everything except ASCII alphanumerics and `-_.~` is escaped, and spaces
// become `%20` rather than `+`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

// An object name must stay one path segment: `/` and `\` would split it and
// `%` would be read back as an escape. `!` stays literal for service names.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (Icinga2 ships a self-signed CA by default).
    #[default]
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// The client itself only bounds connection setup; the per-request
    /// timeout is applied by [`crate::Client`] to non-streaming calls so
    /// event streams stay open as long as the server keeps them open.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(concat!("icinga-api/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Encode a filter expression as a `filter=` query parameter.
pub fn filter_encode(expr: &str) -> String {
    format!("filter={}", utf8_percent_encode(expr, QUERY_VALUE))
}

/// Escape an object name so it occupies exactly one URL path segment.
pub fn path_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

/// Turn `host:port`, a bare host, or a full URL into the API base URL.
pub fn base_url(address: &str) -> Result<Url, Error> {
    if address.contains("://") {
        return Ok(Url::parse(address)?);
    }
    let mut url = Url::parse(&format!("https://{address}"))?;
    if url.port().is_none() {
        url.set_port(Some(DEFAULT_PORT))
            .map_err(|()| Error::InvalidUrl(url::ParseError::InvalidPort))?;
    }
    Ok(url)
}

/// Authenticated request builder bound to one Icinga2 endpoint.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    timeout: Option<Duration>,
}

impl Transport {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
            timeout: None,
        }
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute, versioned URL for `path` with optional filter and cascade.
    pub(crate) fn url(&self, path: &str, filter: &str, cascade: bool) -> Url {
        let mut url = self.base_url.clone();
        let base = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{base}{VERSION_PREFIX}{path}"));

        let mut query = Vec::new();
        if !filter.is_empty() {
            query.push(filter_encode(filter));
        }
        if cascade {
            query.push("cascade=1".to_owned());
        }
        let query = query.join("&");
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        url
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        debug!("{method} {url}");
        let write = matches!(method, Method::POST | Method::PUT);
        let mut req = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(ACCEPT, JSON);
        if write {
            req = req.header(CONTENT_TYPE, JSON);
        }
        req
    }

    fn bounded(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    pub(crate) async fn get(&self, path: &str, filter: &str) -> Result<reqwest::Response, Error> {
        let url = self.url(path, filter, false);
        Ok(self.bounded(self.request(Method::GET, url)).send().await?)
    }

    pub(crate) async fn delete(
        &self,
        path: &str,
        cascade: bool,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path, "", cascade);
        Ok(self.bounded(self.request(Method::DELETE, url)).send().await?)
    }

    pub(crate) async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path, "", false);
        Ok(self.bounded(self.request(Method::PUT, url)).json(body).send().await?)
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path, "", false);
        Ok(self.bounded(self.request(Method::POST, url)).json(body).send().await?)
    }

    /// POST without the per-request timeout, for long-lived response bodies.
    pub(crate) async fn post_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path, "", false);
        Ok(self.request(Method::POST, url).json(body).send().await?)
    }
}
