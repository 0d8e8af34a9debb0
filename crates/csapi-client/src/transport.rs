//! Transport collaborators.
//!
//! The endpoint never touches sockets. It hands a URL and a header list to a
//! [`Transport`] and gets back a status, headers and a parsed JSON body.
//! [`HttpTransport`] does this over reqwest; [`MemoryTransport`] serves canned
//! documents for offline use.

use async_trait::async_trait;
use csapi_core::{classify, FormatTag};
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// A fetched response.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, names lowercased
    pub headers: BTreeMap<String, String>,
    /// Parsed body, `Null` when the body was empty or not JSON
    pub body: Value,
}

impl FetchResponse {
    /// A response with a JSON body and `application/json` content type.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::with_content_type(status, "application/json", body)
    }

    /// A response with an explicit content type.
    #[must_use]
    pub fn with_content_type(status: u16, content_type: &str, body: Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self {
            status,
            headers,
            body,
        }
    }

    /// The `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Format tag of the body according to its content type.
    #[must_use]
    pub fn format(&self) -> FormatTag {
        classify(self.content_type())
    }
}

/// Fetches JSON documents.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `headers` and parse the body as JSON.
    ///
    /// A non-2xx status is not an error at this level.
    ///
    /// # Errors
    ///
    /// Returns error when no response could be obtained.
    async fn fetch_json(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch_json(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, TransportError> {
        (**self).fetch_json(url, headers).await
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Custom CA certificate path for self-signed server certs (PEM format)
    pub ca_cert_path: Option<PathBuf>,
    /// Client certificate path for mTLS authentication (PEM format)
    pub client_cert_path: Option<PathBuf>,
    /// Client private key path for mTLS authentication (PEM format)
    pub client_key_path: Option<PathBuf>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            ca_cert_path: None,
            client_cert_path: None,
            client_key_path: None,
        }
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created, or if TLS
    /// certificate files cannot be read or parsed.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().timeout(config.timeout).use_rustls_tls();

        if let Some(ca_path) = &config.ca_cert_path {
            let ca_cert = fs::read(ca_path).map_err(|e| {
                TransportError::Init(format!(
                    "failed to read CA certificate {}: {e}",
                    ca_path.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&ca_cert)
                .map_err(|e| TransportError::Init(format!("failed to parse CA certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
            tracing::debug!(ca_path = %ca_path.display(), "Loaded custom CA certificate");
        }

        if let (Some(cert_path), Some(key_path)) =
            (&config.client_cert_path, &config.client_key_path)
        {
            let mut identity_pem = fs::read(cert_path).map_err(|e| {
                TransportError::Init(format!(
                    "failed to read client certificate {}: {e}",
                    cert_path.display()
                ))
            })?;
            let key_pem = fs::read(key_path).map_err(|e| {
                TransportError::Init(format!(
                    "failed to read client key {}: {e}",
                    key_path.display()
                ))
            })?;
            identity_pem.extend_from_slice(&key_pem);

            let identity = reqwest::Identity::from_pem(&identity_pem)
                .map_err(|e| TransportError::Init(format!("failed to create client identity: {e}")))?;
            builder = builder.identity(identity);
            tracing::debug!(
                cert_path = %cert_path.display(),
                key_path = %key_path.display(),
                "Loaded client certificate for mTLS"
            );
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Init(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_json(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, TransportError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let body = parse_body(url, status, &bytes);
        tracing::debug!(%url, status, "GET complete");

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decode a response body, `Null` when empty or not JSON.
///
/// Error pages are routinely HTML, so a non-JSON body only warrants a warning
/// on a successful status.
fn parse_body(url: &Url, status: u16, bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        if (200..300).contains(&status) {
            tracing::warn!(%url, status, error = %e, "Response body is not JSON");
        } else {
            tracing::debug!(%url, status, "Error response body is not JSON");
        }
        Value::Null
    })
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Requested URL
    pub url: String,
    /// Headers sent with it
    pub headers: Vec<(String, String)>,
}

/// In-memory transport serving canned responses.
///
/// Unknown URLs answer `404` with a `Null` body. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: HashMap<String, Result<FetchResponse, TransportError>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MemoryTransport {
    /// Empty transport; every URL answers 404.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as `200 application/json` at `url`.
    #[must_use]
    pub fn with_json(self, url: &str, body: Value) -> Self {
        self.with_response(url, FetchResponse::json(200, body))
    }

    /// Serve an arbitrary response at `url`.
    #[must_use]
    pub fn with_response(mut self, url: &str, response: FetchResponse) -> Self {
        self.routes.insert(route_key(url), Ok(response));
        self
    }

    /// Fail every request to `url` with a transport error.
    #[must_use]
    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.routes.insert(
            route_key(url),
            Err(TransportError::Request(message.to_string())),
        );
        self
    }

    /// Requests seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch_json(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, TransportError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(RecordedRequest {
                url: url.to_string(),
                headers: headers.to_vec(),
            });
        }

        self.routes
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(FetchResponse::json(404, Value::Null)))
    }
}

/// Canonical form used to key canned routes.
fn route_key(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), |parsed| parsed.to_string())
}

/// Errors that can occur in a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Client initialization error
    #[error("client initialization error: {0}")]
    Init(String),

    /// Request failed before a response arrived
    #[error("request error: {0}")]
    Request(String),
}
