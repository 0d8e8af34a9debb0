//! CLI configuration.

use anyhow::{Context, Result};
use csapi_client::{FetchOptions, HttpTransportConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for one CLI run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// API root URL
    pub server: String,

    /// Basic auth user
    pub user: Option<String>,

    /// Basic auth password
    pub password: Option<String>,

    /// Bearer token, used only when Basic credentials are incomplete
    pub bearer_token: Option<String>,

    /// Accept header
    pub accept: String,

    /// HTTP transport settings
    pub transport: HttpTransportConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8181/sensorhub/api".to_string(),
            user: None,
            password: None,
            bearer_token: None,
            accept: csapi_client::options::DEFAULT_ACCEPT.to_string(),
            transport: HttpTransportConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CSAPI_SERVER`: API root URL
    /// - `CSAPI_USER` / `CSAPI_PASS`: Basic auth credentials
    /// - `CSAPI_BEARER_TOKEN`: Bearer token
    /// - `CSAPI_TIMEOUT_SECS`: Request timeout in seconds
    /// - `CSAPI_CA_CERT`: CA certificate (PEM)
    /// - `CSAPI_CLIENT_CERT` / `CSAPI_CLIENT_KEY`: mTLS client identity (PEM)
    /// - `CSAPI_ACCEPT`: Accept header
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(server) = lookup("CSAPI_SERVER") {
            config.server = server;
        }

        config.user = lookup("CSAPI_USER");
        config.password = lookup("CSAPI_PASS");
        config.bearer_token = lookup("CSAPI_BEARER_TOKEN");

        if let Some(accept) = lookup("CSAPI_ACCEPT") {
            config.accept = accept;
        }

        if let Some(secs) = lookup("CSAPI_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .context("Invalid CSAPI_TIMEOUT_SECS")?;
            config.transport.timeout = Duration::from_secs(secs);
        }

        config.transport.ca_cert_path = lookup("CSAPI_CA_CERT").map(PathBuf::from);
        config.transport.client_cert_path = lookup("CSAPI_CLIENT_CERT").map(PathBuf::from);
        config.transport.client_key_path = lookup("CSAPI_CLIENT_KEY").map(PathBuf::from);

        Ok(config)
    }

    /// Headers for the navigation session.
    ///
    /// Basic auth wins over a bearer token when both user and password are set.
    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        let options = FetchOptions::empty().with_accept(self.accept.as_str());
        match (&self.user, &self.password, &self.bearer_token) {
            (Some(user), Some(password), _) => options.with_basic_auth(user, password),
            (_, _, Some(token)) => options.with_bearer_token(token),
            _ => options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = CliConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server, "http://localhost:8181/sensorhub/api");
        assert_eq!(config.transport.timeout, Duration::from_secs(30));
        assert_eq!(config.fetch_options(), FetchOptions::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = CliConfig::from_lookup(lookup(&[
            ("CSAPI_SERVER", "https://osh.example/api"),
            ("CSAPI_TIMEOUT_SECS", " 5 "),
            ("CSAPI_CA_CERT", "/etc/ca.pem"),
            ("CSAPI_CLIENT_CERT", "/etc/client.pem"),
            ("CSAPI_CLIENT_KEY", "/etc/client.key"),
            ("CSAPI_ACCEPT", "application/geo+json"),
        ]))
        .unwrap();

        assert_eq!(config.server, "https://osh.example/api");
        assert_eq!(config.transport.timeout, Duration::from_secs(5));
        assert_eq!(config.transport.ca_cert_path, Some(PathBuf::from("/etc/ca.pem")));
        assert!(config.transport.client_key_path.is_some());
        assert_eq!(
            config.fetch_options().header("Accept"),
            Some("application/geo+json")
        );
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = CliConfig::from_lookup(lookup(&[("CSAPI_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("CSAPI_TIMEOUT_SECS"));
    }

    #[test]
    fn basic_auth_wins_over_bearer() {
        let config = CliConfig::from_lookup(lookup(&[
            ("CSAPI_USER", "admin"),
            ("CSAPI_PASS", "admin"),
            ("CSAPI_BEARER_TOKEN", "tok"),
        ]))
        .unwrap();
        assert_eq!(
            config.fetch_options().header("authorization"),
            Some("Basic YWRtaW46YWRtaW4=")
        );

        let config = CliConfig::from_lookup(lookup(&[
            ("CSAPI_USER", "admin"),
            ("CSAPI_BEARER_TOKEN", "tok"),
        ]))
        .unwrap();
        assert_eq!(config.fetch_options().header("authorization"), Some("Bearer tok"));
    }
}
