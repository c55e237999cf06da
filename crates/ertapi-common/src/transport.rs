//! The transport seam between ensemble nodes and the remote API.
//!
//! Nodes only ever see [`Transport`]. `Ok(None)` means the server had nothing
//! useful to say (non-success status, empty body) and is treated by callers as
//! benign absence. `Err` is a real transport failure and is passed through.

use std::collections::HashSet;
use std::time::Duration;

use ertapi_config::Config;
use reqwest::blocking::{Client, ClientBuilder};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{Result, TransportError};
use crate::Record;

/// Blocking GET access to the ensemble API.
pub trait Transport: Send + Sync {
    /// Fetch `url` and decode the body as a JSON object.
    fn fetch_json(&self, url: &str) -> Result<Option<Record>>;

    /// Fetch `url` and return the raw body bytes.
    fn fetch_raw(&self, url: &str) -> Result<Option<Vec<u8>>>;
}

/// HTTP transport capped to an allowlist of hosts.
/// Relative URLs are resolved against the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    allowlist: HashSet<String>,
}

impl HttpTransport {
    /// Transport for `base_url` with default timeout and user agent.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut config = Config::default();
        config.server.base_url = base_url.to_string();
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let base_url = parse_url(&config.server.base_url)?;

        let mut allowlist: HashSet<String> = config.security.allowed_hosts.iter().cloned().collect();
        if let Some(host) = base_url.host_str() {
            allowlist.insert(host.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.server.timeout_secs))
            .user_agent(config.server.user_agent.clone())
            .build()?;

        Ok(Self { client, base_url, allowlist })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_host(&mut self, host: &str) {
        self.allowlist.insert(host.to_string());
    }

    /// Exact match or subdomain of an allowed host.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    /// Resolve `url` against the base URL and check it against the allowlist.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        let resolved = match Url::parse(url) {
            Ok(abs) => abs,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url.join(url).map_err(|source| TransportError::InvalidUrl {
                    url: url.to_string(),
                    source,
                })?
            }
            Err(source) => {
                return Err(TransportError::InvalidUrl { url: url.to_string(), source });
            }
        };
        if !self.is_allowed(&resolved) {
            return Err(TransportError::Forbidden(resolved.to_string()));
        }
        Ok(resolved)
    }

    #[instrument(skip(self))]
    fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let resolved = self.resolve(url)?;
        let resp = self.client.get(resolved.clone()).send()?;
        let status = resp.status();
        if !status.is_success() {
            warn!(url = %resolved, %status, "Request returned no usable result");
            return Ok(None);
        }
        let body = resp.bytes()?;
        debug!(url = %resolved, bytes = body.len(), "Fetched");
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(body.to_vec()))
    }
}

impl Transport for HttpTransport {
    fn fetch_json(&self, url: &str) -> Result<Option<Record>> {
        let Some(body) = self.get(url)? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Value>(&body)? {
            Value::Object(record) => Ok(Some(record)),
            Value::Null => Ok(None),
            other => Err(TransportError::UnexpectedJson {
                url: url.to_string(),
                found: json_type_name(&other),
            }),
        }
    }

    fn fetch_raw(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.get(url)
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| TransportError::InvalidUrl { url: url.to_string(), source })
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new("http://ert.example.org:5000/api/").unwrap()
    }

    #[test]
    fn test_relative_url_joins_base() {
        let t = transport();
        let url = t.resolve("ensembles/1").unwrap();
        assert_eq!(url.as_str(), "http://ert.example.org:5000/api/ensembles/1");

        let url = t.resolve("/ensembles/1").unwrap();
        assert_eq!(url.as_str(), "http://ert.example.org:5000/ensembles/1");
    }

    #[test]
    fn test_absolute_url_kept() {
        let t = transport();
        let url = t.resolve("http://ert.example.org/data/0").unwrap();
        assert_eq!(url.as_str(), "http://ert.example.org/data/0");
    }

    #[test]
    fn test_subdomain_allowed() {
        let t = transport();
        assert!(t.resolve("https://data.ert.example.org/x").is_ok());
    }

    #[test]
    fn test_foreign_host_forbidden() {
        let t = transport();
        let err = t.resolve("http://elsewhere.example.com/ensembles").unwrap_err();
        assert!(matches!(err, TransportError::Forbidden(_)));
        // Rejected before any network access.
        let err = t.fetch_json("http://elsewhere.example.com/ensembles").unwrap_err();
        assert!(matches!(err, TransportError::Forbidden(_)));
    }

    #[test]
    fn test_allow_host() {
        let mut t = transport();
        t.allow_host("mirror.example.com");
        assert!(t.resolve("http://mirror.example.com/ensembles").is_ok());
    }

    #[test]
    fn test_allowlist_from_config() {
        let config = Config::from_toml_str(
            "[server]\nbase_url = \"http://localhost:5000\"\n[security]\nallowed_hosts = [\"ert.example.org\"]\n",
        )
        .unwrap();
        let t = HttpTransport::from_config(&config).unwrap();
        assert!(t.resolve("http://ert.example.org/a").is_ok());
        assert!(t.resolve("http://localhost:5000/a").is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpTransport::new("not a url").unwrap_err(),
            TransportError::Config(_)
        ));
    }

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&serde_json::json!([1])), "an array");
        assert_eq!(json_type_name(&serde_json::json!("s")), "a string");
    }
}
