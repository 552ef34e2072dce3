//! Immutable service configuration.
//!
//! Built once at process start and shared behind an `Arc`; nothing mutates it
//! afterwards.

use std::fmt;
use thiserror::Error;
use url::Url;

pub const DEFAULT_NAMESPACE: &str = "ODataExperiments";
pub const DEFAULT_REALM: &str = "OData Experiments";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid namespace '{0}': must be a dotted identifier")]
    InvalidNamespace(String),

    #[error("Credentials must have a non-empty username")]
    EmptyUsername,
}

/// Username and password accepted on collection feeds.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// OData service configuration shared by every component.
#[derive(Debug, Clone)]
pub struct ODataConfig {
    namespace: String,
    endpoint: String,
    realm: String,
    credentials: BasicCredentials,
}

impl ODataConfig {
    /// Validate and build a configuration.
    ///
    /// The endpoint must be an absolute http(s) URL; any trailing slash is
    /// removed so collection URLs can be built by plain concatenation.
    pub fn new(
        namespace: impl Into<String>,
        endpoint: impl AsRef<str>,
        credentials: BasicCredentials,
    ) -> Result<Self, ConfigError> {
        let namespace = namespace.into();
        if !is_namespace(&namespace) {
            return Err(ConfigError::InvalidNamespace(namespace));
        }

        if credentials.username.is_empty() {
            return Err(ConfigError::EmptyUsername);
        }

        Ok(Self {
            namespace,
            endpoint: normalize_endpoint(endpoint.as_ref())?,
            realm: DEFAULT_REALM.to_string(),
            credentials,
        })
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Public base URL, without trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn credentials(&self) -> &BasicCredentials {
        &self.credentials
    }

    /// `<endpoint>/$metadata`
    pub fn metadata_url(&self) -> String {
        format!("{}/$metadata", self.endpoint)
    }

    /// `<endpoint>/<collection>`
    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.endpoint, collection)
    }
}

fn normalize_endpoint(endpoint: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }

    Ok(endpoint.trim_end_matches('/').to_string())
}

fn is_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> BasicCredentials {
        BasicCredentials::new("conwat", "password")
    }

    #[test]
    fn test_trailing_slash_is_removed() {
        let config =
            ODataConfig::new("ODataExperiments", "http://localhost:8004/", credentials()).unwrap();

        assert_eq!(config.endpoint(), "http://localhost:8004");
        assert_eq!(config.metadata_url(), "http://localhost:8004/$metadata");
        assert_eq!(
            config.collection_url("Depots"),
            "http://localhost:8004/Depots"
        );
    }

    #[test]
    fn test_endpoint_path_is_kept() {
        let config =
            ODataConfig::new("Geo", "https://example.com/odata", credentials()).unwrap();
        assert_eq!(config.endpoint(), "https://example.com/odata");
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        for endpoint in ["localhost:8004", "ftp://example.com", "http://x/?a=1", "not a url"] {
            let result = ODataConfig::new("Geo", endpoint, credentials());
            assert!(
                matches!(result, Err(ConfigError::InvalidEndpoint { .. })),
                "{} should be rejected",
                endpoint
            );
        }
    }

    #[test]
    fn test_rejects_bad_namespaces() {
        for namespace in ["", "1abc", "a..b", "with space"] {
            let result = ODataConfig::new(namespace, "http://localhost", credentials());
            assert_eq!(
                result.unwrap_err(),
                ConfigError::InvalidNamespace(namespace.to_string())
            );
        }
        assert!(ODataConfig::new("Org.Geo_1", "http://localhost", credentials()).is_ok());
    }

    #[test]
    fn test_empty_username_rejected() {
        let result = ODataConfig::new(
            "Geo",
            "http://localhost",
            BasicCredentials::new("", "secret"),
        );
        assert_eq!(result.unwrap_err(), ConfigError::EmptyUsername);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("conwat"));
        assert!(!rendered.contains("password\""));
        assert!(rendered.contains("<redacted>"));
    }
}
