//! CloudHealth perspective schema API client.
//!
//! `GET {base_url}/v1/perspective_schemas/{id}?api_key=...`
//!
//! Status handling:
//! - 401 → [`FetchError::Unauthorized`]
//! - 403 → [`FetchError::Forbidden`]
//! - 404 → [`FetchError::NotFound`]
//! - any other non-2xx → [`FetchError::InvalidResponse`]

use async_trait::async_trait;
use perspective_core::Document;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{FetchError, SchemaLoader};

pub const DEFAULT_BASE_URL: &str = "https://chapi.cloudhealthtech.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches one perspective's schema from the CloudHealth API.
pub struct CloudHealthClient {
    base_url: String,
    api_key: String,
    perspective_id: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for CloudHealthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudHealthClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("perspective_id", &self.perspective_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CloudHealthClient {
    /// Create a client with the default base URL and a 30 second timeout.
    pub fn new(
        api_key: impl Into<String>,
        perspective_id: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let api_key = api_key.into();
        let perspective_id = perspective_id.into();

        if api_key.trim().is_empty() {
            return Err(FetchError::NotConfigured("API key is empty".into()));
        }
        if perspective_id.trim().is_empty() {
            return Err(FetchError::NotConfigured("perspective ID is empty".into()));
        }

        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key,
            perspective_id,
            timeout,
            client: build_client(timeout)?,
        })
    }

    /// Use a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a custom request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, FetchError> {
        self.timeout = timeout;
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn perspective_id(&self) -> &str {
        &self.perspective_id
    }

    /// Endpoint URL, without the key.
    pub fn schema_url(&self) -> String {
        format!(
            "{}/v1/perspective_schemas/{}",
            self.base_url, self.perspective_id
        )
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))
}

/// Map a non-success HTTP status to its error. `None` for 2xx.
pub fn classify_status(status: u16, perspective_id: &str) -> Option<FetchError> {
    match status {
        200..=299 => None,
        401 => Some(FetchError::Unauthorized),
        403 => Some(FetchError::Forbidden),
        404 => Some(FetchError::NotFound {
            perspective_id: perspective_id.to_string(),
        }),
        other => Some(FetchError::InvalidResponse(format!(
            "unexpected HTTP status {other}"
        ))),
    }
}

#[async_trait]
impl SchemaLoader for CloudHealthClient {
    fn name(&self) -> &str {
        "cloudhealth"
    }

    async fn load(&self) -> Result<Document, FetchError> {
        let url = self.schema_url();
        debug!(perspective_id = %self.perspective_id, %url, "Fetching perspective schema");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if let Some(err) = classify_status(status, &self.perspective_id) {
            warn!(status, perspective_id = %self.perspective_id, "CloudHealth API error");
            return Err(err);
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        Ok(Document::from_value(&value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor() {
        let client = CloudHealthClient::new("key", "1234").unwrap();
        assert_eq!(client.name(), "cloudhealth");
        assert_eq!(client.perspective_id(), "1234");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.timeout, Duration::from_secs(30));
        assert_eq!(
            client.schema_url(),
            "https://chapi.cloudhealthtech.com/v1/perspective_schemas/1234"
        );
    }

    #[test]
    fn constructor_with_base_url() {
        let client = CloudHealthClient::new("key", "42")
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(client.schema_url(), "http://localhost:9000/v1/perspective_schemas/42");
    }

    #[test]
    fn empty_credentials_rejected() {
        assert!(matches!(
            CloudHealthClient::new("  ", "42"),
            Err(FetchError::NotConfigured(_))
        ));
        assert!(matches!(
            CloudHealthClient::new("key", ""),
            Err(FetchError::NotConfigured(_))
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = CloudHealthClient::new("super-secret", "42").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(200, "1").is_none());
        assert!(classify_status(204, "1").is_none());
        assert!(matches!(classify_status(401, "1"), Some(FetchError::Unauthorized)));
        assert!(matches!(classify_status(403, "1"), Some(FetchError::Forbidden)));
        match classify_status(404, "77") {
            Some(FetchError::NotFound { perspective_id }) => assert_eq!(perspective_id, "77"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(matches!(
            classify_status(500, "1"),
            Some(FetchError::InvalidResponse(msg)) if msg.contains("500")
        ));
    }
}
