//! Async HTTP lookups against the npm registry and the GitHub REST API.
//!
//! - [`npm`]: package name → canonical source URL.
//! - [`github`]: `owner/repo` → [`LicenseDescriptor`].
//!
//! Both go through [`send_json`], which maps every failure onto
//! [`LookupError`]. Nothing here retries.

pub mod github;
pub mod npm;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::models::LicenseDescriptor;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("building request for {url}: {source}")]
    Build {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no response body from {url}")]
    EmptyBody { url: String },

    #[error("not OK status code {status} from {url}")]
    Status {
        url: String,
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The two remote lookups a resolution task chains together.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Repository URL declared in the package's registry metadata, or `""`.
    async fn fetch_source_url(&self, package: &str) -> Result<String, LookupError>;

    /// License declared by a GitHub repository; default when none is declared.
    async fn fetch_license(&self, owner: &str, repo: &str)
        -> Result<LicenseDescriptor, LookupError>;
}

/// [`Lookup`] backed by real HTTP calls.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: Client,
    registry_url: String,
    github_api_url: String,
}

impl HttpLookup {
    pub fn new(config: &ResolverConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            github_api_url: config.github_api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Lookup for HttpLookup {
    async fn fetch_source_url(&self, package: &str) -> Result<String, LookupError> {
        npm::fetch_source_url(&self.client, &self.registry_url, package).await
    }

    async fn fetch_license(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LicenseDescriptor, LookupError> {
        github::fetch_license(&self.client, &self.github_api_url, owner, repo).await
    }
}

/// GET `url` and decode a JSON body of type `T`.
///
/// A non-success status is always reported as [`LookupError::Status`], with the
/// decoded body when there is one; [`LookupError::EmptyBody`] is for 2xx only.
pub async fn send_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, LookupError> {
    let request = client
        .get(url)
        .header("Accept", "application/json")
        .build()
        .map_err(|source| LookupError::Build {
            url: url.to_string(),
            source,
        })?;

    debug!(url, "sending request");

    let response = client.execute(request).await.map_err(|source| {
        warn!(url, error = %source, "request failed");
        LookupError::Transport {
            url: url.to_string(),
            source,
        }
    })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|source| {
        warn!(url, error = %source, "reading response body failed");
        LookupError::Transport {
            url: url.to_string(),
            source,
        }
    })?;

    if !status.is_success() {
        let decoded = serde_json::from_slice::<serde_json::Value>(&body).ok();
        warn!(url, status = status.as_u16(), body = ?decoded, "unsuccessful response");
        return Err(LookupError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: decoded,
        });
    }

    if body.is_empty() {
        warn!(url, status = status.as_u16(), "empty response body");
        return Err(LookupError::EmptyBody {
            url: url.to_string(),
        });
    }

    serde_json::from_slice(&body).map_err(|source| {
        warn!(url, error = %source, "decoding response failed");
        LookupError::Decode {
            url: url.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_status_error_carries_decoded_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).json_body(json!({ "error": "Not found" }));
            })
            .await;

        let err = send_json::<serde_json::Value>(&Client::new(), &server.url("/missing"))
            .await
            .unwrap_err();

        match err {
            LookupError::Status { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, Some(json!({ "error": "Not found" })));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_error_without_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(502);
            })
            .await;

        let err = send_json::<serde_json::Value>(&Client::new(), &server.url("/gone"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::Status {
                status: 502,
                body: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_status_error_with_non_json_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/html-error");
                then.status(503).body("<html>Service Unavailable</html>");
            })
            .await;

        let err = send_json::<serde_json::Value>(&Client::new(), &server.url("/html-error"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::Status {
                status: 503,
                body: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/empty");
                then.status(200);
            })
            .await;

        let err = send_json::<serde_json::Value>(&Client::new(), &server.url("/empty"))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::EmptyBody { .. }));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/garbage");
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let err = send_json::<serde_json::Value>(&Client::new(), &server.url("/garbage"))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let err = send_json::<serde_json::Value>(&Client::new(), "http://127.0.0.1:9/")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_build_error() {
        let err = send_json::<serde_json::Value>(&Client::new(), "not a url")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Build { .. }));
    }
}
