use std::collections::{BTreeMap, HashMap};

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{send_json, LookupError};

/// Packument returned by `GET /{name}` on the npm registry (only the fields we read).
#[derive(Debug, Default, Deserialize)]
pub struct RegistryResponse {
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: HashMap<String, String>,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VersionMetadata {
    /// Either `{ "type": "git", "url": "..." }` or a bare URL string.
    #[serde(default)]
    pub repository: Option<Value>,
}

impl VersionMetadata {
    fn repository_url(&self) -> Option<&str> {
        let url = match self.repository.as_ref()? {
            Value::String(url) => Some(url.as_str()),
            Value::Object(fields) => fields.get("url").and_then(Value::as_str),
            _ => None,
        };
        url.filter(|url| !url.is_empty())
    }
}

impl RegistryResponse {
    /// Repository URL of the most relevant published version, or `""`.
    ///
    /// Preference order: the `latest` dist-tag, then the highest semver
    /// version declaring a repository, then the greatest version key.
    pub fn source_url(&self) -> &str {
        let latest = self
            .dist_tags
            .get("latest")
            .and_then(|v| self.versions.get(v))
            .and_then(VersionMetadata::repository_url);
        if let Some(url) = latest {
            return url;
        }

        self.versions_with_repository()
            .filter_map(|(v, url)| semver::Version::parse(v).ok().map(|sv| (sv, url)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, url)| url)
            .or_else(|| self.versions_with_repository().last().map(|(_, url)| url))
            .unwrap_or("")
    }

    fn versions_with_repository(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.versions
            .iter()
            .filter_map(|(v, meta)| meta.repository_url().map(|url| (v.as_str(), url)))
    }
}

/// Scoped names must be escaped: `@scope/pkg` → `%40scope%2Fpkg`.
fn encode_package_name(name: &str) -> String {
    name.replace('@', "%40").replace('/', "%2F")
}

/// Fetch the canonical source URL for an npm package.
pub async fn fetch_source_url(
    client: &Client,
    registry_url: &str,
    package: &str,
) -> Result<String, LookupError> {
    let url = format!("{}/{}", registry_url, encode_package_name(package));
    let response: RegistryResponse = send_json(client, &url).await?;

    let source = response.source_url().to_string();
    if source.is_empty() {
        debug!(package, "no repository declared in registry metadata");
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> RegistryResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_repository_is_empty() {
        let resp = decode(json!({
            "versions": { "1.0.0": { "name": "no-repo" } }
        }));
        assert_eq!(resp.source_url(), "");
    }

    #[test]
    fn test_no_versions_is_empty() {
        assert_eq!(decode(json!({})).source_url(), "");
    }

    #[test]
    fn test_prefers_latest_dist_tag() {
        let resp = decode(json!({
            "dist-tags": { "latest": "1.0.0" },
            "versions": {
                "1.0.0": { "repository": { "type": "git", "url": "git+https://github.com/a/stable.git" } },
                "2.0.0-beta.1": { "repository": { "type": "git", "url": "git+https://github.com/a/beta.git" } }
            }
        }));
        assert_eq!(resp.source_url(), "git+https://github.com/a/stable.git");
    }

    #[test]
    fn test_falls_back_to_highest_semver() {
        // Lexicographically "9.0.0" > "10.0.0"; semver ordering must win.
        let resp = decode(json!({
            "dist-tags": { "latest": "11.0.0" },
            "versions": {
                "9.0.0": { "repository": { "url": "git+https://github.com/a/nine.git" } },
                "10.0.0": { "repository": { "url": "git+https://github.com/a/ten.git" } },
                "11.0.0": {}
            }
        }));
        assert_eq!(resp.source_url(), "git+https://github.com/a/ten.git");
    }

    #[test]
    fn test_shorthand_and_odd_repository_fields() {
        let resp = decode(json!({
            "versions": {
                "1.0.0": { "repository": "https://github.com/a/short.git" },
                "0.1.0": { "repository": ["unexpected"] }
            }
        }));
        assert_eq!(resp.source_url(), "https://github.com/a/short.git");
    }

    #[test]
    fn test_encode_scoped_name() {
        assert_eq!(encode_package_name("@babel/core"), "%40babel%2Fcore");
        assert_eq!(encode_package_name("left-pad"), "left-pad");
    }

    #[tokio::test]
    async fn test_fetch_source_url() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/left-pad");
                then.status(200).json_body(json!({
                    "dist-tags": { "latest": "1.3.0" },
                    "versions": {
                        "1.3.0": { "repository": { "type": "git", "url": "git+https://github.com/foo/left-pad.git" } }
                    }
                }));
            })
            .await;

        let url = fetch_source_url(&Client::new(), &server.base_url(), "left-pad")
            .await
            .unwrap();
        assert_eq!(url, "git+https://github.com/foo/left-pad.git");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_source_url_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken-pkg");
                then.status(404).json_body(json!({ "error": "Not found" }));
            })
            .await;

        let err = fetch_source_url(&Client::new(), &server.base_url(), "broken-pkg")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Status { status: 404, .. }));
    }
}
