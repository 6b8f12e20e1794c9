use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{send_json, LookupError};
use crate::models::LicenseDescriptor;

/// Subset of `GET /repos/{owner}/{repo}`.
#[derive(Debug, Default, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub license: Option<LicenseDescriptor>,
}

/// Fetch the license GitHub detected for `owner/repo`.
pub async fn fetch_license(
    client: &Client,
    api_url: &str,
    owner: &str,
    repo: &str,
) -> Result<LicenseDescriptor, LookupError> {
    let url = format!("{}/repos/{}/{}", api_url, owner, repo);
    let info: RepoInfo = send_json(client, &url).await?;

    let license = info.license.unwrap_or_default();
    if license.is_empty() {
        debug!(owner, repo, "repository declares no license");
    }
    Ok(license)
}
