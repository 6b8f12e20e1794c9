use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Accepts `https://`, `git+https://`, `git+ssh://git@`, `git://` and bare `//`
/// prefixes in front of `github.com/<owner>/<repo>.git`.
const GITHUB_URL_PATTERN: &str = r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:)?//(?:[^@/\s]+@)?github\.com/([A-Za-z0-9_\-]+)/([A-Za-z0-9_.\-]+?)\.git(?:#.*)?$";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceUrlError {
    #[error("not a github url: {0:?}")]
    NotGithub(String),
}

/// Owner and repository name of a GitHub-hosted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRepo {
    pub owner: String,
    pub repo: String,
}

fn github_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GITHUB_URL_PATTERN).expect("github url pattern is valid"))
}

/// Extract `(owner, repo)` from a canonical source URL.
pub fn parse(url: &str) -> Result<SourceRepo, SourceUrlError> {
    let caps = github_url_regex()
        .captures(url.trim())
        .ok_or_else(|| SourceUrlError::NotGithub(url.to_string()))?;

    Ok(SourceRepo {
        owner: caps[1].to_string(),
        repo: caps[2].to_string(),
    })
}
