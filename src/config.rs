use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::license::license_id;
use crate::models::{LicenseResult, PolicyVerdict};

const CONFIG_DIR: &str = ".license-fetchr";
const CONFIG_FILE: &str = "config.toml";

/// Root configuration structure, deserialized from `.license-fetchr/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// License policy rules.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Remote lookup and fan-out settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Defines how resolved licenses are evaluated.
#[derive(Debug, Deserialize)]
pub struct PolicyConfig {
    /// Verdict applied to any license not explicitly listed in `licenses`.
    /// Defaults to `warn`.
    #[serde(default = "default_policy_action")]
    pub default: PolicyAction,
    /// Per-license overrides keyed by SPDX identifier (e.g. `"MIT"`, `"GPL-3.0"`).
    /// Matched case-insensitively.
    #[serde(default)]
    pub licenses: HashMap<String, PolicyAction>,
}

fn default_policy_action() -> PolicyAction {
    PolicyAction::Warn
}

/// The action to take when a dependency's license matches a policy rule.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    Pass,
    Warn,
    /// The CLI exits with code 1.
    Error,
}

impl PolicyAction {
    pub fn to_verdict(&self) -> PolicyVerdict {
        match self {
            PolicyAction::Pass => PolicyVerdict::Pass,
            PolicyAction::Warn => PolicyVerdict::Warn,
            PolicyAction::Error => PolicyVerdict::Error,
        }
    }
}

impl Default for PolicyConfig {
    /// Permissive licenses pass, weak copyleft and unresolved licenses warn,
    /// strong copyleft fails.
    fn default() -> Self {
        let licenses = [
            ("MIT", PolicyAction::Pass),
            ("Apache-2.0", PolicyAction::Pass),
            ("BSD-2-Clause", PolicyAction::Pass),
            ("BSD-3-Clause", PolicyAction::Pass),
            ("ISC", PolicyAction::Pass),
            ("0BSD", PolicyAction::Pass),
            ("Unlicense", PolicyAction::Pass),
            ("LGPL-2.1", PolicyAction::Warn),
            ("LGPL-3.0", PolicyAction::Warn),
            ("MPL-2.0", PolicyAction::Warn),
            ("GPL-2.0", PolicyAction::Error),
            ("GPL-3.0", PolicyAction::Error),
            ("AGPL-3.0", PolicyAction::Error),
            ("unknown", PolicyAction::Warn),
        ]
        .into_iter()
        .map(|(id, action)| (id.to_string(), action))
        .collect();

        PolicyConfig {
            default: PolicyAction::Warn,
            licenses,
        }
    }
}

/// Settings for the lookup client and the resolver's fan-out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum number of dependencies resolved at the same time.
    pub concurrency: usize,
    /// Timeout applied to each individual HTTP request.
    pub timeout_secs: u64,
    pub registry_url: String,
    pub github_api_url: String,
    /// GitHub rejects API requests without a `User-Agent`.
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout_secs: 10,
            registry_url: "https://registry.npmjs.org".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            user_agent: format!("license-fetchr/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.license-fetchr/config.toml`
/// 3. `~/.config/license-fetchr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(CONFIG_DIR).join(CONFIG_FILE);
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("license-fetchr")
            .join(CONFIG_FILE);
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

/// Determine the policy verdict for a resolved license.
///
/// Error placeholders and repositories without a license are evaluated as `unknown`.
pub fn apply_policy(config: &Config, license: &LicenseResult) -> PolicyVerdict {
    let id = license_id(license);
    let licenses = &config.policy.licenses;

    // Exact key first; among case-insensitive matches the smallest key wins.
    licenses
        .get(id)
        .or_else(|| {
            licenses
                .iter()
                .filter(|(key, _)| key.eq_ignore_ascii_case(id))
                .min_by(|a, b| a.0.cmp(b.0))
                .map(|(_, action)| action)
        })
        .map(PolicyAction::to_verdict)
        .unwrap_or_else(|| config.policy.default.to_verdict())
}
