//! `license-fetchr`: resolve the upstream GitHub license of every npm dependency.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install the `tracing` subscriber.
//! 2. Load config ([`config::load_config`]).
//! 3. Read dependency names from `package.json` ([`manifest`]).
//! 4. Resolve licenses with bounded concurrency ([`resolver`]): npm registry
//!    → source URL ([`source_url`]) → GitHub license ([`registry`]).
//! 5. Classify licenses and apply policy ([`license`], [`config::apply_policy`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0` (clean) or `1` (an [`models::PolicyVerdict::Error`] or a failed lookup).

mod cli;
mod config;
mod license;
mod manifest;
mod models;
mod registry;
mod report;
mod resolver;
mod source_url;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use cli::{Cli, ReportFormat};
use config::{apply_policy, load_config};
use license::classifier::classify;
use models::{DependencyOutcome, PolicyVerdict, ReportEntry};
use registry::HttpLookup;
use resolver::{Resolution, Resolver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());

    let project_dir = if path.is_dir() {
        path.as_path()
    } else {
        path.parent().unwrap_or(Path::new("."))
    };
    let mut config = load_config(project_dir, cli.config.as_deref())?;
    if let Some(n) = cli.concurrency {
        config.resolver.concurrency = n;
    }

    let names = manifest::read(&path, &cli.sections())?;

    let lookup = Arc::new(HttpLookup::new(&config.resolver)?);
    let mut resolver = Resolver::new(lookup, config.resolver.concurrency);
    if !cli.quiet {
        eprintln!(
            "  {} {} dependencies ({} at a time)",
            "→".cyan(),
            names.len(),
            resolver.concurrency()
        );
    }

    let pb = progress_bar(names.len(), cli.quiet)?;
    if let Some(pb) = &pb {
        resolver = resolver.with_progress(pb.clone());
    }

    let Resolution {
        outcomes,
        error,
        failures,
    } = resolver.resolve(names).await;
    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    let entries = evaluate(&config, outcomes);

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&entries, &path, cli.verbose, cli.quiet);
        }
        ReportFormat::Json => {
            println!("{}", report::json::render(&entries)?);
        }
    }

    if let Some(err) = &error {
        eprintln!(
            "{} {} of {} dependencies could not be resolved (e.g. {})",
            "warning:".yellow().bold(),
            failures,
            entries.len(),
            err
        );
    }

    let has_errors = entries.iter().any(|e| e.verdict == PolicyVerdict::Error);
    if has_errors || error.is_some() {
        std::process::exit(1);
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` for this crate with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,license_fetchr=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(len: usize, quiet: bool) -> Result<Option<ProgressBar>> {
    if quiet {
        return Ok(None);
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(Some(pb))
}

/// Classify each outcome and apply the policy, sorted by dependency name.
fn evaluate(config: &config::Config, outcomes: Vec<DependencyOutcome>) -> Vec<ReportEntry> {
    let mut entries: Vec<ReportEntry> = outcomes
        .into_iter()
        .map(|outcome| ReportEntry {
            risk: classify(&outcome.license),
            verdict: apply_policy(config, &outcome.license),
            name: outcome.name,
            license: outcome.license,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ResolverConfig};
    use crate::models::{LicenseDescriptor, LicenseResult, LicenseRisk, ResolveStage};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_evaluate_sorts_and_classifies() {
        let outcomes = vec![
            DependencyOutcome {
                name: "zod".to_string(),
                license: LicenseResult::License(LicenseDescriptor {
                    key: "mit".to_string(),
                    spdx_id: Some("MIT".to_string()),
                    ..Default::default()
                }),
            },
            DependencyOutcome {
                name: "abandoned".to_string(),
                license: LicenseResult::Error(ResolveStage::ParseSourceUrl),
            },
        ];

        let entries = evaluate(&Config::default(), outcomes);
        assert_eq!(entries[0].name, "abandoned");
        assert_eq!(entries[0].risk, LicenseRisk::Unknown);
        assert_eq!(entries[0].verdict, PolicyVerdict::Warn);
        assert_eq!(entries[1].risk, LicenseRisk::Permissive);
        assert_eq!(entries[1].verdict, PolicyVerdict::Pass);
    }

    #[tokio::test]
    async fn test_manifest_to_licenses_over_http() {
        let server = MockServer::start_async().await;
        server
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
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/foo/left-pad");
                then.status(200).json_body(json!({
                    "license": { "key": "mit", "name": "MIT", "spdx_id": "MIT", "url": "https://api.github.com/licenses/mit" }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken-pkg");
                then.status(404).json_body(json!({ "error": "Not found" }));
            })
            .await;

        let config = ResolverConfig {
            registry_url: server.base_url(),
            github_api_url: server.base_url(),
            ..Default::default()
        };
        let lookup = Arc::new(HttpLookup::new(&config).unwrap());
        let resolver = Resolver::new(lookup, config.concurrency);

        let names = manifest::dependency_names(
            br#"{ "dependencies": { "left-pad": "^1.0.0" } }"#,
            &manifest::Section::ALL,
        )
        .unwrap();
        let resolution = resolver.resolve(names).await;
        assert!(resolution.is_ok());
        assert_eq!(resolution.outcomes.len(), 1);
        assert_eq!(resolution.outcomes[0].name, "left-pad");
        assert_eq!(resolution.outcomes[0].license.key(), "mit");

        let resolution = resolver.resolve(vec!["broken-pkg".to_string()]).await;
        assert_eq!(resolution.outcomes.len(), 1);
        assert_eq!(
            resolution.outcomes[0].license,
            LicenseResult::Error(ResolveStage::FetchSourceUrl)
        );
        assert!(resolution.error.is_some());
    }
}
