//! Bounded-concurrency license resolution.
//!
//! Every dependency goes through the same three steps:
//!
//! ```text
//! name ──fetch_source_url──▶ url ──source_url::parse──▶ owner/repo ──fetch_license──▶ license
//! ```
//!
//! At most `concurrency` dependencies are in flight at once. Each one yields
//! exactly one [`DependencyOutcome`]; a failing step is recorded as a
//! [`LicenseResult::Error`] placeholder naming the step, and the first failure
//! observed is also returned as the representative [`ResolveError`].

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::models::{DependencyOutcome, LicenseDescriptor, LicenseResult, ResolveStage};
use crate::registry::{Lookup, LookupError};
use crate::source_url::{self, SourceUrlError};

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    SourceUrl(#[from] SourceUrlError),
}

/// A failed resolution step for one dependency.
#[derive(Debug, Error)]
#[error("{dependency}: {stage}: {cause}")]
pub struct ResolveError {
    pub dependency: String,
    pub stage: ResolveStage,
    #[source]
    pub cause: StepError,
}

/// Everything a [`Resolver::resolve`] call produced.
#[derive(Debug)]
pub struct Resolution {
    /// One entry per unique input name, in completion order.
    pub outcomes: Vec<DependencyOutcome>,
    /// One of the failures, if any step failed anywhere.
    pub error: Option<ResolveError>,
    /// Number of dependencies whose result is an error placeholder.
    pub failures: usize,
}

impl Resolution {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Resolver<L> {
    lookup: Arc<L>,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl<L: Lookup> Resolver<L> {
    pub fn new(lookup: Arc<L>, concurrency: usize) -> Self {
        Self {
            lookup,
            concurrency: concurrency.max(1),
            progress: None,
        }
    }

    /// Tick `progress` once per finished dependency.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolve the license of every name in `names`.
    ///
    /// Returns only after every dependency has an outcome.
    pub async fn resolve<I>(&self, names: I) -> Resolution
    where
        I: IntoIterator<Item = String>,
    {
        let names: BTreeSet<String> = names.into_iter().collect();
        let total = names.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        info!(
            dependencies = total,
            concurrency = self.concurrency,
            "resolving licenses"
        );

        let mut tasks: FuturesUnordered<_> = names
            .into_iter()
            .map(|name| {
                let semaphore = Arc::clone(&semaphore);
                let lookup = Arc::clone(&self.lookup);
                async move {
                    // Held until the task finishes; the semaphore is never closed.
                    let _permit = semaphore.acquire().await;
                    resolve_one(lookup.as_ref(), name).await
                }
            })
            .collect();

        let mut resolution = Resolution {
            outcomes: Vec::with_capacity(total),
            error: None,
            failures: 0,
        };

        while let Some((outcome, error)) = tasks.next().await {
            if let Some(err) = error {
                warn!(
                    dependency = %err.dependency,
                    stage = %err.stage,
                    error = %err.cause,
                    "license resolution failed"
                );
                resolution.failures += 1;
                resolution.error.get_or_insert(err);
            }
            resolution.outcomes.push(outcome);

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        debug!(
            resolved = total - resolution.failures,
            failed = resolution.failures,
            "license resolution finished"
        );
        resolution
    }
}

/// Run the three lookup steps for a single dependency.
async fn resolve_one<L: Lookup + ?Sized>(
    lookup: &L,
    name: String,
) -> (DependencyOutcome, Option<ResolveError>) {
    match resolve_license(lookup, &name).await {
        Ok(license) => (
            DependencyOutcome {
                name,
                license: LicenseResult::License(license),
            },
            None,
        ),
        Err((stage, cause)) => (
            DependencyOutcome {
                name: name.clone(),
                license: LicenseResult::Error(stage),
            },
            Some(ResolveError {
                dependency: name,
                stage,
                cause,
            }),
        ),
    }
}

async fn resolve_license<L: Lookup + ?Sized>(
    lookup: &L,
    name: &str,
) -> Result<LicenseDescriptor, (ResolveStage, StepError)> {
    let url = lookup
        .fetch_source_url(name)
        .await
        .map_err(|e| (ResolveStage::FetchSourceUrl, StepError::from(e)))?;

    let repo =
        source_url::parse(&url).map_err(|e| (ResolveStage::ParseSourceUrl, StepError::from(e)))?;
    debug!(dependency = name, owner = %repo.owner, repo = %repo.repo, "found source repository");

    lookup
        .fetch_license(&repo.owner, &repo.repo)
        .await
        .map_err(|e| (ResolveStage::FetchLicense, StepError::from(e)))
}
