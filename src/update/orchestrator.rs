//! Concurrent update pass over a merged target set

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::update::asset::{no_match_detail, select_asset};
use crate::update::error::InstallError;
use crate::update::installed::ArtifactLookup;
use crate::update::installer;
use crate::update::outcome::{UpdateOutcome, UpdateReport};
use crate::update::source::{AuthConfig, ReleaseSource};
use crate::update::target::{Target, TargetSet};
use crate::update::version::Version;

/// Drives update passes against a release source and the host's installed artifacts
pub struct Updater {
    source: Arc<dyn ReleaseSource>,
    lookup: Arc<dyn ArtifactLookup>,
    max_concurrency: usize,
}

impl Updater {
    pub fn new(source: Arc<dyn ReleaseSource>, lookup: Arc<dyn ArtifactLookup>) -> Self {
        Self {
            source,
            lookup,
            max_concurrency: 0,
        }
    }

    /// Limit how many target pipelines run at once (0 = one per target)
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Run one pass over every target.
    ///
    /// Each target runs in its own task, so a failure or panic in one
    /// pipeline never affects another. Returns one report per target, in
    /// target order, once every pipeline has reached a terminal state.
    pub async fn run_pass(
        &self,
        targets: &TargetSet,
        auth: &AuthConfig,
        cancel: &CancellationToken,
    ) -> Vec<UpdateReport> {
        info!("Starting update check for {} targets", targets.len());

        let auth = Arc::new(auth.clone());
        let limiter = (self.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(self.max_concurrency)));

        let tasks = targets.iter().cloned().map(|target| {
            let source = Arc::clone(&self.source);
            let lookup = Arc::clone(&self.lookup);
            let auth = Arc::clone(&auth);
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            let task_target = target.clone();

            let handle = tokio::spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                process_target(&*source, lookup, &task_target, &auth, &cancel).await
            });

            async move {
                let outcome = handle.await.unwrap_or_else(|e| {
                    error!("Update task for {} ended abnormally: {}", target.name, e);
                    UpdateOutcome::InternalError {
                        detail: format!("Update task ended abnormally: {}", e),
                    }
                });
                debug!(plugin = %target.name, outcome = outcome.kind(), "Target finished");
                UpdateReport {
                    name: target.name,
                    origin: target.origin,
                    outcome,
                }
            }
        });

        let reports = join_all(tasks).await;

        let updated = reports.iter().filter(|r| r.outcome.is_updated()).count();
        let failed = reports.iter().filter(|r| r.outcome.is_failure()).count();
        info!(
            "Update check finished: {} updated, {} failed, {} total",
            updated,
            failed,
            reports.len()
        );

        reports
    }
}

/// Run the full pipeline for one target and return its terminal outcome
pub async fn process_target(
    source: &dyn ReleaseSource,
    lookup: Arc<dyn ArtifactLookup>,
    target: &Target,
    auth: &AuthConfig,
    cancel: &CancellationToken,
) -> UpdateOutcome {
    let name = &target.name;
    let declared = &target.source;

    if !declared.is_processable() {
        debug!("{}: owner or repository missing", name);
        return UpdateOutcome::ConfigError {
            detail: "The 'user' or 'repository' field is missing in the configuration."
                .to_string(),
        };
    }

    let lookup_name = name.clone();
    let installed = match tokio::task::spawn_blocking(move || lookup.lookup(&lookup_name)).await {
        Ok(Some(installed)) => installed,
        Ok(None) => {
            debug!("{}: not installed on this host", name);
            return UpdateOutcome::TargetNotInstalled;
        }
        Err(e) => {
            error!("{}: installed lookup ended abnormally: {}", name, e);
            return UpdateOutcome::InternalError {
                detail: format!("Installed lookup ended abnormally: {}", e),
            };
        }
    };

    let release = tokio::select! {
        biased;
        _ = cancel.cancelled() => return UpdateOutcome::Cancelled,
        result = source.latest_release(&declared.owner, &declared.repo, auth) => result,
    };
    let release = match release {
        Ok(release) => release,
        Err(e) => {
            warn!("{}: failed to fetch latest release: {}", name, e);
            return UpdateOutcome::RemoteFetchError {
                installed: installed.version,
                detail: format!("Could not fetch latest release data from GitHub: {}", e),
            };
        }
    };

    let latest = match Version::from_tag(&release.tag_name) {
        Ok(version) => version,
        Err(e) => {
            warn!("{}: unparseable release tag '{}'", name, release.tag_name);
            return UpdateOutcome::RemoteFetchError {
                installed: installed.version,
                detail: format!(
                    "Could not parse version from tag '{}': {}",
                    release.tag_name, e
                ),
            };
        }
    };

    if !latest.is_newer_than(&installed.version) {
        debug!("{}: v{} is up to date (latest v{})", name, installed.version, latest);
        return UpdateOutcome::UpToDate {
            installed: installed.version,
            latest,
        };
    }

    let asset_override = declared.asset_override();
    let Some(asset) = select_asset(&release, asset_override) else {
        return UpdateOutcome::NoMatchingAsset {
            installed: installed.version,
            latest,
            detail: no_match_detail(asset_override),
        };
    };

    info!(
        "{}: updating v{} -> v{} from {}",
        name, installed.version, latest, asset.name
    );

    match installer::install(source, asset, &installed.install_path, auth, cancel).await {
        Ok(bytes) => UpdateOutcome::Updated {
            from: installed.version,
            to: latest,
            path: installed.install_path,
            bytes,
        },
        Err(InstallError::Download(e)) => UpdateOutcome::DownloadError {
            installed: installed.version,
            latest,
            detail: format!("Failed to download '{}': {}", asset.name, e),
        },
        Err(e @ InstallError::Write { .. }) => {
            error!("{}: {}", name, e);
            UpdateOutcome::WriteError {
                installed: installed.version,
                latest,
                detail: format!("{} (check file permissions or if it's locked)", e),
            }
        }
        Err(InstallError::Cancelled) => UpdateOutcome::Cancelled,
    }
}
