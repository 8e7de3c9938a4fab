//! Terminal per-target outcomes of a pass

use std::fmt;
use std::path::PathBuf;

use crate::update::target::TargetOrigin;
use crate::update::version::Version;

/// Terminal state of one target for one pass.
///
/// Each variant carries only the data that exists at the step where the
/// pipeline stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Installed version is equal to or newer than the latest release
    UpToDate { installed: Version, latest: Version },
    /// The installed file was replaced with the latest release asset
    Updated {
        from: Version,
        to: Version,
        path: PathBuf,
        bytes: u64,
    },
    /// The host has nothing installed under the target's name
    TargetNotInstalled,
    /// Owner or repository missing from the declaration
    ConfigError { detail: String },
    /// Release metadata could not be fetched, parsed, or its tag parsed
    RemoteFetchError { installed: Version, detail: String },
    /// No asset in the release satisfies the selection policy
    NoMatchingAsset {
        installed: Version,
        latest: Version,
        detail: String,
    },
    /// The selected asset could not be downloaded
    DownloadError {
        installed: Version,
        latest: Version,
        detail: String,
    },
    /// The downloaded asset could not be written over the installed file
    WriteError {
        installed: Version,
        latest: Version,
        detail: String,
    },
    /// The pass was cancelled before this target reached another state
    Cancelled,
    /// The target's task ended abnormally (panic)
    InternalError { detail: String },
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, UpdateOutcome::UpToDate { .. })
    }

    /// True for every state that needs attention
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            UpdateOutcome::Updated { .. } | UpdateOutcome::UpToDate { .. }
        )
    }

    /// Short machine-friendly name of the state
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateOutcome::UpToDate { .. } => "up_to_date",
            UpdateOutcome::Updated { .. } => "updated",
            UpdateOutcome::TargetNotInstalled => "target_not_installed",
            UpdateOutcome::ConfigError { .. } => "config_error",
            UpdateOutcome::RemoteFetchError { .. } => "remote_fetch_error",
            UpdateOutcome::NoMatchingAsset { .. } => "no_matching_asset",
            UpdateOutcome::DownloadError { .. } => "download_error",
            UpdateOutcome::WriteError { .. } => "write_error",
            UpdateOutcome::Cancelled => "cancelled",
            UpdateOutcome::InternalError { .. } => "internal_error",
        }
    }

    /// Installed version before the pass, when the target was found
    pub fn installed_version(&self) -> Option<&Version> {
        match self {
            UpdateOutcome::UpToDate { installed, .. }
            | UpdateOutcome::RemoteFetchError { installed, .. }
            | UpdateOutcome::NoMatchingAsset { installed, .. }
            | UpdateOutcome::DownloadError { installed, .. }
            | UpdateOutcome::WriteError { installed, .. } => Some(installed),
            UpdateOutcome::Updated { from, .. } => Some(from),
            UpdateOutcome::TargetNotInstalled
            | UpdateOutcome::ConfigError { .. }
            | UpdateOutcome::Cancelled
            | UpdateOutcome::InternalError { .. } => None,
        }
    }

    /// Latest remote version, when it was resolved
    pub fn latest_version(&self) -> Option<&Version> {
        match self {
            UpdateOutcome::UpToDate { latest, .. }
            | UpdateOutcome::NoMatchingAsset { latest, .. }
            | UpdateOutcome::DownloadError { latest, .. }
            | UpdateOutcome::WriteError { latest, .. } => Some(latest),
            UpdateOutcome::Updated { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            UpdateOutcome::ConfigError { detail }
            | UpdateOutcome::RemoteFetchError { detail, .. }
            | UpdateOutcome::NoMatchingAsset { detail, .. }
            | UpdateOutcome::DownloadError { detail, .. }
            | UpdateOutcome::WriteError { detail, .. }
            | UpdateOutcome::InternalError { detail } => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Updated { from, to, .. } => {
                write!(f, "Updated from v{} to v{}", from, to)
            }
            UpdateOutcome::UpToDate { installed, .. } => {
                write!(f, "Is up to date (v{})", installed)
            }
            UpdateOutcome::TargetNotInstalled => f.write_str("Plugin not found on this server."),
            UpdateOutcome::Cancelled => f.write_str("Check cancelled before completion."),
            other => write!(f, "Error - {}", other.detail().unwrap_or_default()),
        }
    }
}

/// Outcome of one target together with its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub name: String,
    pub origin: TargetOrigin,
    pub outcome: UpdateOutcome,
}
