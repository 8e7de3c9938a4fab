//! Lookup of currently installed artifacts, supplied by the host

use std::path::PathBuf;

use crate::update::version::Version;

/// A target as currently installed by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub version: Version,
    /// File that is overwritten when the target is updated
    pub install_path: PathBuf,
}

/// Trait for mapping a target name to its installed artifact
pub trait ArtifactLookup: Send + Sync {
    /// Returns `None` when the host has nothing installed under `name`
    fn lookup(&self, name: &str) -> Option<InstalledArtifact>;
}

impl<F> ArtifactLookup for F
where
    F: Fn(&str) -> Option<InstalledArtifact> + Send + Sync,
{
    fn lookup(&self, name: &str) -> Option<InstalledArtifact> {
        self(name)
    }
}
