//! Plugin directory host: installed-artifact lookup backed by a manifest

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{self, ConfigError};
use crate::update::installed::{ArtifactLookup, InstalledArtifact};
use crate::update::outcome::{UpdateOutcome, UpdateReport};
use crate::update::target::eq_ignore_case;
use crate::update::version::Version;

pub const MANIFEST_FILE: &str = "plugins.json";

/// One installed plugin as recorded in `plugins.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Kept as text so one bad entry does not invalidate the manifest
    pub version: String,
    /// File name relative to the plugins directory
    pub file: String,
}

pub type Manifest = IndexMap<String, ManifestEntry>;

/// A directory of plugin files described by `plugins.json`
#[derive(Debug, Clone)]
pub struct PluginDirectory {
    dir: PathBuf,
}

impl PluginDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Current manifest; empty when the file does not exist
    pub fn manifest(&self) -> Result<Manifest, ConfigError> {
        Ok(config::try_load(&self.manifest_path())?.unwrap_or_default())
    }

    /// Write the new version of every updated target back into the manifest.
    ///
    /// Returns the number of entries changed.
    pub fn record_updates(&self, reports: &[UpdateReport]) -> Result<usize, ConfigError> {
        let mut manifest = self.manifest()?;
        let mut changed = 0;

        for report in reports {
            let UpdateOutcome::Updated { to, .. } = &report.outcome else {
                continue;
            };
            match find_entry_mut(&mut manifest, &report.name) {
                Some(entry) => {
                    entry.version = to.to_string();
                    changed += 1;
                }
                None => warn!("{} is no longer in {}", report.name, MANIFEST_FILE),
            }
        }

        if changed > 0 {
            config::write_json(&self.manifest_path(), &manifest)?;
            debug!("Recorded {} update(s) in {}", changed, self.manifest_path().display());
        }
        Ok(changed)
    }
}

impl ArtifactLookup for PluginDirectory {
    fn lookup(&self, name: &str) -> Option<InstalledArtifact> {
        let manifest = match self.manifest() {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        let (_, entry) = manifest
            .iter()
            .find(|(key, _)| eq_ignore_case(key, name))?;

        match Version::parse(&entry.version) {
            Ok(version) => Some(InstalledArtifact {
                version,
                install_path: self.dir.join(&entry.file),
            }),
            Err(e) => {
                warn!("Invalid installed version for {}: {}", name, e);
                None
            }
        }
    }
}

fn find_entry_mut<'a>(manifest: &'a mut Manifest, name: &str) -> Option<&'a mut ManifestEntry> {
    manifest
        .iter_mut()
        .find(|(key, _)| eq_ignore_case(key, name))
        .map(|(_, entry)| entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::target::TargetOrigin;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        std::fs::write(dir.join(MANIFEST_FILE), json).unwrap();
    }

    fn report(name: &str, outcome: UpdateOutcome) -> UpdateReport {
        UpdateReport {
            name: name.to_string(),
            origin: TargetOrigin::File,
            outcome,
        }
    }

    #[test]
    fn lookup_is_case_insensitive_and_resolves_path() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(
            temp_dir.path(),
            r#"{"SCPStats": {"version": "1.2.3", "file": "SCPStats.dll"}}"#,
        );
        let plugins = PluginDirectory::new(temp_dir.path());

        let artifact = plugins.lookup("scpstats").unwrap();

        assert_eq!(artifact.version, Version::parse("1.2.3").unwrap());
        assert_eq!(artifact.install_path, temp_dir.path().join("SCPStats.dll"));
    }

    #[test]
    fn lookup_folds_non_ascii_case() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(
            temp_dir.path(),
            r#"{"Ünlock": {"version": "1.0", "file": "Unlock.dll"}}"#,
        );
        let plugins = PluginDirectory::new(temp_dir.path());

        assert!(plugins.lookup("ünlock").is_some());
    }

    #[test]
    fn lookup_returns_none_for_missing_or_invalid_entries() {
        let temp_dir = TempDir::new().unwrap();
        let plugins = PluginDirectory::new(temp_dir.path());
        assert_eq!(plugins.lookup("Anything"), None);

        write_manifest(
            temp_dir.path(),
            r#"{"Broken": {"version": "beta", "file": "Broken.dll"}}"#,
        );
        assert_eq!(plugins.lookup("Broken"), None);
        assert_eq!(plugins.lookup("Other"), None);

        write_manifest(temp_dir.path(), "not json");
        assert_eq!(plugins.lookup("Broken"), None);
    }

    #[test]
    fn lookup_reads_manifest_fresh_on_every_call() {
        let temp_dir = TempDir::new().unwrap();
        let plugins = PluginDirectory::new(temp_dir.path());
        assert_eq!(plugins.lookup("Late"), None);

        write_manifest(
            temp_dir.path(),
            r#"{"Late": {"version": "0.1", "file": "Late.dll"}}"#,
        );

        assert!(plugins.lookup("Late").is_some());
    }

    #[test]
    fn record_updates_writes_only_updated_targets() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(
            temp_dir.path(),
            r#"{
                "Alpha": {"version": "1.0.0", "file": "Alpha.dll"},
                "Beta": {"version": "2.0.0", "file": "Beta.dll"}
            }"#,
        );
        let plugins = PluginDirectory::new(temp_dir.path());
        let reports = vec![
            report(
                "alpha",
                UpdateOutcome::Updated {
                    from: Version::parse("1.0.0").unwrap(),
                    to: Version::parse("1.1.0").unwrap(),
                    path: temp_dir.path().join("Alpha.dll"),
                    bytes: 4,
                },
            ),
            report("Beta", UpdateOutcome::TargetNotInstalled),
        ];

        let changed = plugins.record_updates(&reports).unwrap();

        assert_eq!(changed, 1);
        let manifest = plugins.manifest().unwrap();
        assert_eq!(manifest["Alpha"].version, "1.1.0");
        assert_eq!(manifest["Beta"].version, "2.0.0");
    }

    #[test]
    fn record_updates_without_updates_leaves_file_alone() {
        let temp_dir = TempDir::new().unwrap();
        let plugins = PluginDirectory::new(temp_dir.path());

        let changed = plugins
            .record_updates(&[report("Alpha", UpdateOutcome::Cancelled)])
            .unwrap();

        assert_eq!(changed, 0);
        assert!(!plugins.manifest_path().exists());
    }
}
