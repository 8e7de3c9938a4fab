//! Update targets and the registry of dynamically registered targets

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where a target came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOrigin {
    /// Declared in the repositories file
    File,
    /// Registered at runtime by another component
    Integration,
}

impl TargetOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOrigin::File => "File",
            TargetOrigin::Integration => "Integration",
        }
    }
}

/// Remote release feed of a target, as declared in `repositories.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSource {
    #[serde(rename = "user", alias = "owner")]
    pub owner: String,
    #[serde(rename = "repository", alias = "repo")]
    pub repo: String,
    /// Exact asset file name to pick instead of the first matching extension
    #[serde(
        rename = "fileName",
        alias = "assetName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_name: Option<String>,
}

impl TargetSource {
    pub fn new(owner: &str, repo: &str, asset_name: Option<&str>) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            asset_name: asset_name.map(str::to_string),
        }
    }

    /// Owner and repository are both required to query the release feed
    pub fn is_processable(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }

    /// The override only counts when it is non-empty
    pub fn asset_override(&self) -> Option<&str> {
        self.asset_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// A named update subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub source: TargetSource,
    pub origin: TargetOrigin,
}

/// Target map keyed by name, compared case-insensitively
pub type TargetMap = IndexMap<String, TargetSource>;

fn key_of(name: &str) -> String {
    name.to_lowercase()
}

/// Case-insensitive name comparison, folding non-ASCII letters too
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// The merged set of targets for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    entries: IndexMap<String, Target>,
}

impl TargetSet {
    /// Merge dynamic and file targets. File entries replace dynamic entries
    /// of the same name, compared case-insensitively.
    pub fn merge(dynamic: &TargetMap, file: &TargetMap) -> Self {
        let mut entries = IndexMap::with_capacity(dynamic.len() + file.len());

        let sources = dynamic
            .iter()
            .map(|entry| (entry, TargetOrigin::Integration))
            .chain(file.iter().map(|entry| (entry, TargetOrigin::File)));

        for ((name, source), origin) in sources {
            entries.insert(
                key_of(name),
                Target {
                    name: name.clone(),
                    source: source.clone(),
                    origin,
                },
            );
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.entries.get(&key_of(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for TargetSet {
    type Item = Target;
    type IntoIter = indexmap::map::IntoValues<String, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Targets registered at runtime by other components.
///
/// Safe to share between threads; registration may happen at any time,
/// including while a pass is running on an earlier snapshot.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    entries: Mutex<IndexMap<String, (String, TargetSource)>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, (String, TargetSource)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a target for updates.
    ///
    /// Re-registering a name replaces the previous entry. Empty name, owner
    /// or repository is rejected and nothing is stored. Returns whether the
    /// registration was accepted.
    pub fn register(&self, name: &str, owner: &str, repo: &str, asset_name: Option<&str>) -> bool {
        if name.is_empty() || owner.is_empty() || repo.is_empty() {
            warn!(
                "[Integration] Rejected registration with empty name, owner or repository (name: '{}', source: '{}/{}')",
                name, owner, repo
            );
            return false;
        }

        let previous = self.lock().insert(
            key_of(name),
            (name.to_string(), TargetSource::new(owner, repo, asset_name)),
        );

        if previous.is_some() {
            debug!(
                "[Integration] '{}' was already registered. Overwriting previous registration.",
                name
            );
        }
        debug!(
            "[Integration] '{}' registered for updates from {}/{}",
            name, owner, repo
        );
        true
    }

    /// Copy of the current registrations, keyed by the registered name
    pub fn snapshot(&self) -> TargetMap {
        self.lock()
            .values()
            .map(|(name, source)| (name.clone(), source.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
