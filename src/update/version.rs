//! Dotted numeric versions such as `1.3.3.0`

use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::update::error::VersionError;

/// Accepted number of dotted components
const COMPONENT_COUNT: RangeInclusive<usize> = 2..=4;

/// Largest accepted component value
const MAX_COMPONENT: u64 = i32::MAX as u64;

/// A dotted numeric version compared component-wise.
///
/// Missing trailing components compare as zero, so `1.2` and `1.2.0.0`
/// are equal. The original component count is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    pub fn new(components: Vec<u64>) -> Self {
        Self { components }
    }

    /// Parse the canonical dotted numeric form: `major.minor[.build[.revision]]`.
    ///
    /// Between two and four components, each a non-empty run of ASCII digits
    /// no larger than `i32::MAX`; signs, whitespace and pre-release suffixes
    /// are rejected.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if input.is_empty() {
            return Err(VersionError::Empty);
        }

        let count = input.split('.').count();
        if !COMPONENT_COUNT.contains(&count) {
            return Err(VersionError::ComponentCount {
                input: input.to_string(),
                count,
            });
        }

        let components = input
            .split('.')
            .map(|component| {
                if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid(input, component));
                }
                component
                    .parse::<u64>()
                    .ok()
                    .filter(|value| *value <= MAX_COMPONENT)
                    .ok_or_else(|| invalid(input, component))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }

    /// Parse a release tag, stripping any leading `v`/`V` characters first.
    pub fn from_tag(tag: &str) -> Result<Self, VersionError> {
        Self::parse(strip_tag_prefix(tag))
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// True when `self` is strictly greater than `installed`.
    pub fn is_newer_than(&self, installed: &Version) -> bool {
        self > installed
    }
}

fn invalid(input: &str, component: &str) -> VersionError {
    VersionError::InvalidComponent {
        input: input.to_string(),
        component: component.to_string(),
    }
}

/// Strip every leading `v`/`V` from a tag (`vV1.0` -> `1.0`).
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.trim_start_matches(['v', 'V'])
}

/// Compare two version strings, tags with a `v` prefix included.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(Version::from_tag(a)?.cmp(&Version::from_tag(b)?))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let a = self.components.get(i).copied().unwrap_or(0);
                let b = other.components.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}
