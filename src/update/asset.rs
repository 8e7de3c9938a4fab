//! Asset selection policy

use crate::config::DEFAULT_ASSET_EXTENSION;
use crate::update::source::{Asset, Release};
use crate::update::target::eq_ignore_case;

/// Pick the asset to install from a release.
///
/// With an override, the asset whose name equals it (ignoring case) is
/// chosen and every other asset is ignored. Without one, the first asset in
/// feed order whose name ends with [`DEFAULT_ASSET_EXTENSION`] is chosen.
pub fn select_asset<'a>(release: &'a Release, asset_override: Option<&str>) -> Option<&'a Asset> {
    match asset_override {
        Some(name) => release
            .assets
            .iter()
            .find(|asset| eq_ignore_case(&asset.name, name)),
        None => release
            .assets
            .iter()
            .find(|asset| has_extension(&asset.name, DEFAULT_ASSET_EXTENSION)),
    }
}

/// Human-readable reason for a failed selection
pub fn no_match_detail(asset_override: Option<&str>) -> String {
    match asset_override {
        Some(name) => format!("Asset with specific name '{}' not found.", name),
        None => format!(
            "No {} file found in the latest release.",
            DEFAULT_ASSET_EXTENSION
        ),
    }
}

fn has_extension(name: &str, extension: &str) -> bool {
    name.to_lowercase().ends_with(&extension.to_lowercase())
}
