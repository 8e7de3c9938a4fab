//! Shared utilities for integration tests

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mockito::{Mock, Server};
use serde_json::json;
use tempfile::TempDir;

use plugin_updater::host::{MANIFEST_FILE, Manifest, ManifestEntry, PluginDirectory};
use plugin_updater::update::orchestrator::Updater;
use plugin_updater::update::sources::GitHubReleases;

/// A temporary plugins directory with a `plugins.json` manifest
pub struct TestPlugins {
    _temp_dir: TempDir,
    pub directory: PluginDirectory,
}

impl TestPlugins {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let directory = PluginDirectory::new(temp_dir.path());
        Self {
            _temp_dir: temp_dir,
            directory,
        }
    }

    /// Install `file` with `contents` and record it under `name` at `version`
    pub fn install(&self, name: &str, version: &str, file: &str, contents: &[u8]) -> PathBuf {
        let path = self.directory.dir().join(file);
        std::fs::write(&path, contents).unwrap();

        let mut manifest: Manifest = self.directory.manifest().unwrap();
        manifest.insert(
            name.to_string(),
            ManifestEntry {
                version: version.to_string(),
                file: file.to_string(),
            },
        );
        std::fs::write(
            self.directory.dir().join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();

        path
    }
}

/// Updater wired to the GitHub source at `server` and to `plugins`
pub fn create_updater(server: &Server, plugins: &TestPlugins) -> Updater {
    let source = GitHubReleases::new(&server.url(), Duration::from_secs(5)).unwrap();
    Updater::new(Arc::new(source), Arc::new(plugins.directory.clone()))
}

/// URL the release JSON advertises for an asset
pub fn asset_url(server: &Server, owner: &str, repo: &str, asset: &str) -> String {
    format!("{}/download/{}/{}/{}", server.url(), owner, repo, asset)
}

/// Mock `releases/latest` for `owner/repo` returning `tag` and `assets`
pub async fn mock_latest_release(
    server: &mut Server,
    owner: &str,
    repo: &str,
    tag: &str,
    assets: &[&str],
) -> Mock {
    let assets: Vec<_> = assets
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "browser_download_url": asset_url(server, owner, repo, name),
            })
        })
        .collect();
    let body = json!({ "tag_name": tag, "assets": assets });

    server
        .mock(
            "GET",
            format!("/repos/{}/{}/releases/latest", owner, repo).as_str(),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Mock the binary download of one asset
pub async fn mock_asset(
    server: &mut Server,
    owner: &str,
    repo: &str,
    asset: &str,
    contents: &[u8],
) -> Mock {
    server
        .mock(
            "GET",
            format!("/download/{}/{}/{}", owner, repo, asset).as_str(),
        )
        .match_header("accept", "application/octet-stream")
        .with_status(200)
        .with_body(contents)
        .create_async()
        .await
}
