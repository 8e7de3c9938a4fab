//! Download and replacement of installed artifact files

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::update::error::InstallError;
use crate::update::source::{Asset, AuthConfig, ReleaseSource};

/// Download `asset` and overwrite the file at `install_path`.
///
/// Cancellation is only observed while the download is in flight. Once the
/// bytes are in memory the replacement always runs to completion.
///
/// Returns the number of bytes written.
pub async fn install(
    source: &dyn ReleaseSource,
    asset: &Asset,
    install_path: &Path,
    auth: &AuthConfig,
    cancel: &CancellationToken,
) -> Result<u64, InstallError> {
    let bytes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(InstallError::Cancelled),
        result = source.download(&asset.download_url, auth) => result?,
    };
    debug!("Downloaded {} ({} bytes)", asset.name, bytes.len());

    let len = bytes.len() as u64;
    let path = install_path.to_path_buf();
    tokio::task::spawn_blocking(move || replace_file(&path, &bytes))
        .await
        .map_err(|e| InstallError::write(install_path, std::io::Error::other(e)))??;
    info!(
        "Replaced {} with {} ({} bytes)",
        install_path.display(),
        asset.name,
        len
    );

    Ok(len)
}

/// Replace `path` with `contents` via a temporary file in the same directory,
/// so the original is never left half-written.
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<(), InstallError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| InstallError::write(path, e))?;
    temp.write_all(contents)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| InstallError::write(path, e))?;

    // Keep the permissions of the file being replaced
    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|e| InstallError::write(path, e))?;
    }

    temp.persist(path)
        .map_err(|e| InstallError::write(path, e.error))?;
    Ok(())
}
