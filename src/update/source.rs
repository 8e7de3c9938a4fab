//! Release source trait for fetching release metadata and assets

#[cfg(test)]
use mockall::automock;

use serde::{Deserialize, Serialize};

use crate::update::error::FetchError;

/// Latest published release of a target's remote source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Raw tag, possibly carrying a leading `v`
    pub tag_name: String,
    /// Assets in feed order
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One downloadable file within a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

impl Asset {
    pub fn new(name: &str, download_url: &str) -> Self {
        Self {
            name: name.to_string(),
            download_url: download_url.to_string(),
        }
    }
}

/// Credential applied to every remote request when enabled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn with_token(token: &str) -> Self {
        Self {
            enabled: true,
            token: Some(token.to_string()),
        }
    }

    /// The token to send, if authentication is enabled and a token is set
    pub fn active_token(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Trait for fetching releases and downloading their assets
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches the latest published release of `owner/repo`
    ///
    /// # Returns
    /// * `Ok(Release)` - Tag and assets of the newest release
    /// * `Err(FetchError)` - Network failure, non-success status or unparseable body
    async fn latest_release(
        &self,
        owner: &str,
        repo: &str,
        auth: &AuthConfig,
    ) -> Result<Release, FetchError>;

    /// Downloads the raw bytes behind an asset's download URL
    async fn download(&self, url: &str, auth: &AuthConfig) -> Result<Vec<u8>, FetchError>;
}
