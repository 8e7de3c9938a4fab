//! GitHub Releases API source implementation

use std::time::Duration;

use reqwest::RequestBuilder;
use tracing::{debug, warn};

use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::update::error::FetchError;
use crate::update::source::{AuthConfig, Release, ReleaseSource};

/// Release source backed by the GitHub Releases API
pub struct GitHubReleases {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubReleases {
    /// Creates a source against a custom base URL with the given request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a source against api.github.com with the default timeout
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(
            DEFAULT_API_BASE_URL,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

fn authorize(request: RequestBuilder, auth: &AuthConfig) -> RequestBuilder {
    match auth.active_token() {
        Some(token) => request.header("Authorization", format!("token {}", token)),
        None => request,
    }
}

/// Map a non-success status to the matching error
fn status_error(response: &reqwest::Response, resource: &str) -> Option<FetchError> {
    let status = response.status();

    if status.is_success() {
        return None;
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Some(FetchError::NotFound(resource.to_string()));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Some(FetchError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    Some(FetchError::Status {
        status: status.as_u16(),
        url: response.url().to_string(),
    })
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest_release(
        &self,
        owner: &str,
        repo: &str,
        auth: &AuthConfig,
    ) -> Result<Release, FetchError> {
        let url = format!("{}/repos/{}/{}/releases/latest", self.base_url, owner, repo);
        debug!("Fetching latest release from {}", url);

        let request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        let response = authorize(request, auth).send().await?;

        if let Some(err) = status_error(&response, &format!("{}/{}", owner, repo)) {
            warn!("GitHub API error for {}/{}: {}", owner, repo, err);
            return Err(err);
        }

        response.json::<Release>().await.map_err(|e| {
            warn!("Failed to parse GitHub release for {}/{}: {}", owner, repo, e);
            FetchError::InvalidResponse(e.to_string())
        })
    }

    async fn download(&self, url: &str, auth: &AuthConfig) -> Result<Vec<u8>, FetchError> {
        debug!("Downloading asset from {}", url);

        let request = self
            .client
            .get(url)
            .header("Accept", "application/octet-stream");
        let response = authorize(request, auth).send().await?;

        if let Some(err) = status_error(&response, url) {
            warn!("Asset download failed for {}: {}", url, err);
            return Err(err);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::source::Asset;
    use mockito::{Matcher, Server};

    fn source(server: &Server) -> GitHubReleases {
        GitHubReleases::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn latest_release_parses_tag_and_assets() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/DiabeloDev/AutoUpdate/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "tag_name": "v1.2.0",
                    "assets": [
                        {"name": "AutoUpdate.dll", "browser_download_url": "https://example.com/AutoUpdate.dll"},
                        {"name": "source.zip", "browser_download_url": "https://example.com/source.zip"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let release = source(&server)
            .latest_release("DiabeloDev", "AutoUpdate", &AuthConfig::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.tag_name, "v1.2.0");
        assert_eq!(
            release.assets,
            vec![
                Asset::new("AutoUpdate.dll", "https://example.com/AutoUpdate.dll"),
                Asset::new("source.zip", "https://example.com/source.zip"),
            ]
        );
    }

    #[tokio::test]
    async fn latest_release_sends_token_when_enabled() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .match_header("authorization", "token secret")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_body(r#"{"tag_name": "1.0.0", "assets": []}"#)
            .create_async()
            .await;

        source(&server)
            .latest_release("owner", "repo", &AuthConfig::with_token("secret"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn latest_release_omits_token_when_disabled() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"tag_name": "1.0.0", "assets": []}"#)
            .create_async()
            .await;

        let auth = AuthConfig {
            enabled: false,
            token: Some("secret".to_string()),
        };
        source(&server)
            .latest_release("owner", "repo", &auth)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn latest_release_returns_not_found_for_404() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/nonexistent/repo/releases/latest")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let result = source(&server)
            .latest_release("nonexistent", "repo", &AuthConfig::default())
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Release not found (HTTP 404): nonexistent/repo");
        assert!(matches!(err, FetchError::NotFound(name) if name == "nonexistent/repo"));
    }

    #[tokio::test]
    async fn latest_release_returns_rate_limited_for_429() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .with_status(429)
            .with_header("retry-after", "60")
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let result = source(&server)
            .latest_release("owner", "repo", &AuthConfig::default())
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Rate limited (HTTP 429)"));
        assert!(matches!(
            err,
            FetchError::RateLimited {
                retry_after_secs: Some(60)
            }
        ));
    }

    #[tokio::test]
    async fn latest_release_returns_status_error_for_server_failure() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .with_status(503)
            .create_async()
            .await;

        let result = source(&server)
            .latest_release("owner", "repo", &AuthConfig::default())
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn latest_release_returns_invalid_response_for_bad_json() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let result = source(&server)
            .latest_release("owner", "repo", &AuthConfig::default())
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn download_requests_octet_stream_and_returns_bytes() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/assets/Plugin.dll")
            .match_header("accept", "application/octet-stream")
            .match_header("authorization", "token secret")
            .with_status(200)
            .with_body(b"\x4d\x5a\x90\x00binary")
            .create_async()
            .await;

        let url = format!("{}/assets/Plugin.dll", server.url());
        let bytes = source(&server)
            .download(&url, &AuthConfig::with_token("secret"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"\x4d\x5a\x90\x00binary".to_vec());
    }

    #[tokio::test]
    async fn download_fails_on_non_success_status() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/assets/Plugin.dll")
            .with_status(500)
            .create_async()
            .await;

        let url = format!("{}/assets/Plugin.dll", server.url());
        let result = source(&server).download(&url, &AuthConfig::default()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Status { status: 500, .. })));
    }
}
