//! GitHub releases access

use crate::error::{Result, UpdateError};
use crate::version::{compare_descending, ReleaseVersion};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use expertup_core::types::{GitHubConfig, RuntimeConfig};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{ACCEPT, CONTENT_LENGTH};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Tag of the continuously rebuilt release
pub const NIGHTLY_TAG: &str = "nightly";

/// GitHub REST API version pinned for every request
pub const GITHUB_API_VERSION: &str = "2022-11-28";

const GITHUB_JSON: &str = "application/vnd.github+json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Release information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "v0.1.0" or "nightly")
    pub tag_name: String,

    /// Release name
    #[serde(default)]
    pub name: Option<String>,

    /// Release page on github.com
    #[serde(default)]
    pub html_url: Option<String>,

    /// Whether this is a draft
    #[serde(default)]
    pub draft: bool,

    /// Whether this is a prerelease
    #[serde(default)]
    pub prerelease: bool,

    /// Published date
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Last modification, bumped when a moving tag is republished
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Release assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Best known modification time of the release
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.published_at)
    }

    /// Parsed version of the tag, `None` for moving tags
    pub fn version(&self) -> Option<ReleaseVersion> {
        ReleaseVersion::parse(&self.tag_name)
    }
}

/// Release asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Asset id
    pub id: u64,

    /// Asset name
    pub name: String,

    /// API download URL (serves raw bytes with `Accept: application/octet-stream`)
    pub url: String,

    /// Public download URL
    #[serde(default)]
    pub browser_download_url: String,

    /// Asset size in bytes
    #[serde(default)]
    pub size: u64,

    /// Upload time
    pub updated_at: DateTime<Utc>,

    /// Content digest reported by GitHub (e.g. `sha256:...`)
    #[serde(default)]
    pub digest: Option<String>,
}

/// Remote catalog of releases
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch a single release by tag
    async fn fetch_by_tag(&self, tag: &str) -> Result<Release>;

    /// Fetch every published release
    async fn fetch_all(&self) -> Result<Vec<Release>>;

    /// Download the raw bytes of an asset
    async fn download_asset(&self, asset: &ReleaseAsset) -> Result<Bytes>;

    /// Greatest stable release, counting 0.1.0 release candidates as stable
    ///
    /// `Ok(None)` means the catalog has no qualifying release.
    async fn fetch_best_stable(&self) -> Result<Option<Release>> {
        let releases = self.fetch_all().await?;
        Ok(select_best_stable(releases))
    }
}

/// Pick the greatest non-draft release whose tag is stable or an eligible RC
pub fn select_best_stable(releases: Vec<Release>) -> Option<Release> {
    releases
        .into_iter()
        .filter(|r| !r.draft)
        .filter_map(|r| r.version().map(|v| (v, r)))
        .filter(|(v, _)| v.is_stable_or_eligible_rc())
        .min_by(|(a, _), (b, _)| compare_descending(a, b))
        .map(|(_, r)| r)
}

/// Release source backed by the GitHub REST API
pub struct GitHubReleaseSource {
    /// Client for metadata requests
    client: reqwest::Client,

    /// Client for asset downloads (longer timeout)
    download_client: reqwest::Client,

    /// GitHub configuration
    github_config: GitHubConfig,

    /// Bearer token for authenticated, higher rate limit access
    auth_token: Option<String>,

    /// Render a progress bar while downloading
    show_progress: bool,
}

impl GitHubReleaseSource {
    /// Create a release source from runtime configuration
    pub fn new(runtime_config: &RuntimeConfig) -> Result<Self> {
        let network = &runtime_config.network;

        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.http_timeout_secs))
            .build()
            .map_err(UpdateError::HttpClient)?;

        let download_client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.download_timeout_secs))
            .build()
            .map_err(UpdateError::HttpClient)?;

        Ok(Self {
            client,
            download_client,
            github_config: runtime_config.github.clone(),
            auth_token: None,
            show_progress: false,
        })
    }

    /// Authenticate requests with a bearer token
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn request(&self, client: &reqwest::Client, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let request = client
            .get(url)
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);

        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and turn non-2xx responses into API errors
    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|source| {
            error!("Request to {} failed: {}", url, source);
            UpdateError::Network {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("GitHub API returned {} for {}: {}", status, url, body);
            return Err(UpdateError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("Fetching {}", url);

        let response = self
            .send(self.request(&self.client, url, GITHUB_JSON), url)
            .await?;

        let body = response.text().await.map_err(|source| UpdateError::Network {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|source| {
            error!("Failed to decode response from {}: {}", url, source);
            UpdateError::Decode {
                url: url.to_string(),
                source,
            }
        })
    }

    fn progress_bar(&self, asset: &ReleaseAsset, total_size: u64) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Downloading {}", asset.name));
        Some(pb)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleaseSource {
    async fn fetch_by_tag(&self, tag: &str) -> Result<Release> {
        let url = format!("{}/tags/{}", self.github_config.releases_url(), tag);
        self.get_json(&url).await
    }

    async fn fetch_all(&self) -> Result<Vec<Release>> {
        let url = format!("{}?per_page=100", self.github_config.releases_url());
        self.get_json(&url).await
    }

    async fn download_asset(&self, asset: &ReleaseAsset) -> Result<Bytes> {
        debug!("Downloading {} from {}", asset.name, asset.url);

        let response = self
            .send(
                self.request(&self.download_client, &asset.url, OCTET_STREAM),
                &asset.url,
            )
            .await?;

        let total_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|ct| ct.to_str().ok())
            .and_then(|ct| ct.parse::<u64>().ok())
            .unwrap_or(asset.size);

        let progress = self.progress_bar(asset, total_size);
        let mut buffer = BytesMut::with_capacity(initial_capacity(total_size));
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|source| {
                error!("Download of {} interrupted: {}", asset.url, source);
                UpdateError::Network {
                    url: asset.url.clone(),
                    source,
                }
            })?;
            buffer.extend_from_slice(&chunk);

            if let Some(pb) = &progress {
                pb.set_position(buffer.len() as u64);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message(format!("Downloaded {}", asset.name));
        }

        Ok(buffer.freeze())
    }
}

/// Largest buffer reserved up front from an advertised download size
const MAX_PREALLOCATED_BYTES: u64 = 64 * 1024 * 1024;

/// Buffer capacity for a download whose size the server advertises
///
/// Larger downloads grow the buffer as chunks arrive.
fn initial_capacity(advertised: u64) -> usize {
    advertised.min(MAX_PREALLOCATED_BYTES) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str, draft: bool) -> Release {
        Release {
            tag_name: tag.to_string(),
            name: None,
            html_url: None,
            draft,
            prerelease: false,
            published_at: None,
            updated_at: None,
            assets: Vec::new(),
        }
    }

    fn tags(releases: &[&str]) -> Vec<Release> {
        releases.iter().map(|t| release(t, false)).collect()
    }

    #[test]
    fn test_select_best_stable_prefers_greatest() {
        let best = select_best_stable(tags(&["v0.1.0", "v0.3.1", "v0.2.0", "nightly"])).unwrap();
        assert_eq!(best.tag_name, "v0.3.1");
    }

    #[test]
    fn test_select_best_stable_skips_ineligible_prereleases() {
        let best = select_best_stable(tags(&["0.1.0", "0.2.0-rc.1", "0.2.0-beta.3"])).unwrap();
        assert_eq!(best.tag_name, "0.1.0");
    }

    #[test]
    fn test_select_best_stable_accepts_graduation_rc() {
        let best = select_best_stable(tags(&["0.1.0-rc.2", "0.1.0-rc.10", "nightly"])).unwrap();
        assert_eq!(best.tag_name, "0.1.0-rc.10");
    }

    #[test]
    fn test_select_best_stable_skips_drafts() {
        let releases = vec![release("0.4.0", true), release("0.3.0", false)];
        assert_eq!(select_best_stable(releases).unwrap().tag_name, "0.3.0");
    }

    #[test]
    fn test_select_best_stable_none_when_nothing_qualifies() {
        assert!(select_best_stable(tags(&["nightly", "0.3.0-rc.1", "latest"])).is_none());
        assert!(select_best_stable(Vec::new()).is_none());
    }

    #[test]
    fn test_release_deserializes_github_shape() {
        let json = r#"{
            "id": 1,
            "tag_name": "nightly",
            "html_url": "https://github.com/elixir-lang/expert/releases/tag/nightly",
            "draft": false,
            "prerelease": true,
            "published_at": "2025-01-02T03:04:05Z",
            "updated_at": "2025-01-03T00:00:00Z",
            "author": {"login": "github-actions[bot]"},
            "assets": [{
                "id": 42,
                "name": "expert_linux_amd64",
                "url": "https://api.github.com/repos/elixir-lang/expert/releases/assets/42",
                "browser_download_url": "https://github.com/elixir-lang/expert/releases/download/nightly/expert_linux_amd64",
                "size": 1024,
                "updated_at": "2025-01-03T00:00:00Z",
                "digest": "sha256:abc"
            }]
        }"#;

        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "nightly");
        assert!(release.version().is_none());
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].id, 42);
        assert_eq!(release.assets[0].digest.as_deref(), Some("sha256:abc"));
        assert_eq!(release.timestamp(), release.updated_at);
    }

    #[test]
    fn test_timestamp_falls_back_to_published_at() {
        let mut r = release("0.1.0", false);
        r.published_at = Some(Utc::now());
        assert_eq!(r.timestamp(), r.published_at);
    }

    #[test]
    fn test_blank_auth_token_is_ignored() {
        let source = GitHubReleaseSource::new(&RuntimeConfig::default())
            .unwrap()
            .with_auth_token(Some("  ".to_string()));
        assert!(source.auth_token.is_none());
    }

    #[test]
    fn test_initial_capacity_is_capped() {
        assert_eq!(initial_capacity(1024), 1024);
        assert_eq!(initial_capacity(1 << 50), MAX_PREALLOCATED_BYTES as usize);
    }
}
