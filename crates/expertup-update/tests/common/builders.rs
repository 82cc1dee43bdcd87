//! Builder patterns for test data construction

use chrono::{DateTime, TimeZone, Utc};
use expertup_update::{Release, ReleaseAsset};

use super::constants::*;

/// Fixed timestamp so manifests compare deterministically
pub fn test_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
}

/// Builder for constructing Release objects with sensible test defaults
#[derive(Debug, Clone)]
pub struct ReleaseBuilder {
    tag_name: String,
    html_url: Option<String>,
    draft: bool,
    prerelease: bool,
    published_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    assets: Vec<ReleaseAsset>,
}

impl ReleaseBuilder {
    /// Create a new ReleaseBuilder for a tag
    pub fn new(tag: &str) -> Self {
        Self {
            tag_name: tag.to_string(),
            html_url: Some(format!(
                "https://github.com/elixir-lang/expert/releases/tag/{}",
                tag
            )),
            draft: false,
            prerelease: tag == TAG_NIGHTLY,
            published_at: Some(test_timestamp()),
            updated_at: Some(test_timestamp()),
            assets: Vec::new(),
        }
    }

    /// The nightly release
    pub fn nightly() -> Self {
        Self::new(TAG_NIGHTLY)
    }

    /// Mark as draft
    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    /// Set the update time
    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Add a single asset
    pub fn asset(mut self, asset: ReleaseAsset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Add a platform binary served by the mock server
    pub fn binary(self, server_uri: &str, name: &str, id: u64) -> Self {
        self.asset(ReleaseAssetBuilder::new(name, id).served_by(server_uri).build())
    }

    /// Add the checksums asset served by the mock server
    pub fn checksums(self, server_uri: &str) -> Self {
        self.binary(server_uri, ASSET_CHECKSUMS, ID_CHECKSUMS)
    }

    /// Add the full set of platform binaries plus checksums
    pub fn with_standard_assets(self, server_uri: &str) -> Self {
        self.binary(server_uri, ASSET_LINUX_AMD64, ID_LINUX_AMD64)
            .binary(server_uri, ASSET_LINUX_ARM64, ID_LINUX_ARM64)
            .binary(server_uri, ASSET_DARWIN_ARM64, ID_DARWIN_ARM64)
            .binary(server_uri, ASSET_WINDOWS_AMD64, ID_WINDOWS_AMD64)
            .checksums(server_uri)
    }

    /// Build the Release
    pub fn build(self) -> Release {
        Release {
            tag_name: self.tag_name,
            name: None,
            html_url: self.html_url,
            draft: self.draft,
            prerelease: self.prerelease,
            published_at: self.published_at,
            updated_at: self.updated_at,
            assets: self.assets,
        }
    }
}

/// Builder for constructing ReleaseAsset objects
#[derive(Debug, Clone)]
pub struct ReleaseAssetBuilder {
    id: u64,
    name: String,
    url: String,
    size: u64,
}

impl ReleaseAssetBuilder {
    /// Create a new asset builder
    pub fn new(name: &str, id: u64) -> Self {
        Self {
            id,
            name: name.to_string(),
            url: format!("https://api.github.com{}", asset_path(id)),
            size: 1024,
        }
    }

    /// Point the API download URL at a mock server
    pub fn served_by(mut self, server_uri: &str) -> Self {
        self.url = format!("{}{}", server_uri, asset_path(self.id));
        self
    }

    /// Set the asset size
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Build the ReleaseAsset
    pub fn build(self) -> ReleaseAsset {
        ReleaseAsset {
            id: self.id,
            browser_download_url: format!(
                "https://github.com/elixir-lang/expert/releases/download/nightly/{}",
                self.name
            ),
            name: self.name,
            url: self.url,
            size: self.size,
            updated_at: test_timestamp(),
            digest: None,
        }
    }
}
