//! Host platform detection and asset name matching

use crate::releases::{Release, ReleaseAsset};
use std::fmt;

/// Prefix shared by every server distribution asset
pub const ASSET_PREFIX: &str = "expert";

/// Canonical platform and architecture tokens used in asset names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformIdentity {
    pub platform: String,
    pub arch: String,
}

impl PlatformIdentity {
    /// Build an identity from raw tokens, applying the release pipeline's aliases
    pub fn new(platform: impl AsRef<str>, arch: impl AsRef<str>) -> Self {
        Self {
            platform: normalize_platform(platform.as_ref()),
            arch: normalize_arch(arch.as_ref()),
        }
    }

    /// Identity of the running host
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Recover the identity from an asset name such as `expert_linux_amd64`
    pub fn from_asset_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(ASSET_PREFIX)?.strip_prefix('_')?;
        let (platform, arch) = rest.split_once('_')?;
        let arch = arch.split('.').next().unwrap_or(arch);

        if platform.is_empty() || arch.is_empty() {
            return None;
        }

        Some(Self::new(platform, arch))
    }

    /// Asset name prefix for this identity, e.g. `expert_darwin_arm64`
    pub fn expected_asset_prefix(&self) -> String {
        format!("{}_{}_{}", ASSET_PREFIX, self.platform, self.arch)
    }

    /// Whether an asset name is a distribution for this identity
    ///
    /// Only an executable suffix may follow the prefix, so `arm` never matches `arm64`.
    pub fn matches_asset(&self, name: &str) -> bool {
        match name.strip_prefix(&self.expected_asset_prefix()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }

    /// First asset of a release built for this identity
    pub fn find_asset<'a>(&self, release: &'a Release) -> Option<&'a ReleaseAsset> {
        release.assets.iter().find(|a| self.matches_asset(&a.name))
    }
}

impl fmt::Display for PlatformIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.platform, self.arch)
    }
}

fn normalize_platform(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    match lower.as_str() {
        "win32" | "windows" => "windows".to_string(),
        "macos" => "darwin".to_string(),
        _ => lower,
    }
}

fn normalize_arch(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    match lower.as_str() {
        "x64" | "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        _ => lower,
    }
}
