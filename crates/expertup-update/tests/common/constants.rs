//! Shared constants for test infrastructure

// Platform used by every installer under test
pub const TEST_PLATFORM: &str = "linux";
pub const TEST_ARCH: &str = "amd64";
pub const TEST_PLATFORM_TOKEN: &str = "linux_amd64";

// Asset names as published by the release pipeline
pub const ASSET_LINUX_AMD64: &str = "expert_linux_amd64";
pub const ASSET_LINUX_ARM64: &str = "expert_linux_arm64";
pub const ASSET_DARWIN_ARM64: &str = "expert_darwin_arm64";
pub const ASSET_WINDOWS_AMD64: &str = "expert_windows_amd64.exe";
pub const ASSET_CHECKSUMS: &str = "expert_checksums.txt";

// Asset ids
pub const ID_LINUX_AMD64: u64 = 101;
pub const ID_LINUX_ARM64: u64 = 102;
pub const ID_DARWIN_ARM64: u64 = 103;
pub const ID_WINDOWS_AMD64: u64 = 104;
pub const ID_CHECKSUMS: u64 = 199;

// Tags
pub const TAG_NIGHTLY: &str = "nightly";
pub const TAG_RC_1: &str = "v0.1.0-rc.1";
pub const TAG_0_1_0: &str = "v0.1.0";
pub const TAG_0_2_0: &str = "v0.2.0";
pub const TAG_0_3_0_RC_1: &str = "v0.3.0-rc.1";
pub const TAG_0_4_0: &str = "v0.4.0";

// GitHub API paths for the default repository
pub const RELEASES_PATH: &str = "/repos/elixir-lang/expert/releases";

// Nothing listens here; connections are refused immediately
pub const UNREACHABLE_API: &str = "http://127.0.0.1:1";

// Binary content for testing
pub const OLD_BINARY_CONTENT: &[u8] = b"expert build from last week";
pub const NEW_BINARY_CONTENT: &[u8] = b"expert build from today";

pub const AUTH_TOKEN: &str = "ghp_test_token";

/// Path of a release fetched by tag
pub fn tag_path(tag: &str) -> String {
    format!("{}/tags/{}", RELEASES_PATH, tag)
}

/// Path of an asset download
pub fn asset_path(id: u64) -> String {
    format!("{}/assets/{}", RELEASES_PATH, id)
}
