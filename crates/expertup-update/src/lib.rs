//! Release resolution and self-update engine for the Expert language server
//!
//! Provides:
//! - Release version parsing and ordering, including the 0.1.0 RC carve-out
//! - Host platform detection and asset matching
//! - GitHub release access with optional bearer token
//! - SHA-256 checksum verification for the mutable nightly build
//! - Install manifest persistence
//! - The installer that ties these together with error recovery

pub mod checksum;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod notify;
pub mod platform;
pub mod releases;
pub mod version;

pub use checksum::{digest_of, find_checksums_asset, ChecksumIndex};
pub use error::{Result, UpdateError};
pub use installer::{Installer, Outcome};
pub use manifest::{FileStateStore, Manifest, MemoryStateStore, StateStore, MANIFEST_KEY};
pub use notify::{
    Notification, NotificationAction, NotificationLevel, Notifier, StaticSettings, UpdateSettings,
};
pub use platform::PlatformIdentity;
pub use releases::{
    select_best_stable, GitHubReleaseSource, Release, ReleaseAsset, ReleaseSource, NIGHTLY_TAG,
};
pub use version::{compare_descending, should_force_upgrade, Identifier, ReleaseVersion};
