//! Install and update orchestration
//!
//! One invocation of [`Installer::check_for_update`] does the following:
//! 1. Load the install manifest (absent means nothing is installed yet)
//! 2. Resolve the channel's release (nightly tag, or best stable with nightly fallback)
//! 3. Decide whether the local copy is current
//!    (checksums on nightly, tag comparison on stable)
//! 4. Download, install and record a new manifest when it is not
//! 5. Fall back to the installed build when the check fails and the build
//!    still fits this platform

use crate::checksum::{digest_bytes, digest_of, find_checksums_asset, ChecksumIndex};
use crate::error::{Result, UpdateError};
use crate::manifest::{Manifest, StateStore};
use crate::notify::{Notification, NotificationAction, Notifier, UpdateSettings};
use crate::platform::PlatformIdentity;
use crate::releases::{Release, ReleaseAsset, ReleaseSource, NIGHTLY_TAG};
use crate::version::should_force_upgrade;
use expertup_core::Channel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Release page used when the API does not report one
const RELEASES_PAGE: &str = "https://github.com/elixir-lang/expert/releases/tag";

/// Result of one update check
#[derive(Debug)]
pub enum Outcome {
    /// Nothing was installed; the channel's build is now installed
    FreshInstall { path: PathBuf, manifest: Manifest },

    /// The installed build is current
    UpToDate { path: PathBuf },

    /// A newer build replaced the installed one
    Updated { path: PathBuf, manifest: Manifest },

    /// No release asset exists for this platform; nothing was installed
    UnsupportedPlatform { expected: String },

    /// The check failed; the installed build is still usable
    StaleFallback { path: PathBuf, reason: String },

    /// No usable installation is available
    Failed {
        error: UpdateError,
        retry_requested: bool,
    },
}

impl Outcome {
    /// Path of the server binary to run, if any
    pub fn install_path(&self) -> Option<&Path> {
        match self {
            Outcome::FreshInstall { path, .. }
            | Outcome::UpToDate { path }
            | Outcome::Updated { path, .. }
            | Outcome::StaleFallback { path, .. } => Some(path),
            Outcome::UnsupportedPlatform { .. } | Outcome::Failed { .. } => None,
        }
    }

    fn retry_requested(&self) -> bool {
        matches!(
            self,
            Outcome::Failed {
                retry_requested: true,
                ..
            }
        )
    }
}

/// Keeps one server build installed and current
pub struct Installer {
    source: Arc<dyn ReleaseSource>,
    state: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<dyn UpdateSettings>,
    install_dir: PathBuf,
    platform: PlatformIdentity,

    /// Serializes overlapping checks on this installer
    in_flight: Mutex<()>,
}

impl Installer {
    /// Create an installer for the running host
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        state: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<dyn UpdateSettings>,
        install_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            state,
            notifier,
            settings,
            install_dir: install_dir.into(),
            platform: PlatformIdentity::current(),
            in_flight: Mutex::new(()),
        }
    }

    /// Resolve assets for another platform
    pub fn with_platform(mut self, platform: PlatformIdentity) -> Self {
        self.platform = platform;
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn platform(&self) -> &PlatformIdentity {
        &self.platform
    }

    /// Currently recorded installation
    pub fn installed_manifest(&self) -> Option<Manifest> {
        Manifest::load(self.state.as_ref())
    }

    /// Run update checks until the user stops asking to retry
    pub async fn check_and_install(&self) -> Outcome {
        let mut attempt = 1;
        loop {
            let outcome = self.check_for_update(attempt).await;
            if !outcome.retry_requested() {
                return outcome;
            }
            attempt += 1;
            info!("Retrying update check (attempt #{})", attempt);
        }
    }

    /// Run one update check
    ///
    /// `attempt` only changes the wording of failure notifications.
    pub async fn check_for_update(&self, attempt: u32) -> Outcome {
        let _guard = self.in_flight.lock().await;
        let channel = self.settings.channel();

        match Manifest::load(self.state.as_ref()) {
            None => {
                info!(
                    "Language server is not installed, fetching the latest {} release",
                    channel
                );
                self.install_latest(channel, attempt).await
            }
            Some(manifest) => {
                info!("Checking GitHub for new {} releases", channel);
                match self.compare_and_install(channel, &manifest).await {
                    Ok(outcome) => outcome,
                    Err(e) => self.recover(manifest, e, attempt).await,
                }
            }
        }
    }

    async fn install_latest(&self, channel: Channel, attempt: u32) -> Outcome {
        let release = match self.resolve_release(channel).await {
            Ok(release) => release,
            Err(e) => return self.fail(e, "Failed to install Expert", attempt).await,
        };

        let Some(asset) = self.platform.find_asset(&release) else {
            let err = self.unsupported_platform();
            error!("{}", err);
            self.notifier
                .notify(&Notification::error(err.to_string()))
                .await;
            return Outcome::UnsupportedPlatform {
                expected: self.platform.to_string(),
            };
        };

        match self.download_install(&release, asset).await {
            Ok((path, manifest)) => {
                info!("Installed {} from {}", manifest.name, manifest.version);
                Outcome::FreshInstall { path, manifest }
            }
            Err(e) => self.fail(e, "Failed to install Expert", attempt).await,
        }
    }

    /// Release to install when nothing is installed yet
    async fn resolve_release(&self, channel: Channel) -> Result<Release> {
        if channel.is_nightly() {
            return self.source.fetch_by_tag(NIGHTLY_TAG).await;
        }

        match self.source.fetch_best_stable().await? {
            Some(release) => Ok(release),
            None => {
                warn!("No stable release found, installing nightly instead");
                self.source.fetch_by_tag(NIGHTLY_TAG).await
            }
        }
    }

    async fn compare_and_install(&self, channel: Channel, manifest: &Manifest) -> Result<Outcome> {
        if channel.is_nightly() {
            return self.update_nightly().await;
        }

        match self.source.fetch_best_stable().await? {
            Some(release) => self.update_stable(manifest, release).await,
            None => {
                warn!("No stable release found, following nightly instead");
                self.update_nightly().await
            }
        }
    }

    async fn update_nightly(&self) -> Result<Outcome> {
        let release = self.source.fetch_by_tag(NIGHTLY_TAG).await?;
        let asset = self
            .platform
            .find_asset(&release)
            .ok_or_else(|| self.unsupported_platform())?;

        if self.local_copy_matches_checksum(&release, asset).await {
            info!("{} matches the published nightly checksum", asset.name);
            return Ok(Outcome::UpToDate {
                path: self.install_dir.join(&asset.name),
            });
        }

        let (path, manifest) = self.download_install(&release, asset).await?;
        self.notify_auto_update(&release).await;
        Ok(Outcome::Updated { path, manifest })
    }

    async fn update_stable(&self, manifest: &Manifest, release: Release) -> Result<Outcome> {
        let needs_update = manifest.version != release.tag_name
            || should_force_upgrade(&manifest.version, &release.tag_name);

        if !needs_update && self.platform.matches_asset(&manifest.name) {
            info!("{} is already the latest stable release", manifest.version);
            return Ok(Outcome::UpToDate {
                path: self.install_dir.join(&manifest.name),
            });
        }

        info!(
            "Updating {} ({}) to {}",
            manifest.name, manifest.version, release.tag_name
        );

        let asset = self
            .platform
            .find_asset(&release)
            .ok_or_else(|| self.unsupported_platform())?;

        let (path, new_manifest) = self.download_install(&release, asset).await?;
        self.notify_auto_update(&release).await;
        Ok(Outcome::Updated {
            path,
            manifest: new_manifest,
        })
    }

    /// Compare the local binary against the release's checksums asset
    ///
    /// Every failure counts as "not current" so the caller re-downloads.
    async fn local_copy_matches_checksum(&self, release: &Release, asset: &ReleaseAsset) -> bool {
        let path = self.install_dir.join(&asset.name);
        if !path.exists() {
            debug!("{} is not present locally", path.display());
            return false;
        }

        let Some(checksums_asset) = find_checksums_asset(release) else {
            warn!("Release {} has no checksums asset", release.tag_name);
            return false;
        };

        let bytes = match self.source.download_asset(checksums_asset).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not fetch {}: {}", checksums_asset.name, e);
                return false;
            }
        };

        let index = ChecksumIndex::parse(&String::from_utf8_lossy(&bytes));
        if index.get(&asset.name).is_none() {
            warn!("{} has no entry for {}", checksums_asset.name, asset.name);
            return false;
        }

        match digest_of(&path) {
            Ok(actual) => {
                debug!("{}: local digest {}", asset.name, actual);
                index.matches(&asset.name, &actual)
            }
            Err(e) => {
                warn!("Could not hash {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Download an asset into the install directory and record it
    async fn download_install(
        &self,
        release: &Release,
        asset: &ReleaseAsset,
    ) -> Result<(PathBuf, Manifest)> {
        let bytes = self.source.download_asset(asset).await?;

        tokio::fs::create_dir_all(&self.install_dir)
            .await
            .map_err(|e| UpdateError::io(&self.install_dir, e))?;

        let path = self.install_dir.join(&asset.name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| UpdateError::io(&path, e))?;
        set_executable(&path).await?;

        debug!(
            "Wrote {} ({} bytes, sha256 {})",
            path.display(),
            bytes.len(),
            digest_bytes(&bytes)
        );

        let manifest = Manifest::from_release(release, asset);
        manifest.save(self.state.as_ref())?;

        Ok((path, manifest))
    }

    async fn notify_auto_update(&self, release: &Release) {
        if !self.settings.notify_on_auto_update() {
            debug!("Auto-update notifications are disabled");
            return;
        }

        let release_url = release
            .html_url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", RELEASES_PAGE, release.tag_name));

        let message = if release.tag_name == NIGHTLY_TAG {
            format!(
                "Expert was automatically updated to the latest nightly version. See [what's new]({}).",
                release_url
            )
        } else {
            format!(
                "Expert was automatically updated to version {}. See [what's new]({}).",
                release.tag_name, release_url
            )
        };

        let notification =
            Notification::info(message).with_action(NotificationAction::DisableNotifications);

        if self.notifier.notify(&notification).await == Some(NotificationAction::DisableNotifications)
        {
            if let Err(e) = self.settings.disable_auto_update_notifications() {
                warn!("Failed to disable auto-update notifications: {}", e);
            }
        }
    }

    /// Handle a failed check while a build is installed
    async fn recover(&self, manifest: Manifest, err: UpdateError, attempt: u32) -> Outcome {
        if err.is_remote() {
            warn!("Could not reach the release API: {}", err);
        } else {
            error!("An unexpected error occurred checking for updates: {}", err);
        }

        if self.platform.matches_asset(&manifest.name) {
            let path = self.install_dir.join(&manifest.name);
            warn!(
                "Continuing with installed {} ({})",
                manifest.name, manifest.version
            );
            return Outcome::StaleFallback {
                path,
                reason: err.to_string(),
            };
        }

        let installed = PlatformIdentity::from_asset_name(&manifest.name)
            .map(|p| p.to_string())
            .unwrap_or_else(|| manifest.name.clone());
        let mismatch = UpdateError::PlatformMismatch {
            installed,
            current: self.platform.to_string(),
        };

        let message = format!(
            "{}. A matching build could not be downloaded: {}{}",
            mismatch,
            err,
            attempt_suffix(attempt)
        );
        let retry_requested = self.ask_retry(message).await;

        Outcome::Failed {
            error: mismatch,
            retry_requested,
        }
    }

    /// Report a failure with no usable installation
    async fn fail(&self, err: UpdateError, context: &str, attempt: u32) -> Outcome {
        error!("{}: {}", context, err);

        let message = format!("{}: {}{}", context, err, attempt_suffix(attempt));
        let retry_requested = self.ask_retry(message).await;

        Outcome::Failed {
            error: err,
            retry_requested,
        }
    }

    async fn ask_retry(&self, message: String) -> bool {
        let notification = Notification::error(message).with_action(NotificationAction::Retry);
        self.notifier.notify(&notification).await == Some(NotificationAction::Retry)
    }

    fn unsupported_platform(&self) -> UpdateError {
        UpdateError::UnsupportedPlatform {
            expected: self.platform.to_string(),
        }
    }
}

fn attempt_suffix(attempt: u32) -> String {
    if attempt > 1 {
        format!(" (Attempt #{})", attempt)
    } else {
        String::new()
    }
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path)
        .await
        .map_err(|e| UpdateError::io(path, e))?
        .permissions();
    perms.set_mode(0o755);
    tokio::fs::set_permissions(path, perms)
        .await
        .map_err(|e| UpdateError::io(path, e))
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
