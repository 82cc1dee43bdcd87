//! Installer wiring with recording collaborators

use async_trait::async_trait;
use expertup_core::RuntimeConfig;
use expertup_update::{
    GitHubReleaseSource, Installer, Manifest, MemoryStateStore, Notification, NotificationAction,
    Notifier, PlatformIdentity, StaticSettings,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::builders::test_timestamp;
use super::constants::*;

/// Notifier that records every notification and replays scripted answers
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
    answers: Mutex<VecDeque<Option<NotificationAction>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer successive notifications with `answers`, then with no action
    pub fn answering(answers: Vec<Option<NotificationAction>>) -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            answers: Mutex::new(answers.into()),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Option<NotificationAction> {
        self.notifications.lock().unwrap().push(notification.clone());
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

/// Release source talking to `api_url`
pub fn source_for(api_url: &str) -> GitHubReleaseSource {
    let mut config = RuntimeConfig::default();
    config.github.api_url = api_url.to_string();
    config.network.http_timeout_secs = 5;
    config.network.download_timeout_secs = 5;
    GitHubReleaseSource::new(&config).unwrap()
}

/// Collaborators shared by one installer under test
pub struct Harness {
    pub state: Arc<MemoryStateStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub settings: Arc<StaticSettings>,
    pub install_root: TempDir,
}

impl Harness {
    pub fn new(settings: StaticSettings) -> Self {
        Self::with_notifier(settings, RecordingNotifier::new())
    }

    pub fn with_notifier(settings: StaticSettings, notifier: RecordingNotifier) -> Self {
        Self {
            state: Arc::new(MemoryStateStore::new()),
            notifier: Arc::new(notifier),
            settings: Arc::new(settings),
            install_root: TempDir::new().unwrap(),
        }
    }

    pub fn install_dir(&self) -> PathBuf {
        self.install_root.path().join("server")
    }

    /// Installer for the test platform against `api_url`
    pub fn installer(&self, api_url: &str) -> Installer {
        Installer::new(
            Arc::new(source_for(api_url)),
            self.state.clone(),
            self.notifier.clone(),
            self.settings.clone(),
            self.install_dir(),
        )
        .with_platform(PlatformIdentity::new(TEST_PLATFORM, TEST_ARCH))
    }

    /// Record an existing installation and optionally place its binary
    pub fn seed_install(&self, name: &str, version: &str, content: Option<&[u8]>) -> Manifest {
        let manifest = Manifest {
            name: name.to_string(),
            version: version.to_string(),
            asset_timestamp: test_timestamp(),
            release_timestamp: test_timestamp(),
        };
        manifest.save(&*self.state).unwrap();

        if let Some(content) = content {
            std::fs::create_dir_all(self.install_dir()).unwrap();
            std::fs::write(self.install_dir().join(name), content).unwrap();
        }

        manifest
    }

    pub fn manifest(&self) -> Option<Manifest> {
        Manifest::load(&*self.state)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifier.notifications()
    }
}
