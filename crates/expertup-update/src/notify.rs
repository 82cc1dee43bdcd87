//! User-facing notifications and update settings seams
//!
//! The host decides how notifications are rendered and where settings live;
//! the installer only reports what happened and which action was picked.

use crate::error::Result;
use async_trait::async_trait;
use expertup_core::Channel;
use std::sync::atomic::{AtomicBool, Ordering};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Action a user can pick from a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Run the whole update check again
    Retry,

    /// Stop showing auto-update notifications
    DisableNotifications,
}

impl NotificationAction {
    /// Button label shown to the user
    pub fn label(self) -> &'static str {
        match self {
            NotificationAction::Retry => "Retry",
            NotificationAction::DisableNotifications => "Disable this notification",
        }
    }
}

/// Message for the user with optional actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            actions: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// Sink for notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a notification and return the action the user picked, if any
    async fn notify(&self, notification: &Notification) -> Option<NotificationAction>;
}

/// Update settings read by the installer
pub trait UpdateSettings: Send + Sync {
    /// Channel to follow
    fn channel(&self) -> Channel;

    /// Whether to announce automatic updates
    fn notify_on_auto_update(&self) -> bool;

    /// Turn off auto-update notifications
    fn disable_auto_update_notifications(&self) -> Result<()>;
}

/// Settings held in memory
#[derive(Debug)]
pub struct StaticSettings {
    channel: Channel,
    notify_on_auto_update: AtomicBool,
}

impl StaticSettings {
    pub fn new(channel: Channel, notify_on_auto_update: bool) -> Self {
        Self {
            channel,
            notify_on_auto_update: AtomicBool::new(notify_on_auto_update),
        }
    }

    pub fn nightly() -> Self {
        Self::new(Channel::Nightly, true)
    }

    pub fn stable() -> Self {
        Self::new(Channel::Stable, true)
    }
}

impl UpdateSettings for StaticSettings {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn notify_on_auto_update(&self) -> bool {
        self.notify_on_auto_update.load(Ordering::SeqCst)
    }

    fn disable_auto_update_notifications(&self) -> Result<()> {
        self.notify_on_auto_update.store(false, Ordering::SeqCst);
        Ok(())
    }
}
