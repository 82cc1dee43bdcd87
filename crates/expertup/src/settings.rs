//! Update settings backed by the user configuration file

use expertup_core::types::UpdateConfig;
use expertup_core::{Channel, HierarchicalConfigLoader};
use expertup_update::{UpdateError, UpdateSettings};
use std::sync::Mutex;
use tracing::info;

/// Settings resolved from configuration, with an optional channel override for one run
pub struct ConfigSettings {
    loader: HierarchicalConfigLoader,
    channel: Channel,
    update: Mutex<UpdateConfig>,
}

impl ConfigSettings {
    pub fn new(loader: HierarchicalConfigLoader, update: UpdateConfig, channel: Option<Channel>) -> Self {
        Self {
            loader,
            channel: channel.unwrap_or(update.channel),
            update: Mutex::new(update),
        }
    }
}

impl UpdateSettings for ConfigSettings {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn notify_on_auto_update(&self) -> bool {
        self.update
            .lock()
            .map(|u| u.notify_on_auto_update)
            .unwrap_or(true)
    }

    fn disable_auto_update_notifications(&self) -> expertup_update::Result<()> {
        let mut update = self
            .update
            .lock()
            .map_err(|_| UpdateError::state("settings lock poisoned"))?;
        update.notify_on_auto_update = false;

        self.loader
            .save_update_config(&update)
            .map_err(|e| UpdateError::state(e.to_string()))?;
        info!(
            "Auto-update notifications disabled in {}",
            self.loader.user_config_path()
        );
        Ok(())
    }
}
