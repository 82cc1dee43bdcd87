//! Console rendering of installer notifications

use async_trait::async_trait;
use dialoguer::Select;
use expertup_update::{Notification, NotificationAction, NotificationLevel, Notifier};
use tracing::warn;

use crate::output;

/// Prints notifications and, when a user is present, offers their actions
pub struct ConsoleNotifier {
    interactive: bool,
}

impl ConsoleNotifier {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, notification: &Notification) -> Option<NotificationAction> {
        let message = output::plain_links(&notification.message);
        match notification.level {
            NotificationLevel::Info => output::info(&message),
            NotificationLevel::Error => output::error(&message),
        }

        if !self.interactive || notification.actions.is_empty() {
            return None;
        }

        let actions = notification.actions.clone();
        let picked = tokio::task::spawn_blocking(move || prompt(&actions)).await;

        match picked {
            Ok(action) => action,
            Err(e) => {
                warn!("Notification prompt failed: {}", e);
                None
            }
        }
    }
}

/// Offer the actions plus a dismiss entry
fn prompt(actions: &[NotificationAction]) -> Option<NotificationAction> {
    let mut items: Vec<&str> = actions.iter().map(|a| a.label()).collect();
    items.push("Dismiss");

    let selection = Select::new()
        .items(&items)
        .default(0)
        .interact_opt()
        .ok()
        .flatten()?;

    actions.get(selection).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_interactive_never_picks_an_action() {
        let notifier = ConsoleNotifier::new(false);
        let notification = Notification::error("Failed to install Expert: offline")
            .with_action(NotificationAction::Retry);
        assert_eq!(notifier.notify(&notification).await, None);
    }
}
