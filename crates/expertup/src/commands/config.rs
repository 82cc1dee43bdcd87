//! Configuration management commands

use anyhow::{Context, Result};
use expertup_core::HierarchicalConfigLoader;

use crate::cli::{ConfigCommands, ConfigShowArgs, SetChannelArgs};
use crate::output;

pub fn run(cmd: ConfigCommands) -> Result<()> {
    let loader = HierarchicalConfigLoader::new().context("Failed to initialize configuration")?;

    match cmd {
        ConfigCommands::Show(args) => show(&loader, args),
        ConfigCommands::SetChannel(args) => set_channel(&loader, args),
        ConfigCommands::DisableNotifications => disable_notifications(&loader),
    }
}

fn show(loader: &HierarchicalConfigLoader, args: ConfigShowArgs) -> Result<()> {
    let config = loader
        .load_runtime_config()
        .context("Failed to load configuration")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        output::header(&format!("Configuration ({})", loader.user_config_path()));
        print!("{}", serde_yaml_ng::to_string(&config)?);
    }

    Ok(())
}

fn set_channel(loader: &HierarchicalConfigLoader, args: SetChannelArgs) -> Result<()> {
    let mut update = loader
        .load_runtime_config()
        .context("Failed to load configuration")?
        .update;
    update.channel = args.channel;

    loader
        .save_update_config(&update)
        .context("Failed to save configuration")?;
    output::success(&format!("Following the {} channel", args.channel));

    if std::env::var("EXPERTUP_CHANNEL").is_ok() {
        output::warning("EXPERTUP_CHANNEL is set and overrides this setting");
    }

    Ok(())
}

fn disable_notifications(loader: &HierarchicalConfigLoader) -> Result<()> {
    let mut update = loader
        .load_runtime_config()
        .context("Failed to load configuration")?
        .update;
    update.notify_on_auto_update = false;

    loader
        .save_update_config(&update)
        .context("Failed to save configuration")?;
    output::success("Auto-update notifications disabled");

    Ok(())
}
