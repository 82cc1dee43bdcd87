//! Version command: expertup's own version and the installed server build

use anyhow::{Context, Result};
use expertup_core::{Channel, HierarchicalConfigLoader};
use expertup_update::{FileStateStore, Manifest, PlatformIdentity};
use serde::Serialize;

use crate::cli::VersionArgs;
use crate::output;
use crate::utils;

#[derive(Debug, Serialize)]
struct VersionReport {
    expertup: String,
    channel: String,
    platform: String,
    server: Option<Manifest>,
}

impl VersionReport {
    fn new(channel: Channel, platform: &PlatformIdentity, server: Option<Manifest>) -> Self {
        Self {
            expertup: env!("CARGO_PKG_VERSION").to_string(),
            channel: channel.to_string(),
            platform: platform.to_string(),
            server,
        }
    }

    /// One-line summary of the installed server
    fn server_line(&self) -> String {
        match &self.server {
            Some(manifest) => format!(
                "Expert {} ({}, released {})",
                manifest.version,
                manifest.name,
                manifest.release_timestamp.format("%Y-%m-%d")
            ),
            None => "Expert is not installed".to_string(),
        }
    }
}

pub fn run(args: VersionArgs) -> Result<()> {
    let loader = HierarchicalConfigLoader::new().context("Failed to initialize configuration")?;
    let config = loader
        .load_runtime_config()
        .context("Failed to load configuration")?;
    console::set_colors_enabled(config.display.color_enabled);

    let state = FileStateStore::new(utils::state_path()?);
    let report = VersionReport::new(
        config.update.channel,
        &PlatformIdentity::current(),
        Manifest::load(&state),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("expertup {}", report.expertup);
    println!("{}", report.server_line());
    output::kv("Channel", &report.channel);
    output::kv("Platform", &report.platform);

    Ok(())
}
