//! Status command

use anyhow::{Context, Result};
use expertup_core::HierarchicalConfigLoader;
use expertup_update::{FileStateStore, Manifest, PlatformIdentity};
use serde::Serialize;
use std::path::Path;

use crate::cli::StatusArgs;
use crate::output;
use crate::utils;

/// Installed build as reported by `expertup status`
#[derive(Debug, Serialize)]
struct StatusReport {
    channel: String,
    platform: String,
    install_dir: String,
    installed: Option<InstalledBuild>,
}

#[derive(Debug, Serialize)]
struct InstalledBuild {
    #[serde(flatten)]
    manifest: Manifest,
    path: String,
    present: bool,
    matches_platform: bool,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let loader = HierarchicalConfigLoader::new().context("Failed to initialize configuration")?;
    let config = loader
        .load_runtime_config()
        .context("Failed to load configuration")?;
    console::set_colors_enabled(config.display.color_enabled);

    let install_dir = utils::install_dir(args.install_dir)?;
    let state = FileStateStore::new(utils::state_path()?);
    let manifest = Manifest::load(&state);

    let report = build_report(
        config.update.channel.as_str(),
        &PlatformIdentity::current(),
        &install_dir,
        manifest,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header("Expert language server");
    output::kv("Channel", &report.channel);
    output::kv("Platform", &report.platform);
    output::kv("Install directory", &report.install_dir);

    match &report.installed {
        Some(build) => {
            output::kv("Installed", &build.manifest.name);
            output::kv("Version", &build.manifest.version);
            output::kv("Release updated", &build.manifest.release_timestamp.to_rfc3339());
            output::kv("Path", &build.path);
            if !build.present {
                output::warning("The recorded binary is missing; run 'expertup check' to reinstall");
            }
            if !build.matches_platform {
                output::warning("The installed build targets another platform");
            }
        }
        None => output::info("Expert is not installed; run 'expertup check' to install it"),
    }

    Ok(())
}

fn build_report(
    channel: &str,
    platform: &PlatformIdentity,
    install_dir: &Path,
    manifest: Option<Manifest>,
) -> StatusReport {
    let installed = manifest.map(|manifest| {
        let path = install_dir.join(&manifest.name);
        InstalledBuild {
            present: path.exists(),
            matches_platform: platform.matches_asset(&manifest.name),
            path: path.display().to_string(),
            manifest,
        }
    });

    StatusReport {
        channel: channel.to_string(),
        platform: platform.to_string(),
        install_dir: install_dir.display().to_string(),
        installed,
    }
}
