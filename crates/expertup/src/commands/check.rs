//! Check command: install Expert or bring it up to date

use anyhow::{anyhow, Context, Result};
use expertup_core::HierarchicalConfigLoader;
use expertup_update::{FileStateStore, GitHubReleaseSource, Installer, Outcome, UpdateSettings};
use std::sync::Arc;

use crate::cli::CheckArgs;
use crate::notifier::ConsoleNotifier;
use crate::output;
use crate::settings::ConfigSettings;
use crate::utils;

pub async fn run(args: CheckArgs) -> Result<()> {
    let loader = HierarchicalConfigLoader::new().context("Failed to initialize configuration")?;
    let config = loader
        .load_runtime_config()
        .context("Failed to load configuration")?;
    console::set_colors_enabled(config.display.color_enabled);

    let interactive = !args.non_interactive && console::user_attended();
    let install_dir = utils::install_dir(args.install_dir)?;

    let source = GitHubReleaseSource::new(&config)?
        .with_auth_token(args.github_token)
        .with_progress(interactive && config.display.show_progress);
    let state = FileStateStore::new(utils::state_path()?);
    let settings = ConfigSettings::new(loader, config.update.clone(), args.channel);
    let channel = settings.channel();

    let installer = Installer::new(
        Arc::new(source),
        Arc::new(state),
        Arc::new(ConsoleNotifier::new(interactive)),
        Arc::new(settings),
        install_dir,
    );

    output::info(&format!(
        "Checking {} releases for {}",
        channel,
        installer.platform()
    ));

    report(installer.check_and_install().await)
}

/// Print the outcome; failures become the command's error
fn report(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::FreshInstall { path, manifest } => {
            output::success(&format!("Installed Expert {}", manifest.version));
            output::kv("Path", &path.display().to_string());
            Ok(())
        }
        Outcome::Updated { path, manifest } => {
            output::success(&format!("Updated Expert to {}", manifest.version));
            output::kv("Path", &path.display().to_string());
            Ok(())
        }
        Outcome::UpToDate { path } => {
            output::success("Expert is up to date");
            output::kv("Path", &path.display().to_string());
            Ok(())
        }
        Outcome::StaleFallback { path, reason } => {
            output::warning(&format!("Could not check for updates: {}", reason));
            output::kv("Using installed build", &path.display().to_string());
            Ok(())
        }
        Outcome::UnsupportedPlatform { expected } => Err(anyhow!(
            "No distribution of Expert is available for your platform: {}",
            expected
        )),
        Outcome::Failed { error, .. } => {
            Err(anyhow::Error::new(error).context("Expert could not be installed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expertup_update::UpdateError;
    use std::path::PathBuf;

    #[test]
    fn test_report_stale_fallback_is_success() {
        let outcome = Outcome::StaleFallback {
            path: PathBuf::from("/tmp/expert_linux_amd64"),
            reason: "offline".to_string(),
        };
        assert!(report(outcome).is_ok());
    }

    #[test]
    fn test_report_failure_keeps_cause() {
        let outcome = Outcome::Failed {
            error: UpdateError::PlatformMismatch {
                installed: "darwin_arm64".to_string(),
                current: "linux_amd64".to_string(),
            },
            retry_requested: false,
        };
        let err = report(outcome).unwrap_err();
        assert_eq!(err.to_string(), "Expert could not be installed");
        assert!(format!("{:#}", err).contains("darwin_arm64"));
    }

    #[test]
    fn test_report_unsupported_platform_is_error() {
        let outcome = Outcome::UnsupportedPlatform {
            expected: "plan9_mips".to_string(),
        };
        assert!(report(outcome)
            .unwrap_err()
            .to_string()
            .contains("plan9_mips"));
    }
}
