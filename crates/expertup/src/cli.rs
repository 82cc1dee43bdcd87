//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use expertup_core::Channel;

/// expertup - keeps the Expert language server installed and current
#[derive(Parser, Debug)]
#[command(name = "expertup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install Expert or update it to the latest build of the channel
    Check(CheckArgs),

    /// Show the installed build
    Status(StatusArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show the expertup version and the installed server build
    Version(VersionArgs),
}

// Check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Channel to follow for this run (nightly or stable)
    #[arg(long)]
    pub channel: Option<Channel>,

    /// Directory holding the server binary
    #[arg(long)]
    pub install_dir: Option<Utf8PathBuf>,

    /// Never prompt; notifications are printed without actions
    #[arg(long)]
    pub non_interactive: bool,

    /// GitHub token for higher API rate limits
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

// Status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory holding the server binary
    #[arg(long)]
    pub install_dir: Option<Utf8PathBuf>,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration
    Show(ConfigShowArgs),

    /// Choose the channel to follow
    SetChannel(SetChannelArgs),

    /// Stop announcing automatic updates
    DisableNotifications,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SetChannelArgs {
    /// nightly or stable
    pub channel: Channel,
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
