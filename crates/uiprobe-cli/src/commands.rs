//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// uiprobe: drive popup dialogs of an application under test
#[derive(Parser, Debug)]
#[command(name = "uiprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Probe configuration file (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Click a button inside a popup dialog of a scene
    ClickPopup(ClickPopupArgs),

    /// Show the companion files of a test script
    DocStatus(DocStatusArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the click-popup command
#[derive(Parser, Debug)]
pub struct ClickPopupArgs {
    /// Scene file describing the open dialogs (JSON, or YAML by extension)
    #[arg(short, long)]
    pub scene: PathBuf,

    /// Seconds to wait for the button (defaults to the configured timeout)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Pause between polls in milliseconds (defaults to the configured interval)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Exact button text
    pub text: String,

    /// Print the click log as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the doc-status command
#[derive(Parser, Debug)]
pub struct DocStatusArgs {
    /// Test script file
    pub script: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Output format of the config command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
