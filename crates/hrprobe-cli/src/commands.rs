//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use hrprobe::Suite;
use std::path::PathBuf;

/// hrprobe: end-to-end scenario suites for OrangeHRM
#[derive(Parser, Debug)]
#[command(name = "hrprobe")]
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

    /// Log output format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against a live OrangeHRM instance
    Run(RunArgs),

    /// List the scenario catalogue
    List(ListArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite to run
    #[arg(short, long, default_value = "all")]
    pub suite: SuiteArg,

    /// Only run scenarios whose `suite::name` contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "HRPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the application base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Suite to list
    #[arg(short, long, default_value = "all")]
    pub suite: SuiteArg,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long, env = "HRPROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Suite selection on the command line
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuiteArg {
    /// Every suite
    #[default]
    All,
    /// Authentication
    Login,
    /// Buzz feed
    Buzz,
    /// My Info personal details
    MyInfo,
}

impl SuiteArg {
    /// Library suite, `None` for all
    #[must_use]
    pub const fn suite(self) -> Option<Suite> {
        match self {
            Self::All => None,
            Self::Login => Some(Suite::Login),
            Self::Buzz => Some(Suite::Buzz),
            Self::MyInfo => Some(Suite::MyInfo),
        }
    }
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
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

/// Log line format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}
