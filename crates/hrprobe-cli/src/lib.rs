//! hrprobe CLI library
//!
//! Command-line front end for the hrprobe scenario suites: run them against
//! a live OrangeHRM instance, list the catalogue, show the configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ListArgs, LogFormat, RunArgs, SuiteArg};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{effective_config, run_scenarios, select_scenarios, Launcher, RunSummary, ScenarioReport};

#[cfg(feature = "browser")]
pub use runner::ChromiumLauncher;
