//! hrprobe: run the OrangeHRM end-to-end scenario suites
//!
//! ## Usage
//!
//! ```bash
//! hrprobe run                        # Every suite, headless
//! hrprobe run --suite buzz --headed  # One suite in a visible browser
//! hrprobe run --filter toast -vv     # Matching scenarios, debug logging
//! hrprobe list                       # Scenario catalogue
//! hrprobe config --config hr.yaml    # Effective configuration
//! ```

use clap::Parser;
use hrprobe::{scenarios, ScenarioId, SuiteConfig};
use hrprobe_cli::{
    effective_config, logging, select_scenarios, Cli, CliConfig, CliResult, ColorChoice,
    Commands, ConfigArgs, ListArgs, RunArgs, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity, cli.log_format)?;

    match cli.command {
        Commands::Run(args) => run_suites(config, &args),
        Commands::List(args) => {
            run_list(&config, &args);
            Ok(())
        }
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
}

fn run_suites(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let suite_config = effective_config(args.config.as_deref(), args.base_url.as_deref(), args.headed)?;
    let selected = select_scenarios(args.suite.suite(), args.filter.as_deref())?;
    let config = config.with_fail_fast(args.fail_fast);

    if config.verbosity.is_verbose() {
        println!(
            "Running {} scenario(s) against {}",
            selected.len(),
            suite_config.base_url
        );
    }

    run_in_browser(&config, &suite_config, &selected)
}

#[cfg(feature = "browser")]
fn run_in_browser(config: &CliConfig, suite_config: &SuiteConfig, selected: &[ScenarioId]) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut launcher = hrprobe_cli::ChromiumLauncher::new(suite_config);
    let mut reporter =
        hrprobe_cli::ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let summary = runtime.block_on(hrprobe_cli::run_scenarios(
        &mut launcher,
        suite_config,
        selected,
        config.fail_fast,
        &mut reporter,
    ));
    summary.into_result()
}

#[cfg(not(feature = "browser"))]
fn run_in_browser(_config: &CliConfig, _suite_config: &SuiteConfig, selected: &[ScenarioId]) -> CliResult<()> {
    Err(hrprobe_cli::CliError::config(format!(
        "cannot run {} scenario(s): hrprobe was built without the `browser` feature \
         (rebuild with `--features browser`)",
        selected.len()
    )))
}

fn run_list(config: &CliConfig, args: &ListArgs) {
    let selected = scenarios::select(args.suite.suite(), None);
    for id in &selected {
        println!("{id}");
    }
    if !config.verbosity.is_quiet() {
        println!();
        println!("{} scenario(s)", selected.len());
    }
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let suite_config = effective_config(args.config.as_deref(), None, false)?;
    print!("{}", suite_config.to_yaml()?);
    Ok(())
}
