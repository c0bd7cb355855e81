//! Scenario runner
//!
//! Every scenario gets its own driver from a [`Launcher`] and its own
//! [`TestContext`]; nothing carries over between scenarios.

use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use async_trait::async_trait;
use hrprobe::{scenarios, Driver, FailureKind, ProbeResult, ScenarioId, Suite, SuiteConfig, TestContext};
use std::path::Path;
use std::time::{Duration, Instant};

/// Source of fresh drivers, one per scenario
#[async_trait]
pub trait Launcher: Send {
    /// Driver type handed to each scenario
    type Driver: Driver + 'static;

    /// Start a fresh browser page
    async fn launch(&mut self) -> ProbeResult<Self::Driver>;

    /// Tear a driver down after its scenario
    async fn close(&mut self, driver: Self::Driver) -> ProbeResult<()> {
        drop(driver);
        Ok(())
    }
}

/// Launches one headless or headed chromium per scenario
#[cfg(feature = "browser")]
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: hrprobe::DriverConfig,
}

#[cfg(feature = "browser")]
impl ChromiumLauncher {
    /// Launcher for the given suite configuration
    #[must_use]
    pub fn new(config: &SuiteConfig) -> Self {
        Self {
            config: hrprobe::DriverConfig::from_suite(config),
        }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl Launcher for ChromiumLauncher {
    type Driver = hrprobe::ChromiumDriver;

    async fn launch(&mut self) -> ProbeResult<Self::Driver> {
        hrprobe::ChromiumDriver::launch(&self.config).await
    }

    async fn close(&mut self, driver: Self::Driver) -> ProbeResult<()> {
        driver.close().await
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// `suite::name`
    pub name: String,
    /// Number of checks that passed
    pub checks: usize,
    /// Failure kind and message, `None` when the scenario passed
    pub failure: Option<(FailureKind, String)>,
    /// Wall-clock time including browser start-up
    pub duration: Duration,
}

impl ScenarioReport {
    /// Whether the scenario passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Aggregated scenario results
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Reports in execution order
    pub reports: Vec<ScenarioReport>,
    /// Total duration
    pub duration: Duration,
}

impl RunSummary {
    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    /// Whether every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(ScenarioReport::passed)
    }

    /// `Ok` when everything passed, a test execution error otherwise
    pub fn into_result(self) -> CliResult<()> {
        if self.all_passed() {
            Ok(())
        } else {
            Err(CliError::test_execution(format!(
                "{} scenario(s) failed",
                self.failed()
            )))
        }
    }
}

/// Build the effective suite configuration.
///
/// Precedence, lowest first: defaults, the YAML file, `HRPROBE_*`
/// environment variables, command-line flags.
pub fn effective_config(
    path: Option<&Path>,
    base_url: Option<&str>,
    headed: bool,
) -> CliResult<SuiteConfig> {
    let mut config = match path {
        Some(path) => SuiteConfig::load(path)?,
        None => SuiteConfig::default(),
    }
    .apply_env()?;
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    if headed {
        config = config.with_headless(false);
    }
    config.validate()?;
    Ok(config)
}

/// Scenarios to run; an empty selection is an argument error
pub fn select_scenarios(suite: Option<Suite>, filter: Option<&str>) -> CliResult<Vec<ScenarioId>> {
    let selected = scenarios::select(suite, filter);
    if selected.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no scenarios match suite {} and filter {:?}",
            suite.map_or("all", |s| s.as_str()),
            filter.unwrap_or("")
        )));
    }
    Ok(selected)
}

/// Run `scenarios` in order, each on a freshly launched driver
pub async fn run_scenarios<L: Launcher>(
    launcher: &mut L,
    config: &SuiteConfig,
    scenarios: &[ScenarioId],
    fail_fast: bool,
    reporter: &mut ProgressReporter,
) -> RunSummary {
    let started = Instant::now();
    let mut summary = RunSummary::default();
    reporter.start_progress(scenarios.len() as u64, "running scenarios");

    for &id in scenarios {
        let name = id.qualified_name();
        reporter.set_message(&name);
        let report = run_one(launcher, config, id).await;

        match &report.failure {
            None => reporter.success(&format!(
                "{name} ({} checks, {:.2}s)",
                report.checks,
                report.duration.as_secs_f64()
            )),
            Some((kind, message)) => {
                reporter.failure(&format!("{name} [{kind}]"));
                reporter.detail(message);
            }
        }
        reporter.increment(1);

        let stop = fail_fast && !report.passed();
        summary.reports.push(report);
        if stop {
            tracing::info!(scenario = %name, "stopping after first failure");
            break;
        }
    }

    reporter.finish();
    summary.duration = started.elapsed();
    reporter.summary(summary.passed(), summary.failed(), summary.duration);
    summary
}

async fn run_one<L: Launcher>(launcher: &mut L, config: &SuiteConfig, id: ScenarioId) -> ScenarioReport {
    let started = Instant::now();
    let name = id.qualified_name();

    let outcome = match launcher.launch().await {
        Ok(driver) => {
            let mut ctx = TestContext::new(name.clone(), driver, config.clone());
            let outcome = id.run(&mut ctx).await;
            if let Err(e) = launcher.close(ctx.into_driver()).await {
                tracing::warn!(scenario = %name, error = %e, "driver teardown failed");
            }
            outcome
        }
        Err(e) => Err(e),
    };

    ScenarioReport {
        name,
        checks: outcome.as_ref().map_or(0, hrprobe::ScenarioOutcome::len),
        failure: outcome.err().map(|e| (e.kind(), e.to_string())),
        duration: started.elapsed(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hrprobe::mock::MockDriver;
    use hrprobe::ProbeError;
    use std::io::Write as _;

    struct MockLauncher {
        launched: usize,
        closed: usize,
        fail_launch: bool,
    }

    impl MockLauncher {
        const fn new() -> Self {
            Self {
                launched: 0,
                closed: 0,
                fail_launch: false,
            }
        }
    }

    #[async_trait]
    impl Launcher for MockLauncher {
        type Driver = MockDriver;

        async fn launch(&mut self) -> ProbeResult<MockDriver> {
            if self.fail_launch {
                return Err(ProbeError::driver("no chromium on PATH"));
            }
            self.launched += 1;
            Ok(MockDriver::new())
        }

        async fn close(&mut self, driver: MockDriver) -> ProbeResult<()> {
            drop(driver);
            self.closed += 1;
            Ok(())
        }
    }

    fn fast_config() -> SuiteConfig {
        SuiteConfig::default()
            .with_command_timeout(200)
            .with_network_timeouts(200, 200)
            .with_poll_interval(50)
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults_without_file() {
            let config = effective_config(None, None, false).unwrap();
            assert!(config.headless);
        }

        #[test]
        fn test_flags_override_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "base_url: http://from-file.local\nheadless: true").unwrap();

            let config = effective_config(Some(file.path()), Some("http://flag.local"), true).unwrap();
            assert_eq!(config.base_url, "http://flag.local");
            assert!(!config.headless);
        }

        #[test]
        fn test_invalid_base_url_rejected() {
            let err = effective_config(None, Some("ftp://hr.local"), false).unwrap_err();
            assert!(matches!(err, CliError::Probe(_)));
            assert!(err.to_string().contains("base_url"));
        }

        #[test]
        fn test_missing_file_is_an_error() {
            let err = effective_config(Some(Path::new("/nonexistent/hr.yaml")), None, false).unwrap_err();
            assert!(err.to_string().contains("cannot read"));
        }
    }

    mod select_tests {
        use super::*;

        #[test]
        fn test_suite_selection() {
            let selected = select_scenarios(Some(Suite::Login), None).unwrap();
            assert_eq!(selected.len(), 3);
            assert!(selected.iter().all(|id| id.suite() == Suite::Login));
        }

        #[test]
        fn test_filter_selection() {
            let selected = select_scenarios(None, Some("toast")).unwrap();
            assert_eq!(
                selected,
                vec![
                    ScenarioId::LikeNetworkErrorShowsToast,
                    ScenarioId::UpdateNetworkErrorShowsToast
                ]
            );
        }

        #[test]
        fn test_empty_selection_is_an_error() {
            let err = select_scenarios(Some(Suite::Buzz), Some("login")).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }
    }

    mod summary_tests {
        use super::*;

        fn report(name: &str, failure: Option<(FailureKind, String)>) -> ScenarioReport {
            ScenarioReport {
                name: name.to_string(),
                checks: 1,
                failure,
                duration: Duration::ZERO,
            }
        }

        #[test]
        fn test_counts() {
            let summary = RunSummary {
                reports: vec![
                    report("login::a", None),
                    report("login::b", Some((FailureKind::Timeout, "late".to_string()))),
                ],
                duration: Duration::ZERO,
            };
            assert_eq!(summary.passed(), 1);
            assert_eq!(summary.failed(), 1);
            assert!(!summary.all_passed());
            let err = summary.into_result().unwrap_err();
            assert!(err.to_string().contains("1 scenario(s) failed"));
        }

        #[test]
        fn test_empty_summary_passes() {
            assert!(RunSummary::default().into_result().is_ok());
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_each_scenario_gets_a_fresh_driver() {
            let mut launcher = MockLauncher::new();
            let mut reporter = ProgressReporter::new(false, true);
            let scenarios = select_scenarios(Some(Suite::Login), None).unwrap();

            let summary = run_scenarios(&mut launcher, &fast_config(), &scenarios, false, &mut reporter).await;

            assert_eq!(launcher.launched, 3);
            assert_eq!(launcher.closed, 3);
            assert_eq!(summary.reports.len(), 3);
            // An empty page has no login form
            assert_eq!(summary.failed(), 3);
            assert_eq!(summary.reports[0].name, "login::valid_login_reaches_dashboard");
        }

        #[tokio::test(start_paused = true)]
        async fn test_fail_fast_stops_after_first_failure() {
            let mut launcher = MockLauncher::new();
            let mut reporter = ProgressReporter::new(false, true);
            let scenarios = select_scenarios(Some(Suite::MyInfo), None).unwrap();

            let summary = run_scenarios(&mut launcher, &fast_config(), &scenarios, true, &mut reporter).await;

            assert_eq!(summary.reports.len(), 1);
            assert_eq!(launcher.launched, 1);
        }

        #[tokio::test]
        async fn test_launch_failure_is_reported_per_scenario() {
            let mut launcher = MockLauncher::new();
            launcher.fail_launch = true;
            let mut reporter = ProgressReporter::new(false, true);
            let scenarios = select_scenarios(Some(Suite::Buzz), Some("like")).unwrap();

            let summary = run_scenarios(&mut launcher, &fast_config(), &scenarios, false, &mut reporter).await;

            assert_eq!(summary.reports.len(), scenarios.len());
            for report in &summary.reports {
                let (kind, message) = report.failure.as_ref().unwrap();
                assert_eq!(*kind, FailureKind::Driver);
                assert!(message.contains("no chromium"));
            }
            assert_eq!(launcher.closed, 0);
        }
    }
}
