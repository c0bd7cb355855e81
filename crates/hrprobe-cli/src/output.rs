//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for scenario runs
///
/// Result lines go to stdout; the progress bar draws on stderr and is
/// suspended while a line is written.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Remove the progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    fn write_line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.suspend(|| {
                let _ = self.term.write_line(line);
            }),
            None => {
                let _ = self.term.write_line(line);
            }
        }
    }

    /// Line for a passed scenario
    #[must_use]
    pub fn pass_line(&self, message: &str) -> String {
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "✓".to_string()
        };
        format!("{prefix} {message}")
    }

    /// Line for a failed scenario
    #[must_use]
    pub fn fail_line(&self, message: &str) -> String {
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "✗".to_string()
        };
        format!("{prefix} {message}")
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.write_line(&self.pass_line(message));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        self.write_line(&self.fail_line(message));
    }

    /// Print an indented detail line under the previous result
    pub fn detail(&self, message: &str) {
        let styled = if self.use_color {
            style(message).dim().to_string()
        } else {
            message.to_string()
        };
        self.write_line(&format!("    {styled}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.write_line("");
        self.write_line(&styled);
    }

    /// Summary line
    #[must_use]
    pub fn summary_line(&self, passed: usize, failed: usize, duration: Duration) -> String {
        let total = passed + failed;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({} passed, {} failed)",
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            )
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed)"
            )
        }
    }

    /// Print the run summary
    pub fn summary(&self, passed: usize, failed: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }
        self.write_line("");
        self.write_line(&self.summary_line(passed, failed, duration));
    }
}
