use crate::model::AggregationTable;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::time::Duration;

/// Operator-facing observation sink.
///
/// Everything goes to stderr; stdout is reserved for the serialized table.
/// With `quiet` set nothing is printed and progress bars are hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    pub quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn status(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{}", style(message).bold().white().on_red());
        }
    }

    pub fn starting(&self) {
        self.status(style("starting!").bold());
    }

    pub fn job(&self, label: &str) {
        self.status(format_args!("{} {label}", style("processing:").bold().blue()));
    }

    /// Begin reporting for one repository of the current job.
    pub fn repo(&self, full_name: &str) -> RepoProgress {
        self.status(format_args!("{} {full_name}", style("processing repo:").bold().blue()));

        let bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} ({pos} commits)")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("scanning {full_name}"));
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        };

        RepoProgress {
            bar,
            quiet: self.quiet,
        }
    }

    pub fn done(&self, table: &AggregationTable, elapsed: Duration) {
        if self.quiet {
            return;
        }
        let elapsed = Duration::from_secs(elapsed.as_secs());
        eprintln!(
            "{} in {} output:",
            style("done!").bold(),
            humantime::format_duration(elapsed)
        );
        eprintln!("{table:?}");
    }

    pub fn interrupted(&self) {
        self.warn("caught ^C, exiting gracefully!");
    }
}

/// Progress for a single repository scan.
pub struct RepoProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl RepoProgress {
    pub fn commit_scanned(&self) {
        self.bar.inc(1);
    }

    pub fn file_change(&self, filename: &str, author: &str, changes: u64) {
        if self.quiet {
            return;
        }
        self.bar.suspend(|| {
            eprintln!("file '{filename}' by '{author}' with {changes} changes");
        });
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for RepoProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
