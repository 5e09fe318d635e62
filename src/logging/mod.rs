//! Output control for the mirror CLI
//!
//! This module provides the [`Logger`] for controlling output verbosity and
//! formatting, plus [`ConsoleProgress`], the presentation side of the copy
//! worker pool. Regular output goes to stdout, errors to stderr.

use crate::concurrency::{ProgressEvent, ProgressObserver, TaskOutcome};
use crate::sync::CopyTask;
use std::time::{Duration, Instant};

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    /// Sub-section heading
    pub fn subsection(&self, title: &str) {
        if !self.quiet {
            println!("\n--- {} ---", title);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("📝 {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  WARNING: {}", message);
        }
    }

    /// Error message, shown even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Step information
    pub fn step(&self, message: &str) {
        if !self.quiet {
            println!("▶️  {}", message);
        }
    }

    /// Plain line, used for listings that scripts may consume
    pub fn plain(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("   {}", message);
        }
    }

    /// Key-value pair summary display
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            self.subsection(title);
            for (key, value) in items {
                println!("  {}: {}", key, value);
            }
        }
    }

    /// Time since the logger was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{}.{}s", secs, duration.subsec_millis() / 100)
        } else if secs < 3600 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

/// Prints one line per finished copy task
///
/// Failures are printed at the moment they complete, regardless of verbosity,
/// so they are never lost in a long run.
pub struct ConsoleProgress {
    logger: Logger,
}

impl ConsoleProgress {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    fn counter(event: &ProgressEvent) -> String {
        let width = event.total.to_string().len();
        format!("[{:>width$}/{}]", event.completed, event.total, width = width)
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_dispatch(&self, worker: usize, task: &CopyTask) {
        self.logger
            .detail(&format!("worker {} picked up {}", worker, task.source));
    }

    fn on_complete(&self, event: &ProgressEvent) {
        let record = &event.record;
        let counter = Self::counter(event);
        let elapsed = self.logger.format_duration(record.elapsed);

        match &record.outcome {
            TaskOutcome::Succeeded => self.logger.success(&format!(
                "{} copied {} -> {} ({})",
                counter, record.task.source, record.task.destination, elapsed
            )),
            TaskOutcome::Skipped { .. } => self.logger.warning(&format!(
                "{} skip (missing on source): {}",
                counter, record.task.source
            )),
            TaskOutcome::Failed { error } => self.logger.error(&format!(
                "{} copy failed for {}: {}",
                counter, record.task.source, error
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(logger.format_duration(Duration::from_secs(125)), "2m5s");
        assert_eq!(logger.format_duration(Duration::from_secs(3725)), "1h2m5s");
    }
}
