use crate::experiment::constants::PROGRESS_TICK_INTERVAL_MS;
use crate::experiment::error::{ExperimentError, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress display for probes that are still running
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    /// Create a tracker for `probe_count` concurrent probes.
    ///
    /// In quiet mode the bar is hidden but the tracker is still usable.
    pub fn new(probe_count: usize, quiet: bool) -> Result<Self> {
        if quiet {
            return Ok(Self {
                pb: ProgressBar::hidden(),
            });
        }

        let pb = ProgressBar::new(probe_count as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner} {msg}\n{bar:40.cyan/blue} {pos:>3}/{len:3} probes [{elapsed_precise}]",
            )
            .map_err(|e| ExperimentError::Measurement(format!("Failed to create progress style: {}", e)))?
            .progress_chars("█░"),
        );
        pb.set_message("Waiting for probes...");
        pb.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_INTERVAL_MS));
        Ok(Self { pb })
    }

    /// Record that the probe for `id` reported back
    pub fn completed(&self, id: &str) {
        self.pb.inc(1);
        self.pb.set_message(format!("Got results for {}", id.green()));
    }

    /// Record that the probe for `id` failed and the batch is over
    pub fn failed(&self, id: &str) {
        self.pb
            .abandon_with_message(format!("No results for {}", id.red().bold()));
    }

    /// Finish the progress bar
    pub fn finish(&self) {
        self.pb.finish_with_message("All probes completed");
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.pb.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_tracker_counts() -> Result<()> {
        let tracker = ProgressTracker::new(3, true)?;
        tracker.completed("Default");
        tracker.completed("High priority");
        assert_eq!(tracker.position(), 2);
        tracker.finish();
        Ok(())
    }
}
