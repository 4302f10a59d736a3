//! Reports the progress of the simulation runs to the console.

use log::info;
use std::time::Duration;

/// Progress of a run, reported after every completed step.
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    /// Index of the run, counting from zero.
    pub run_index: usize,
    /// Total number of runs being performed.
    pub n_runs: usize,
    /// Index of the step that has just completed.
    pub step: usize,
    /// Number of steps in a run.
    pub total_steps: usize,
    /// Wall time elapsed since the run started stepping.
    pub elapsed: Duration,
}

impl Progress {
    /// Fraction of the run completed, between 0 and 1.
    pub fn fraction(&self) -> f64 {
        if self.total_steps == 0 {
            return 1.0;
        }
        (self.step + 1) as f64 / self.total_steps as f64
    }

    /// Estimated wall time until this run and the runs after it are complete.
    ///
    /// Assumes the remaining runs take as long per step as this one.
    pub fn estimated_remaining(&self) -> Duration {
        let completed = self.step + 1;
        let per_step = self.elapsed.as_secs_f64() / completed as f64;
        let remaining_runs = self.n_runs.saturating_sub(self.run_index + 1);
        let remaining_steps =
            self.total_steps.saturating_sub(completed) + remaining_runs * self.total_steps;
        Duration::from_secs_f64(per_step * remaining_steps as f64)
    }
}

/// Receives progress updates from the integrator.
///
/// Runs may be performed in parallel, so observers must be shareable between threads.
pub trait ProgressObserver: Sync {
    fn on_step(&self, progress: &Progress);
}

/// Discards all progress updates.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_step(&self, _progress: &Progress) {}
}

/// Logs the progress and estimated remaining time at regular intervals of each run.
///
/// Runs with fewer steps than `reports_per_run` are not reported.
pub struct ConsoleProgress {
    /// Number of reports written over the course of one run.
    pub reports_per_run: usize,
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        ConsoleProgress {
            reports_per_run: 1000,
        }
    }
}

impl ConsoleProgress {
    fn interval(&self, total_steps: usize) -> Option<usize> {
        match total_steps / self.reports_per_run.max(1) {
            0 => None,
            interval => Some(interval),
        }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_step(&self, progress: &Progress) {
        let interval = match self.interval(progress.total_steps) {
            Some(interval) => interval,
            None => return,
        };
        if (progress.step + 1) % interval != 0 {
            return;
        }
        info!(
            "Run {}/{}: {:.1}% complete, {} remaining.",
            progress.run_index + 1,
            progress.n_runs,
            100.0 * progress.fraction(),
            format_duration(progress.estimated_remaining())
        );
    }
}

/// Formats a duration as `HH:MM:SS`, prefixed by the number of days when longer than a day.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn progress(run_index: usize, step: usize) -> Progress {
        Progress {
            run_index,
            n_runs: 2,
            step,
            total_steps: 100,
            elapsed: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05");
        assert_eq!(format_duration(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[test]
    fn test_estimated_remaining() {
        // 10 steps in 10 s, 90 left in this run and 100 in the next
        let first = progress(0, 9);
        assert_eq!(first.estimated_remaining().as_secs(), 190);
        assert!((first.fraction() - 0.1).abs() < 1e-12);

        let last = progress(1, 99);
        assert_eq!(last.estimated_remaining().as_secs(), 0);
        assert_eq!(last.fraction(), 1.0);
    }

    #[test]
    fn test_console_interval() {
        let console = ConsoleProgress {
            reports_per_run: 1000,
        };
        assert_eq!(console.interval(100), None);
        assert_eq!(console.interval(999), None);
        assert_eq!(console.interval(1000), Some(1));
        assert_eq!(console.interval(10_000), Some(10));
    }
}
