use std::time::Instant;

pub fn format_duration_from_seconds(seconds: u64) -> String {
    let hours = seconds / (60 * 60);
    let minutes = seconds % (60 * 60) / 60;
    let seconds = seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Prints completion, speed and time left after each flushed stagger batch.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    total_nonces: u64,
    stagger_size: u64,
    async_mode: bool,
}

impl ProgressReporter {
    pub fn new(total_nonces: u64, stagger_size: u64, async_mode: bool) -> Self {
        Self { total_nonces, stagger_size, async_mode }
    }

    pub fn percent(&self, completed: u64) -> f64 {
        100.0 * completed as f64 / self.total_nonces as f64
    }

    /// Nonces per minute and seconds left, given how long the last batch took
    /// from the start of hashing to the end of its flush.
    pub fn estimate(&self, completed: u64, batch_seconds: f64) -> (u64, u64) {
        let seconds = batch_seconds.max(1e-3);
        let remaining = self.total_nonces.saturating_sub(completed);
        ((self.stagger_size as f64 * 60.0 / seconds) as u64,
         (remaining as f64 * seconds / self.stagger_size as f64) as u64)
    }

    pub fn writing(&self, run: u64) {
        debug!("{:5.2}% done. [writing{}]", self.percent(run), if self.async_mode { " asynchronously" } else { "" });
    }

    pub fn flushed(&self, completed: u64, batch_started: Instant) {
        let (per_minute, seconds_left) = self.estimate(completed, batch_started.elapsed().as_secs_f64());
        info!("{:5.2}% done. {} nonces per minute, {} left",
              self.percent(completed), per_minute, format_duration_from_seconds(seconds_left));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_duration_from_seconds(0), "00:00:00");
        assert_eq!(format_duration_from_seconds(3661), "01:01:01");
        assert_eq!(format_duration_from_seconds(100 * 3600 + 59), "100:00:59");
    }

    #[test]
    fn estimates_rate_and_time_left() {
        let reporter = ProgressReporter::new(10000, 2000, false);
        assert_eq!(reporter.percent(2000), 20.0);
        let (per_minute, left) = reporter.estimate(2000, 10.0);
        assert_eq!(per_minute, 12000);
        assert_eq!(left, 40);
        assert_eq!(reporter.estimate(10000, 60.0).1, 0);
    }
}
