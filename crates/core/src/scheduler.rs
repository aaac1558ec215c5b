//! Outer cycle loop: fixed-interval pacing, no jitter, no backoff.

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::cycle::CycleController;

/// Remaining sleep before the next cycle may start. Never negative; a cycle
/// that overruns the interval is followed immediately.
pub fn wait_duration(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Paces repeated cycle execution at a fixed wall-clock interval.
pub struct CycleScheduler {
    interval: Duration,
}

impl CycleScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run cycles forever.
    ///
    /// Cycle failures are handled at the cycle boundary and never break the
    /// loop. The future only ends by being dropped; process termination is
    /// the only stop mechanism.
    pub async fn run(&self, controller: &mut CycleController) {
        loop {
            let started = Instant::now();

            let outcome = controller.run_cycle().await;
            if let Some(reason) = &outcome.failure {
                info!(reason = %reason, "Cycle ended with handled failure");
            }

            let wait = wait_duration(self.interval, started.elapsed());
            info!(
                wait_secs = wait.as_secs_f64(),
                "Waiting before next run"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_is_zero_when_cycle_overruns_interval() {
        let interval = Duration::from_secs(300);

        assert_eq!(wait_duration(interval, interval), Duration::ZERO);
        assert_eq!(
            wait_duration(interval, Duration::from_secs(400)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_wait_is_remainder_of_interval() {
        let interval = Duration::from_secs(300);

        assert_eq!(
            wait_duration(interval, Duration::from_secs(40)),
            Duration::from_secs(260)
        );
        assert_eq!(
            wait_duration(interval, Duration::from_millis(150)),
            Duration::from_millis(299_850)
        );
        assert_eq!(wait_duration(interval, Duration::ZERO), interval);
    }
}
