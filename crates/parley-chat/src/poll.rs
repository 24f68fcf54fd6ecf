// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded polling of a run until it leaves `queued` / `in_progress`.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use parley_config::PollingConfig;
use parley_core::types::AgentRun;
use parley_core::{AgentService, ParleyError};

/// How often and for how long a turn waits on its run.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second fetch.
    pub interval: Duration,
    /// Cap on the delay between fetches.
    pub max_interval: Duration,
    /// Growth factor applied after each fetch.
    pub multiplier: f64,
    /// Total wait allowed before giving up.
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_interval: config.max_interval(),
            multiplier: config.backoff_multiplier,
            deadline: config.deadline(),
        }
    }
}

impl PollPolicy {
    /// The delay that follows `current`.
    ///
    /// A product too large for [`Duration`] saturates at `max_interval`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let grown = current.as_secs_f64() * self.multiplier.max(1.0);
        Duration::try_from_secs_f64(grown)
            .map_or(self.max_interval, |d| d.min(self.max_interval))
    }
}

/// Fetches the run immediately, then re-fetches with backoff while it is pending.
///
/// Returns the first non-pending run, or [`ParleyError::RunTimedOut`] once
/// the deadline passes with the run still pending.
pub async fn wait_for_run(
    service: &dyn AgentService,
    thread_id: &str,
    run_id: &str,
    policy: &PollPolicy,
) -> Result<AgentRun, ParleyError> {
    let started = Instant::now();
    let mut delay = policy.interval;
    let mut run = service.get_run(thread_id, run_id).await?;
    let mut polls = 1u32;

    while run.status.is_pending() {
        let waited = started.elapsed();
        if waited >= policy.deadline {
            return Err(ParleyError::RunTimedOut {
                run_id: run_id.to_string(),
                waited,
            });
        }

        tokio::time::sleep(delay.min(policy.deadline - waited)).await;
        run = service.get_run(thread_id, run_id).await?;
        polls += 1;
        debug!(run_id, status = %run.status, polls, "polled run");
        delay = policy.next_delay(delay);
    }

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_then_cap() {
        let policy = PollPolicy::default();
        let mut delay = policy.interval;
        let mut seen = vec![delay];
        for _ in 0..5 {
            delay = policy.next_delay(delay);
            seen.push(delay);
        }
        let millis: Vec<u128> = seen.iter().map(Duration::as_millis).collect();
        assert_eq!(millis, vec![1000, 1500, 2250, 3375, 5000, 5000]);
    }

    #[test]
    fn huge_multiplier_saturates_at_max_interval() {
        let policy = PollPolicy {
            multiplier: 1e300,
            ..PollPolicy::default()
        };
        assert_eq!(policy.next_delay(policy.interval), policy.max_interval);
        assert_eq!(policy.next_delay(policy.max_interval), policy.max_interval);
    }

    #[test]
    fn multiplier_below_one_never_shrinks_delay() {
        let policy = PollPolicy {
            multiplier: 0.5,
            ..PollPolicy::default()
        };
        assert_eq!(policy.next_delay(Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[test]
    fn policy_follows_runtime_config() {
        let config = PollingConfig {
            interval_ms: 200,
            max_interval_ms: 800,
            backoff_multiplier: 2.0,
            deadline_secs: 10,
        };
        let policy = PollPolicy::from(&config);
        assert_eq!(policy.interval, Duration::from_millis(200));
        assert_eq!(policy.deadline, Duration::from_secs(10));
        assert_eq!(policy.next_delay(Duration::from_millis(600)), Duration::from_millis(800));
    }
}
