use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::db::config::HealthCheckConfig;

#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub timestamp_ms: u64,
}

impl HealthCheckResult {
    pub fn healthy(latency: Duration) -> Self {
        Self {
            healthy: true,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
            timestamp_ms: now_ms(),
        }
    }

    pub fn unhealthy(error: String) -> Self {
        Self {
            healthy: false,
            latency_ms: None,
            error: Some(error),
            timestamp_ms: now_ms(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthCheckSnapshot {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub timestamp_ms: Option<u64>,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
pub struct HealthTracker {
    config: HealthCheckConfig,
    consecutive_failures: u32,
    last_result: Option<HealthCheckResult>,
}

impl HealthTracker {
    pub fn new(config: HealthCheckConfig) -> Self {
        Self {
            config,
            consecutive_failures: 0,
            last_result: None,
        }
    }

    pub fn process(&mut self, result: HealthCheckResult) {
        if result.healthy {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            if self.consecutive_failures == self.config.failure_threshold {
                tracing::error!(
                    failures = self.consecutive_failures,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "database failure threshold reached"
                );
            }
        }
        self.last_result = Some(result);
    }

    pub fn snapshot(&self) -> HealthCheckSnapshot {
        HealthCheckSnapshot {
            healthy: self.last_result.as_ref().map(|r| r.healthy).unwrap_or(false),
            latency_ms: self.last_result.as_ref().and_then(|r| r.latency_ms),
            error: self.last_result.as_ref().and_then(|r| r.error.clone()),
            timestamp_ms: self.last_result.as_ref().map(|r| r.timestamp_ms),
            consecutive_failures: self.consecutive_failures,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> HealthCheckConfig {
        HealthCheckConfig {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(10),
            failure_threshold: 3,
        }
    }

    #[test]
    fn failures_accumulate_and_reset() {
        let mut tracker = HealthTracker::new(config());

        tracker.process(HealthCheckResult::unhealthy("refused".into()));
        tracker.process(HealthCheckResult::unhealthy("refused".into()));
        assert_eq!(tracker.snapshot().consecutive_failures, 2);
        assert!(!tracker.snapshot().healthy);

        tracker.process(HealthCheckResult::healthy(Duration::from_millis(2)));
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.consecutive_failures, 0);
        assert!(snapshot.healthy);
        assert_eq!(snapshot.latency_ms, Some(2));
    }
}
