//! Per-operation timeout configuration for the container engine API.
//!
//! Each lifecycle call gets its own deadline scoped to that operation: a
//! pull can legitimately take minutes while an existence check should take
//! milliseconds, so they never share a budget.
//!
//! ## Configuration via Environment Variables
//!
//! ```bash
//! EXHUME_IMAGE_CHECK_TIMEOUT_SECS=60
//! EXHUME_IMAGE_PULL_TIMEOUT_SECS=600
//! EXHUME_REMOVE_TIMEOUT_SECS=30
//! EXHUME_CREATE_TIMEOUT_SECS=60
//! EXHUME_START_TIMEOUT_SECS=60
//! EXHUME_STOP_TIMEOUT_SECS=30
//! EXHUME_READY_MAX_ATTEMPTS=30
//! EXHUME_READY_INTERVAL_MS=1000
//! ```

use std::time::Duration;

/// Deadlines for each execution-environment operation.
#[derive(Debug, Clone)]
pub struct RuntimeTimeouts {
    /// Image/container existence check timeout (default: 60s)
    pub image_check_secs: u64,

    /// Image pull timeout (default: 600s)
    pub image_pull_secs: u64,

    /// Container removal timeout (default: 30s)
    pub remove_secs: u64,

    /// Container creation timeout (default: 60s)
    pub create_secs: u64,

    /// Start plus wait-until-running timeout (default: 60s)
    /// Distinct from readiness: a running container is not yet serviceable.
    pub start_secs: u64,

    /// Graceful stop timeout (default: 30s)
    pub stop_secs: u64,

    /// Readiness ping attempts before giving up (default: 30)
    pub ready_max_attempts: u32,

    /// Fixed interval between readiness pings (default: 1000ms)
    pub ready_interval_ms: u64,
}

impl Default for RuntimeTimeouts {
    fn default() -> Self {
        Self {
            image_check_secs: 60,
            image_pull_secs: 600,
            remove_secs: 30,
            create_secs: 60,
            start_secs: 60,
            stop_secs: 30,
            ready_max_attempts: 30,
            ready_interval_ms: 1000,
        }
    }
}

impl RuntimeTimeouts {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            image_check_secs: env_u64("EXHUME_IMAGE_CHECK_TIMEOUT_SECS", defaults.image_check_secs),
            image_pull_secs: env_u64("EXHUME_IMAGE_PULL_TIMEOUT_SECS", defaults.image_pull_secs),
            remove_secs: env_u64("EXHUME_REMOVE_TIMEOUT_SECS", defaults.remove_secs),
            create_secs: env_u64("EXHUME_CREATE_TIMEOUT_SECS", defaults.create_secs),
            start_secs: env_u64("EXHUME_START_TIMEOUT_SECS", defaults.start_secs),
            stop_secs: env_u64("EXHUME_STOP_TIMEOUT_SECS", defaults.stop_secs),
            ready_max_attempts: env_u64("EXHUME_READY_MAX_ATTEMPTS", defaults.ready_max_attempts as u64)
                as u32,
            ready_interval_ms: env_u64("EXHUME_READY_INTERVAL_MS", defaults.ready_interval_ms),
        }
    }

    pub fn image_check(&self) -> Duration {
        Duration::from_secs(self.image_check_secs)
    }

    pub fn image_pull(&self) -> Duration {
        Duration::from_secs(self.image_pull_secs)
    }

    pub fn remove(&self) -> Duration {
        Duration::from_secs(self.remove_secs)
    }

    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn start(&self) -> Duration {
        Duration::from_secs(self.start_secs)
    }

    pub fn stop(&self) -> Duration {
        Duration::from_secs(self.stop_secs)
    }

    pub fn ready_interval(&self) -> Duration {
        Duration::from_millis(self.ready_interval_ms)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = RuntimeTimeouts::default();
        assert_eq!(timeouts.image_check_secs, 60);
        assert_eq!(timeouts.image_pull_secs, 600);
        assert_eq!(timeouts.remove_secs, 30);
        assert_eq!(timeouts.create_secs, 60);
        assert_eq!(timeouts.start_secs, 60);
        assert_eq!(timeouts.stop_secs, 30);
        assert_eq!(timeouts.ready_max_attempts, 30);
        assert_eq!(timeouts.ready_interval_ms, 1000);
    }

    #[test]
    fn test_duration_conversion() {
        let timeouts = RuntimeTimeouts::default();
        assert_eq!(timeouts.image_pull(), Duration::from_secs(600));
        assert_eq!(timeouts.stop(), Duration::from_secs(30));
        assert_eq!(timeouts.ready_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_readiness_budget_is_bounded() {
        let timeouts = RuntimeTimeouts::default();
        let budget = timeouts.ready_interval() * timeouts.ready_max_attempts;
        assert_eq!(budget, Duration::from_secs(30));
    }
}
