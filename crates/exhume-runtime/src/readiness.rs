//! Bounded readiness polling for a started environment.

use std::time::Duration;

use exhume_common::{Error, Result};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::RuntimeTimeouts;
use crate::surface::ExecSurface;

/// Administrative ping proving the engine services requests.
const PING: [&str; 5] = ["mysqladmin", "-u", "root", "ping", "--silent"];

/// Fixed-interval, bounded-attempt poll deciding when a started environment
/// is ready to accept work. No backoff: the expected wait is short and the
/// total budget is `max_attempts * interval`.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    max_attempts: u32,
    interval: Duration,
}

impl ReadinessProbe {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_timeouts(timeouts: &RuntimeTimeouts) -> Self {
        Self::new(timeouts.ready_max_attempts, timeouts.ready_interval())
    }

    /// Ping until the engine answers or the attempt budget is exhausted.
    /// Exhaustion carries the last observed failure and is fatal for the
    /// run; no dump is attempted against a not-ready environment.
    pub async fn wait_until_ready(&self, surface: &dyn ExecSurface, name: &str) -> Result<()> {
        let mut last_error = String::from("ping never attempted");
        for attempt in 1..=self.max_attempts {
            match surface.exec_run(name, &PING).await {
                Ok(0) => {
                    info!("engine in {name} ready after {attempt} attempt(s)");
                    return Ok(());
                }
                Ok(code) => last_error = format!("ping exited with status {code}"),
                Err(e) => last_error = e.to_string(),
            }
            debug!(
                "engine in {name} not ready ({attempt}/{}), retrying in {:?}",
                self.max_attempts, self.interval
            );
            sleep(self.interval).await;
        }
        Err(Error::ReadinessTimeout {
            name: name.to_string(),
            attempts: self.max_attempts,
            last_error,
        })
    }
}
