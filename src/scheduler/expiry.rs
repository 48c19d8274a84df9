//! Periodic expiry of stale pending payments
//!
//! # Design
//!
//! `ExpiryScheduler` runs two fixed-period timers on one task:
//! - every `sweep_interval` it expires pending records older than
//!   `pending_timeout`
//! - every `statistics_interval` it logs the payment count per status
//!
//! Each sweep cycle runs on the blocking pool and is awaited through its
//! `JoinHandle`, so an error or even a panic inside a cycle is logged and
//! the next cycle still fires.

use crate::core::clock::Clock;
use crate::core::PaymentLifecycleManager;
use crate::types::{PaymentError, PaymentStatus, TransactionId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Default period between expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default age after which a pending payment expires
pub const DEFAULT_PENDING_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default period between statistics log lines
pub const DEFAULT_STATISTICS_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Stand-in for a first tick that lies beyond `Instant`'s range
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// What the scheduler drives
///
/// Implemented by `PaymentLifecycleManager`.
pub trait ExpirySweep: Send + Sync + 'static {
    /// Expire pending records submitted before `now - timeout`
    fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Vec<TransactionId>, PaymentError>;

    /// Total record count and count per status
    fn statistics(&self) -> (usize, BTreeMap<PaymentStatus, usize>);
}

impl ExpirySweep for PaymentLifecycleManager {
    fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Vec<TransactionId>, PaymentError> {
        PaymentLifecycleManager::sweep_expired(self, now, timeout)
    }

    fn statistics(&self) -> (usize, BTreeMap<PaymentStatus, usize>) {
        (self.payment_count(), self.status_counts())
    }
}

/// Timer settings of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryConfig {
    pub sweep_interval: Duration,
    pub pending_timeout: Duration,
    pub statistics_interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            pending_timeout: DEFAULT_PENDING_TIMEOUT,
            statistics_interval: DEFAULT_STATISTICS_INTERVAL,
        }
    }
}

/// Periodic sweeper of pending payments
pub struct ExpiryScheduler<S: ExpirySweep> {
    target: Arc<S>,
    clock: Arc<dyn Clock>,
    config: ExpiryConfig,
}

impl<S: ExpirySweep> ExpiryScheduler<S> {
    /// Create a scheduler
    ///
    /// # Arguments
    ///
    /// * `target` - The sweep target, normally the lifecycle manager
    /// * `clock` - Source of the sweep's notion of now
    /// * `config` - Timer periods and the pending timeout
    pub fn new(target: Arc<S>, clock: Arc<dyn Clock>, config: ExpiryConfig) -> Self {
        Self {
            target,
            clock,
            config,
        }
    }

    /// Run one sweep cycle, isolated from its own failures
    ///
    /// # Returns
    ///
    /// The number of expired records, or `None` if the cycle failed.
    pub async fn run_sweep_cycle(&self) -> Option<usize> {
        let target = Arc::clone(&self.target);
        let now = self.clock.now();
        let timeout = self.config.pending_timeout;

        match tokio::task::spawn_blocking(move || target.sweep_expired(now, timeout)).await {
            Ok(Ok(expired)) => {
                if expired.is_empty() {
                    debug!("Expiry sweep found no stale pending payments");
                } else {
                    info!(expired = expired.len(), "Expiry sweep complete");
                }
                Some(expired.len())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Expiry sweep failed");
                None
            }
            Err(e) => {
                error!(error = %e, "Expiry sweep panicked");
                None
            }
        }
    }

    /// Log the payment count per status
    pub fn log_statistics(&self) {
        let (total, counts) = self.target.statistics();
        let breakdown = counts
            .iter()
            .map(|(status, count)| format!("{}={}", status, count))
            .collect::<Vec<_>>()
            .join(", ");
        info!(total = total, breakdown = %breakdown, "Payment statistics");
    }

    /// Start the timers on a new task
    ///
    /// The first sweep fires one `sweep_interval` after the start. The task
    /// stops when `cancel` fires.
    pub fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = Instant::now();
            let mut sweeps = interval_at(
                first_tick(start, self.config.sweep_interval),
                self.config.sweep_interval,
            );
            sweeps.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut statistics = interval_at(
                first_tick(start, self.config.statistics_interval),
                self.config.statistics_interval,
            );
            statistics.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                sweep_interval_secs = self.config.sweep_interval.as_secs(),
                pending_timeout_secs = self.config.pending_timeout.as_secs(),
                "Expiry scheduler started"
            );
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sweeps.tick() => {
                        self.run_sweep_cycle().await;
                    }
                    _ = statistics.tick() => self.log_statistics(),
                }
            }
            info!("Expiry scheduler stopped");
        })
    }
}

fn first_tick(start: Instant, period: Duration) -> Instant {
    start
        .checked_add(period)
        .unwrap_or_else(|| start + FAR_FUTURE)
}
