//! Pipeline configuration

use crate::dispatch::{DirectBinding, DispatchConfig};
use crate::scheduler::ExpiryConfig;
use std::time::Duration;
use tracing::warn;

/// Default number of submissions in flight at once while processing a file
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;

/// Configuration of a running pipeline
///
/// Controls the dispatch bound, the queue names, the expiry timers and how
/// many submissions run concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Reply timeout and queue names
    pub dispatch: DispatchConfig,
    /// Endpoint answering the direct leg
    pub direct_binding: DirectBinding,
    /// Sweep period, pending timeout and statistics period
    pub expiry: ExpiryConfig,
    /// Maximum number of submissions processing concurrently
    pub max_in_flight: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            direct_binding: DirectBinding::default(),
            expiry: ExpiryConfig::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

fn duration_or_default(name: &str, value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        warn!(
            "Invalid {} ({:?}), using default ({:?})",
            name, value, default
        );
        default
    } else {
        value
    }
}

impl PipelineConfig {
    /// Create a new PipelineConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(
        reply_timeout: Duration,
        pending_timeout: Duration,
        sweep_interval: Duration,
        max_in_flight: usize,
    ) -> Self {
        let default = Self::default();

        let max_in_flight = if max_in_flight == 0 {
            warn!(
                "Invalid max_in_flight ({}), using default ({})",
                max_in_flight, default.max_in_flight
            );
            default.max_in_flight
        } else {
            max_in_flight
        };

        Self {
            dispatch: DispatchConfig {
                reply_timeout: duration_or_default(
                    "reply_timeout",
                    reply_timeout,
                    default.dispatch.reply_timeout,
                ),
                ..default.dispatch
            },
            direct_binding: default.direct_binding,
            expiry: ExpiryConfig {
                sweep_interval: duration_or_default(
                    "sweep_interval",
                    sweep_interval,
                    default.expiry.sweep_interval,
                ),
                pending_timeout: duration_or_default(
                    "pending_timeout",
                    pending_timeout,
                    default.expiry.pending_timeout,
                ),
                ..default.expiry
            },
            max_in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.dispatch.reply_timeout, Duration::from_secs(30));
        assert_eq!(config.dispatch.request_queue, "fraud.check.requests");
        assert_eq!(config.dispatch.reply_queue, "fraud.check.responses");
        assert_eq!(config.direct_binding, DirectBinding::Local);
        assert_eq!(config.expiry.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.expiry.pending_timeout, Duration::from_secs(1800));
        assert_eq!(config.expiry.statistics_interval, Duration::from_secs(3600));
    }

    #[rstest]
    #[case::zero_reply_timeout(Duration::ZERO, Duration::from_secs(60), Duration::from_secs(10), 4)]
    #[case::zero_pending_timeout(Duration::from_secs(5), Duration::ZERO, Duration::from_secs(10), 4)]
    #[case::zero_sweep_interval(Duration::from_secs(5), Duration::from_secs(60), Duration::ZERO, 4)]
    #[case::zero_in_flight(Duration::from_secs(5), Duration::from_secs(60), Duration::from_secs(10), 0)]
    fn test_zero_values_fall_back(
        #[case] reply_timeout: Duration,
        #[case] pending_timeout: Duration,
        #[case] sweep_interval: Duration,
        #[case] max_in_flight: usize,
    ) {
        let default = PipelineConfig::default();
        let config = PipelineConfig::new(reply_timeout, pending_timeout, sweep_interval, max_in_flight);

        let expect = |given: Duration, fallback: Duration| if given.is_zero() { fallback } else { given };
        assert_eq!(config.dispatch.reply_timeout, expect(reply_timeout, default.dispatch.reply_timeout));
        assert_eq!(config.expiry.pending_timeout, expect(pending_timeout, default.expiry.pending_timeout));
        assert_eq!(config.expiry.sweep_interval, expect(sweep_interval, default.expiry.sweep_interval));
        assert_eq!(config.max_in_flight, if max_in_flight == 0 { DEFAULT_MAX_IN_FLIGHT } else { max_in_flight });
    }
}
