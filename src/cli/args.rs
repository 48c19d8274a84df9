use crate::dispatch::{DirectBinding, TransportKind};
use crate::pipeline::PipelineConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Screen payment requests for fraud and track their lifecycle
#[derive(Parser, Debug)]
#[command(name = "payments-bridge")]
#[command(about = "Screen payment requests for fraud and track their lifecycle", long_about = None)]
pub struct CliArgs {
    /// Input JSON Lines file path containing payment requests
    #[arg(value_name = "INPUT", help = "Path to the input JSON Lines file")]
    pub input_file: PathBuf,

    /// Transport the fraud checks are dispatched over
    #[arg(
        long = "transport",
        value_name = "TRANSPORT",
        default_value = "queued",
        help = "Fraud check transport: 'direct' for a synchronous call or 'queued' for a queue round-trip"
    )]
    pub transport: TransportKind,

    /// Endpoint answering direct fraud checks
    #[arg(
        long = "direct-binding",
        value_name = "BINDING",
        default_value = "local",
        help = "Direct leg endpoint: 'local' evaluates in process, 'queue-relay' relays over the queue"
    )]
    pub direct_binding: DirectBinding,

    /// Seconds to wait for a fraud check reply
    #[arg(
        long = "reply-timeout-secs",
        value_name = "SECS",
        help = "Seconds to wait for a fraud check reply (default: 30)"
    )]
    pub reply_timeout_secs: Option<u64>,

    /// Minutes after which a pending payment expires
    #[arg(
        long = "pending-timeout-mins",
        value_name = "MINS",
        help = "Minutes after which a pending payment expires (default: 30)"
    )]
    pub pending_timeout_mins: Option<u64>,

    /// Seconds between expiry sweeps
    #[arg(
        long = "sweep-interval-secs",
        value_name = "SECS",
        help = "Seconds between expiry sweeps (default: 300)"
    )]
    pub sweep_interval_secs: Option<u64>,

    /// Maximum number of submissions processing concurrently
    #[arg(
        long = "max-in-flight",
        value_name = "COUNT",
        help = "Maximum number of payments processing concurrently (default: 256)"
    )]
    pub max_in_flight: Option<usize>,

    /// Number of runtime worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,
}

impl CliArgs {
    /// Create a PipelineConfig from CLI arguments
    ///
    /// Values not given on the command line fall back to the defaults; zero
    /// values are replaced with the defaults and a warning is logged.
    ///
    /// # Returns
    ///
    /// A `PipelineConfig` with values from CLI arguments or defaults.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let default = PipelineConfig::default();
        let config = PipelineConfig::new(
            self.reply_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(default.dispatch.reply_timeout),
            self.pending_timeout_mins
                .map(|mins| Duration::from_secs(mins.saturating_mul(60)))
                .unwrap_or(default.expiry.pending_timeout),
            self.sweep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(default.expiry.sweep_interval),
            self.max_in_flight.unwrap_or(default.max_in_flight),
        );
        PipelineConfig {
            direct_binding: self.direct_binding,
            ..config
        }
    }

    /// Number of runtime worker threads, at least one
    pub fn worker_threads(&self) -> usize {
        match self.workers {
            Some(0) | None => num_cpus::get(),
            Some(workers) => workers,
        }
    }
}
