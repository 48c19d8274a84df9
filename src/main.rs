//! Payments Bridge CLI
//!
//! Screens payment requests from a JSON Lines file for fraud and prints the
//! resulting payment records.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- payments.jsonl > outcomes.jsonl
//! cargo run -- --transport direct payments.jsonl > outcomes.jsonl
//! cargo run -- --transport queued --reply-timeout-secs 10 payments.jsonl > outcomes.jsonl
//! RUST_LOG=debug cargo run -- payments.jsonl
//! ```
//!
//! Every input line yields one output line: the payment record on success,
//! an error response (`code`, `message`, `errors`) on failure. Logs go to
//! stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (individual payments may still have failed)
//! - 1: Error (file not found, file not readable, output not writable, etc.)

use payments_bridge::cli;
use payments_bridge::pipeline::{self, Pipeline};
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    let config = args.to_pipeline_config();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let pipeline = Pipeline::start(config);
        let mut output = std::io::stdout();
        let result =
            pipeline::process_file(&pipeline, &args.input_file, args.transport, &mut output).await;
        pipeline.shutdown().await;
        result
    });

    if let Err(e) = result {
        error!("Error: {}", e);
        process::exit(1);
    }
}
