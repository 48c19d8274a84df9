//! Composition root of the payments bridge
//!
//! `Pipeline::start` constructs every component explicitly and wires them
//! together, passing each capability by `Arc`:
//!
//! ```text
//! Pipeline
//!     ├── InMemoryBroker            (queue transport)
//!     ├── FraudCheckResponder task  (consumes the request queue)
//!     ├── DispatchBridge            (direct leg per `DirectBinding`)
//!     │     ├── reply listener task (consumes the reply queue)
//!     │     └── relay DispatchBridge (queue-relay binding only, own reply queue)
//!     ├── PaymentLifecycleManager   (validator + RecordStore + bridge)
//!     └── ExpiryScheduler task      (sweeps the manager)
//! ```
//!
//! `Pipeline::shutdown` cancels the shared token and waits for every task.

pub mod config;

pub use config::PipelineConfig;

use crate::core::{Clock, PaymentLifecycleManager, PaymentValidator, RecordStore, SystemClock};
use crate::dispatch::{
    DirectBinding, DirectEndpoint, DispatchBridge, DispatchConfig, InMemoryBroker,
    LocalFraudEndpoint, QueueRelayEndpoint, TransportKind,
};
use crate::fraud::{Blacklists, FraudCheckResponder, FraudEvaluator};
use crate::io::{write_outcome, RequestReader};
use crate::scheduler::ExpiryScheduler;
use crate::types::{PaymentError, PaymentRecord, PaymentRequest};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Suffix of the reply queue used by the queue-relay direct leg
const RELAY_REPLY_SUFFIX: &str = ".relay";

/// A running payments bridge
pub struct Pipeline {
    config: PipelineConfig,
    bridge: Arc<DispatchBridge>,
    manager: Arc<PaymentLifecycleManager>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Build and start a pipeline on the wall clock
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: PipelineConfig) -> Self {
        Self::start_with_clock(config, Arc::new(SystemClock))
    }

    /// Build and start a pipeline on the given clock
    pub fn start_with_clock(config: PipelineConfig, clock: Arc<dyn Clock>) -> Self {
        let cancel = CancellationToken::new();
        let broker = Arc::new(InMemoryBroker::new());
        let evaluator = Arc::new(FraudEvaluator::new(Blacklists::default(), Arc::clone(&clock)));

        let responder = Arc::new(FraudCheckResponder::new(
            broker.clone(),
            Arc::clone(&evaluator),
            config.dispatch.request_queue.as_str(),
        ));
        let mut tasks = vec![responder.start(cancel.clone())];

        let direct: Arc<dyn DirectEndpoint> = match config.direct_binding {
            DirectBinding::Local => Arc::new(LocalFraudEndpoint::new(Arc::clone(&evaluator))),
            DirectBinding::QueueRelay => {
                // replies to relayed calls must not reach the main listener
                let relay_config = DispatchConfig {
                    reply_queue: format!("{}{}", config.dispatch.reply_queue, RELAY_REPLY_SUFFIX),
                    ..config.dispatch.clone()
                };
                let relay = Arc::new(DispatchBridge::new(
                    relay_config,
                    broker.clone(),
                    Arc::new(LocalFraudEndpoint::new(Arc::clone(&evaluator))),
                ));
                tasks.push(relay.spawn_reply_listener(cancel.clone()));
                Arc::new(QueueRelayEndpoint::new(relay))
            }
        };

        let bridge = Arc::new(DispatchBridge::new(config.dispatch.clone(), broker, direct));
        tasks.push(bridge.spawn_reply_listener(cancel.clone()));

        let manager = Arc::new(PaymentLifecycleManager::new(
            PaymentValidator::new(),
            Arc::new(RecordStore::new()),
            Arc::clone(&bridge),
            Arc::clone(&clock),
        ));

        tasks.push(
            ExpiryScheduler::new(Arc::clone(&manager), clock, config.expiry).start(cancel.clone()),
        );

        info!(
            direct_binding = %config.direct_binding,
            reply_timeout_secs = config.dispatch.reply_timeout.as_secs(),
            request_queue = %config.dispatch.request_queue,
            reply_queue = %config.dispatch.reply_queue,
            "Payments bridge started"
        );

        Self {
            config,
            bridge,
            manager,
            cancel,
            tasks,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bridge(&self) -> &Arc<DispatchBridge> {
        &self.bridge
    }

    pub fn manager(&self) -> &Arc<PaymentLifecycleManager> {
        &self.manager
    }

    /// Submit one payment
    pub async fn submit(
        &self,
        request: PaymentRequest,
        transport: TransportKind,
    ) -> Result<PaymentRecord, PaymentError> {
        self.manager.submit(request, transport).await
    }

    /// Stop every background task and wait for them
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Background task ended abnormally");
            }
        }
        info!("Payments bridge stopped");
    }
}

/// Counts of one processed input file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Lines processed
    pub processed: usize,
    /// Lines that produced a payment record
    pub succeeded: usize,
    /// Lines that produced an error response
    pub failed: usize,
}

/// Submit every request of a JSON Lines file and write one outcome per line
///
/// Up to `max_in_flight` submissions run concurrently, each on its own task.
/// Outcomes are written in input order.
///
/// # Arguments
///
/// * `pipeline` - The running pipeline
/// * `input_path` - JSON Lines file of key-value encoded payment requests
/// * `transport` - Transport every fraud check is dispatched over
/// * `output` - Writer receiving one JSON line per input line
///
/// # Returns
///
/// * `Ok(ProcessSummary)` - If the whole input was processed; per-line
///   failures are reported in the output, not here
/// * `Err(String)` - If the input could not be read or the output written
pub async fn process_file(
    pipeline: &Pipeline,
    input_path: &Path,
    transport: TransportKind,
    output: &mut dyn Write,
) -> Result<ProcessSummary, String> {
    let file = tokio::fs::File::open(input_path)
        .await
        .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
    let mut reader = RequestReader::new(BufReader::new(file));
    let max_in_flight = pipeline.config.max_in_flight;
    let mut summary = ProcessSummary::default();

    loop {
        let batch = reader.read_batch(max_in_flight).await?;
        if batch.is_empty() {
            break;
        }

        let outcomes: Vec<_> = stream::iter(batch)
            .map(|line| {
                let manager = Arc::clone(&pipeline.manager);
                let line_number = line.line_number;
                let task = tokio::spawn(async move {
                    match line.request {
                        Ok(request) => manager.submit(request, transport).await,
                        Err(e) => Err(e),
                    }
                });
                async move { (line_number, task.await) }
            })
            .buffered(max_in_flight)
            .collect()
            .await;

        for (line_number, joined) in outcomes {
            let outcome = joined.unwrap_or_else(|e| {
                error!(line = line_number, error = %e, "Submission task panicked");
                Err(PaymentError::encode(format!("submission task failed: {}", e)))
            });
            match &outcome {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    warn!(line = line_number, code = e.code(), error = %e, "Payment not processed");
                    summary.failed += 1;
                }
            }
            summary.processed += 1;
            write_outcome(&outcome, output)?;
        }
    }

    output
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;
    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Input processed"
    );
    Ok(summary)
}
