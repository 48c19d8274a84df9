//! Payments Bridge Library
//! # Overview
//!
//! This library moves payment requests through validation, fraud screening and
//! status tracking. The fraud check is reachable over two transport bindings:
//! a synchronous call and an asynchronous queue round-trip with request/reply
//! correlation.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Canonical entities (PaymentRequest, FraudVerdict, PaymentRecord) and errors
//! - [`codec`] - Protocol transcoder between the key-value (JSON) and markup (XML) encodings
//! - [`fraud`] - Blacklist screening and its queue-side responder
//! - [`dispatch`] - Transport-agnostic dispatch bridge with a correlation table
//! - [`core`] - Business logic components:
//!   - [`core::lifecycle`] - Payment state machine, submission and expiry sweep
//!   - [`core::record_store`] - Concurrent record storage
//!   - [`core::validation`] - Field-level request rules
//! - [`scheduler`] - Periodic expiry sweep and statistics
//! - [`pipeline`] - Explicit wiring of all components, file processing
//! - [`cli`] / [`io`] - Command line arguments, JSON Lines input and output
//!
//! # Payment Statuses
//!
//! - **PENDING_FRAUD_CHECK**: Accepted, waiting for a verdict
//! - **APPROVED**: Verdict was APPROVED
//! - **REJECTED**: Verdict was SUSPICIOUS
//! - **FAILED**: The fraud check could not be completed
//! - **EXPIRED**: Still pending after the pending timeout
//!
//! The last four are terminal.

// Module declarations
pub mod cli;
pub mod codec;
pub mod core;
pub mod dispatch;
pub mod fraud;
pub mod io;
pub mod pipeline;
pub mod scheduler;
pub mod types;

#[cfg(test)]
mod test_support;

pub use codec::{decode, encode, Canonical, WireEncoding};
pub use core::{PaymentLifecycleManager, RecordStore};
pub use dispatch::{DispatchBridge, TransportKind};
pub use pipeline::{process_file, Pipeline, PipelineConfig};
pub use types::{
    ErrorResponse, FraudStatus, FraudVerdict, PaymentError, PaymentRecord, PaymentRequest,
    PaymentStatus, TransactionId,
};
