//! Scheduled background work
//!
//! - `expiry` - Periodic sweep of stale pending payments and statistics log

pub mod expiry;

pub use expiry::{ExpiryConfig, ExpiryScheduler, ExpirySweep};
