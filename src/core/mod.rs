//! Core business logic module
//!
//! This module contains the payment lifecycle components:
//! - `clock` - Time source abstraction
//! - `iso_codes` - Country and currency code registries
//! - `validation` - Field-level rules for inbound requests
//! - `record_store` - Concurrent record storage
//! - `lifecycle` - Status transitions, submission and the expiry sweep

pub mod clock;
pub mod iso_codes;
pub mod lifecycle;
pub mod record_store;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use lifecycle::PaymentLifecycleManager;
pub use record_store::RecordStore;
pub use validation::PaymentValidator;
