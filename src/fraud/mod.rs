//! Fraud evaluation module
//!
//! - `evaluator` - Pure blacklist screening of payment requests
//! - `responder` - The evaluator exposed as a queue consumer

pub mod evaluator;
pub mod responder;

pub use evaluator::{Blacklists, FraudEvaluator};
pub use responder::FraudCheckResponder;
