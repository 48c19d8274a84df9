//! I/O module
//!
//! Handles JSON Lines input and outcome output.
//!
//! # Components
//!
//! - `reader` - Asynchronous batch reader of key-value encoded requests
//! - `output` - One JSON line per outcome

pub mod output;
pub mod reader;

pub use output::{render_outcome, write_outcome};
pub use reader::{InputLine, RequestReader};
