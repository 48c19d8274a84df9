//! Asynchronous JSON Lines reader
//!
//! Each non-blank line of the input is one key-value encoded payment request.
//! Lines are read in batches; a line that fails to decode is reported with its
//! line number instead of stopping the read.
//!
//! # Architecture
//!
//! ```text
//! File → RequestReader → Batches of InputLine
//!                ↓
//!          codec (KeyValue)
//! ```

use crate::codec::{self, WireEncoding};
use crate::types::{PaymentError, PaymentRequest};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// One decoded input line
#[derive(Debug, Clone, PartialEq)]
pub struct InputLine {
    /// 1-based line number in the input
    pub line_number: usize,
    /// The decoded request, or why it could not be decoded
    pub request: Result<PaymentRequest, PaymentError>,
}

/// Batch reader over JSON Lines payment requests
pub struct RequestReader<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: AsyncBufRead + Unpin> RequestReader<R> {
    /// Create a new RequestReader
    ///
    /// # Arguments
    ///
    /// * `reader` - Buffered async reader providing the JSON Lines input
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Read up to `batch_size` requests
    ///
    /// Blank lines are skipped and do not count towards the batch.
    ///
    /// # Returns
    ///
    /// * `Ok(batch)` - The next lines; empty at end of input
    /// * `Err(String)` - If the underlying read failed
    pub async fn read_batch(&mut self, batch_size: usize) -> Result<Vec<InputLine>, String> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| format!("Failed to read line {}: {}", self.line_number + 1, e))?;
            let Some(line) = line else {
                break;
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            batch.push(InputLine {
                line_number: self.line_number,
                request: codec::decode(line.as_bytes(), WireEncoding::KeyValue),
            });
        }
        Ok(batch)
    }
}
