//! Batch admission gate.
//!
//! A sync request carries a batch of operations. The gate bounds the work a
//! single request can demand before anything is parsed, reserved, or written.

use crate::error::{Error, Result};

/// Hard cap on operations per batch.
pub const MAX_OPS: usize = 10_000;

/// Accept a batch iff it is within the cap. Performs no per-operation
/// inspection; it runs before any sequence numbers are reserved.
pub fn validate_batch<T>(ops: &[T]) -> Result<()> {
    if ops.len() > MAX_OPS {
        return Err(Error::TooManyOperations);
    }
    Ok(())
}
