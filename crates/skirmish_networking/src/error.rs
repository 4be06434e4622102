//! # Protocol Error Types
//!
//! Failures on the encode side. Decoding never errors: malformed input is
//! reported as `None` with no side effects.

use thiserror::Error;

/// Errors that can occur while building a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// An entity id does not fit its one-byte length prefix.
    #[error("entity id is {len} bytes, limit is {max}")]
    IdTooLong {
        /// Encoded length of the offending id.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },

    /// More records than the two-byte count field can express.
    #[error("frame holds {count} entities, limit is {max}")]
    TooManyEntities {
        /// Records offered.
        count: usize,
        /// Largest encodable count.
        max: usize,
    },
}
