//! Errors raised when a caller hands the engine a table it cannot use.

use core::fmt;

/// Rejected table content.
///
/// Returned by the `load_*` entry points. The table that was in use before
/// the call keeps playing; nothing is partially replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The supplied table has no samples.
    Empty,
    /// The supplied table does not match the engine's fixed table size.
    LengthMismatch {
        /// Length the engine was built with.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// A sample is NaN or infinite.
    NonFinite {
        /// Position of the first offending sample.
        index: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Empty => write!(f, "table is empty"),
            TableError::LengthMismatch { expected, actual } => {
                write!(f, "table length {} does not match table size {}", actual, expected)
            }
            TableError::NonFinite { index } => {
                write!(f, "table sample {} is not finite", index)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TableError {}
