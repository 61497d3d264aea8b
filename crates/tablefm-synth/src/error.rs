//! Errors reported to the control thread.

use tablefm_core::TableError;
use thiserror::Error;

/// Why a control call did not reach the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The command queue is full; the engine has not drained it yet.
    #[error("control queue is full")]
    QueueFull,

    /// The engine has been dropped.
    #[error("engine is gone")]
    Disconnected,

    /// A supplied table was rejected before being sent.
    #[error("invalid table: {0}")]
    Table(#[from] TableError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_errors_convert() {
        let err: ControlError = TableError::Empty.into();
        assert_eq!(err, ControlError::Table(TableError::Empty));
        assert_eq!(err.to_string(), "invalid table: table is empty");
    }

    #[test]
    fn display() {
        assert_eq!(ControlError::QueueFull.to_string(), "control queue is full");
        assert_eq!(ControlError::Disconnected.to_string(), "engine is gone");
    }
}
