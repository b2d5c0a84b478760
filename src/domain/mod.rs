//! Domain layer for rask-log-transport.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: One emitted log event, as seen by every sink
//! - `Severity`: Numeric record level, including the `log` and `notify` extensions
//! - `TransportError`: Failure taxonomy reported on the diagnostic channel

pub mod error;
pub mod log_record;
pub mod severity;

pub use error::TransportError;
pub use log_record::{FieldValue, Fields, LogRecord, STANDARD_FIELDS};
pub use severity::Severity;
