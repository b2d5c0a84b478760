#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Millisecond durations fit comfortably in u64
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. DeliveryError in sender module
    clippy::must_use_candidate        // Annotated selectively on critical APIs
)]

pub mod app;
pub mod config;
pub mod console;
pub mod diagnostics;
pub mod domain;
pub mod drain;
pub mod logger;
pub mod normalizer;
pub mod sender;
pub mod transport;

// Re-export main types for easy access
pub use config::{ConfigError, TransportConfig};
pub use diagnostics::{Diagnostics, MemoryDiagnostics, StderrDiagnostics};
pub use domain::{FieldValue, Fields, LogRecord, Severity, TransportError};
pub use drain::{DrainCoordinator, DrainOutcome};
pub use logger::Logger;
pub use normalizer::{RecordInput, normalize};
pub use transport::{Transport, TransportBuilder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
