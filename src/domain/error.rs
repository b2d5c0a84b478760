use thiserror::Error;

/// Failure taxonomy of the transport.
///
/// None of these ever reach the caller of `Transport::write`; each one is
/// either recovered locally or handed to the diagnostic channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Formatting error: {0}")]
    Formatting(String),
}

impl TransportError {
    /// Short machine-friendly name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Configuration(_) => "configuration",
            TransportError::Serialization(_) => "serialization",
            TransportError::Delivery(_) => "delivery",
            TransportError::Formatting(_) => "formatting",
        }
    }
}
