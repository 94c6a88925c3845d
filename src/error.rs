// MIT License - Copyright (c) 2026 Peter Wright
// Error taxonomy

/// All errors that can occur in the ialarm-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum IAlarmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {reason}")]
    Connection { reason: String },

    #[error("Timed out after {after_ms} ms waiting for {operation}")]
    Timeout { operation: &'static str, after_ms: u64 },

    #[error("Panel {host} not ready: {source}")]
    NotReady {
        host: String,
        #[source]
        source: Box<IAlarmError>,
    },

    #[error("A disarm code is required to disarm the panel")]
    MissingDisarmCode,

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("Panel already registered: {mac}")]
    DuplicatePanel { mac: String },

    #[error("Coordinator has been shut down")]
    ShutDown,
}

impl IAlarmError {
    /// Convenience constructor for transport failures reported by a client.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Whether this error is transient and the next poll should simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IAlarmError::Io(_) | IAlarmError::Connection { .. } | IAlarmError::Timeout { .. }
        )
    }

    /// Whether the caller supplied an invalid command argument.
    pub fn is_validation(&self) -> bool {
        matches!(self, IAlarmError::MissingDisarmCode)
    }
}

pub type Result<T> = std::result::Result<T, IAlarmError>;
