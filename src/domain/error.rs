use thiserror::Error;

/// F4TCom unified error type
#[derive(Error, Debug)]
pub enum F4tError {
    #[error("Connection error: failed to connect to {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Communication timeout (partial response: {partial:?})")]
    Timeout { partial: String },

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Device not connected")]
    NotConnected,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unexpected response to '{command}': {response:?}")]
    UnexpectedResponse { command: String, response: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Output error: {0}")]
    Output(String),
}

impl F4tError {
    /// Whether the session that produced this error has lost its socket
    /// and must be rebuilt before further use.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            F4tError::Connection { .. }
                | F4tError::ConnectionClosed
                | F4tError::NotConnected
                | F4tError::Network(_)
        )
    }
}

pub type F4tResult<T> = Result<T, F4tError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_classification() {
        assert!(F4tError::ConnectionClosed.is_transport_failure());
        assert!(F4tError::NotConnected.is_transport_failure());
        assert!(!F4tError::Timeout { partial: String::new() }.is_transport_failure());
        assert!(!F4tError::InvalidInput("loop 9".to_string()).is_transport_failure());
    }

    #[test]
    fn test_timeout_display_includes_partial() {
        let err = F4tError::Timeout { partial: "25.0".to_string() };
        assert!(err.to_string().contains("\"25.0\""));
    }
}
