use std::time::Duration;
use thiserror::Error;

/// Failures of the relay link itself, as opposed to what the relay said.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out connecting to the signaling relay")]
    ConnectTimeout,
    #[error("could not connect to the signaling relay: {0}")]
    ConnectFailed(String),
    #[error("relay did not answer within {0:?}")]
    SendTimeout(Duration),
    #[error("connection to the signaling relay was lost")]
    Disconnected,
}
