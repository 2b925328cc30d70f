use thiserror::Error;

/// Errors raised while negotiating or operating a single peer link.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("failed to set up peer connection: {0}")]
    Setup(String),

    #[error("failed to produce offer: {0}")]
    Offer(String),

    #[error("failed to produce answer: {0}")]
    Answer(String),

    #[error("failed to apply ICE candidate: {0}")]
    Candidate(String),

    #[error("failed to attach local media: {0}")]
    Attach(String),
}
