mod error;
mod transport;
mod ws;

pub use error::TransportError;
pub use transport::{AckPayload, SignalingTransport, TransportEvent};
pub use ws::WsTransport;
