mod connection;
mod error;
mod link;
mod registry;
mod rtc;

pub use connection::{LinkEvent, LinkHealth, PeerConnection, PeerConnector, RemoteTrackInfo};
pub use error::NegotiationError;
pub use link::{LinkState, NegotiationRole, PeerLink};
pub use registry::LinkRegistry;
pub use rtc::RtcConnector;
