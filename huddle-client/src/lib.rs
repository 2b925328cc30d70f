//! Client engine for multi-party audio/video rooms: one session actor per
//! connection drives room membership, per-participant peer links and local
//! media over an external signaling relay.
//!
//! [`connect`] wires the full stack. For a custom transport, connector or
//! media backend, assemble the pieces and call [`Session::spawn`] directly.

use std::sync::Arc;

use tokio::sync::mpsc;

pub mod config;
pub mod media;
pub mod peer;
pub mod session;
pub mod signaling;

pub use config::ClientConfig;
pub use media::{MediaConstraints, MediaKind, RtcMediaSource, TrackHandle};
pub use session::{
    ParticipantInfo, RoomError, Session, SessionError, SessionEvent, SessionHandle, SessionStatus,
};
pub use signaling::WsTransport;

use crate::peer::RtcConnector;

/// Connects to the relay and spawns a session over the webrtc-backed stack.
pub async fn connect(
    config: ClientConfig,
) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
    let media = RtcMediaSource::new();
    let connector = Arc::new(RtcConnector::new(config.ice_servers.clone(), media.clone()));
    let (transport, transport_events) = WsTransport::connect(&config).await?;
    Ok(Session::spawn(
        Arc::new(transport),
        transport_events,
        connector,
        media,
    ))
}
