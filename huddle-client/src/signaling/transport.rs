use async_trait::async_trait;
use huddle_core::{AckError, ClientMessage, ParticipantId, Role, RoomCode, ServerMessage};

use crate::signaling::error::TransportError;

/// What a room request came back with. Failures carry the relay's error
/// code; turning those into room errors is the session's job.
#[derive(Debug, Clone)]
pub struct AckPayload {
    pub success: bool,
    pub room_id: Option<RoomCode>,
    pub role: Option<Role>,
    pub participant_count: Option<u32>,
    pub error: Option<AckError>,
    pub message: Option<String>,
}

/// Relay-side happenings, funneled into the session loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A pushed (non-ack) relay message.
    Message(ServerMessage),
    /// The socket dropped without a local `disconnect`. Reconnection is in
    /// progress; in-flight requests have already been failed.
    Lost,
    /// Reconnected and re-identified by the relay.
    Restored { participant_id: ParticipantId },
    /// Reconnection attempts are exhausted; the transport is dead.
    Failed,
}

/// Client side of the relay protocol: two acked requests plus
/// fire-and-forget sends. Implementations own correlation and timeouts.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Relay-assigned identity, once the `welcome` handshake completed.
    fn local_id(&self) -> Option<ParticipantId>;

    async fn create_room(&self) -> Result<AckPayload, TransportError>;

    async fn join_room(&self, room_id: RoomCode) -> Result<AckPayload, TransportError>;

    /// Queues a fire-and-forget message.
    fn send(&self, msg: ClientMessage) -> Result<(), TransportError>;

    /// Closes the socket for good. Does not surface as `Lost`.
    async fn disconnect(&self);
}
