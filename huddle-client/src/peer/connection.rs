use async_trait::async_trait;
use huddle_core::model::{IceCandidate, ParticipantId};
use tokio::sync::mpsc;

use crate::media::{MediaKind, TrackHandle};
use crate::peer::error::NegotiationError;

/// A remote media track announced by a peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    /// Track identifier as carried on the wire.
    pub id: String,
    pub kind: MediaKind,
}

/// Coarse transport health reported by the connection backend.
///
/// Backends collapse their native state set down to the transitions the
/// session cares about; intermediate states such as "checking" are not
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events emitted asynchronously by a live peer connection.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    Health {
        participant: ParticipantId,
        health: LinkHealth,
    },
    /// A locally gathered ICE candidate ready to relay to the peer.
    Candidate {
        participant: ParticipantId,
        candidate: IceCandidate,
    },
    RemoteTrack {
        participant: ParticipantId,
        track: RemoteTrackInfo,
    },
}

/// One negotiable media connection to a single remote participant.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Produces a local offer SDP and applies it as the local description.
    async fn create_offer(&self, ice_restart: bool) -> Result<String, NegotiationError>;

    /// Applies a remote offer and produces the answer SDP.
    async fn accept_offer(&self, sdp: &str) -> Result<String, NegotiationError>;

    /// Applies the remote answer to an offer this side produced.
    async fn accept_answer(&self, sdp: &str) -> Result<(), NegotiationError>;

    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError>;

    /// Attaches local tracks so they are included in subsequent negotiation.
    async fn attach_tracks(&self, tracks: &[TrackHandle]) -> Result<(), NegotiationError>;

    /// Swaps the outgoing video track without renegotiating.
    async fn replace_video_track(&self, track: TrackHandle) -> Result<(), NegotiationError>;

    async fn close(&self);
}

/// Factory for peer connections, keeping the backend out of session logic.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Opens a fresh connection to `participant`, delivering its events
    /// through `events`.
    async fn open(
        &self,
        participant: ParticipantId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError>;
}
