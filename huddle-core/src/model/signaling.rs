use serde::{Deserialize, Serialize};

use crate::model::participant::{ParticipantId, ParticipantSummary, Role};
use crate::model::request::RequestId;
use crate::model::room::RoomCode;

/// STUN/TURN server entry handed to the peer-connection backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Trickled ICE candidate as it crosses the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u16>,
}

/// Machine-readable rejection code carried by relay acks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckError {
    RoomNotFound,
    RoomFull,
    Internal,
}

/// Messages the engine sends to the relay.
///
/// `create-room` and `join-room` carry a request id and are answered with an
/// `ack`; everything else is fire-and-forget. Unicast negotiation messages
/// name their recipient with `targetId`, the relay does the routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        req_id: RequestId,
    },
    JoinRoom {
        req_id: RequestId,
        room_id: RoomCode,
    },
    Offer {
        room_id: RoomCode,
        target_id: ParticipantId,
        sdp: String,
    },
    Answer {
        room_id: RoomCode,
        target_id: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        room_id: RoomCode,
        target_id: ParticipantId,
        candidate: IceCandidate,
    },
    LeaveRoom {
        room_id: RoomCode,
    },
    EndSession {
        room_id: RoomCode,
    },
}

/// Messages the relay pushes to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First frame after the socket opens; re-sent on every reconnect.
    Welcome {
        participant_id: ParticipantId,
    },
    /// Reply to `create-room` / `join-room`, correlated by request id.
    Ack {
        req_id: RequestId,
        success: bool,
        room_id: Option<RoomCode>,
        role: Option<Role>,
        participant_count: Option<u32>,
        error: Option<AckError>,
        message: Option<String>,
    },
    Offer {
        room_id: RoomCode,
        sender_id: ParticipantId,
        sdp: String,
    },
    Answer {
        room_id: RoomCode,
        sender_id: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        room_id: RoomCode,
        sender_id: ParticipantId,
        candidate: IceCandidate,
    },
    ParticipantJoined {
        room_id: RoomCode,
        participant: ParticipantSummary,
        participant_count: u32,
    },
    ParticipantLeft {
        room_id: RoomCode,
        participant: ParticipantSummary,
        participant_count: u32,
    },
    SessionEnded {
        room_id: RoomCode,
        reason: Option<String>,
        message: String,
    },
    RoomUpdate {
        room_id: RoomCode,
        participants: Vec<ParticipantSummary>,
        participant_count: u32,
    },
}

impl ServerMessage {
    /// The room a message is scoped to, when it is room-scoped at all.
    pub fn room_id(&self) -> Option<&RoomCode> {
        match self {
            ServerMessage::Welcome { .. } => None,
            ServerMessage::Ack { room_id, .. } => room_id.as_ref(),
            ServerMessage::Offer { room_id, .. }
            | ServerMessage::Answer { room_id, .. }
            | ServerMessage::IceCandidate { room_id, .. }
            | ServerMessage::ParticipantJoined { room_id, .. }
            | ServerMessage::ParticipantLeft { room_id, .. }
            | ServerMessage::SessionEnded { room_id, .. }
            | ServerMessage::RoomUpdate { room_id, .. } => Some(room_id),
        }
    }
}
