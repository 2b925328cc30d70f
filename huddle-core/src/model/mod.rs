mod participant;
mod request;
mod room;
mod signaling;

pub use participant::{ParticipantId, ParticipantSummary, Role};
pub use request::RequestId;
pub use room::{InvalidRoomCode, ROOM_CODE_LEN, RoomCode, RoomInfo};
pub use signaling::{AckError, ClientMessage, IceCandidate, IceServerConfig, ServerMessage};
