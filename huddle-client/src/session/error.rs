use huddle_core::model::{InvalidRoomCode, RoomCode};
use thiserror::Error;

use crate::media::MediaError;
use crate::signaling::TransportError;

/// Why entering or operating a room failed.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error(transparent)]
    InvalidCode(#[from] InvalidRoomCode),

    #[error("already in a room")]
    AlreadyInRoom,

    #[error("no suspended room to resume")]
    NothingToResume,

    #[error("room {0} was not found")]
    NotFound(RoomCode),

    #[error("room {0} is full")]
    Full(RoomCode),

    #[error("room creation rejected: {0}")]
    CreateFailed(String),

    #[error("room join rejected: {0}")]
    JoinFailed(String),

    #[error("create-room request timed out")]
    CreateTimeout,

    #[error("join-room request timed out")]
    JoinTimeout,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Transport(TransportError),
}

/// Top-level error for everything a [`SessionHandle`] can do.
///
/// [`SessionHandle`]: crate::session::SessionHandle
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("session is no longer running")]
    Closed,
}
