use huddle_core::model::{RoomCode, RoomInfo};
use tokio::sync::oneshot;

use crate::media::{LocalTracks, MediaConstraints, MediaError, MediaKind, TrackHandle};
use crate::session::error::RoomError;
use crate::signaling::AckPayload;

pub(crate) type Reply<T> = oneshot::Sender<T>;

/// Which room entry a spawned signaling pipeline is performing.
#[derive(Debug, Clone)]
pub(crate) enum RoomOp {
    Create,
    Join(RoomCode),
    Resume(RoomCode),
}

impl RoomOp {
    pub(crate) fn code(&self) -> Option<&RoomCode> {
        match self {
            RoomOp::Create => None,
            RoomOp::Join(code) | RoomOp::Resume(code) => Some(code),
        }
    }

    pub(crate) fn is_create(&self) -> bool {
        matches!(self, RoomOp::Create)
    }
}

/// Everything the session actor can be asked to do. Slow pipelines (media
/// acquisition, acked room requests) run in spawned tasks and come back as
/// the `*Outcome` variants so the loop never blocks on them.
pub(crate) enum SessionCommand {
    CreateRoom {
        constraints: Option<MediaConstraints>,
        reply: Reply<Result<RoomInfo, RoomError>>,
    },
    JoinRoom {
        code: RoomCode,
        constraints: Option<MediaConstraints>,
        reply: Reply<Result<RoomInfo, RoomError>>,
    },
    Resume {
        reply: Reply<Result<RoomInfo, RoomError>>,
    },
    LeaveRoom {
        reply: Reply<()>,
    },
    EndSession {
        reply: Reply<()>,
    },
    Toggle {
        kind: MediaKind,
        reply: Reply<bool>,
    },
    SetEnabled {
        kind: MediaKind,
        enabled: bool,
        reply: Reply<bool>,
    },
    ShareScreen {
        reply: Reply<Result<TrackHandle, MediaError>>,
    },
    Disconnect {
        reply: Reply<()>,
    },
    RoomOutcome {
        op: RoomOp,
        media: Option<LocalTracks>,
        outcome: Result<AckPayload, RoomError>,
        reply: Reply<Result<RoomInfo, RoomError>>,
    },
    ScreenOutcome {
        outcome: Result<TrackHandle, MediaError>,
        reply: Reply<Result<TrackHandle, MediaError>>,
    },
}
