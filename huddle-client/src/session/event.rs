use huddle_core::model::ParticipantId;

use crate::peer::{LinkState, RemoteTrackInfo};
use crate::session::status::SessionStatus;

/// Things that happen to a running session, in occurrence order.
///
/// Each variant carries enough context to render one human-readable line
/// about it; none of them require replying.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StatusChanged(SessionStatus),
    ParticipantJoined {
        participant: ParticipantId,
        participant_count: u32,
    },
    ParticipantLeft {
        participant: ParticipantId,
        participant_count: u32,
    },
    /// Roster snapshot refreshed from the relay.
    RoomUpdated {
        participant_count: u32,
    },
    LinkChanged {
        participant: ParticipantId,
        state: LinkState,
    },
    RemoteTrack {
        participant: ParticipantId,
        track: RemoteTrackInfo,
    },
    /// The relay ended the room for everyone; local state is already reset.
    SessionEnded {
        reason: Option<String>,
        message: String,
    },
    TransportLost,
    TransportRestored,
    TransportFailed,
    /// A non-fatal per-link operation failure.
    Fault {
        participant: Option<ParticipantId>,
        operation: &'static str,
        detail: String,
    },
}
