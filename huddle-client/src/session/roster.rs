use huddle_core::model::{ParticipantId, Role};

use crate::peer::{LinkState, RemoteTrackInfo};

/// Everything the session knows about one remote participant.
///
/// `link` is `None` until negotiation towards them has started; a `Failed`
/// entry sticks around until they leave so the failure stays visible.
#[derive(Debug, Clone)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub role: Role,
    pub link: Option<LinkState>,
    pub remote_tracks: Vec<RemoteTrackInfo>,
}

impl ParticipantInfo {
    pub fn new(id: ParticipantId, role: Role) -> Self {
        ParticipantInfo {
            id,
            role,
            link: None,
            remote_tracks: Vec::new(),
        }
    }
}
