use std::fmt;
use std::mem;

use huddle_core::model::{IceCandidate, ParticipantId};
use tracing::{debug, warn};

use crate::media::TrackHandle;
use crate::peer::connection::PeerConnection;
use crate::peer::error::NegotiationError;

/// Which side of the offer/answer exchange this link plays.
///
/// The room host always offers and everyone else always answers, so a link
/// never changes role over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Offerer,
    Answerer,
}

impl fmt::Display for NegotiationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationRole::Offerer => write!(f, "offerer"),
            NegotiationRole::Answerer => write!(f, "answerer"),
        }
    }
}

/// Lifecycle of a single peer link.
///
/// `Failed` and `Closed` are both terminal. `Failed` marks a link torn down
/// after an unrecoverable transport failure and is kept around until the
/// participant leaves; `Closed` marks a clean teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Creating,
    Negotiating,
    Connected,
    Degraded,
    Restarting,
    Failed,
    Closed,
}

impl LinkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkState::Failed | LinkState::Closed)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Creating => "creating",
            LinkState::Negotiating => "negotiating",
            LinkState::Connected => "connected",
            LinkState::Degraded => "degraded",
            LinkState::Restarting => "restarting",
            LinkState::Failed => "failed",
            LinkState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// One remote participant's connection plus the negotiation bookkeeping
/// around it.
///
/// Candidates received before the remote description are buffered and
/// applied in arrival order once a description lands; afterwards they are
/// applied immediately.
pub struct PeerLink {
    participant: ParticipantId,
    role: NegotiationRole,
    state: LinkState,
    connection: Box<dyn PeerConnection>,
    pending_candidates: Vec<IceCandidate>,
    remote_described: bool,
}

impl PeerLink {
    pub fn new(
        participant: ParticipantId,
        role: NegotiationRole,
        connection: Box<dyn PeerConnection>,
    ) -> Self {
        PeerLink {
            participant,
            role,
            state: LinkState::Creating,
            connection,
            pending_candidates: Vec::new(),
            remote_described: false,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Produces an offer SDP. A fresh offer moves the link into
    /// `Negotiating`; a restart offer leaves the state alone so the link
    /// remains visibly `Restarting` until the transport reports back.
    pub async fn start_offer(&mut self, ice_restart: bool) -> Result<String, NegotiationError> {
        let sdp = self.connection.create_offer(ice_restart).await?;
        if !ice_restart {
            self.state = LinkState::Negotiating;
        }
        Ok(sdp)
    }

    /// Applies a remote offer and produces the answer SDP, flushing any
    /// candidates that arrived early.
    pub async fn accept_offer(&mut self, sdp: &str) -> Result<String, NegotiationError> {
        let answer = self.connection.accept_offer(sdp).await?;
        self.remote_described = true;
        self.flush_candidates().await;
        if self.state == LinkState::Creating {
            self.state = LinkState::Negotiating;
        }
        Ok(answer)
    }

    /// Applies the remote answer to our outstanding offer and flushes any
    /// buffered candidates.
    pub async fn accept_answer(&mut self, sdp: &str) -> Result<(), NegotiationError> {
        self.connection.accept_answer(sdp).await?;
        self.remote_described = true;
        self.flush_candidates().await;
        Ok(())
    }

    /// Buffers the candidate until a remote description is in place, then
    /// applies candidates directly. A candidate the backend rejects is
    /// logged and dropped rather than failing the link.
    pub async fn add_remote_candidate(&mut self, candidate: IceCandidate) {
        if !self.remote_described {
            self.pending_candidates.push(candidate);
            return;
        }
        if let Err(err) = self.connection.add_remote_candidate(&candidate).await {
            warn!(
                "dropping ICE candidate from {}: {}",
                self.participant, err
            );
        }
    }

    async fn flush_candidates(&mut self) {
        let buffered = mem::take(&mut self.pending_candidates);
        if buffered.is_empty() {
            return;
        }
        debug!(
            "applying {} buffered ICE candidates for {}",
            buffered.len(),
            self.participant
        );
        for candidate in buffered {
            if let Err(err) = self.connection.add_remote_candidate(&candidate).await {
                warn!(
                    "dropping buffered ICE candidate from {}: {}",
                    self.participant, err
                );
            }
        }
    }

    pub async fn attach_tracks(&mut self, tracks: &[TrackHandle]) -> Result<(), NegotiationError> {
        self.connection.attach_tracks(tracks).await
    }

    pub async fn replace_video_track(
        &mut self,
        track: TrackHandle,
    ) -> Result<(), NegotiationError> {
        self.connection.replace_video_track(track).await
    }

    pub fn mark_connected(&mut self) {
        if !self.state.is_terminal() {
            self.state = LinkState::Connected;
        }
    }

    /// Records a transient connectivity drop. Only a connected link can
    /// degrade; earlier states have their own failure handling.
    pub fn mark_degraded(&mut self) {
        if self.state == LinkState::Connected {
            self.state = LinkState::Degraded;
        }
    }

    pub fn begin_restart(&mut self) {
        if !self.state.is_terminal() {
            self.state = LinkState::Restarting;
        }
    }

    /// Terminates the link after an unrecoverable failure. The native
    /// connection is closed and buffered candidates are dropped, but the
    /// link stays around in `Failed` so the session can still report it.
    pub async fn fail(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = LinkState::Failed;
        self.pending_candidates.clear();
        self.connection.close().await;
    }

    /// Tears the link down cleanly. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = LinkState::Closed;
        self.pending_candidates.clear();
        self.connection.close().await;
    }
}
