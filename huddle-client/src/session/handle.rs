use std::sync::Arc;

use dashmap::DashMap;
use huddle_core::model::{ParticipantId, RoomCode, RoomInfo};
use tokio::sync::{mpsc, oneshot, watch};

use crate::media::{MediaConstraints, MediaKind, TrackHandle};
use crate::session::command::{Reply, SessionCommand};
use crate::session::error::{RoomError, SessionError};
use crate::session::roster::ParticipantInfo;
use crate::session::status::SessionStatus;

/// Cloneable front door to a running session actor.
///
/// All operations are forwarded as commands and answered through oneshots;
/// accessors read shared snapshots without touching the loop.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
    roster: Arc<DashMap<ParticipantId, ParticipantInfo>>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<SessionCommand>,
        status: watch::Receiver<SessionStatus>,
        roster: Arc<DashMap<ParticipantId, ParticipantInfo>>,
    ) -> Self {
        SessionHandle {
            commands,
            status,
            roster,
        }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }

    /// Creates a room without touching local media; the caller becomes host.
    pub async fn create_room(&self) -> Result<RoomInfo, SessionError> {
        let result = self
            .call(|reply| SessionCommand::CreateRoom {
                constraints: None,
                reply,
            })
            .await?;
        Ok(result?)
    }

    /// Acquires local media, then creates a room as host. Media failure
    /// leaves no room state; room failure releases the fresh media again.
    pub async fn start_session(
        &self,
        constraints: MediaConstraints,
    ) -> Result<RoomInfo, SessionError> {
        let result = self
            .call(|reply| SessionCommand::CreateRoom {
                constraints: Some(constraints),
                reply,
            })
            .await?;
        Ok(result?)
    }

    /// Joins an existing room without touching local media. The code is
    /// validated locally first; invalid input never reaches the relay.
    pub async fn join_room(&self, code: &str) -> Result<RoomInfo, SessionError> {
        let code = Self::parse_code(code)?;
        let result = self
            .call(|reply| SessionCommand::JoinRoom {
                code,
                constraints: None,
                reply,
            })
            .await?;
        Ok(result?)
    }

    /// Acquires local media, then joins the room.
    pub async fn join_session(
        &self,
        code: &str,
        constraints: MediaConstraints,
    ) -> Result<RoomInfo, SessionError> {
        let code = Self::parse_code(code)?;
        let result = self
            .call(|reply| SessionCommand::JoinRoom {
                code,
                constraints: Some(constraints),
                reply,
            })
            .await?;
        Ok(result?)
    }

    /// Replays the join for a room retained across a transport drop.
    pub async fn resume(&self) -> Result<RoomInfo, SessionError> {
        let result = self.call(|reply| SessionCommand::Resume { reply }).await?;
        Ok(result?)
    }

    /// Leaves the current room and tears down all local room state.
    pub async fn leave_room(&self) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::LeaveRoom { reply }).await
    }

    /// Ends the room for every participant. Only the host can do this; for
    /// anyone else it is a no-op.
    pub async fn end_session(&self) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::EndSession { reply })
            .await
    }

    /// Flips the enable flag of the local track of `kind`, returning the new
    /// state. Returns `false` without side effects when no such track is
    /// active.
    pub async fn toggle(&self, kind: MediaKind) -> Result<bool, SessionError> {
        self.call(|reply| SessionCommand::Toggle { kind, reply })
            .await
    }

    /// Sets the enable flag of the local track of `kind`, returning the
    /// state actually applied.
    pub async fn set_enabled(&self, kind: MediaKind, enabled: bool) -> Result<bool, SessionError> {
        self.call(|reply| SessionCommand::SetEnabled {
            kind,
            enabled,
            reply,
        })
        .await
    }

    /// Captures the display and swaps it in as the outgoing video on every
    /// live link. Per-link swap failures are reported as fault events, not
    /// errors here.
    pub async fn share_screen(&self) -> Result<TrackHandle, SessionError> {
        let result = self
            .call(|reply| SessionCommand::ShareScreen { reply })
            .await?;
        Ok(result?)
    }

    /// Clears everything and stops the session actor for good.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::Disconnect { reply })
            .await
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Watch stream of status changes, for callers that want to await them.
    pub fn status_stream(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Snapshot of everyone else in the room.
    pub fn roster(&self) -> Vec<ParticipantInfo> {
        self.roster.iter().map(|entry| entry.value().clone()).collect()
    }

    fn parse_code(input: &str) -> Result<RoomCode, SessionError> {
        let code = RoomCode::parse(input).map_err(RoomError::from)?;
        Ok(code)
    }
}
