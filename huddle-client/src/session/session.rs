use std::sync::Arc;

use dashmap::DashMap;
use huddle_core::model::{
    AckError, ClientMessage, IceCandidate, ParticipantId, ParticipantSummary, Role, RoomCode,
    RoomInfo, ServerMessage,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::media::{
    LocalTracks, MediaConstraints, MediaController, MediaError, MediaSource, TrackHandle,
};
use crate::peer::{
    LinkEvent, LinkHealth, LinkRegistry, LinkState, NegotiationRole, PeerConnector,
};
use crate::session::command::{Reply, RoomOp, SessionCommand};
use crate::session::error::RoomError;
use crate::session::event::SessionEvent;
use crate::session::handle::SessionHandle;
use crate::session::roster::ParticipantInfo;
use crate::session::status::{aggregate, SessionStatus};
use crate::signaling::{AckPayload, SignalingTransport, TransportError, TransportEvent};

const COMMAND_BUFFER: usize = 64;

struct ActiveRoom {
    code: RoomCode,
    role: Role,
}

/// The session actor. Owns all room, link and media state; everything
/// mutates through its loop, one step at a time.
///
/// Slow pipelines (media acquisition, acked room requests) run in spawned
/// tasks and post their completions back as commands, so a hanging relay
/// never stalls negotiation with an already-connected peer.
pub struct Session {
    transport: Arc<dyn SignalingTransport>,
    media: MediaController,
    links: LinkRegistry,
    roster: Arc<DashMap<ParticipantId, ParticipantInfo>>,
    room: Option<ActiveRoom>,
    /// Room retained across a transport drop, waiting for an explicit
    /// `resume`.
    suspended: bool,
    entry_in_flight: bool,
    /// Weak so the loop still stops once every handle is gone.
    commands: mpsc::WeakSender<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    status: watch::Sender<SessionStatus>,
}

impl Session {
    /// Spawns the actor over an already-connected transport, returning its
    /// handle and the session event stream.
    pub fn spawn(
        transport: Arc<dyn SignalingTransport>,
        transport_events: mpsc::UnboundedReceiver<TransportEvent>,
        connector: Arc<dyn PeerConnector>,
        media_source: Arc<dyn MediaSource>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::Disconnected);
        let (links, link_events) = LinkRegistry::new(connector);
        let roster = Arc::new(DashMap::new());

        let session = Session {
            transport,
            media: MediaController::new(media_source),
            links,
            roster: roster.clone(),
            room: None,
            suspended: false,
            entry_in_flight: false,
            commands: command_tx.downgrade(),
            events: event_tx,
            status: status_tx,
        };
        tokio::spawn(session.run(command_rx, transport_events, link_events));

        (SessionHandle::new(command_tx, status_rx, roster), event_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut transport_events: mpsc::UnboundedReceiver<TransportEvent>,
        mut link_events: mpsc::Receiver<LinkEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await {
                            break;
                        }
                    }
                    // Every handle is gone; nobody can talk to us anymore.
                    None => break,
                },
                Some(event) = transport_events.recv() => {
                    self.handle_transport_event(event).await;
                }
                Some(event) = link_events.recv() => {
                    self.handle_link_event(event).await;
                }
            }
        }
        self.links.close_all().await;
        debug!("session loop stopped");
    }

    /// Returns true when the loop should stop.
    async fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::CreateRoom { constraints, reply } => {
                self.enter_room(RoomOp::Create, constraints, reply);
            }
            SessionCommand::JoinRoom {
                code,
                constraints,
                reply,
            } => {
                self.enter_room(RoomOp::Join(code), constraints, reply);
            }
            SessionCommand::Resume { reply } => self.resume(reply),
            SessionCommand::LeaveRoom { reply } => {
                self.leave().await;
                let _ = reply.send(());
            }
            SessionCommand::EndSession { reply } => {
                self.end_session().await;
                let _ = reply.send(());
            }
            SessionCommand::Toggle { kind, reply } => {
                let _ = reply.send(self.media.toggle(kind));
            }
            SessionCommand::SetEnabled {
                kind,
                enabled,
                reply,
            } => {
                let _ = reply.send(self.media.set_enabled(kind, enabled));
            }
            SessionCommand::ShareScreen { reply } => self.share_screen(reply),
            SessionCommand::Disconnect { reply } => {
                info!("disconnecting from relay");
                self.leave().await;
                self.transport.disconnect().await;
                let _ = reply.send(());
                return true;
            }
            SessionCommand::RoomOutcome {
                op,
                media,
                outcome,
                reply,
            } => {
                self.finish_room_entry(op, media, outcome, reply).await;
            }
            SessionCommand::ScreenOutcome { outcome, reply } => {
                self.finish_screen_share(outcome, reply).await;
            }
        }
        false
    }

    fn enter_room(
        &mut self,
        op: RoomOp,
        constraints: Option<MediaConstraints>,
        reply: Reply<Result<RoomInfo, RoomError>>,
    ) {
        if self.room.is_some() || self.entry_in_flight {
            let _ = reply.send(Err(RoomError::AlreadyInRoom));
            return;
        }
        self.spawn_room_entry(op, constraints, reply);
    }

    fn resume(&mut self, reply: Reply<Result<RoomInfo, RoomError>>) {
        if self.entry_in_flight {
            let _ = reply.send(Err(RoomError::AlreadyInRoom));
            return;
        }
        let code = match &self.room {
            Some(room) if self.suspended => room.code.clone(),
            _ => {
                let _ = reply.send(Err(RoomError::NothingToResume));
                return;
            }
        };
        info!("resuming room {}", code);
        self.spawn_room_entry(RoomOp::Resume(code), None, reply);
    }

    fn spawn_room_entry(
        &mut self,
        op: RoomOp,
        constraints: Option<MediaConstraints>,
        reply: Reply<Result<RoomInfo, RoomError>>,
    ) {
        let Some(completions) = self.commands.upgrade() else {
            return;
        };
        self.entry_in_flight = true;
        let transport = self.transport.clone();
        let source = self.media.source().clone();
        tokio::spawn(async move {
            let mut media = None;
            if let Some(constraints) = constraints {
                match source.acquire(constraints).await {
                    Ok(tracks) => media = Some(tracks),
                    Err(err) => {
                        let _ = completions
                            .send(SessionCommand::RoomOutcome {
                                op,
                                media: None,
                                outcome: Err(RoomError::Media(err)),
                                reply,
                            })
                            .await;
                        return;
                    }
                }
            }

            let request = match &op {
                RoomOp::Create => transport.create_room().await,
                RoomOp::Join(code) | RoomOp::Resume(code) => {
                    transport.join_room(code.clone()).await
                }
            };
            let outcome = match request {
                Ok(ack) => Ok(ack),
                Err(err) => {
                    // Back to the prior stable state: no room, no fresh media.
                    if let Some(tracks) = media.take() {
                        source.release(tracks.handles()).await;
                    }
                    Err(entry_transport_error(&op, err))
                }
            };

            let completion = SessionCommand::RoomOutcome {
                op,
                media,
                outcome,
                reply,
            };
            if let Err(unsent) = completions.send(completion).await {
                if let SessionCommand::RoomOutcome {
                    media: Some(tracks),
                    ..
                } = unsent.0
                {
                    source.release(tracks.handles()).await;
                }
            }
        });
    }

    async fn finish_room_entry(
        &mut self,
        op: RoomOp,
        media: Option<LocalTracks>,
        outcome: Result<AckPayload, RoomError>,
        reply: Reply<Result<RoomInfo, RoomError>>,
    ) {
        self.entry_in_flight = false;
        let ack = match outcome {
            Ok(ack) => ack,
            Err(err) => {
                let _ = reply.send(Err(err));
                return;
            }
        };
        if !ack.success {
            if let Some(tracks) = media {
                self.media.source().release(tracks.handles()).await;
            }
            let _ = reply.send(Err(rejected_entry_error(&op, ack)));
            return;
        }

        let Some(code) = ack.room_id.or_else(|| op.code().cloned()) else {
            if let Some(tracks) = media {
                self.media.source().release(tracks.handles()).await;
            }
            let _ = reply.send(Err(RoomError::CreateFailed(
                "relay ack carried no room id".to_string(),
            )));
            return;
        };
        // The relay owns seat assignment; a resumed host may come back as a
        // plain participant.
        let role = ack.role.unwrap_or(if op.is_create() {
            Role::Host
        } else {
            Role::Participant
        });
        let participant_count = ack.participant_count.unwrap_or(1);

        if let Some(tracks) = media {
            self.media.install(tracks).await;
        }
        info!("entered room {} as {}", code, role);
        self.room = Some(ActiveRoom {
            code: code.clone(),
            role,
        });
        self.suspended = false;
        let _ = reply.send(Ok(RoomInfo {
            code,
            role,
            participant_count,
        }));
    }

    async fn leave(&mut self) {
        if let Some(room) = &self.room {
            info!("leaving room {}", room.code);
            let message = ClientMessage::LeaveRoom {
                room_id: room.code.clone(),
            };
            if let Err(err) = self.transport.send(message) {
                debug!("leave-room notification not sent: {}", err);
            }
        }
        self.reset_room_state().await;
    }

    async fn end_session(&mut self) {
        let Some(room) = &self.room else {
            return;
        };
        if room.role != Role::Host {
            debug!("end_session ignored: local role is {}", room.role);
            return;
        }
        info!("ending room {} for everyone", room.code);
        let message = ClientMessage::EndSession {
            room_id: room.code.clone(),
        };
        if let Err(err) = self.transport.send(message) {
            debug!("end-session notification not sent: {}", err);
        }
        self.reset_room_state().await;
    }

    async fn reset_room_state(&mut self) {
        self.links.close_all().await;
        self.roster.clear();
        self.media.release().await;
        self.room = None;
        self.suspended = false;
        self.publish_status();
    }

    fn share_screen(&mut self, reply: Reply<Result<TrackHandle, MediaError>>) {
        let Some(completions) = self.commands.upgrade() else {
            return;
        };
        let source = self.media.source().clone();
        tokio::spawn(async move {
            let outcome = source.acquire_display().await;
            let completion = SessionCommand::ScreenOutcome { outcome, reply };
            if let Err(unsent) = completions.send(completion).await {
                if let SessionCommand::ScreenOutcome {
                    outcome: Ok(handle),
                    ..
                } = unsent.0
                {
                    source.release(vec![handle]).await;
                }
            }
        });
    }

    async fn finish_screen_share(
        &mut self,
        outcome: Result<TrackHandle, MediaError>,
        reply: Reply<Result<TrackHandle, MediaError>>,
    ) {
        let handle = match outcome {
            Ok(handle) => handle,
            Err(err) => {
                let _ = reply.send(Err(err));
                return;
            }
        };
        info!("replacing outgoing video with display capture");
        let previous = self.media.replace_video(handle);
        for (participant, link) in self.links.iter_mut() {
            if link.state().is_terminal() {
                continue;
            }
            if let Err(err) = link.replace_video_track(handle).await {
                warn!("video swap failed for {}: {}", participant, err);
                let _ = self.events.send(SessionEvent::Fault {
                    participant: Some(participant.clone()),
                    operation: "replace-video",
                    detail: err.to_string(),
                });
            }
        }
        if let Some(previous) = previous {
            self.media.source().release(vec![previous]).await;
        }
        let _ = reply.send(Ok(handle));
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(message) => self.handle_server_message(message).await,
            TransportEvent::Lost => {
                warn!("signaling transport lost");
                if self.room.is_some() {
                    self.suspended = true;
                }
                self.links.close_all().await;
                for mut entry in self.roster.iter_mut() {
                    entry.link = None;
                }
                self.publish_status();
                let _ = self.events.send(SessionEvent::TransportLost);
            }
            TransportEvent::Restored { participant_id } => {
                info!("signaling transport restored as {}", participant_id);
                let _ = self.events.send(SessionEvent::TransportRestored);
            }
            TransportEvent::Failed => {
                warn!("signaling transport failed for good");
                self.reset_room_state().await;
                let _ = self.events.send(SessionEvent::TransportFailed);
            }
        }
    }

    async fn handle_server_message(&mut self, message: ServerMessage) {
        let Some(room) = &self.room else {
            debug!("ignoring relay message outside a room");
            return;
        };
        if self.suspended {
            debug!("ignoring relay message while the room is suspended");
            return;
        }
        if let Some(room_id) = message.room_id() {
            if *room_id != room.code {
                debug!("ignoring message for room {}", room_id);
                return;
            }
        }
        let local_role = room.role;
        let current = room.code.clone();

        match message {
            ServerMessage::Welcome { .. } | ServerMessage::Ack { .. } => {}
            ServerMessage::Offer { sender_id, sdp, .. } => {
                self.handle_remote_offer(current, local_role, sender_id, sdp)
                    .await;
            }
            ServerMessage::Answer { sender_id, sdp, .. } => {
                self.handle_remote_answer(sender_id, sdp).await;
            }
            ServerMessage::IceCandidate {
                sender_id,
                candidate,
                ..
            } => {
                self.handle_remote_candidate(sender_id, candidate).await;
            }
            ServerMessage::ParticipantJoined {
                participant,
                participant_count,
                ..
            } => {
                self.handle_participant_joined(current, local_role, participant, participant_count)
                    .await;
            }
            ServerMessage::ParticipantLeft {
                participant,
                participant_count,
                ..
            } => {
                self.handle_participant_left(participant, participant_count)
                    .await;
            }
            ServerMessage::SessionEnded {
                reason, message, ..
            } => {
                self.handle_session_ended(reason, message).await;
            }
            ServerMessage::RoomUpdate {
                participants,
                participant_count,
                ..
            } => {
                self.handle_room_update(current, local_role, participants, participant_count)
                    .await;
            }
        }
    }

    async fn handle_participant_joined(
        &mut self,
        room: RoomCode,
        local_role: Role,
        participant: ParticipantSummary,
        participant_count: u32,
    ) {
        let id = participant.id;
        if self.transport.local_id().as_ref() == Some(&id) {
            return;
        }
        info!("participant {} joined ({} in room)", id, participant_count);
        self.ensure_roster_entry(&id, Role::Participant);
        let _ = self.events.send(SessionEvent::ParticipantJoined {
            participant: id.clone(),
            participant_count,
        });
        if local_role == Role::Host {
            self.offer_to(room, id).await;
        }
    }

    async fn handle_participant_left(
        &mut self,
        participant: ParticipantSummary,
        participant_count: u32,
    ) {
        let id = participant.id;
        info!("participant {} left ({} remain)", id, participant_count);
        if !self.links.close(&id).await {
            debug!("no live link to {} to close", id);
        }
        self.roster.remove(&id);
        let _ = self.events.send(SessionEvent::ParticipantLeft {
            participant: id,
            participant_count,
        });
        self.publish_status();
    }

    async fn handle_session_ended(&mut self, reason: Option<String>, message: String) {
        info!("relay ended the session: {}", message);
        self.reset_room_state().await;
        let _ = self
            .events
            .send(SessionEvent::SessionEnded { reason, message });
    }

    async fn handle_room_update(
        &mut self,
        room: RoomCode,
        local_role: Role,
        participants: Vec<ParticipantSummary>,
        participant_count: u32,
    ) {
        let local_id = self.transport.local_id();
        let mut listed = Vec::new();
        for summary in participants {
            if local_id.as_ref() == Some(&summary.id) {
                continue;
            }
            self.ensure_roster_entry(&summary.id, Role::Participant);
            listed.push(summary.id);
        }

        // Participants the relay no longer lists are gone, whether or not we
        // saw them leave.
        let departed: Vec<ParticipantId> = self
            .roster
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|id| !listed.contains(id))
            .collect();
        for id in departed {
            self.links.close(&id).await;
            self.roster.remove(&id);
        }

        let _ = self
            .events
            .send(SessionEvent::RoomUpdated { participant_count });

        if local_role == Role::Host {
            for id in listed {
                if !self.links.contains(&id) {
                    self.offer_to(room.clone(), id).await;
                }
            }
        }
        self.publish_status();
    }

    /// Host side: open a link to a newcomer, attach local media and send
    /// them the offer. A link that is already past `Creating` is left alone,
    /// so duplicate join events cannot double-offer.
    async fn offer_to(&mut self, room: RoomCode, participant: ParticipantId) {
        let tracks = self.media.handles();
        let link = match self.links.ensure(&participant, NegotiationRole::Offerer).await {
            Ok(link) => link,
            Err(err) => {
                warn!("could not open peer link to {}: {}", participant, err);
                let _ = self.events.send(SessionEvent::Fault {
                    participant: Some(participant.clone()),
                    operation: "offer",
                    detail: err.to_string(),
                });
                return;
            }
        };
        if link.state() != LinkState::Creating {
            debug!("link to {} already negotiating, not offering again", participant);
            return;
        }

        if let Err(err) = link.attach_tracks(&tracks).await {
            link.fail().await;
            let _ = self.events.send(SessionEvent::Fault {
                participant: Some(participant.clone()),
                operation: "offer",
                detail: err.to_string(),
            });
            self.sync_link_state(&participant);
            return;
        }
        match link.start_offer(false).await {
            Ok(sdp) => {
                debug!("sending offer to {}", participant);
                let message = ClientMessage::Offer {
                    room_id: room,
                    target_id: participant.clone(),
                    sdp,
                };
                if let Err(err) = self.transport.send(message) {
                    debug!("offer to {} not sent: {}", participant, err);
                }
            }
            Err(err) => {
                link.fail().await;
                let _ = self.events.send(SessionEvent::Fault {
                    participant: Some(participant.clone()),
                    operation: "offer",
                    detail: err.to_string(),
                });
            }
        }
        self.sync_link_state(&participant);
    }

    /// Answerer side: apply an inbound offer and send the answer back. A
    /// fresh link gets local media attached first; on an existing link the
    /// offer is a renegotiation applied in place.
    async fn handle_remote_offer(
        &mut self,
        room: RoomCode,
        local_role: Role,
        sender: ParticipantId,
        sdp: String,
    ) {
        let fresh = !self.links.contains(&sender);
        if fresh {
            // Only the host initiates offers, so a first offer identifies it.
            self.ensure_roster_entry(&sender, local_role.counterpart());
        }
        let tracks = self.media.handles();
        let link = match self.links.ensure(&sender, NegotiationRole::Answerer).await {
            Ok(link) => link,
            Err(err) => {
                warn!("could not open peer link to {}: {}", sender, err);
                let _ = self.events.send(SessionEvent::Fault {
                    participant: Some(sender.clone()),
                    operation: "answer",
                    detail: err.to_string(),
                });
                return;
            }
        };

        if fresh {
            if let Err(err) = link.attach_tracks(&tracks).await {
                link.fail().await;
                let _ = self.events.send(SessionEvent::Fault {
                    participant: Some(sender.clone()),
                    operation: "answer",
                    detail: err.to_string(),
                });
                self.sync_link_state(&sender);
                return;
            }
        }
        match link.accept_offer(&sdp).await {
            Ok(answer) => {
                debug!("answering offer from {}", sender);
                let message = ClientMessage::Answer {
                    room_id: room,
                    target_id: sender.clone(),
                    sdp: answer,
                };
                if let Err(err) = self.transport.send(message) {
                    debug!("answer to {} not sent: {}", sender, err);
                }
            }
            Err(err) => {
                link.fail().await;
                let _ = self.events.send(SessionEvent::Fault {
                    participant: Some(sender.clone()),
                    operation: "answer",
                    detail: err.to_string(),
                });
            }
        }
        self.sync_link_state(&sender);
    }

    async fn handle_remote_answer(&mut self, sender: ParticipantId, sdp: String) {
        let Some(link) = self.links.get_mut(&sender) else {
            debug!("dropping answer from unknown participant {}", sender);
            return;
        };
        if let Err(err) = link.accept_answer(&sdp).await {
            link.fail().await;
            let _ = self.events.send(SessionEvent::Fault {
                participant: Some(sender.clone()),
                operation: "answer",
                detail: err.to_string(),
            });
        }
        self.sync_link_state(&sender);
    }

    async fn handle_remote_candidate(&mut self, sender: ParticipantId, candidate: IceCandidate) {
        match self.links.get_mut(&sender) {
            Some(link) => link.add_remote_candidate(candidate).await,
            // Tolerated: candidate delivery races participant-left during
            // teardown.
            None => warn!("dropping ICE candidate for unknown participant {}", sender),
        }
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Health {
                participant,
                health,
            } => {
                self.handle_link_health(participant, health).await;
            }
            LinkEvent::Candidate {
                participant,
                candidate,
            } => {
                let Some(room) = &self.room else {
                    return;
                };
                if self.suspended {
                    return;
                }
                let message = ClientMessage::IceCandidate {
                    room_id: room.code.clone(),
                    target_id: participant,
                    candidate,
                };
                if let Err(err) = self.transport.send(message) {
                    debug!("local ICE candidate not sent: {}", err);
                }
            }
            LinkEvent::RemoteTrack { participant, track } => {
                debug!("remote {} track from {}", track.kind, participant);
                if let Some(mut entry) = self.roster.get_mut(&participant) {
                    if !entry.remote_tracks.contains(&track) {
                        entry.remote_tracks.push(track.clone());
                    }
                }
                let _ = self
                    .events
                    .send(SessionEvent::RemoteTrack { participant, track });
            }
        }
    }

    async fn handle_link_health(&mut self, participant: ParticipantId, health: LinkHealth) {
        match health {
            LinkHealth::Connected => {
                if let Some(link) = self.links.get_mut(&participant) {
                    link.mark_connected();
                }
                self.sync_link_state(&participant);
            }
            LinkHealth::Disconnected => {
                if let Some(link) = self.links.get_mut(&participant) {
                    link.mark_degraded();
                }
                self.sync_link_state(&participant);
            }
            LinkHealth::Failed => self.handle_link_failure(participant).await,
            LinkHealth::Closed => {
                // The native stack closed underneath us without a local
                // teardown; count it as a failure.
                let failed = match self.links.get_mut(&participant) {
                    Some(link) if !link.state().is_terminal() => {
                        link.fail().await;
                        true
                    }
                    _ => false,
                };
                if failed {
                    self.sync_link_state(&participant);
                }
            }
        }
    }

    /// One restart per failure transition. Only the offerer sends the
    /// restart offer; the answerer parks in `Restarting` until it arrives.
    async fn handle_link_failure(&mut self, participant: ParticipantId) {
        let room_code = self.room.as_ref().map(|room| room.code.clone());
        let Some(link) = self.links.get_mut(&participant) else {
            return;
        };
        match link.state() {
            LinkState::Restarting => {
                debug!("ignoring repeated failure from {} during restart", participant);
            }
            LinkState::Connected | LinkState::Degraded => {
                warn!("link to {} failed, restarting ICE", participant);
                link.begin_restart();
                if link.role() == NegotiationRole::Offerer {
                    match link.start_offer(true).await {
                        Ok(sdp) => {
                            if let Some(room_id) = room_code {
                                let message = ClientMessage::Offer {
                                    room_id,
                                    target_id: participant.clone(),
                                    sdp,
                                };
                                if let Err(err) = self.transport.send(message) {
                                    debug!("restart offer to {} not sent: {}", participant, err);
                                }
                            }
                        }
                        Err(err) => {
                            link.fail().await;
                            let _ = self.events.send(SessionEvent::Fault {
                                participant: Some(participant.clone()),
                                operation: "restart",
                                detail: err.to_string(),
                            });
                        }
                    }
                }
                self.sync_link_state(&participant);
            }
            LinkState::Creating | LinkState::Negotiating => {
                warn!("link to {} failed before connecting", participant);
                link.fail().await;
                self.sync_link_state(&participant);
            }
            LinkState::Failed | LinkState::Closed => {}
        }
    }

    fn ensure_roster_entry(&self, participant: &ParticipantId, role: Role) {
        self.roster
            .entry(participant.clone())
            .or_insert_with(|| ParticipantInfo::new(participant.clone(), role));
    }

    /// Mirrors a link's state into the roster, announces the change and
    /// refreshes the aggregate status.
    fn sync_link_state(&mut self, participant: &ParticipantId) {
        if let Some(state) = self.links.get(participant).map(|link| link.state()) {
            if let Some(mut entry) = self.roster.get_mut(participant) {
                entry.link = Some(state);
            }
            let _ = self.events.send(SessionEvent::LinkChanged {
                participant: participant.clone(),
                state,
            });
        }
        self.publish_status();
    }

    fn publish_status(&mut self) {
        let status = aggregate(self.links.states());
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            info!("session status is now {}", status);
            let _ = self.events.send(SessionEvent::StatusChanged(status));
        }
    }
}

fn entry_transport_error(op: &RoomOp, err: TransportError) -> RoomError {
    match err {
        TransportError::SendTimeout(_) if op.is_create() => RoomError::CreateTimeout,
        TransportError::SendTimeout(_) => RoomError::JoinTimeout,
        other => RoomError::Transport(other),
    }
}

fn rejected_entry_error(op: &RoomOp, ack: AckPayload) -> RoomError {
    let code = ack.room_id.or_else(|| op.code().cloned());
    match (ack.error, code) {
        (Some(AckError::RoomNotFound), Some(code)) => RoomError::NotFound(code),
        (Some(AckError::RoomFull), Some(code)) => RoomError::Full(code),
        (_, _) => {
            let message = ack
                .message
                .unwrap_or_else(|| "request rejected by relay".to_string());
            if op.is_create() {
                RoomError::CreateFailed(message)
            } else {
                RoomError::JoinFailed(message)
            }
        }
    }
}
