use std::collections::HashMap;
use std::sync::Arc;

use huddle_core::model::ParticipantId;
use tokio::sync::mpsc;
use tracing::debug;

use crate::peer::connection::{LinkEvent, PeerConnector};
use crate::peer::error::NegotiationError;
use crate::peer::link::{LinkState, NegotiationRole, PeerLink};

const LINK_EVENT_BUFFER: usize = 256;

/// Owns every live peer link in the current room, keyed by participant.
///
/// All connections opened through the registry report their events into a
/// single channel whose receiver is handed out at construction.
pub struct LinkRegistry {
    connector: Arc<dyn PeerConnector>,
    links: HashMap<ParticipantId, PeerLink>,
    events: mpsc::Sender<LinkEvent>,
}

impl LinkRegistry {
    pub fn new(connector: Arc<dyn PeerConnector>) -> (Self, mpsc::Receiver<LinkEvent>) {
        let (events, events_rx) = mpsc::channel(LINK_EVENT_BUFFER);
        (
            LinkRegistry {
                connector,
                links: HashMap::new(),
                events,
            },
            events_rx,
        )
    }

    /// Returns the link for `participant`, opening a fresh connection if
    /// none exists yet. An existing link is returned as-is, so repeated
    /// calls never spawn duplicate connections.
    pub async fn ensure(
        &mut self,
        participant: &ParticipantId,
        role: NegotiationRole,
    ) -> Result<&mut PeerLink, NegotiationError> {
        if !self.links.contains_key(participant) {
            debug!("opening peer link to {} as {}", participant, role);
            let connection = self
                .connector
                .open(participant.clone(), self.events.clone())
                .await?;
            self.links.insert(
                participant.clone(),
                PeerLink::new(participant.clone(), role, connection),
            );
        }
        self.links
            .get_mut(participant)
            .ok_or_else(|| NegotiationError::Setup("peer link table out of sync".to_string()))
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<&PeerLink> {
        self.links.get(participant)
    }

    pub fn get_mut(&mut self, participant: &ParticipantId) -> Option<&mut PeerLink> {
        self.links.get_mut(participant)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.links.contains_key(participant)
    }

    /// Closes and removes the link for `participant`, returning whether one
    /// existed.
    pub async fn close(&mut self, participant: &ParticipantId) -> bool {
        match self.links.remove(participant) {
            Some(mut link) => {
                link.close().await;
                true
            }
            None => false,
        }
    }

    /// Tears down every link, leaving the registry empty.
    pub async fn close_all(&mut self) {
        for (participant, mut link) in self.links.drain() {
            debug!("closing peer link to {}", participant);
            link.close().await;
        }
    }

    pub fn states(&self) -> impl Iterator<Item = LinkState> + '_ {
        self.links.values().map(|link| link.state())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ParticipantId, &mut PeerLink)> {
        self.links.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
