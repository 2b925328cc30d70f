use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use huddle_client::signaling::{AckPayload, SignalingTransport, TransportError};
use huddle_core::{AckError, ClientMessage, ParticipantId, Role, RoomCode};

/// Room code the mock relay assigns when a test does not script one.
pub const TEST_ROOM: &str = "AB12CD";

/// Mock relay transport: acked requests pop scripted payloads (or sensible
/// defaults), fire-and-forget sends are captured for verification.
#[derive(Clone)]
pub struct MockRelay {
    state: Arc<RelayState>,
}

struct RelayState {
    local_id: ParticipantId,
    create_acks: Mutex<VecDeque<Result<AckPayload, TransportError>>>,
    join_acks: Mutex<VecDeque<Result<AckPayload, TransportError>>>,
    create_calls: AtomicUsize,
    join_calls: Mutex<Vec<RoomCode>>,
    /// All captured fire-and-forget messages (for verification).
    sent: Mutex<Vec<ClientMessage>>,
    /// Channel carrying captured messages as they happen.
    sent_tx: mpsc::UnboundedSender<ClientMessage>,
    disconnects: AtomicUsize,
}

impl MockRelay {
    /// Create a new MockRelay and the receiver for its captured messages.
    pub fn new(local_id: &str) -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let relay = Self {
            state: Arc::new(RelayState {
                local_id: ParticipantId::from(local_id),
                create_acks: Mutex::new(VecDeque::new()),
                join_acks: Mutex::new(VecDeque::new()),
                create_calls: AtomicUsize::new(0),
                join_calls: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                sent_tx,
                disconnects: AtomicUsize::new(0),
            }),
        };
        (relay, sent_rx)
    }

    /// Queue the reply for the next create-room request.
    pub fn push_create_ack(&self, ack: Result<AckPayload, TransportError>) {
        self.state.create_acks.lock().unwrap().push_back(ack);
    }

    /// Queue the reply for the next join-room request.
    pub fn push_join_ack(&self, ack: Result<AckPayload, TransportError>) {
        self.state.join_acks.lock().unwrap().push_back(ack);
    }

    /// Successful ack payload in the shape the relay sends.
    pub fn ack_ok(code: &RoomCode, role: Role, participant_count: u32) -> AckPayload {
        AckPayload {
            success: true,
            room_id: Some(code.clone()),
            role: Some(role),
            participant_count: Some(participant_count),
            error: None,
            message: None,
        }
    }

    /// Rejection ack payload carrying an error code and human message.
    pub fn ack_rejected(error: AckError, message: &str) -> AckPayload {
        AckPayload {
            success: false,
            room_id: None,
            role: None,
            participant_count: None,
            error: Some(error),
            message: Some(message.to_string()),
        }
    }

    /// All fire-and-forget messages sent so far.
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    /// Room codes of every join-room request, in order.
    pub fn join_calls(&self) -> Vec<RoomCode> {
        self.state.join_calls.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    fn default_room() -> RoomCode {
        RoomCode::parse(TEST_ROOM).expect("TEST_ROOM is a valid code")
    }
}

#[async_trait]
impl SignalingTransport for MockRelay {
    fn local_id(&self) -> Option<ParticipantId> {
        Some(self.state.local_id.clone())
    }

    async fn create_room(&self) -> Result<AckPayload, TransportError> {
        tracing::debug!("[MockRelay] create-room request");
        self.state.create_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.state.create_acks.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::ack_ok(&Self::default_room(), Role::Host, 1)))
    }

    async fn join_room(&self, room_id: RoomCode) -> Result<AckPayload, TransportError> {
        tracing::debug!("[MockRelay] join-room request for {}", room_id);
        self.state.join_calls.lock().unwrap().push(room_id.clone());
        let scripted = self.state.join_acks.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::ack_ok(&room_id, Role::Participant, 2)))
    }

    fn send(&self, msg: ClientMessage) -> Result<(), TransportError> {
        tracing::debug!("[MockRelay] send {:?}", msg);
        self.state.sent.lock().unwrap().push(msg.clone());
        let _ = self.state.sent_tx.send(msg);
        Ok(())
    }

    async fn disconnect(&self) {
        tracing::debug!("[MockRelay] disconnect");
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_relay_defaults_and_captures() {
        let (relay, mut rx) = MockRelay::new("p1");

        let ack = relay.create_room().await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.role, Some(Role::Host));
        assert_eq!(relay.create_calls(), 1);

        let code = RoomCode::parse("ZZ99AA").unwrap();
        relay
            .send(ClientMessage::LeaveRoom {
                room_id: code.clone(),
            })
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg, ClientMessage::LeaveRoom { room_id: code });
        assert_eq!(relay.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_relay_pops_scripted_acks_in_order() {
        let (relay, _rx) = MockRelay::new("p1");
        let code = RoomCode::parse("AB12CD").unwrap();
        relay.push_join_ack(Ok(MockRelay::ack_rejected(
            AckError::RoomFull,
            "Room AB12CD is full",
        )));

        let first = relay.join_room(code.clone()).await.unwrap();
        assert!(!first.success);
        assert_eq!(first.error, Some(AckError::RoomFull));

        // Once the script runs dry the default kicks back in.
        let second = relay.join_room(code.clone()).await.unwrap();
        assert!(second.success);
        assert_eq!(relay.join_calls(), vec![code.clone(), code]);
    }
}
