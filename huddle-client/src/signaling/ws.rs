use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ParticipantId, RequestId, RoomCode, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::signaling::error::TransportError;
use crate::signaling::transport::{AckPayload, SignalingTransport, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Outbound {
    Message(ClientMessage),
    Shutdown,
}

enum PumpExit {
    Shutdown,
    ConnectionLost,
}

struct Shared {
    pending: DashMap<RequestId, oneshot::Sender<AckPayload>>,
    local_id: RwLock<Option<ParticipantId>>,
    request_timeout: Duration,
}

/// WebSocket client for the signaling relay.
///
/// One driver task owns the socket. It pumps queued outbound traffic,
/// resolves acks against in-flight requests by id and forwards pushed
/// messages as [`TransportEvent`]s. When the socket drops without a local
/// `disconnect`, the driver redials with exponential backoff and replays the
/// `welcome` handshake.
pub struct WsTransport {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl WsTransport {
    /// Dials the relay and completes the `welcome` handshake within the
    /// configured connect budget.
    pub async fn connect(
        config: &ClientConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>), TransportError> {
        let mut ws = dial(&config.server_url, config.connect_timeout).await?;
        let participant_id = await_welcome(&mut ws, config.connect_timeout).await?;
        info!("Connected to relay as {}", participant_id);

        let shared = Arc::new(Shared {
            pending: DashMap::new(),
            local_id: RwLock::new(Some(participant_id)),
            request_timeout: config.request_timeout,
        });
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            shared: shared.clone(),
            config: config.clone(),
            outbound: outbound_rx,
            events: event_tx,
        };
        tokio::spawn(driver.run(ws));

        Ok((
            Self {
                shared,
                outbound: outbound_tx,
            },
            event_rx,
        ))
    }

    async fn request(
        &self,
        req_id: RequestId,
        msg: ClientMessage,
    ) -> Result<AckPayload, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(req_id, tx);
        if self.outbound.send(Outbound::Message(msg)).is_err() {
            self.shared.pending.remove(&req_id);
            return Err(TransportError::Disconnected);
        }
        match timeout(self.shared.request_timeout, rx).await {
            Ok(Ok(ack)) => Ok(ack),
            // Waiter dropped: the driver failed every pending request when
            // the socket went away.
            Ok(Err(_)) => Err(TransportError::Disconnected),
            Err(_) => {
                self.shared.pending.remove(&req_id);
                Err(TransportError::SendTimeout(self.shared.request_timeout))
            }
        }
    }
}

#[async_trait]
impl SignalingTransport for WsTransport {
    fn local_id(&self) -> Option<ParticipantId> {
        self.shared
            .local_id
            .read()
            .ok()
            .and_then(|id| id.clone())
    }

    async fn create_room(&self) -> Result<AckPayload, TransportError> {
        let req_id = RequestId::new();
        self.request(req_id, ClientMessage::CreateRoom { req_id }).await
    }

    async fn join_room(&self, room_id: RoomCode) -> Result<AckPayload, TransportError> {
        let req_id = RequestId::new();
        self.request(req_id, ClientMessage::JoinRoom { req_id, room_id })
            .await
    }

    fn send(&self, msg: ClientMessage) -> Result<(), TransportError> {
        self.outbound
            .send(Outbound::Message(msg))
            .map_err(|_| TransportError::Disconnected)
    }

    async fn disconnect(&self) {
        let _ = self.outbound.send(Outbound::Shutdown);
    }
}

struct Driver {
    shared: Arc<Shared>,
    config: ClientConfig,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl Driver {
    async fn run(mut self, mut ws: WsStream) {
        loop {
            match self.pump(&mut ws).await {
                PumpExit::Shutdown => {
                    let _ = ws.close(None).await;
                    debug!("Relay socket closed by local disconnect");
                    return;
                }
                PumpExit::ConnectionLost => {
                    self.fail_pending();
                    let _ = self.events.send(TransportEvent::Lost);
                    warn!("Relay socket lost, reconnecting");
                    match self.reconnect().await {
                        Some(restored) => ws = restored,
                        None => {
                            let _ = self.events.send(TransportEvent::Failed);
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn pump(&mut self, ws: &mut WsStream) -> PumpExit {
        loop {
            tokio::select! {
                out = self.outbound.recv() => match out {
                    Some(Outbound::Message(msg)) => {
                        let json = match serde_json::to_string(&msg) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!("Dropping unencodable message: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = ws.send(Message::Text(json)).await {
                            debug!("Relay send failed: {}", e);
                            return PumpExit::ConnectionLost;
                        }
                    }
                    Some(Outbound::Shutdown) | None => return PumpExit::Shutdown,
                },
                frame = ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text),
                    Some(Ok(Message::Ping(payload))) => {
                        if ws.send(Message::Pong(payload)).await.is_err() {
                            return PumpExit::ConnectionLost;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return PumpExit::ConnectionLost,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Relay read failed: {}", e);
                        return PumpExit::ConnectionLost;
                    }
                },
            }
        }
    }

    fn handle_text(&self, text: &str) {
        let msg: ServerMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Ignoring malformed relay message: {}", e);
                return;
            }
        };
        match msg {
            ServerMessage::Ack {
                req_id,
                success,
                room_id,
                role,
                participant_count,
                error,
                message,
            } => {
                let Some((_, waiter)) = self.shared.pending.remove(&req_id) else {
                    debug!("Ack for unknown or expired request {}", req_id);
                    return;
                };
                let _ = waiter.send(AckPayload {
                    success,
                    room_id,
                    role,
                    participant_count,
                    error,
                    message,
                });
            }
            ServerMessage::Welcome { participant_id } => {
                // Handshake frames are consumed before the pump starts; one
                // showing up here means the relay re-identified us.
                debug!("Mid-session welcome for {}", participant_id);
                self.set_local_id(participant_id);
            }
            other => {
                let _ = self.events.send(TransportEvent::Message(other));
            }
        }
    }

    async fn reconnect(&mut self) -> Option<WsStream> {
        let mut delay = self.config.reconnect_backoff;
        for attempt in 1..=self.config.max_reconnect_attempts {
            tokio::time::sleep(delay).await;
            match self.try_connect().await {
                Ok((ws, participant_id)) => {
                    info!(
                        "Relay connection restored as {} on attempt {}",
                        participant_id, attempt
                    );
                    self.set_local_id(participant_id.clone());
                    let _ = self.events.send(TransportEvent::Restored { participant_id });
                    return Some(ws);
                }
                Err(e) => {
                    warn!("Reconnect attempt {} failed: {}", attempt, e);
                    delay *= 2;
                }
            }
        }
        warn!(
            "Giving up on the relay after {} attempts",
            self.config.max_reconnect_attempts
        );
        None
    }

    async fn try_connect(&self) -> Result<(WsStream, ParticipantId), TransportError> {
        let mut ws = dial(&self.config.server_url, self.config.connect_timeout).await?;
        let participant_id = await_welcome(&mut ws, self.config.connect_timeout).await?;
        Ok((ws, participant_id))
    }

    fn fail_pending(&self) {
        // Dropping the waiters wakes every in-flight request with an error.
        self.shared.pending.clear();
    }

    fn set_local_id(&self, id: ParticipantId) {
        if let Ok(mut slot) = self.shared.local_id.write() {
            *slot = Some(id);
        }
    }
}

async fn dial(url: &str, budget: Duration) -> Result<WsStream, TransportError> {
    match timeout(budget, connect_async(url)).await {
        Ok(Ok((ws, _response))) => Ok(ws),
        Ok(Err(e)) => Err(TransportError::ConnectFailed(e.to_string())),
        Err(_) => Err(TransportError::ConnectTimeout),
    }
}

/// Reads frames until the relay identifies us. Stray traffic ahead of the
/// `welcome` is dropped.
async fn await_welcome(
    ws: &mut WsStream,
    budget: Duration,
) -> Result<ParticipantId, TransportError> {
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        let frame = timeout_at(deadline, ws.next())
            .await
            .map_err(|_| TransportError::ConnectTimeout)?;
        match frame {
            Some(Ok(Message::Text(text))) => {
                if let Ok(ServerMessage::Welcome { participant_id }) = serde_json::from_str(&text)
                {
                    return Ok(participant_id);
                }
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(TransportError::ConnectFailed(e.to_string())),
            None => {
                return Err(TransportError::ConnectFailed(
                    "socket closed during handshake".into(),
                ));
            }
        }
    }
}
