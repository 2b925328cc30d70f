use std::time::Duration;

use huddle_core::IceServerConfig;

/// Engine configuration. Defaults point at a local relay and the public
/// Google STUN pool.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the signaling relay.
    pub server_url: String,
    /// STUN/TURN servers handed to every peer connection.
    pub ice_servers: Vec<IceServerConfig>,
    /// Budget for the socket handshake plus the relay `welcome`.
    pub connect_timeout: Duration,
    /// Budget for each acked relay request.
    pub request_timeout: Duration,
    /// Delay before the first reconnect attempt; doubles per attempt.
    pub reconnect_backoff: Duration,
    /// Reconnect attempts before the transport gives up.
    pub max_reconnect_attempts: u32,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3001/ws".to_owned(),
            ice_servers: vec![IceServerConfig {
                urls: vec![
                    "stun:stun.l.google.com:19302".to_owned(),
                    "stun:stun1.l.google.com:19302".to_owned(),
                ],
                username: None,
                credential: None,
            }],
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(10),
            reconnect_backoff: Duration::from_secs(1),
            max_reconnect_attempts: 3,
        }
    }
}
