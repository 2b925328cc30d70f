use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;

use huddle_client::session::SessionEvent;
use huddle_core::{ClientMessage, IceCandidate, ParticipantId, ParticipantSummary, RoomCode};

/// Budget for anything the session should do promptly (ms).
pub const EVENT_TIMEOUT_MS: u64 = 2000;

/// Window used to prove an action did not happen (ms).
pub const SILENCE_WINDOW_MS: u64 = 150;

pub fn room_code(code: &str) -> RoomCode {
    RoomCode::parse(code).expect("invalid room code in test")
}

pub fn peer(id: &str) -> ParticipantId {
    ParticipantId::from(id)
}

pub fn summary(id: &str) -> ParticipantSummary {
    ParticipantSummary { id: peer(id) }
}

/// Distinct host candidates keyed by an index, stable across calls.
pub fn candidate(index: u16) -> IceCandidate {
    IceCandidate {
        candidate: format!(
            "candidate:{index} 1 udp 2122260223 192.0.2.1 {} typ host",
            50000 + index
        ),
        sdp_mid: Some("0".to_string()),
        sdp_mline_index: Some(0),
    }
}

/// Next message the engine queued toward the relay.
pub async fn next_outbound(
    rx: &mut mpsc::UnboundedReceiver<ClientMessage>,
) -> Result<ClientMessage> {
    tokio::time::timeout(Duration::from_millis(EVENT_TIMEOUT_MS), rx.recv())
        .await
        .context("timed out waiting for an outbound relay message")?
        .context("outbound relay channel closed")
}

/// Proves the engine sends nothing within the silence window.
pub async fn expect_outbound_silence(
    rx: &mut mpsc::UnboundedReceiver<ClientMessage>,
) -> Result<()> {
    match tokio::time::timeout(Duration::from_millis(SILENCE_WINDOW_MS), rx.recv()).await {
        Err(_) => Ok(()),
        Ok(Some(msg)) => bail!("unexpected outbound message: {msg:?}"),
        Ok(None) => bail!("outbound relay channel closed"),
    }
}

/// Waits for the first session event matching `matcher`, skipping others.
pub async fn wait_for_event<F>(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    what: &str,
    matcher: F,
) -> Result<SessionEvent>
where
    F: Fn(&SessionEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            bail!("timed out waiting for {what}");
        }
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(event)) if matcher(&event) => return Ok(event),
            Ok(Some(other)) => {
                tracing::debug!("[Helpers] skipping {:?} while waiting for {}", other, what);
            }
            Ok(None) => bail!("session event channel closed while waiting for {what}"),
            Err(_) => bail!("timed out waiting for {what}"),
        }
    }
}

/// Polls `probe` until it reports true. Returns false once the budget runs
/// out.
pub async fn wait_until<F, Fut>(probe: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
    while Instant::now() < deadline {
        if probe().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}
