use std::fmt;

use crate::peer::LinkState;

/// One session-wide connectivity verdict derived from all peer links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
            SessionStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Collapses link states into one status, optimistically: a single healthy
/// link outranks everything else, links still working towards connectivity
/// outrank failures, and failures only show when nothing is in progress.
/// Degraded links do not count towards any bucket; many recover on their
/// own.
pub fn aggregate<I>(states: I) -> SessionStatus
where
    I: IntoIterator<Item = LinkState>,
{
    let mut connecting = false;
    let mut failed = false;
    for state in states {
        match state {
            LinkState::Connected => return SessionStatus::Connected,
            LinkState::Creating | LinkState::Negotiating | LinkState::Restarting => {
                connecting = true;
            }
            LinkState::Failed => failed = true,
            LinkState::Degraded | LinkState::Closed => {}
        }
    }
    if connecting {
        SessionStatus::Connecting
    } else if failed {
        SessionStatus::Failed
    } else {
        SessionStatus::Disconnected
    }
}
