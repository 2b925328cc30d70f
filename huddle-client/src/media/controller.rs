use std::sync::Arc;

use tracing::debug;

use crate::media::source::{LocalTracks, MediaKind, MediaSource, TrackHandle};

/// Local capture state as the session sees it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMediaState {
    pub audio: Option<TrackHandle>,
    pub video: Option<TrackHandle>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

/// Owns the local tracks for the lifetime of a session and keeps the
/// enabled flags in lockstep with the backend gates.
pub struct MediaController {
    source: Arc<dyn MediaSource>,
    state: LocalMediaState,
}

impl MediaController {
    pub fn new(source: Arc<dyn MediaSource>) -> Self {
        Self {
            source,
            state: LocalMediaState::default(),
        }
    }

    pub fn source(&self) -> &Arc<dyn MediaSource> {
        &self.source
    }

    pub fn state(&self) -> LocalMediaState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.audio.is_some() || self.state.video.is_some()
    }

    pub fn handles(&self) -> Vec<TrackHandle> {
        self.state.audio.into_iter().chain(self.state.video).collect()
    }

    pub fn track(&self, kind: MediaKind) -> Option<TrackHandle> {
        match kind {
            MediaKind::Audio => self.state.audio,
            MediaKind::Video => self.state.video,
        }
    }

    /// Adopts a fresh acquisition, releasing whatever was active before.
    pub async fn install(&mut self, tracks: LocalTracks) {
        self.release().await;
        self.state = LocalMediaState {
            audio: tracks.audio,
            video: tracks.video,
            audio_enabled: tracks.audio.is_some(),
            video_enabled: tracks.video.is_some(),
        };
    }

    /// Stops and forgets every local track.
    pub async fn release(&mut self) {
        let handles = self.handles();
        if !handles.is_empty() {
            self.source.release(handles).await;
        }
        self.state = LocalMediaState::default();
    }

    /// Flips one pipeline. Returns the new enabled flag, or `false` without
    /// touching anything when no such track exists.
    pub fn toggle(&mut self, kind: MediaKind) -> bool {
        let current = match kind {
            MediaKind::Audio => self.state.audio_enabled,
            MediaKind::Video => self.state.video_enabled,
        };
        self.set_enabled(kind, !current)
    }

    /// Sets one pipeline's enabled flag, mirroring it into the backend gate.
    /// Returns the flag as applied, `false` when there is no such track.
    pub fn set_enabled(&mut self, kind: MediaKind, enabled: bool) -> bool {
        let Some(track) = self.track(kind) else {
            debug!("No local {} track to switch", kind);
            return false;
        };
        match kind {
            MediaKind::Audio => self.state.audio_enabled = enabled,
            MediaKind::Video => self.state.video_enabled = enabled,
        }
        self.source.set_enabled(track, enabled);
        enabled
    }

    /// Swaps the active video track, returning the one it replaced. The new
    /// track starts enabled.
    pub fn replace_video(&mut self, track: TrackHandle) -> Option<TrackHandle> {
        let old = self.state.video.replace(track);
        self.state.video_enabled = true;
        old
    }
}
