use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::media::error::MediaError;

/// Which of the two capture pipelines a track belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        })
    }
}

/// Backend-scoped track identity. Only the id crosses module boundaries;
/// the native track object stays inside the `MediaSource` that minted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to one local capture track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackHandle {
    pub id: TrackId,
    pub kind: MediaKind,
}

/// Which pipelines to open on acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Everything one acquisition produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalTracks {
    pub audio: Option<TrackHandle>,
    pub video: Option<TrackHandle>,
}

impl LocalTracks {
    pub fn handles(&self) -> Vec<TrackHandle> {
        self.audio.into_iter().chain(self.video).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }
}

/// Device seam. Implementations mint tracks, flip their live gates and
/// reclaim them; no backend track type ever leaks through this trait.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Opens the requested pipelines. Callers release prior acquisitions;
    /// acquire itself replaces nothing.
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalTracks, MediaError>;

    /// Opens a display/screen capture video track.
    async fn acquire_display(&self) -> Result<TrackHandle, MediaError>;

    /// Flips a track's enabled gate. Unknown handles are ignored.
    fn set_enabled(&self, track: TrackHandle, enabled: bool);

    /// Returns tracks to the backend.
    async fn release(&self, tracks: Vec<TrackHandle>);
}
