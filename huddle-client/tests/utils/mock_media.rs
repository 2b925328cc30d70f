use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use huddle_client::media::{
    LocalTracks, MediaConstraints, MediaError, MediaKind, MediaSource, TrackHandle, TrackId,
};

/// Mock capture backend: mints handles on demand and records every gate
/// flip and release.
#[derive(Clone, Default)]
pub struct MockMedia {
    state: Arc<MediaState>,
}

#[derive(Default)]
struct MediaState {
    acquire_results: Mutex<VecDeque<Result<LocalTracks, MediaError>>>,
    display_results: Mutex<VecDeque<Result<TrackHandle, MediaError>>>,
    /// Every handle this backend ever handed out.
    acquired: Mutex<Vec<TrackHandle>>,
    released: Mutex<Vec<TrackHandle>>,
    switched: Mutex<Vec<(TrackHandle, bool)>>,
    acquire_calls: AtomicUsize,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next acquire call.
    pub fn push_acquire(&self, result: Result<LocalTracks, MediaError>) {
        self.state.acquire_results.lock().unwrap().push_back(result);
    }

    /// Queue the result of the next display capture.
    pub fn push_display(&self, result: Result<TrackHandle, MediaError>) {
        self.state.display_results.lock().unwrap().push_back(result);
    }

    pub fn audio_handle() -> TrackHandle {
        TrackHandle {
            id: TrackId::new(),
            kind: MediaKind::Audio,
        }
    }

    pub fn video_handle() -> TrackHandle {
        TrackHandle {
            id: TrackId::new(),
            kind: MediaKind::Video,
        }
    }

    pub fn acquire_calls(&self) -> usize {
        self.state.acquire_calls.load(Ordering::SeqCst)
    }

    /// Every handle handed out so far, in mint order.
    pub fn acquired(&self) -> Vec<TrackHandle> {
        self.state.acquired.lock().unwrap().clone()
    }

    /// Every handle returned so far, in release order.
    pub fn released(&self) -> Vec<TrackHandle> {
        self.state.released.lock().unwrap().clone()
    }

    /// Every gate flip applied to the backend, in order.
    pub fn switched(&self) -> Vec<(TrackHandle, bool)> {
        self.state.switched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for MockMedia {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalTracks, MediaError> {
        tracing::debug!("[MockMedia] acquire {:?}", constraints);
        self.state.acquire_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.state.acquire_results.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| {
            Ok(LocalTracks {
                audio: constraints.audio.then(Self::audio_handle),
                video: constraints.video.then(Self::video_handle),
            })
        });
        if let Ok(tracks) = &result {
            self.state.acquired.lock().unwrap().extend(tracks.handles());
        }
        result
    }

    async fn acquire_display(&self) -> Result<TrackHandle, MediaError> {
        tracing::debug!("[MockMedia] acquire_display");
        let scripted = self.state.display_results.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| Ok(Self::video_handle()));
        if let Ok(handle) = &result {
            self.state.acquired.lock().unwrap().push(*handle);
        }
        result
    }

    fn set_enabled(&self, track: TrackHandle, enabled: bool) {
        tracing::debug!("[MockMedia] set_enabled {} -> {}", track.id, enabled);
        self.state.switched.lock().unwrap().push((track, enabled));
    }

    async fn release(&self, tracks: Vec<TrackHandle>) {
        tracing::debug!("[MockMedia] release {} track(s)", tracks.len());
        self.state.released.lock().unwrap().extend(tracks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_media_defaults_follow_constraints() {
        let media = MockMedia::new();

        let tracks = media
            .acquire(MediaConstraints {
                audio: true,
                video: false,
            })
            .await
            .unwrap();
        assert!(tracks.audio.is_some());
        assert!(tracks.video.is_none());
        assert_eq!(media.acquire_calls(), 1);
        assert_eq!(media.acquired(), tracks.handles());
    }

    #[tokio::test]
    async fn test_mock_media_scripted_denial() {
        let media = MockMedia::new();
        media.push_acquire(Err(MediaError::PermissionDenied));

        let err = media
            .acquire(MediaConstraints::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::PermissionDenied));
        assert!(media.acquired().is_empty());
    }
}
