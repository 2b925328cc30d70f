use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::media::error::MediaError;
use crate::media::source::{
    LocalTracks, MediaConstraints, MediaKind, MediaSource, TrackHandle, TrackId,
};

struct SampleTrack {
    track: Arc<TrackLocalStaticSample>,
    live: Arc<AtomicBool>,
}

/// `MediaSource` backed by webrtc sample tracks.
///
/// The source mints opus/VP8 [`TrackLocalStaticSample`]s; feeding them is
/// the embedder's job via [`RtcMediaSource::writer`]. The gate flipped by
/// `set_enabled` tells writers to pause, which is what a muted track looks
/// like on the wire.
#[derive(Default)]
pub struct RtcMediaSource {
    tracks: DashMap<TrackId, SampleTrack>,
}

impl RtcMediaSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Native track for a handle, for wiring into peer connections.
    pub(crate) fn native(&self, id: TrackId) -> Option<Arc<TrackLocalStaticSample>> {
        self.tracks.get(&id).map(|t| t.track.clone())
    }

    /// Sample sink plus its live gate. Writers should skip pushing samples
    /// while the gate is off.
    pub fn writer(&self, id: TrackId) -> Option<(Arc<TrackLocalStaticSample>, Arc<AtomicBool>)> {
        self.tracks
            .get(&id)
            .map(|t| (t.track.clone(), t.live.clone()))
    }

    fn mint(&self, kind: MediaKind, stream_id: &str) -> TrackHandle {
        let id = TrackId::new();
        let capability = match kind {
            MediaKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            MediaKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
        };
        let track = Arc::new(TrackLocalStaticSample::new(
            capability,
            id.to_string(),
            stream_id.to_owned(),
        ));
        self.tracks.insert(
            id,
            SampleTrack {
                track,
                live: Arc::new(AtomicBool::new(true)),
            },
        );
        TrackHandle { id, kind }
    }
}

#[async_trait]
impl MediaSource for RtcMediaSource {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalTracks, MediaError> {
        if !constraints.audio && !constraints.video {
            return Err(MediaError::Backend("nothing to capture".into()));
        }
        let stream_id = format!("huddle-{}", Uuid::new_v4());
        Ok(LocalTracks {
            audio: constraints
                .audio
                .then(|| self.mint(MediaKind::Audio, &stream_id)),
            video: constraints
                .video
                .then(|| self.mint(MediaKind::Video, &stream_id)),
        })
    }

    async fn acquire_display(&self) -> Result<TrackHandle, MediaError> {
        let stream_id = format!("huddle-display-{}", Uuid::new_v4());
        Ok(self.mint(MediaKind::Video, &stream_id))
    }

    fn set_enabled(&self, track: TrackHandle, enabled: bool) {
        if let Some(entry) = self.tracks.get(&track.id) {
            entry.live.store(enabled, Ordering::Relaxed);
        }
    }

    async fn release(&self, tracks: Vec<TrackHandle>) {
        for handle in tracks {
            if self.tracks.remove(&handle.id).is_some() {
                debug!("Released local {} track {}", handle.kind, handle.id);
            }
        }
    }
}
