use std::sync::Arc;

use async_trait::async_trait;
use huddle_core::model::{IceCandidate, IceServerConfig, ParticipantId};
use tokio::sync::mpsc;
use tracing::warn;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;

use crate::media::{MediaKind, RtcMediaSource, TrackHandle};
use crate::peer::connection::{
    LinkEvent, LinkHealth, PeerConnection, PeerConnector, RemoteTrackInfo,
};
use crate::peer::error::NegotiationError;

/// Opens peer connections backed by the webrtc crate.
///
/// Tracks attached to connections are looked up in the shared
/// [`RtcMediaSource`], so handles stay plain data everywhere else.
pub struct RtcConnector {
    ice_servers: Vec<IceServerConfig>,
    media: Arc<RtcMediaSource>,
}

impl RtcConnector {
    pub fn new(ice_servers: Vec<IceServerConfig>, media: Arc<RtcMediaSource>) -> Self {
        RtcConnector { ice_servers, media }
    }

    fn rtc_config(&self) -> RTCConfiguration {
        let ice_servers = self
            .ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect();
        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PeerConnector for RtcConnector {
    async fn open(
        &self,
        participant: ParticipantId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|err| NegotiationError::Setup(err.to_string()))?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|err| NegotiationError::Setup(err.to_string()))?;
        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let pc = Arc::new(
            api.new_peer_connection(self.rtc_config())
                .await
                .map_err(|err| NegotiationError::Setup(err.to_string()))?,
        );

        let peer = participant.clone();
        let tx = events.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let peer = peer.clone();
            let tx = tx.clone();
            Box::pin(async move {
                let health = match state {
                    RTCPeerConnectionState::Connected => Some(LinkHealth::Connected),
                    RTCPeerConnectionState::Disconnected => Some(LinkHealth::Disconnected),
                    RTCPeerConnectionState::Failed => Some(LinkHealth::Failed),
                    RTCPeerConnectionState::Closed => Some(LinkHealth::Closed),
                    _ => None,
                };
                if let Some(health) = health {
                    let _ = tx
                        .send(LinkEvent::Health {
                            participant: peer,
                            health,
                        })
                        .await;
                }
            })
        }));

        let peer = participant.clone();
        let tx = events.clone();
        pc.on_ice_candidate(Box::new(move |candidate| {
            let peer = peer.clone();
            let tx = tx.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else {
                    return;
                };
                match candidate.to_json() {
                    Ok(init) => {
                        let _ = tx
                            .send(LinkEvent::Candidate {
                                participant: peer,
                                candidate: IceCandidate {
                                    candidate: init.candidate,
                                    sdp_mid: init.sdp_mid,
                                    sdp_mline_index: init.sdp_mline_index,
                                },
                            })
                            .await;
                    }
                    Err(err) => {
                        warn!("failed to serialize ICE candidate for {}: {}", peer, err);
                    }
                }
            })
        }));

        let peer = participant.clone();
        let tx = events;
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let peer = peer.clone();
            let tx = tx.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => MediaKind::Audio,
                    _ => MediaKind::Video,
                };
                let _ = tx
                    .send(LinkEvent::RemoteTrack {
                        participant: peer,
                        track: RemoteTrackInfo {
                            id: track.id(),
                            kind,
                        },
                    })
                    .await;
            })
        }));

        Ok(Box::new(RtcConnection {
            participant,
            pc,
            media: self.media.clone(),
        }))
    }
}

struct RtcConnection {
    participant: ParticipantId,
    pc: Arc<RTCPeerConnection>,
    media: Arc<RtcMediaSource>,
}

impl RtcConnection {
    fn resolve(&self, handle: TrackHandle) -> Result<Arc<dyn TrackLocal + Send + Sync>, NegotiationError> {
        let track = self
            .media
            .native(handle.id)
            .ok_or_else(|| NegotiationError::Attach(format!("no local track {}", handle.id)))?;
        Ok(track)
    }
}

#[async_trait]
impl PeerConnection for RtcConnection {
    async fn create_offer(&self, ice_restart: bool) -> Result<String, NegotiationError> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self
            .pc
            .create_offer(options)
            .await
            .map_err(|err| NegotiationError::Offer(err.to_string()))?;
        let sdp = offer.sdp.clone();
        self.pc
            .set_local_description(offer)
            .await
            .map_err(|err| NegotiationError::Offer(err.to_string()))?;
        Ok(sdp)
    }

    async fn accept_offer(&self, sdp: &str) -> Result<String, NegotiationError> {
        let offer = RTCSessionDescription::offer(sdp.to_string())
            .map_err(|err| NegotiationError::Answer(err.to_string()))?;
        self.pc
            .set_remote_description(offer)
            .await
            .map_err(|err| NegotiationError::Answer(err.to_string()))?;
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|err| NegotiationError::Answer(err.to_string()))?;
        let sdp = answer.sdp.clone();
        self.pc
            .set_local_description(answer)
            .await
            .map_err(|err| NegotiationError::Answer(err.to_string()))?;
        Ok(sdp)
    }

    async fn accept_answer(&self, sdp: &str) -> Result<(), NegotiationError> {
        let answer = RTCSessionDescription::answer(sdp.to_string())
            .map_err(|err| NegotiationError::Answer(err.to_string()))?;
        self.pc
            .set_remote_description(answer)
            .await
            .map_err(|err| NegotiationError::Answer(err.to_string()))
    }

    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate.clone(),
            sdp_mid: candidate.sdp_mid.clone(),
            sdp_mline_index: candidate.sdp_mline_index,
            ..Default::default()
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|err| NegotiationError::Candidate(err.to_string()))
    }

    async fn attach_tracks(&self, tracks: &[TrackHandle]) -> Result<(), NegotiationError> {
        for handle in tracks {
            let track = self.resolve(*handle)?;
            self.pc
                .add_track(track)
                .await
                .map_err(|err| NegotiationError::Attach(err.to_string()))?;
        }
        Ok(())
    }

    async fn replace_video_track(&self, track: TrackHandle) -> Result<(), NegotiationError> {
        let replacement = self.resolve(track)?;
        for sender in self.pc.get_senders().await {
            let Some(current) = sender.track().await else {
                continue;
            };
            if current.kind() == RTPCodecType::Video {
                return sender
                    .replace_track(Some(replacement))
                    .await
                    .map_err(|err| NegotiationError::Attach(err.to_string()));
            }
        }
        Err(NegotiationError::Attach(
            "no active video sender".to_string(),
        ))
    }

    async fn close(&self) {
        if let Err(err) = self.pc.close().await {
            warn!(
                "error closing peer connection to {}: {}",
                self.participant, err
            );
        }
    }
}
