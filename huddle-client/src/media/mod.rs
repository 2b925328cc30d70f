mod controller;
mod error;
mod rtc;
mod source;

pub use controller::{LocalMediaState, MediaController};
pub use error::MediaError;
pub use rtc::RtcMediaSource;
pub use source::{LocalTracks, MediaConstraints, MediaKind, MediaSource, TrackHandle, TrackId};
