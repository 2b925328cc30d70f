use thiserror::Error;

/// Capture-side failures, normalized across backends.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("camera/microphone access was denied")]
    PermissionDenied,
    #[error("no capture device available")]
    DeviceNotFound,
    #[error("capture device is already in use")]
    DeviceBusy,
    #[error("media backend failure: {0}")]
    Backend(String),
}
