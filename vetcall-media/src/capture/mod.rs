//! Local capture device access
//!
//! [`MediaDevices`] is the seam to the platform's permission-gated capture
//! API. Acquisition may suspend until the user answers the permission prompt
//! and carries no timeout of its own.

pub mod synthetic;

pub use synthetic::{CapturePermission, SyntheticDevices};

use crate::error::MediaError;
use crate::tracks::MediaStream;
use async_trait::async_trait;

/// Which kinds of media to capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Capture a microphone track
    pub audio: bool,
    /// Capture a camera track
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

impl MediaConstraints {
    /// Human-readable description used in logs and errors
    pub fn describe(&self) -> &'static str {
        match (self.audio, self.video) {
            (true, true) => "audio+video",
            (true, false) => "audio",
            (false, true) => "video",
            (false, false) => "nothing",
        }
    }
}

/// Platform capture API
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request capture of the given kinds, prompting for permission if needed
    async fn get_user_media(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError>;
}
