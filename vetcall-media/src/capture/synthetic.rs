//! Headless capture backend
//!
//! Answers capture prompts without touching hardware (granted, denied, no
//! device, device busy) and hands out [`SoftwareTrack`]s. Used on hosts without cameras and to drive the call
//! lifecycle in tests.

use super::{MediaConstraints, MediaDevices};
use crate::error::MediaError;
use crate::tracks::{MediaStream, MediaTrack, SoftwareTrack, TrackKind};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a capture prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePermission {
    /// User allowed capture
    Granted,
    /// User refused capture
    Denied,
    /// No camera or microphone is attached
    NoDevice,
    /// A device exists but another application holds it
    DeviceBusy,
}

/// Synthetic capture devices
#[derive(Debug)]
pub struct SyntheticDevices {
    permission: Mutex<CapturePermission>,
    acquired: Mutex<Vec<Arc<SoftwareTrack>>>,
    requests: AtomicUsize,
}

impl SyntheticDevices {
    /// Devices that answer every prompt with `permission`
    pub fn new(permission: CapturePermission) -> Self {
        Self {
            permission: Mutex::new(permission),
            acquired: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Devices that always grant capture
    pub fn granted() -> Self {
        Self::new(CapturePermission::Granted)
    }

    /// Devices that always deny capture
    pub fn denied() -> Self {
        Self::new(CapturePermission::Denied)
    }

    /// Change the answer given to subsequent prompts
    pub fn set_permission(&self, permission: CapturePermission) {
        *self.permission.lock() = permission;
    }

    /// Number of capture requests received
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Every track handed out so far
    pub fn acquired_tracks(&self) -> Vec<Arc<SoftwareTrack>> {
        self.acquired.lock().clone()
    }

    /// Tracks that have been handed out and not stopped
    pub fn live_tracks(&self) -> usize {
        self.acquired
            .lock()
            .iter()
            .filter(|track| track.is_live())
            .count()
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::granted()
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if !constraints.audio && !constraints.video {
            return Err(MediaError::InvalidConstraints {
                message: "at least one of audio or video must be requested".to_string(),
            });
        }

        match *self.permission.lock() {
            CapturePermission::Granted => {}
            CapturePermission::Denied => {
                warn!("🚫 Capture permission denied for {}", constraints.describe());
                return Err(MediaError::PermissionDenied {
                    operation: format!("{} capture", constraints.describe()),
                });
            }
            CapturePermission::NoDevice => {
                warn!("🚫 No capture device for {}", constraints.describe());
                return Err(MediaError::DeviceNotFound {
                    device_id: constraints.describe().to_string(),
                });
            }
            CapturePermission::DeviceBusy => {
                warn!("🚫 Capture device busy for {}", constraints.describe());
                return Err(MediaError::ResourceNotAvailable {
                    resource: format!("{} device", constraints.describe()),
                });
            }
        }

        let mut tracks: Vec<Arc<SoftwareTrack>> = Vec::new();
        if constraints.audio {
            tracks.push(Arc::new(SoftwareTrack::new(TrackKind::Audio, "Synthetic Microphone")));
        }
        if constraints.video {
            tracks.push(Arc::new(SoftwareTrack::new(TrackKind::Video, "Synthetic Camera")));
        }

        self.acquired.lock().extend(tracks.iter().cloned());
        info!("🎥 Acquired synthetic {} capture", constraints.describe());

        Ok(MediaStream::new(
            tracks
                .into_iter()
                .map(|track| track as Arc<dyn MediaTrack>)
                .collect(),
        ))
    }
}
