//! # VetCall Media
//!
//! Media handles for the VetCall client: tracks and streams, the
//! permission-gated capture device seam, and the display surfaces a call
//! renders into.

#![warn(clippy::all)]

pub mod capture;
pub mod error;
pub mod surface;
pub mod tracks;

// Re-export main types
pub use capture::{CapturePermission, MediaConstraints, MediaDevices, SyntheticDevices};
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use surface::{CallView, HeadlessCallView, UiRegion};
pub use tracks::{MediaStream, MediaTrack, SoftwareTrack, TrackKind};
