//! Peer connection seam
//!
//! A [`PeerConnection`] is the real-time transport object for one call
//! attempt. Transport notifications are delivered through hooks registered
//! by the owner; track arrival happens asynchronously, at most once per
//! negotiated media section, with no ordering guarantee against candidates.

use crate::protocol::{IceCandidate, SessionDescription};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use vetcall_core::VetCallError;
use vetcall_media::{MediaStream, MediaTrack};

/// Invoked for each discovered local candidate; `None` marks the end of gathering
pub type CandidateHook = Arc<dyn Fn(Option<IceCandidate>) + Send + Sync>;

/// Invoked when a remote track arrives
pub type TrackHook = Arc<dyn Fn(TrackEvent) + Send + Sync>;

/// Remote track arrival notification
#[derive(Clone)]
pub struct TrackEvent {
    /// The received track
    pub track: Arc<dyn MediaTrack>,
    /// Remote streams the track belongs to
    pub streams: Vec<MediaStream>,
}

impl fmt::Debug for TrackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackEvent")
            .field("track", &self.track.id())
            .field("streams", &self.streams)
            .finish()
    }
}

/// STUN/TURN server entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceServer {
    /// Server URLs
    pub urls: Vec<String>,
}

/// Peer connection configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerConfig {
    /// ICE servers; empty means host candidates only
    pub ice_servers: Vec<IceServer>,
}

/// Real-time transport object for one call attempt
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Connection ID
    fn id(&self) -> &str;

    /// Attach a local track, associated with `stream`
    fn add_track(&self, track: Arc<dyn MediaTrack>, stream: &MediaStream) -> Result<(), VetCallError>;

    /// Register the candidate-discovery hook, replacing any previous one
    fn on_ice_candidate(&self, hook: CandidateHook);

    /// Register the remote-track hook, replacing any previous one
    fn on_track(&self, hook: TrackHook);

    /// Generate a local offer describing the attached tracks
    async fn create_offer(&self) -> Result<SessionDescription, VetCallError>;

    /// Apply a description as the local description
    async fn set_local_description(&self, description: SessionDescription) -> Result<(), VetCallError>;

    /// Current local description
    fn local_description(&self) -> Option<SessionDescription>;

    /// Close the connection; later calls are no-ops
    fn close(&self);

    /// Whether `close()` has been called
    fn is_closed(&self) -> bool;
}

/// Constructs peer connections
pub trait PeerConnectionFactory: Send + Sync {
    /// Create a new, unconnected peer connection
    fn create(&self, config: &PeerConfig) -> Result<Arc<dyn PeerConnection>, VetCallError>;
}
