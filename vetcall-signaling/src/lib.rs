//! # VetCall Signaling
//!
//! Session descriptions, ICE candidates and the peer-connection seam used by
//! the call controller, plus the signaling channel abstraction.
//!
//! No signaling server exists for this client. [`UnimplementedSignaling`]
//! makes that explicit: every offer and candidate handed to it is refused
//! and counted rather than silently dropped.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod loopback;
pub mod peer;
pub mod protocol;

// Re-export main types
pub use channel::{SignalingChannel, UnimplementedSignaling};
pub use loopback::{LoopbackFailures, LoopbackPeerConnection, LoopbackPeerFactory};
pub use peer::{
    CandidateHook, IceServer, PeerConfig, PeerConnection, PeerConnectionFactory, TrackEvent,
    TrackHook,
};
pub use protocol::{IceCandidate, SdpType, SessionDescription, SignalingMessage};
