//! In-process peer connection
//!
//! Implements the transport seam without a network: tracks are recorded,
//! offers are generated from the attached tracks, and a driver injects local
//! candidates and remote tracks through the registered hooks.

use crate::peer::{
    CandidateHook, PeerConfig, PeerConnection, PeerConnectionFactory, TrackEvent, TrackHook,
};
use crate::protocol::{IceCandidate, SdpType, SessionDescription};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use vetcall_core::VetCallError;
use vetcall_media::{MediaStream, MediaTrack, SoftwareTrack, TrackKind};

/// Failures to inject into loopback connections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackFailures {
    /// Refuse to construct connections
    pub create: bool,
    /// Refuse to attach tracks
    pub add_track: bool,
    /// Fail offer generation
    pub create_offer: bool,
    /// Reject the local description
    pub set_local_description: bool,
}

#[derive(Debug, Clone)]
struct AttachedTrack {
    track_id: String,
    kind: TrackKind,
    stream_id: String,
}

/// Loopback peer connection
pub struct LoopbackPeerConnection {
    id: String,
    config: PeerConfig,
    failures: LoopbackFailures,
    session_id: u64,
    tracks: Mutex<Vec<AttachedTrack>>,
    candidate_hook: Mutex<Option<CandidateHook>>,
    track_hook: Mutex<Option<TrackHook>>,
    local_description: Mutex<Option<SessionDescription>>,
    offers_created: AtomicUsize,
    close_calls: AtomicUsize,
}

impl LoopbackPeerConnection {
    /// Create new connection
    pub fn new(config: PeerConfig, failures: LoopbackFailures) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            config,
            failures,
            // SDP session ids must fit a signed 64-bit integer
            session_id: rand::random::<u64>() >> 1,
            tracks: Mutex::new(Vec::new()),
            candidate_hook: Mutex::new(None),
            track_hook: Mutex::new(None),
            local_description: Mutex::new(None),
            offers_created: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Configuration the connection was built with
    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// Number of attached local tracks
    pub fn track_count(&self) -> usize {
        self.tracks.lock().len()
    }

    /// Ids of attached local tracks, in attachment order
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks
            .lock()
            .iter()
            .map(|attached| attached.track_id.clone())
            .collect()
    }

    /// Number of offers generated
    pub fn offers_created(&self) -> usize {
        self.offers_created.load(Ordering::SeqCst)
    }

    /// Number of times `close()` has been called
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Whether hooks have been registered
    pub fn has_hooks(&self) -> (bool, bool) {
        (
            self.candidate_hook.lock().is_some(),
            self.track_hook.lock().is_some(),
        )
    }

    /// Deliver a local candidate (or end-of-gathering) to the registered hook
    ///
    /// Returns false if no hook is registered or the connection is closed.
    pub fn emit_candidate(&self, candidate: Option<IceCandidate>) -> bool {
        if self.is_closed() {
            return false;
        }
        // Clone out of the lock so the hook may call back into the connection.
        let hook = self.candidate_hook.lock().clone();
        match hook {
            Some(hook) => {
                hook(candidate);
                true
            }
            None => false,
        }
    }

    /// Emit one host candidate per media section followed by end-of-gathering
    pub fn gather_host_candidates(&self) -> usize {
        let sections = self.tracks.lock().len();
        for index in 0..sections {
            let port = 49152 + (rand::random::<u16>() % 16384);
            let candidate = IceCandidate {
                candidate: format!(
                    "candidate:{} 1 udp 2122260223 127.0.0.1 {} typ host",
                    index + 1,
                    port
                ),
                sdp_mid: Some(index.to_string()),
                sdp_m_line_index: Some(index as u16),
            };
            self.emit_candidate(Some(candidate));
        }
        self.emit_candidate(None);
        sections
    }

    /// Simulate arrival of a remote track of `kind` in a stream with `stream_id`
    ///
    /// The track is delivered even without a registered hook, in which case
    /// nobody owns it; callers get it back to inspect.
    pub fn deliver_remote_track(&self, kind: TrackKind, stream_id: &str) -> Arc<SoftwareTrack> {
        let track = Arc::new(SoftwareTrack::new(kind, format!("remote {}", kind)));
        let stream = MediaStream::with_id(stream_id, vec![track.clone() as Arc<dyn MediaTrack>]);
        let hook = self.track_hook.lock().clone();
        if let Some(hook) = hook {
            hook(TrackEvent {
                track: track.clone(),
                streams: vec![stream],
            });
        }
        track
    }

    fn render_offer(&self) -> String {
        let tracks = self.tracks.lock().clone();
        let mids: Vec<String> = (0..tracks.len()).map(|i| i.to_string()).collect();

        let mut lines = vec![
            "v=0".to_string(),
            format!("o=- {} 2 IN IP4 127.0.0.1", self.session_id),
            "s=-".to_string(),
            "t=0 0".to_string(),
        ];
        if !mids.is_empty() {
            lines.push(format!("a=group:BUNDLE {}", mids.join(" ")));
        }

        for (mid, attached) in tracks.iter().enumerate() {
            let (payload, rtpmap) = match attached.kind {
                TrackKind::Audio => (111, "opus/48000/2"),
                TrackKind::Video => (96, "VP8/90000"),
            };
            lines.push(format!(
                "m={} 9 UDP/TLS/RTP/SAVPF {}",
                attached.kind, payload
            ));
            lines.push("c=IN IP4 0.0.0.0".to_string());
            lines.push(format!("a=mid:{}", mid));
            lines.push("a=sendrecv".to_string());
            lines.push(format!("a=msid:{} {}", attached.stream_id, attached.track_id));
            lines.push(format!("a=rtpmap:{} {}", payload, rtpmap));
        }

        let mut sdp = lines.join("\r\n");
        sdp.push_str("\r\n");
        sdp
    }

    fn ensure_open(&self, operation: &str) -> Result<(), VetCallError> {
        if self.is_closed() {
            return Err(VetCallError::InvalidState {
                expected: "open connection".to_string(),
                actual: format!("closed connection ({})", operation),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoopbackPeerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackPeerConnection")
            .field("id", &self.id)
            .field("tracks", &self.track_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl PeerConnection for LoopbackPeerConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn add_track(&self, track: Arc<dyn MediaTrack>, stream: &MediaStream) -> Result<(), VetCallError> {
        self.ensure_open("add_track")?;
        if self.failures.add_track {
            return Err(VetCallError::InvalidData {
                reason: format!("transport rejected {} track {}", track.kind(), track.id()),
            });
        }
        debug!("➕ Attaching {} track {} to {}", track.kind(), track.id(), self.id);
        self.tracks.lock().push(AttachedTrack {
            track_id: track.id().to_string(),
            kind: track.kind(),
            stream_id: stream.id().to_string(),
        });
        Ok(())
    }

    fn on_ice_candidate(&self, hook: CandidateHook) {
        *self.candidate_hook.lock() = Some(hook);
    }

    fn on_track(&self, hook: TrackHook) {
        *self.track_hook.lock() = Some(hook);
    }

    async fn create_offer(&self) -> Result<SessionDescription, VetCallError> {
        self.ensure_open("create_offer")?;
        if self.failures.create_offer {
            return Err(VetCallError::InvalidData {
                reason: "offer generation failed".to_string(),
            });
        }
        self.offers_created.fetch_add(1, Ordering::SeqCst);
        Ok(SessionDescription::offer(self.render_offer()))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<(), VetCallError> {
        self.ensure_open("set_local_description")?;
        if self.failures.set_local_description {
            return Err(VetCallError::InvalidData {
                reason: "local description rejected".to_string(),
            });
        }
        if description.sdp_type != SdpType::Offer {
            return Err(VetCallError::InvalidState {
                expected: "offer".to_string(),
                actual: "answer without remote offer".to_string(),
            });
        }
        *self.local_description.lock() = Some(description);
        Ok(())
    }

    fn local_description(&self) -> Option<SessionDescription> {
        self.local_description.lock().clone()
    }

    fn close(&self) {
        if self.close_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            info!("🔌 Closed loopback connection {}", self.id);
            self.candidate_hook.lock().take();
            self.track_hook.lock().take();
        }
    }

    fn is_closed(&self) -> bool {
        self.close_calls.load(Ordering::SeqCst) > 0
    }
}

/// Factory for loopback connections
#[derive(Debug, Default)]
pub struct LoopbackPeerFactory {
    failures: Mutex<LoopbackFailures>,
    created: Mutex<Vec<Arc<LoopbackPeerConnection>>>,
}

impl LoopbackPeerFactory {
    /// Create new factory producing healthy connections
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose connections fail as described
    pub fn with_failures(failures: LoopbackFailures) -> Self {
        Self {
            failures: Mutex::new(failures),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Change failures for subsequently created connections
    pub fn set_failures(&self, failures: LoopbackFailures) {
        *self.failures.lock() = failures;
    }

    /// Every connection created so far
    pub fn connections(&self) -> Vec<Arc<LoopbackPeerConnection>> {
        self.created.lock().clone()
    }

    /// Most recently created connection
    pub fn last(&self) -> Option<Arc<LoopbackPeerConnection>> {
        self.created.lock().last().cloned()
    }
}

impl PeerConnectionFactory for LoopbackPeerFactory {
    fn create(&self, config: &PeerConfig) -> Result<Arc<dyn PeerConnection>, VetCallError> {
        let failures = *self.failures.lock();
        if failures.create {
            return Err(VetCallError::Initialization {
                reason: "peer connection construction refused".to_string(),
            });
        }
        let connection = Arc::new(LoopbackPeerConnection::new(config.clone(), failures));
        self.created.lock().push(connection.clone());
        Ok(connection)
    }
}
