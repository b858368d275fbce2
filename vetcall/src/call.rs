//! Video-call session lifecycle
//!
//! [`CallSessionController`] owns everything one outgoing call attempt
//! acquires: the local capture stream, the peer connection, and the remote
//! stream delivered by the transport. Those resources are either all present
//! (in a call) or all released (idle).
//!
//! Signaling is not implemented for this client. The local offer and every
//! discovered candidate are handed to a [`SignalingChannel`]; with the
//! default [`UnimplementedSignaling`] they are refused, which is reported as
//! [`CallEvent::OfferNotSent`] / [`CallEvent::CandidateNotSent`] rather than
//! treated as a call failure. The remote side is therefore never connected.

use crate::config::{CallConfig, DoubleStartPolicy};
use crate::event::{CallEvent, EventEmitter, EventStream};
use crate::notifier::{Notifier, TracingNotifier};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vetcall_core::{SetupStage, VetCallError};
use vetcall_media::{CallView, MediaDevices, MediaStream, MediaTrack, UiRegion};
use vetcall_signaling::{
    CandidateHook, IceCandidate, PeerConnection, PeerConnectionFactory, SessionDescription,
    SignalingChannel, SignalingMessage, TrackEvent, TrackHook, UnimplementedSignaling,
};

/// Alert shown when a call cannot be started
pub const CALL_START_FAILED_MESSAGE: &str =
    "Error starting video call. Please check your device permissions and try again.";

/// Alert shown when a call is started while another one is active
pub const CALL_ALREADY_ACTIVE_MESSAGE: &str = "A video call is already in progress.";

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No resources held
    Idle,
    /// Local media live, connection open, offer applied
    InCall,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Idle => f.write_str("idle"),
            CallState::InCall => f.write_str("in call"),
        }
    }
}

/// Resources of one call attempt
struct CallResources {
    peer_id: String,
    local: MediaStream,
    connection: Arc<dyn PeerConnection>,
    remote: Arc<Mutex<Option<MediaStream>>>,
    active: Arc<AtomicBool>,
    on_screen: Arc<AtomicBool>,
    started_at: DateTime<Utc>,
}

impl CallResources {
    /// Keep the resources held but stop binding them to the view
    fn supersede(&self) {
        // Taken under the slot lock so an in-flight hook finishes its bind first.
        let _slot = self.remote.lock();
        self.on_screen.store(false, Ordering::SeqCst);
        debug!("Call with {} superseded; its tracks no longer reach the view", self.peer_id);
    }

    fn release(self) {
        // Tracks delivered after this point are stopped by the track hook.
        self.active.store(false, Ordering::SeqCst);
        self.connection.close();
        self.local.stop_all();
        let remote = self.remote.lock().take();
        if let Some(remote) = remote {
            remote.stop_all();
        }
        debug!("Released call resources for {}", self.peer_id);
    }
}

/// Fluent builder for a call controller
pub struct CallSessionBuilder {
    config: CallConfig,
    devices: Option<Arc<dyn MediaDevices>>,
    peers: Option<Arc<dyn PeerConnectionFactory>>,
    signaling: Option<Arc<dyn SignalingChannel>>,
    view: Option<Arc<dyn CallView>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl CallSessionBuilder {
    /// Create builder with the given call configuration
    pub fn new(config: CallConfig) -> Self {
        Self {
            config,
            devices: None,
            peers: None,
            signaling: None,
            view: None,
            notifier: None,
        }
    }

    /// Capture devices (required)
    pub fn devices(mut self, devices: Arc<dyn MediaDevices>) -> Self {
        self.devices = Some(devices);
        self
    }

    /// Peer connection factory (required)
    pub fn peer_factory(mut self, peers: Arc<dyn PeerConnectionFactory>) -> Self {
        self.peers = Some(peers);
        self
    }

    /// Display surfaces (required)
    pub fn view(mut self, view: Arc<dyn CallView>) -> Self {
        self.view = Some(view);
        self
    }

    /// Signaling channel; defaults to [`UnimplementedSignaling`]
    pub fn signaling(mut self, signaling: Arc<dyn SignalingChannel>) -> Self {
        self.signaling = Some(signaling);
        self
    }

    /// User notifier; defaults to [`TracingNotifier`]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the double-start policy
    pub fn double_start(mut self, policy: DoubleStartPolicy) -> Self {
        self.config.double_start = policy;
        self
    }

    /// Build the controller
    pub fn build(self) -> Result<CallSessionController, VetCallError> {
        let devices = self.devices.ok_or_else(|| VetCallError::MissingConfiguration {
            field: "devices".to_string(),
        })?;
        let peers = self.peers.ok_or_else(|| VetCallError::MissingConfiguration {
            field: "peer_factory".to_string(),
        })?;
        let view = self.view.ok_or_else(|| VetCallError::MissingConfiguration {
            field: "view".to_string(),
        })?;

        Ok(CallSessionController {
            devices,
            peers,
            signaling: self
                .signaling
                .unwrap_or_else(|| Arc::new(UnimplementedSignaling::new())),
            view,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            config: self.config,
            session: None,
            superseded: Vec::new(),
            emitter: EventEmitter::default(),
        })
    }
}

/// Lifecycle owner for one outgoing call attempt at a time
pub struct CallSessionController {
    devices: Arc<dyn MediaDevices>,
    peers: Arc<dyn PeerConnectionFactory>,
    signaling: Arc<dyn SignalingChannel>,
    view: Arc<dyn CallView>,
    notifier: Arc<dyn Notifier>,
    config: CallConfig,
    session: Option<CallResources>,
    superseded: Vec<CallResources>,
    emitter: EventEmitter,
}

impl CallSessionController {
    /// Start a builder with default call configuration
    pub fn builder() -> CallSessionBuilder {
        CallSessionBuilder::new(CallConfig::default())
    }

    /// Current state
    pub fn state(&self) -> CallState {
        if self.session.is_some() {
            CallState::InCall
        } else {
            CallState::Idle
        }
    }

    /// Remote party of the active call
    pub fn remote_peer(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.peer_id.as_str())
    }

    /// Local capture stream of the active call
    pub fn local_stream(&self) -> Option<MediaStream> {
        self.session.as_ref().map(|s| s.local.clone())
    }

    /// Remote stream of the active call, once a remote track has arrived
    pub fn remote_stream(&self) -> Option<MediaStream> {
        self.session.as_ref().and_then(|s| s.remote.lock().clone())
    }

    /// Local description applied to the active connection
    pub fn local_description(&self) -> Option<SessionDescription> {
        self.session
            .as_ref()
            .and_then(|s| s.connection.local_description())
    }

    /// When the active call finished setup
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref().map(|s| s.started_at)
    }

    /// Resource sets left behind by overlapping starts
    pub fn superseded_sessions(&self) -> usize {
        self.superseded.len()
    }

    /// Call configuration
    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    /// Subscribe to call events
    pub fn events(&self) -> EventStream {
        self.emitter.subscribe()
    }

    /// Start a call with `peer_id`
    ///
    /// Suspends while the capture permission prompt is pending. On failure
    /// everything acquired so far is released, the user is alerted once, and
    /// the controller stays idle.
    pub async fn start_call(&mut self, peer_id: &str) -> Result<(), VetCallError> {
        if let Some(active) = &self.session {
            match self.config.double_start {
                DoubleStartPolicy::Reject => {
                    warn!(
                        "Refusing to start a call with {} while in a call with {}",
                        peer_id, active.peer_id
                    );
                    self.notifier.alert(CALL_ALREADY_ACTIVE_MESSAGE);
                    return Err(VetCallError::InvalidState {
                        expected: CallState::Idle.to_string(),
                        actual: CallState::InCall.to_string(),
                    });
                }
                DoubleStartPolicy::Overlap => {
                    warn!(
                        "Starting a second call while in a call with {}; its resources stay held",
                        active.peer_id
                    );
                }
            }
        }

        if peer_id.trim().is_empty() {
            let error = VetCallError::call_setup(SetupStage::PeerSelection, "no remote party selected");
            return Err(self.report_failure(peer_id, error));
        }

        info!("📞 Starting video call with {}", peer_id);

        let local = match self.devices.get_user_media(self.config.constraints()).await {
            Ok(stream) => stream,
            Err(e) => {
                let error = VetCallError::call_setup(SetupStage::MediaAcquisition, e.to_string());
                return Err(self.report_failure(peer_id, error));
            }
        };

        self.view.attach_local(Some(&local));
        self.view.set_region_visible(UiRegion::CallInstructions, true);
        self.emitter.emit(CallEvent::LocalMediaAcquired {
            stream_id: local.id().to_string(),
            track_count: local.tracks().len(),
        });

        let remote = Arc::new(Mutex::new(None));
        let active = Arc::new(AtomicBool::new(true));
        let on_screen = Arc::new(AtomicBool::new(true));
        let mut partial = None;

        let (connection, offer) = match self
            .connect(peer_id, &local, &remote, (&active, &on_screen), &mut partial)
            .await
        {
            Ok(established) => established,
            Err(error) => {
                active.store(false, Ordering::SeqCst);
                if let Some(connection) = partial {
                    connection.close();
                }
                local.stop_all();
                match &self.session {
                    Some(current) => self.view.attach_local(Some(&current.local)),
                    None => self.clear_surfaces(),
                }
                return Err(self.report_failure(peer_id, error));
            }
        };

        // A missing signaling transport leaves the call half-open but is not a setup failure.
        if let Err(e) = self.signaling.send(SignalingMessage::Offer {
            target: peer_id.to_string(),
            description: offer,
        }) {
            debug!("Offer for {} not delivered: {}", peer_id, e);
            self.emitter.emit(CallEvent::OfferNotSent {
                peer_id: peer_id.to_string(),
                reason: e.to_string(),
            });
        }

        self.view.set_region_visible(UiRegion::CallContainer, true);

        let resources = CallResources {
            peer_id: peer_id.to_string(),
            local,
            connection,
            remote,
            active,
            on_screen,
            started_at: Utc::now(),
        };
        if let Some(previous) = self.session.replace(resources) {
            previous.supersede();
            self.superseded.push(previous);
        }

        info!("✅ Call with {} is up (awaiting remote answer)", peer_id);
        self.emitter.emit(CallEvent::CallStarted {
            peer_id: peer_id.to_string(),
        });
        Ok(())
    }

    /// End the active call
    ///
    /// Closes the connection, stops every local and remote track, clears both
    /// surfaces and hides the call UI. Safe to call while idle.
    pub fn end_call(&mut self) {
        match self.session.take() {
            Some(resources) => {
                let peer_id = resources.peer_id.clone();
                resources.release();
                info!("📴 Ended video call with {}", peer_id);
                self.emitter.emit(CallEvent::CallEnded { peer_id });
            }
            None => debug!("end_call while idle"),
        }
        self.clear_surfaces();
    }

    async fn connect(
        &self,
        peer_id: &str,
        local: &MediaStream,
        remote: &Arc<Mutex<Option<MediaStream>>>,
        (active, on_screen): (&Arc<AtomicBool>, &Arc<AtomicBool>),
        slot: &mut Option<Arc<dyn PeerConnection>>,
    ) -> Result<(Arc<dyn PeerConnection>, SessionDescription), VetCallError> {
        let connection = self
            .peers
            .create(&self.config.peer_config())
            .map_err(|e| VetCallError::call_setup(SetupStage::PeerConnection, e.to_string()))?;
        *slot = Some(connection.clone());

        for track in local.tracks() {
            connection
                .add_track(track, local)
                .map_err(|e| VetCallError::call_setup(SetupStage::TrackAttachment, e.to_string()))?;
        }

        connection.on_ice_candidate(self.candidate_hook(peer_id));
        connection.on_track(self.track_hook(remote.clone(), active.clone(), on_screen.clone()));

        let offer = connection
            .create_offer()
            .await
            .map_err(|e| VetCallError::call_setup(SetupStage::OfferGeneration, e.to_string()))?;
        connection
            .set_local_description(offer.clone())
            .await
            .map_err(|e| VetCallError::call_setup(SetupStage::LocalDescription, e.to_string()))?;

        self.emitter.emit(CallEvent::OfferCreated {
            media_sections: offer.media_sections(),
        });
        Ok((connection, offer))
    }

    fn candidate_hook(&self, peer_id: &str) -> CandidateHook {
        let peer_id = peer_id.to_string();
        let signaling = self.signaling.clone();
        let emitter = self.emitter.clone();

        Arc::new(move |candidate: Option<IceCandidate>| match candidate {
            Some(candidate) => {
                let message = SignalingMessage::Candidate {
                    target: peer_id.clone(),
                    candidate: candidate.clone(),
                };
                if let Err(e) = signaling.send(message) {
                    debug!("Candidate for {} not delivered: {}", peer_id, e);
                    emitter.emit(CallEvent::CandidateNotSent {
                        peer_id: peer_id.clone(),
                        candidate,
                    });
                }
            }
            None => emitter.emit(CallEvent::CandidateGatheringComplete {
                peer_id: peer_id.clone(),
            }),
        })
    }

    fn track_hook(
        &self,
        remote: Arc<Mutex<Option<MediaStream>>>,
        active: Arc<AtomicBool>,
        on_screen: Arc<AtomicBool>,
    ) -> TrackHook {
        let view = self.view.clone();
        let emitter = self.emitter.clone();

        Arc::new(move |event: TrackEvent| {
            // The surface is bound under the slot lock so teardown, which
            // takes the same lock, always clears it afterwards.
            let mut slot = remote.lock();
            if !active.load(Ordering::SeqCst) {
                debug!("Stopping remote track {} that arrived after teardown", event.track.id());
                event.track.stop();
                return;
            }
            let stream = match slot.clone() {
                Some(existing) => existing,
                None => {
                    let stream = event
                        .streams
                        .first()
                        .cloned()
                        .unwrap_or_else(|| MediaStream::new(Vec::new()));
                    *slot = Some(stream.clone());
                    stream
                }
            };
            stream.add_track(event.track.clone());

            if !on_screen.load(Ordering::SeqCst) {
                debug!("Holding remote track {} of a superseded call", event.track.id());
                return;
            }
            view.attach_remote(Some(&stream));
            drop(slot);

            info!("📺 Remote {} track {} attached", event.track.kind(), event.track.id());
            emitter.emit(CallEvent::RemoteTrackAttached {
                stream_id: stream.id().to_string(),
                track_id: event.track.id().to_string(),
            });
        })
    }

    fn report_failure(&self, peer_id: &str, error: VetCallError) -> VetCallError {
        error!("Error starting video call with {:?}: {}", peer_id, error);
        self.notifier.alert(CALL_START_FAILED_MESSAGE);
        self.emitter.emit(CallEvent::CallFailed {
            peer_id: peer_id.to_string(),
            stage: error.setup_stage(),
            error: error.to_string(),
        });
        error
    }

    fn clear_surfaces(&self) {
        self.view.attach_local(None);
        self.view.attach_remote(None);
        self.view.set_region_visible(UiRegion::CallContainer, false);
        self.view.set_region_visible(UiRegion::CallInstructions, false);
    }
}

impl Drop for CallSessionController {
    fn drop(&mut self) {
        if let Some(resources) = self.session.take() {
            resources.release();
        }
        for resources in self.superseded.drain(..) {
            resources.release();
        }
    }
}

impl fmt::Debug for CallSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSessionController")
            .field("state", &self.state())
            .field("remote_peer", &self.remote_peer())
            .field("superseded", &self.superseded.len())
            .finish()
    }
}
