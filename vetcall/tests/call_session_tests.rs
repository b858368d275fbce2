//! Call session lifecycle tests
//!
//! Drive the controller with synthetic capture, loopback connections and a
//! headless view, and check that every acquired resource is released.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tokio_test::{assert_err, assert_ok};
use vetcall::call::{CALL_ALREADY_ACTIVE_MESSAGE, CALL_START_FAILED_MESSAGE};
use vetcall::*;
use vetcall_signaling::{CandidateHook, TrackEvent, TrackHook};

#[derive(Debug, Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
    pages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }

    fn navigate(&self, page: &str) {
        self.pages.lock().push(page.to_string());
    }
}

struct Harness {
    devices: Arc<SyntheticDevices>,
    peers: Arc<LoopbackPeerFactory>,
    view: Arc<HeadlessCallView>,
    notifier: Arc<RecordingNotifier>,
    signaling: Arc<UnimplementedSignaling>,
}

impl Harness {
    fn new() -> Self {
        Self {
            devices: Arc::new(SyntheticDevices::granted()),
            peers: Arc::new(LoopbackPeerFactory::new()),
            view: Arc::new(HeadlessCallView::new()),
            notifier: Arc::new(RecordingNotifier::default()),
            signaling: Arc::new(UnimplementedSignaling::new()),
        }
    }

    fn controller(&self, policy: DoubleStartPolicy) -> CallSessionController {
        CallSessionController::builder()
            .devices(self.devices.clone())
            .peer_factory(self.peers.clone())
            .view(self.view.clone())
            .notifier(self.notifier.clone())
            .signaling(self.signaling.clone())
            .double_start(policy)
            .build()
            .unwrap()
    }

    fn assert_ui_hidden(&self) {
        assert!(!self.view.is_visible(UiRegion::CallContainer));
        assert!(!self.view.is_visible(UiRegion::CallInstructions));
        assert!(self.view.local_stream().is_none());
        assert!(self.view.remote_stream().is_none());
    }
}

#[tokio::test]
async fn test_start_call_with_granted_capture() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);
    let mut events = call.events();

    call.start_call("dr-herriot").await.unwrap();

    assert_eq!(call.state(), CallState::InCall);
    assert_eq!(call.remote_peer(), Some("dr-herriot"));
    assert!(call.started_at().is_some());

    let local = call.local_stream().unwrap();
    assert_eq!(local.tracks().len(), 2);
    assert_eq!(harness.view.local_stream(), Some(local.clone()));
    assert!(harness.view.is_visible(UiRegion::CallContainer));
    assert!(harness.view.is_visible(UiRegion::CallInstructions));

    let offer = call.local_description().unwrap();
    assert_eq!(offer.sdp_type, vetcall_signaling::SdpType::Offer);
    assert_eq!(offer.media_sections(), 2);

    let connection = harness.peers.last().unwrap();
    assert_eq!(connection.track_count(), 2);
    assert_eq!(connection.offers_created(), 1);
    assert_eq!(connection.has_hooks(), (true, true));
    assert!(harness.notifier.alerts().is_empty());

    let kinds: Vec<&str> = events.drain().iter().map(|e| e.event_type()).collect();
    assert_eq!(
        kinds,
        vec![
            "local_media_acquired",
            "offer_created",
            "offer_not_sent",
            "call_started"
        ]
    );
    assert_eq!(harness.signaling.refused_offers(), 1);
}

#[tokio::test]
async fn test_denied_capture_alerts_once_and_stays_idle() {
    let harness = Harness::new();
    harness.devices.set_permission(CapturePermission::Denied);
    let mut call = harness.controller(DoubleStartPolicy::Reject);
    let mut events = call.events();

    let error = assert_err!(call.start_call("dr-herriot").await);

    assert_eq!(error.setup_stage(), Some(SetupStage::MediaAcquisition));
    assert_eq!(error.kind(), ErrorKind::CallSetup);
    assert_eq!(call.state(), CallState::Idle);
    assert!(harness.peers.connections().is_empty());
    assert_eq!(harness.notifier.alerts(), vec![CALL_START_FAILED_MESSAGE.to_string()]);
    harness.assert_ui_hidden();

    match events.drain().as_slice() {
        [CallEvent::CallFailed { peer_id, stage, .. }] => {
            assert_eq!(peer_id, "dr-herriot");
            assert_eq!(*stage, Some(SetupStage::MediaAcquisition));
        }
        other => panic!("unexpected events: {:?}", other),
    }
}

#[tokio::test]
async fn test_busy_camera_fails_at_media_acquisition() {
    let harness = Harness::new();
    harness.devices.set_permission(CapturePermission::DeviceBusy);
    let mut call = harness.controller(DoubleStartPolicy::Reject);

    let error = assert_err!(call.start_call("dr-herriot").await);

    assert_eq!(error.setup_stage(), Some(SetupStage::MediaAcquisition));
    assert!(error.to_string().contains("Resource not available"));
    assert_eq!(harness.notifier.alerts(), vec![CALL_START_FAILED_MESSAGE.to_string()]);
    harness.assert_ui_hidden();
}

#[tokio::test]
async fn test_empty_peer_is_rejected_before_capture() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);

    let error = call.start_call("  ").await.unwrap_err();

    assert_eq!(error.setup_stage(), Some(SetupStage::PeerSelection));
    assert_eq!(harness.devices.requests(), 0);
    assert_eq!(harness.notifier.alerts().len(), 1);
    assert_eq!(call.state(), CallState::Idle);
}

#[test]
fn test_end_call_while_idle_is_noop() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);
    let mut events = call.events();

    call.end_call();
    call.end_call();

    assert_eq!(call.state(), CallState::Idle);
    assert!(events.drain().is_empty());
    assert!(harness.notifier.alerts().is_empty());
    harness.assert_ui_hidden();
}

#[tokio::test]
async fn test_end_call_releases_everything_once() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);
    call.start_call("dr-herriot").await.unwrap();
    let connection = harness.peers.last().unwrap();

    call.end_call();

    assert_eq!(call.state(), CallState::Idle);
    assert!(call.local_stream().is_none());
    assert!(call.local_description().is_none());
    assert_eq!(connection.close_calls(), 1);
    for track in harness.devices.acquired_tracks() {
        assert_eq!(track.stop_calls(), 1);
    }
    assert_eq!(harness.devices.live_tracks(), 0);
    harness.assert_ui_hidden();

    // A second end must not touch the released resources again.
    call.end_call();
    assert_eq!(connection.close_calls(), 1);
    for track in harness.devices.acquired_tracks() {
        assert_eq!(track.stop_calls(), 1);
    }
}

#[tokio::test]
async fn test_call_can_be_restarted_after_end() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);

    assert_ok!(call.start_call("dr-herriot").await);
    call.end_call();
    assert_ok!(call.start_call("dr-pol").await);

    assert_eq!(call.remote_peer(), Some("dr-pol"));
    assert_eq!(harness.peers.connections().len(), 2);
    assert_eq!(harness.devices.live_tracks(), 2);
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);
    call.start_call("dr-herriot").await.unwrap();

    let error = assert_err!(call.start_call("dr-pol").await);

    assert_eq!(error.error_code(), "INVALID_STATE");
    assert_eq!(call.remote_peer(), Some("dr-herriot"));
    assert_eq!(harness.devices.requests(), 1);
    assert_eq!(harness.peers.connections().len(), 1);
    assert_eq!(
        harness.notifier.alerts(),
        vec![CALL_ALREADY_ACTIVE_MESSAGE.to_string()]
    );
    assert!(harness.view.is_visible(UiRegion::CallContainer));
}

#[tokio::test]
async fn test_overlapping_start_leaves_first_resources_held() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Overlap);

    call.start_call("dr-herriot").await.unwrap();
    call.start_call("dr-pol").await.unwrap();

    assert_eq!(harness.devices.requests(), 2);
    assert_eq!(call.superseded_sessions(), 1);
    let connections = harness.peers.connections();
    assert_eq!(connections.len(), 2);

    call.end_call();
    assert_eq!(connections[0].close_calls(), 0);
    assert_eq!(connections[1].close_calls(), 1);
    assert_eq!(harness.devices.live_tracks(), 2);

    drop(call);
    assert_eq!(connections[0].close_calls(), 1);
    assert_eq!(harness.devices.live_tracks(), 0);
}

#[tokio::test]
async fn test_superseded_call_no_longer_reaches_the_view() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Overlap);
    let mut events = call.events();

    assert_ok!(call.start_call("dr-herriot").await);
    assert_ok!(call.start_call("dr-pol").await);
    events.drain();
    let connections = harness.peers.connections();

    // Tracks for the superseded call are held but never shown.
    let stale = connections[0].deliver_remote_track(TrackKind::Video, "stale-stream");
    assert!(harness.view.remote_stream().is_none());
    assert_eq!(stale.stop_calls(), 0);

    let current = connections[1].deliver_remote_track(TrackKind::Video, "current-stream");
    assert_eq!(
        harness.view.remote_stream().map(|s| s.id().to_string()),
        Some("current-stream".to_string())
    );

    call.end_call();
    assert_eq!(current.stop_calls(), 1);

    let late = connections[0].deliver_remote_track(TrackKind::Audio, "stale-stream");
    assert_eq!(call.state(), CallState::Idle);
    harness.assert_ui_hidden();
    let attached = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, CallEvent::RemoteTrackAttached { .. }))
        .count();
    assert_eq!(attached, 1);

    drop(call);
    assert_eq!(stale.stop_calls(), 1);
    assert_eq!(late.stop_calls(), 1);
}

#[tokio::test]
async fn test_remote_track_attaches_and_stops_on_end() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);
    let mut events = call.events();
    call.start_call("dr-herriot").await.unwrap();
    events.drain();
    let connection = harness.peers.last().unwrap();

    let video = connection.deliver_remote_track(TrackKind::Video, "remote-stream");
    let audio = connection.deliver_remote_track(TrackKind::Audio, "remote-stream");

    let remote = call.remote_stream().unwrap();
    assert_eq!(remote.id(), "remote-stream");
    assert_eq!(remote.tracks().len(), 2);
    assert_eq!(harness.view.remote_stream(), Some(remote));

    let attached = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, CallEvent::RemoteTrackAttached { .. }))
        .count();
    assert_eq!(attached, 2);

    call.end_call();
    assert_eq!(video.stop_calls(), 1);
    assert_eq!(audio.stop_calls(), 1);
    assert!(harness.view.remote_stream().is_none());
}

#[tokio::test]
async fn test_candidates_are_reported_as_undelivered() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Reject);
    let mut events = call.events();
    call.start_call("dr-herriot").await.unwrap();
    events.drain();

    let gathered = harness.peers.last().unwrap().gather_host_candidates();
    assert_eq!(gathered, 2);

    let events = events.drain();
    let undelivered = events
        .iter()
        .filter(|e| matches!(e, CallEvent::CandidateNotSent { peer_id, .. } if peer_id == "dr-herriot"))
        .count();
    assert_eq!(undelivered, 2);
    assert!(matches!(
        events.last(),
        Some(CallEvent::CandidateGatheringComplete { .. })
    ));
    assert!(events.iter().all(|e| !e.is_lifecycle_event()));
    assert_eq!(harness.signaling.refused_candidates(), 2);
    assert_eq!(call.state(), CallState::InCall);
}

async fn assert_stage_rolls_back(failures: LoopbackFailures, stage: SetupStage) {
    let harness = Harness::new();
    harness.peers.set_failures(failures);
    let mut call = harness.controller(DoubleStartPolicy::Reject);

    let error = assert_err!(call.start_call("dr-herriot").await);

    assert_eq!(error.setup_stage(), Some(stage), "{}", error);
    assert_eq!(call.state(), CallState::Idle);
    assert_eq!(harness.devices.live_tracks(), 0, "{} leaked tracks", stage);
    for connection in harness.peers.connections() {
        assert_eq!(connection.close_calls(), 1, "{} leaked a connection", stage);
    }
    assert_eq!(harness.notifier.alerts(), vec![CALL_START_FAILED_MESSAGE.to_string()]);
    harness.assert_ui_hidden();
}

#[tokio::test]
async fn test_failed_setup_rolls_back_at_every_stage() {
    assert_stage_rolls_back(
        LoopbackFailures {
            create: true,
            ..Default::default()
        },
        SetupStage::PeerConnection,
    )
    .await;
    assert_stage_rolls_back(
        LoopbackFailures {
            add_track: true,
            ..Default::default()
        },
        SetupStage::TrackAttachment,
    )
    .await;
    assert_stage_rolls_back(
        LoopbackFailures {
            create_offer: true,
            ..Default::default()
        },
        SetupStage::OfferGeneration,
    )
    .await;
    assert_stage_rolls_back(
        LoopbackFailures {
            set_local_description: true,
            ..Default::default()
        },
        SetupStage::LocalDescription,
    )
    .await;
}

#[tokio::test]
async fn test_failed_overlapping_start_keeps_active_call_visible() {
    let harness = Harness::new();
    let mut call = harness.controller(DoubleStartPolicy::Overlap);
    call.start_call("dr-herriot").await.unwrap();

    harness.peers.set_failures(LoopbackFailures {
        create_offer: true,
        ..Default::default()
    });
    call.start_call("dr-pol").await.unwrap_err();

    assert_eq!(call.remote_peer(), Some("dr-herriot"));
    assert!(harness.view.is_visible(UiRegion::CallContainer));
    assert_eq!(harness.view.local_stream(), call.local_stream());
    assert_eq!(call.superseded_sessions(), 0);
}

/// Transport that keeps delivering to its hooks after close
#[derive(Default)]
struct LingeringConnection {
    candidate_hook: Mutex<Option<CandidateHook>>,
    track_hook: Mutex<Option<TrackHook>>,
    description: Mutex<Option<SessionDescription>>,
}

impl LingeringConnection {
    fn deliver(&self, track: Arc<SoftwareTrack>) {
        let hook = self.track_hook.lock().clone();
        if let Some(hook) = hook {
            hook(TrackEvent {
                track,
                streams: Vec::new(),
            });
        }
    }
}

#[async_trait]
impl PeerConnection for LingeringConnection {
    fn id(&self) -> &str {
        "lingering"
    }

    fn add_track(&self, _track: Arc<dyn MediaTrack>, _stream: &MediaStream) -> Result<(), VetCallError> {
        Ok(())
    }

    fn on_ice_candidate(&self, hook: CandidateHook) {
        *self.candidate_hook.lock() = Some(hook);
    }

    fn on_track(&self, hook: TrackHook) {
        *self.track_hook.lock() = Some(hook);
    }

    async fn create_offer(&self) -> Result<SessionDescription, VetCallError> {
        Ok(SessionDescription::offer("v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\n"))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<(), VetCallError> {
        *self.description.lock() = Some(description);
        Ok(())
    }

    fn local_description(&self) -> Option<SessionDescription> {
        self.description.lock().clone()
    }

    fn close(&self) {}

    fn is_closed(&self) -> bool {
        false
    }
}

struct LingeringFactory(Arc<LingeringConnection>);

impl PeerConnectionFactory for LingeringFactory {
    fn create(&self, _config: &PeerConfig) -> Result<Arc<dyn PeerConnection>, VetCallError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_remote_track_after_end_is_stopped() {
    let harness = Harness::new();
    let connection = Arc::new(LingeringConnection::default());
    let mut call = CallSessionController::builder()
        .devices(harness.devices.clone())
        .peer_factory(Arc::new(LingeringFactory(connection.clone())))
        .view(harness.view.clone())
        .notifier(harness.notifier.clone())
        .build()
        .unwrap();

    call.start_call("dr-herriot").await.unwrap();
    call.end_call();

    let late = Arc::new(SoftwareTrack::new(TrackKind::Video, "late"));
    connection.deliver(late.clone());

    assert_eq!(late.stop_calls(), 1);
    assert!(call.remote_stream().is_none());
    harness.assert_ui_hidden();
}

#[tokio::test]
async fn test_remote_tracks_racing_end_call_never_stay_bound() {
    let harness = Harness::new();
    let connection = Arc::new(LingeringConnection::default());
    let mut call = CallSessionController::builder()
        .devices(harness.devices.clone())
        .peer_factory(Arc::new(LingeringFactory(connection.clone())))
        .view(harness.view.clone())
        .notifier(harness.notifier.clone())
        .build()
        .unwrap();
    assert_ok!(call.start_call("dr-herriot").await);

    let transport = connection.clone();
    let delivering = thread::spawn(move || {
        (0..500)
            .map(|i| {
                let track = Arc::new(SoftwareTrack::new(TrackKind::Video, format!("remote {}", i)));
                transport.deliver(track.clone());
                track
            })
            .collect::<Vec<_>>()
    });
    call.end_call();
    let delivered = delivering.join().unwrap();

    harness.assert_ui_hidden();
    // Every track either belonged to the released stream or arrived after teardown.
    for track in delivered {
        assert_eq!(track.stop_calls(), 1, "{}", track.label());
    }
}

#[test]
fn test_builder_reports_missing_collaborators() {
    let error = CallSessionController::builder()
        .devices(Arc::new(SyntheticDevices::granted()))
        .build()
        .unwrap_err();
    assert!(matches!(
        error,
        VetCallError::MissingConfiguration { ref field } if field == "peer_factory"
    ));

    let error = CallSessionController::builder()
        .devices(Arc::new(SyntheticDevices::granted()))
        .peer_factory(Arc::new(LoopbackPeerFactory::new()))
        .build()
        .unwrap_err();
    assert!(matches!(
        error,
        VetCallError::MissingConfiguration { ref field } if field == "view"
    ));
}

#[test]
fn test_controller_without_call_drops_cleanly() {
    let harness = Harness::new();
    let call = harness.controller(DoubleStartPolicy::Reject);
    assert_eq!(call.config().double_start, DoubleStartPolicy::Reject);
    drop(call);
    assert!(harness.peers.connections().is_empty());
}
