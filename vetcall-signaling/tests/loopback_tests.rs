//! Loopback peer connection tests
//!
//! Exercise the transport seam the call controller relies on: track
//! attachment, offer generation, hook delivery and close semantics.

use parking_lot::Mutex;
use std::sync::Arc;
use vetcall_core::VetCallError;
use vetcall_media::{CapturePermission, MediaConstraints, MediaDevices, SyntheticDevices, TrackKind};
use vetcall_signaling::*;

async fn local_stream() -> vetcall_media::MediaStream {
    SyntheticDevices::new(CapturePermission::Granted)
        .get_user_media(MediaConstraints::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_offer_describes_attached_tracks() {
    let factory = LoopbackPeerFactory::new();
    let connection = factory.create(&PeerConfig::default()).unwrap();
    let stream = local_stream().await;

    for track in stream.tracks() {
        connection.add_track(track, &stream).unwrap();
    }

    let offer = connection.create_offer().await.unwrap();
    assert_eq!(offer.sdp_type, SdpType::Offer);
    assert_eq!(offer.media_sections(), 2);
    assert!(offer.sdp.starts_with("v=0\r\n"));
    assert!(offer.sdp.contains("m=audio 9 UDP/TLS/RTP/SAVPF 111"));
    assert!(offer.sdp.contains("m=video 9 UDP/TLS/RTP/SAVPF 96"));
    assert!(offer.sdp.contains(&format!("a=msid:{}", stream.id())));
    assert!(offer.sdp.contains("a=group:BUNDLE 0 1"));

    assert!(connection.local_description().is_none());
    connection.set_local_description(offer.clone()).await.unwrap();
    assert_eq!(connection.local_description(), Some(offer));

    let loopback = factory.last().unwrap();
    assert_eq!(loopback.track_count(), 2);
    assert_eq!(loopback.offers_created(), 1);
}

#[tokio::test]
async fn test_hooks_receive_candidates_and_tracks() {
    let factory = LoopbackPeerFactory::new();
    let connection = factory.create(&PeerConfig::default()).unwrap();
    let stream = local_stream().await;
    for track in stream.tracks() {
        connection.add_track(track, &stream).unwrap();
    }

    let candidates: Arc<Mutex<Vec<Option<IceCandidate>>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = candidates.clone();
    connection.on_ice_candidate(Arc::new(move |candidate: Option<IceCandidate>| seen.lock().push(candidate)));

    let arrived: Arc<Mutex<Vec<TrackEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = arrived.clone();
    connection.on_track(Arc::new(move |event: TrackEvent| sink.lock().push(event)));

    let loopback = factory.last().unwrap();
    assert_eq!(loopback.has_hooks(), (true, true));
    assert_eq!(loopback.gather_host_candidates(), 2);

    let candidates = candidates.lock();
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].as_ref().unwrap().sdp_m_line_index, Some(0));
    assert_eq!(candidates[1].as_ref().unwrap().sdp_mid.as_deref(), Some("1"));
    assert!(candidates[2].is_none());

    let remote = loopback.deliver_remote_track(TrackKind::Video, "remote-stream");
    let arrived = arrived.lock();
    assert_eq!(arrived.len(), 1);
    assert_eq!(arrived[0].track.id(), vetcall_media::MediaTrack::id(remote.as_ref()));
    assert_eq!(arrived[0].streams[0].id(), "remote-stream");
}

#[tokio::test]
async fn test_close_is_idempotent_and_final() {
    let factory = LoopbackPeerFactory::new();
    let connection = factory.create(&PeerConfig::default()).unwrap();
    let stream = local_stream().await;

    connection.on_ice_candidate(Arc::new(|_: Option<IceCandidate>| panic!("closed connections emit nothing")));
    connection.close();
    connection.close();

    let loopback = factory.last().unwrap();
    assert!(connection.is_closed());
    assert_eq!(loopback.close_calls(), 2);
    assert!(!loopback.emit_candidate(None));
    assert_eq!(loopback.has_hooks(), (false, false));

    let track = stream.tracks().remove(0);
    assert!(matches!(
        connection.add_track(track, &stream),
        Err(VetCallError::InvalidState { .. })
    ));
    assert!(connection.create_offer().await.is_err());
}

#[test]
fn test_failure_injection() {
    let factory = LoopbackPeerFactory::with_failures(LoopbackFailures {
        create: true,
        ..LoopbackFailures::default()
    });
    assert!(factory.create(&PeerConfig::default()).is_err());
    assert!(factory.connections().is_empty());

    factory.set_failures(LoopbackFailures {
        create_offer: true,
        ..LoopbackFailures::default()
    });
    let connection = factory.create(&PeerConfig::default()).unwrap();
    let result = tokio_test::block_on(connection.create_offer());
    assert!(result.is_err());
    assert_eq!(factory.connections().len(), 1);
}

#[test]
fn test_answer_cannot_be_local_description() {
    let factory = LoopbackPeerFactory::new();
    let connection = factory.create(&PeerConfig::default()).unwrap();
    let answer = SessionDescription {
        sdp_type: SdpType::Answer,
        sdp: "v=0\r\n".to_string(),
    };
    let result = tokio_test::block_on(connection.set_local_description(answer));
    tokio_test::assert_err!(result);
}
