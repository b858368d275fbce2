//! Track and stream abstractions
//!
//! A [`MediaTrack`] is a releasable handle on a capture device or on media
//! received from a peer. Capture hardware stays claimed until every track is
//! explicitly stopped, so dropping a stream does not release it.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl TrackKind {
    /// Media type name as used in session descriptions
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single media track
pub trait MediaTrack: Send + Sync + fmt::Debug {
    /// Track ID
    fn id(&self) -> &str;

    /// Track kind
    fn kind(&self) -> TrackKind;

    /// Stop the track and release the underlying source
    fn stop(&self);

    /// Whether the track is still producing media
    fn is_live(&self) -> bool;
}

/// Track backed by an in-process source
///
/// Counts `stop()` calls so owners can verify release discipline.
#[derive(Debug)]
pub struct SoftwareTrack {
    id: String,
    kind: TrackKind,
    label: String,
    stop_calls: AtomicUsize,
}

impl SoftwareTrack {
    /// Create new track with a random id
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            stop_calls: AtomicUsize::new(0),
        }
    }

    /// Device label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of times `stop()` has been called
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl MediaTrack for SoftwareTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        let previous = self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            debug!("⏹️ Stopped {} track {} ({})", self.kind, self.id, self.label);
        }
    }

    fn is_live(&self) -> bool {
        self.stop_calls.load(Ordering::SeqCst) == 0
    }
}

/// An ordered group of tracks sharing one id
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Arc<Mutex<Vec<Arc<dyn MediaTrack>>>>,
}

impl MediaStream {
    /// Create a stream with a random id
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), tracks)
    }

    /// Create a stream with an explicit id
    pub fn with_id(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks: Arc::new(Mutex::new(tracks)),
        }
    }

    /// Stream ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the stream's tracks
    pub fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks.lock().clone()
    }

    /// Tracks of one kind
    pub fn tracks_of(&self, kind: TrackKind) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks
            .lock()
            .iter()
            .filter(|track| track.kind() == kind)
            .cloned()
            .collect()
    }

    /// Append a track if no track with the same id is present
    pub fn add_track(&self, track: Arc<dyn MediaTrack>) {
        let mut tracks = self.tracks.lock();
        if !tracks.iter().any(|existing| existing.id() == track.id()) {
            tracks.push(track);
        }
    }

    /// Stop every track in the stream
    pub fn stop_all(&self) {
        let tracks = self.tracks();
        debug!("Stopping {} tracks of stream {}", tracks.len(), self.id);
        for track in tracks {
            track.stop();
        }
    }

    /// Whether any track is still live
    pub fn is_active(&self) -> bool {
        self.tracks.lock().iter().any(|track| track.is_live())
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.lock().len())
            .finish()
    }
}

impl PartialEq for MediaStream {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_software_track_stop() {
        let track = SoftwareTrack::new(TrackKind::Video, "FaceTime HD");
        assert!(track.is_live());
        assert_eq!(track.stop_calls(), 0);

        track.stop();
        assert!(!track.is_live());
        assert_eq!(track.stop_calls(), 1);
    }

    #[test]
    fn test_stream_stop_all() {
        let audio = Arc::new(SoftwareTrack::new(TrackKind::Audio, "mic"));
        let video = Arc::new(SoftwareTrack::new(TrackKind::Video, "cam"));
        let stream = MediaStream::new(vec![
            audio.clone() as Arc<dyn MediaTrack>,
            video.clone() as Arc<dyn MediaTrack>,
        ]);

        assert!(stream.is_active());
        assert_eq!(stream.tracks_of(TrackKind::Audio).len(), 1);

        stream.stop_all();
        assert!(!stream.is_active());
        assert_eq!(audio.stop_calls(), 1);
        assert_eq!(video.stop_calls(), 1);
    }

    #[test]
    fn test_add_track_deduplicates() {
        let track: Arc<dyn MediaTrack> = Arc::new(SoftwareTrack::new(TrackKind::Video, "remote"));
        let stream = MediaStream::with_id("remote-stream", vec![]);
        stream.add_track(track.clone());
        stream.add_track(track);
        assert_eq!(stream.tracks().len(), 1);
        assert_eq!(stream.id(), "remote-stream");
    }
}
