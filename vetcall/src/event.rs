//! Event system for call lifecycle notifications

use futures::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;
use vetcall_core::SetupStage;
use vetcall_signaling::IceCandidate;

/// Events emitted by the call controller
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// Local capture was granted and bound to the local surface
    LocalMediaAcquired {
        /// Local stream ID
        stream_id: String,
        /// Number of captured tracks
        track_count: usize,
    },
    /// The local offer was generated and applied
    OfferCreated {
        /// Number of media sections in the offer
        media_sections: usize,
    },
    /// The offer could not be handed to the signaling channel
    OfferNotSent {
        /// Intended recipient
        peer_id: String,
        /// Why it was not sent
        reason: String,
    },
    /// A local candidate could not be handed to the signaling channel
    CandidateNotSent {
        /// Intended recipient
        peer_id: String,
        /// The undelivered candidate
        candidate: IceCandidate,
    },
    /// Local candidate gathering finished
    CandidateGatheringComplete {
        /// Intended recipient
        peer_id: String,
    },
    /// A remote track arrived and the remote surface was bound
    RemoteTrackAttached {
        /// Remote stream ID
        stream_id: String,
        /// Remote track ID
        track_id: String,
    },
    /// Call setup finished; the controller is in a call
    CallStarted {
        /// Selected remote party
        peer_id: String,
    },
    /// Call setup failed and was rolled back
    CallFailed {
        /// Selected remote party
        peer_id: String,
        /// Failing stage, if setup got that far
        stage: Option<SetupStage>,
        /// Failure description
        error: String,
    },
    /// The call was torn down
    CallEnded {
        /// Remote party of the ended call
        peer_id: String,
    },
}

impl CallEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            CallEvent::LocalMediaAcquired { .. } => "local_media_acquired",
            CallEvent::OfferCreated { .. } => "offer_created",
            CallEvent::OfferNotSent { .. } => "offer_not_sent",
            CallEvent::CandidateNotSent { .. } => "candidate_not_sent",
            CallEvent::CandidateGatheringComplete { .. } => "candidate_gathering_complete",
            CallEvent::RemoteTrackAttached { .. } => "remote_track_attached",
            CallEvent::CallStarted { .. } => "call_started",
            CallEvent::CallFailed { .. } => "call_failed",
            CallEvent::CallEnded { .. } => "call_ended",
        }
    }

    /// Check if this event reports undelivered signaling
    pub fn is_signaling_gap(&self) -> bool {
        matches!(
            self,
            CallEvent::OfferNotSent { .. } | CallEvent::CandidateNotSent { .. }
        )
    }

    /// Check if this event changes the controller state
    pub fn is_lifecycle_event(&self) -> bool {
        matches!(
            self,
            CallEvent::CallStarted { .. } | CallEvent::CallFailed { .. } | CallEvent::CallEnded { .. }
        )
    }
}

/// Stream of call events for async iteration
#[derive(Debug)]
pub struct EventStream {
    /// Receiver for events
    receiver: mpsc::UnboundedReceiver<CallEvent>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: mpsc::UnboundedReceiver<CallEvent>) -> Self {
        Self { receiver }
    }

    /// Get the next event from the stream
    pub async fn next(&mut self) -> Option<CallEvent> {
        self.receiver.recv().await
    }

    /// Try to get the next event without blocking
    pub fn try_next(&mut self) -> Result<Option<CallEvent>, mpsc::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(mpsc::error::TryRecvError::Disconnected)
            }
        }
    }

    /// Drain every event currently queued
    pub fn drain(&mut self) -> Vec<CallEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Close the event stream
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl Stream for EventStream {
    type Item = CallEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Fan-out of call events to every live subscriber
#[derive(Debug, Clone, Default)]
pub(crate) struct EventEmitter {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<CallEvent>>>>,
}

impl EventEmitter {
    /// Register a new subscriber
    pub(crate) fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        EventStream::new(rx)
    }

    /// Deliver an event, dropping subscribers whose stream is gone
    pub(crate) fn emit(&self, event: CallEvent) {
        debug!("📡 Call event: {}", event.event_type());
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
