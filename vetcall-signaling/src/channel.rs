//! Signaling channel to the remote party

use crate::protocol::SignalingMessage;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;
use vetcall_core::VetCallError;

/// Transport for offers and candidates to the remote party
pub trait SignalingChannel: Send + Sync {
    /// Deliver a message to its target
    fn send(&self, message: SignalingMessage) -> Result<(), VetCallError>;
}

/// Channel for deployments without a signaling server
///
/// Every message is refused with [`VetCallError::SignalingNotImplemented`]
/// and counted, so callers can see exactly what was never delivered.
#[derive(Debug, Default)]
pub struct UnimplementedSignaling {
    refused_offers: AtomicUsize,
    refused_candidates: AtomicUsize,
}

impl UnimplementedSignaling {
    /// Create new channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers refused so far
    pub fn refused_offers(&self) -> usize {
        self.refused_offers.load(Ordering::SeqCst)
    }

    /// Candidates refused so far
    pub fn refused_candidates(&self) -> usize {
        self.refused_candidates.load(Ordering::SeqCst)
    }
}

impl SignalingChannel for UnimplementedSignaling {
    fn send(&self, message: SignalingMessage) -> Result<(), VetCallError> {
        match message {
            SignalingMessage::Offer { .. } => self.refused_offers.fetch_add(1, Ordering::SeqCst),
            SignalingMessage::Candidate { .. } => {
                self.refused_candidates.fetch_add(1, Ordering::SeqCst)
            }
        };
        warn!(
            "📭 No signaling transport: {} for {} not sent",
            message.kind(),
            message.target()
        );
        Err(VetCallError::SignalingNotImplemented {
            message_kind: message.kind().to_string(),
        })
    }
}
