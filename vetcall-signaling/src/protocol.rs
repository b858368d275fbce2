//! Negotiation documents and signaling messages

use serde::{Deserialize, Serialize};

/// Role of a session description in offer/answer negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// Initial offer
    Offer,
    /// Answer to an offer
    Answer,
}

/// Immutable session description (SDP document plus its role)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Offer or answer
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    /// SDP text
    pub sdp: String,
}

impl SessionDescription {
    /// Create an offer description
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Number of media sections (`m=` lines) in the document
    pub fn media_sections(&self) -> usize {
        self.sdp.lines().filter(|line| line.starts_with("m=")).count()
    }
}

/// Network path descriptor discovered by the local transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// `candidate:` attribute value
    pub candidate: String,
    /// Media stream identification tag the candidate belongs to
    pub sdp_mid: Option<String>,
    /// Index of the media section the candidate belongs to
    pub sdp_m_line_index: Option<u16>,
}

/// Messages a signaling transport would carry to the remote party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalingMessage {
    /// Local offer for the selected party
    Offer {
        /// Remote party identifier
        target: String,
        /// Offer to deliver
        description: SessionDescription,
    },
    /// Local candidate for the selected party
    Candidate {
        /// Remote party identifier
        target: String,
        /// Candidate to deliver
        candidate: IceCandidate,
    },
}

impl SignalingMessage {
    /// Short name of the message kind
    pub fn kind(&self) -> &'static str {
        match self {
            SignalingMessage::Offer { .. } => "offer",
            SignalingMessage::Candidate { .. } => "ice candidate",
        }
    }

    /// Remote party the message is addressed to
    pub fn target(&self) -> &str {
        match self {
            SignalingMessage::Offer { target, .. } | SignalingMessage::Candidate { target, .. } => {
                target
            }
        }
    }
}
