//! Error types for the VetCall client

use std::fmt;
use thiserror::Error;

/// Step of call setup at which a call-start attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    /// No remote party was selected
    PeerSelection,
    /// Capture permission was denied or the device failed
    MediaAcquisition,
    /// The peer connection could not be constructed
    PeerConnection,
    /// A local track could not be attached to the connection
    TrackAttachment,
    /// The local offer could not be generated
    OfferGeneration,
    /// The offer could not be applied as local description
    LocalDescription,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStage::PeerSelection => "peer selection",
            SetupStage::MediaAcquisition => "media acquisition",
            SetupStage::PeerConnection => "peer connection",
            SetupStage::TrackAttachment => "track attachment",
            SetupStage::OfferGeneration => "offer generation",
            SetupStage::LocalDescription => "local description",
        };
        f.write_str(name)
    }
}

/// Coarse classification used by callers deciding how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend call was rejected at the transport level or the network failed
    Request,
    /// Device permission or connection construction failed
    CallSetup,
    /// Anything else (misuse, configuration, local input)
    Other,
}

/// Main error type for VetCall operations
#[derive(Error, Debug)]
pub enum VetCallError {
    /// Backend request failed
    #[error("Request to {endpoint} failed: {reason}")]
    Request {
        /// Endpoint path that was called
        endpoint: String,
        /// Reason for the failure
        reason: String,
    },

    /// Call setup failed
    #[error("Call setup failed during {stage}: {reason}")]
    CallSetup {
        /// Stage that failed
        stage: SetupStage,
        /// Reason for the failure
        reason: String,
    },

    /// Invalid state error
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },

    /// Invalid data error
    #[error("Invalid data: {reason}")]
    InvalidData {
        /// Reason for invalid data
        reason: String,
    },

    /// The signaling channel cannot carry this message
    #[error("Signaling not implemented: cannot send {message_kind}")]
    SignalingNotImplemented {
        /// Kind of message that was refused
        message_kind: String,
    },

    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },
}

impl VetCallError {
    /// Shorthand for a call-setup failure at `stage`
    pub fn call_setup(stage: SetupStage, reason: impl Into<String>) -> Self {
        VetCallError::CallSetup {
            stage,
            reason: reason.into(),
        }
    }

    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            VetCallError::Request { .. } => "REQUEST_FAILED",
            VetCallError::CallSetup { .. } => "CALL_SETUP_FAILED",
            VetCallError::InvalidState { .. } => "INVALID_STATE",
            VetCallError::MissingConfiguration { .. } => "MISSING_CONFIGURATION",
            VetCallError::InvalidData { .. } => "INVALID_DATA",
            VetCallError::SignalingNotImplemented { .. } => "SIGNALING_NOT_IMPLEMENTED",
            VetCallError::Initialization { .. } => "INITIALIZATION_FAILED",
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VetCallError::Request { .. } => ErrorKind::Request,
            VetCallError::CallSetup { .. } => ErrorKind::CallSetup,
            _ => ErrorKind::Other,
        }
    }

    /// Stage at which call setup failed, if this is a call-setup failure
    pub fn setup_stage(&self) -> Option<SetupStage> {
        match self {
            VetCallError::CallSetup { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
