//! Media error types and handling
//!
//! Errors raised while acquiring capture devices or managing streams.

use thiserror::Error;

/// Main error type for media operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// The user or the platform refused capture permission
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// No device can serve the request
    #[error("Device not found: {device_id}")]
    DeviceNotFound {
        /// Device identifier
        device_id: String,
    },

    /// Constraints that no device can satisfy
    #[error("Invalid constraints: {message}")]
    InvalidConstraints {
        /// Error message
        message: String,
    },

    /// Resource not available (device busy, hardware error)
    #[error("Resource not available: {resource}")]
    ResourceNotAvailable {
        /// Resource name
        resource: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if retrying the operation could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::ResourceNotAvailable { .. } => true,
            MediaError::PermissionDenied { .. } => false,
            MediaError::DeviceNotFound { .. } => false,
            MediaError::InvalidConstraints { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::PermissionDenied { .. } => ErrorCategory::Permission,
            MediaError::DeviceNotFound { .. } => ErrorCategory::Device,
            MediaError::ResourceNotAvailable { .. } => ErrorCategory::Device,
            MediaError::InvalidConstraints { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Capture permission errors
    Permission,
    /// Device and hardware errors
    Device,
    /// Configuration and parameter errors
    Configuration,
}
