//! # VetCall Core
//!
//! Error types and the backend HTTP client shared by the VetCall crates.
//! The client wires registration, login and symptom-report forms to the
//! portal backend and decodes its `{success, message}` responses.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod error;
pub mod forms;

// Re-export main types
pub use api::{ApiRoutes, BackendClient, ClientConfig};
pub use error::{ErrorKind, SetupStage, VetCallError};
pub use forms::{
    ApiResponse, ChatReply, Hospital, ImageAttachment, LoginForm, Medicine, OtpResponse,
    RegistrationForm, Report, ReportForm, VideoCallToken, VideoCallTokenRequest,
};
