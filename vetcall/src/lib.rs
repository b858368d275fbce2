//! # VetCall - client glue for a veterinary portal
//!
//! VetCall wires the portal's forms (registration, login, symptom reports)
//! to the backend HTTP API and manages the lifecycle of an outgoing video
//! call: acquire local media, build a peer connection, generate and apply a
//! local offer, and release everything when the call ends.
//!
//! The call never completes signaling; see [`call`] for how undelivered
//! offers and candidates are surfaced.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vetcall::{HeadlessCallView, LoopbackPeerFactory, SyntheticDevices, VetCall};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vetcall = VetCall::init()?;
//!
//!     let mut call = vetcall
//!         .call()
//!         .devices(Arc::new(SyntheticDevices::granted()))
//!         .peer_factory(Arc::new(LoopbackPeerFactory::new()))
//!         .view(Arc::new(HeadlessCallView::new()))
//!         .build()?;
//!
//!     let mut events = call.events();
//!     call.start_call("dr-herriot").await?;
//!     while let Ok(Some(event)) = events.try_next() {
//!         println!("Call event: {:?}", event);
//!     }
//!     call.end_call();
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export component types for easy access
pub use vetcall_core::{
    ApiResponse, ApiRoutes, BackendClient, ClientConfig, ErrorKind, Hospital, ImageAttachment,
    LoginForm, Medicine, OtpResponse, RegistrationForm, ReportForm, SetupStage, VetCallError,
};
pub use vetcall_media::{
    CallView, CapturePermission, HeadlessCallView, MediaConstraints, MediaDevices, MediaError,
    MediaStream, MediaTrack, SoftwareTrack, SyntheticDevices, TrackKind, UiRegion,
};
pub use vetcall_signaling::{
    IceCandidate, LoopbackFailures, LoopbackPeerConnection, LoopbackPeerFactory, PeerConfig,
    PeerConnection, PeerConnectionFactory, SessionDescription, SignalingChannel,
    SignalingMessage, UnimplementedSignaling,
};

#[cfg(feature = "diagnostics")]
pub use vetcall_diagnostics::DebugLogger;

// Public API modules
pub mod call;
pub mod config;
pub mod event;
pub mod notifier;
pub mod portal;

// Re-export main API types
pub use call::{CallSessionBuilder, CallSessionController, CallState};
pub use config::{CallConfig, DoubleStartPolicy, GlobalConfig, NavigationConfig};
pub use event::{CallEvent, EventStream};
pub use notifier::{Notifier, TracingNotifier};
pub use portal::{FormOutcome, Portal};

/// Main entry point for VetCall
#[derive(Debug, Clone)]
pub struct VetCall {
    inner: std::sync::Arc<VetCallInner>,
}

#[derive(Debug)]
struct VetCallInner {
    config: GlobalConfig,
    client: BackendClient,
}

impl VetCall {
    /// Initialize VetCall with default settings
    ///
    /// # Example
    /// ```rust,no_run
    /// use vetcall::VetCall;
    ///
    /// let vetcall = VetCall::init()?;
    /// # Ok::<(), vetcall::VetCallError>(())
    /// ```
    pub fn init() -> Result<Self, VetCallError> {
        Self::init_with(GlobalConfig::default())
    }

    /// Initialize with custom global configuration
    pub fn init_with(config: GlobalConfig) -> Result<Self, VetCallError> {
        #[cfg(feature = "diagnostics")]
        {
            if config.debug_logging {
                DebugLogger::init_logging()?;
            }
        }

        let client = BackendClient::new(config.client.clone())?;
        tracing::debug!("VetCall initialized against {}", config.client.base_url);

        Ok(Self {
            inner: std::sync::Arc::new(VetCallInner { config, client }),
        })
    }

    /// Global configuration
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }

    /// Backend client
    pub fn client(&self) -> &BackendClient {
        &self.inner.client
    }

    /// Form handlers reporting through `notifier`
    pub fn portal(&self, notifier: std::sync::Arc<dyn Notifier>) -> Portal {
        Portal::new(
            self.inner.client.clone(),
            notifier,
            self.inner.config.navigation.clone(),
        )
    }

    /// Start building a call controller with the configured call settings
    ///
    /// # Example
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use vetcall::{HeadlessCallView, LoopbackPeerFactory, SyntheticDevices, VetCall};
    ///
    /// # async fn example() -> Result<(), vetcall::VetCallError> {
    /// let mut call = VetCall::init()?
    ///     .call()
    ///     .devices(Arc::new(SyntheticDevices::granted()))
    ///     .peer_factory(Arc::new(LoopbackPeerFactory::new()))
    ///     .view(Arc::new(HeadlessCallView::new()))
    ///     .build()?;
    /// call.start_call("dr-herriot").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn call(&self) -> CallSessionBuilder {
        CallSessionBuilder::new(self.inner.config.call.clone())
    }
}
