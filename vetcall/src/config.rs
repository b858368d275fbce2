//! Configuration types and defaults

use serde::{Deserialize, Serialize};
use vetcall_core::ClientConfig;
use vetcall_media::MediaConstraints;
use vetcall_signaling::{IceServer, PeerConfig};

/// Global VetCall configuration
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    /// Install the tracing subscriber on init
    pub debug_logging: bool,
    /// Backend client settings
    pub client: ClientConfig,
    /// Pages to navigate to after successful form submissions
    pub navigation: NavigationConfig,
    /// Call settings
    pub call: CallConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            client: ClientConfig::default(),
            navigation: NavigationConfig::default(),
            call: CallConfig::default(),
        }
    }
}

/// Navigation targets after successful submissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Page shown after registering
    pub after_registration: String,
    /// Page shown after logging in
    pub after_login: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            after_registration: "login.html".to_string(),
            after_login: "profile.html".to_string(),
        }
    }
}

/// What `start_call` does when a call is already active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleStartPolicy {
    /// Refuse the second attempt without acquiring anything
    Reject,
    /// Acquire a second resource set, leaving the first one held but unreleased
    Overlap,
}

/// Call-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallConfig {
    /// Capture a microphone track
    pub audio: bool,
    /// Capture a camera track
    pub video: bool,
    /// STUN/TURN server URLs
    pub ice_servers: Vec<String>,
    /// Behavior of `start_call` while a call is active
    pub double_start: DoubleStartPolicy,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            ice_servers: Vec::new(),
            double_start: DoubleStartPolicy::Reject,
        }
    }
}

impl CallConfig {
    /// Capture constraints for this configuration
    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            audio: self.audio,
            video: self.video,
        }
    }

    /// Peer connection configuration
    pub fn peer_config(&self) -> PeerConfig {
        PeerConfig {
            ice_servers: if self.ice_servers.is_empty() {
                Vec::new()
            } else {
                vec![IceServer {
                    urls: self.ice_servers.clone(),
                }]
            },
        }
    }
}
