//! Display surfaces for a call
//!
//! The call UI consists of two video surfaces (local preview and remote
//! video) and a few regions whose visibility is toggled as a call starts and
//! ends. These are pure output sinks: nothing is read back from them.

use crate::tracks::MediaStream;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Visibility-toggled regions of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiRegion {
    /// Instructions shown once local media is live
    CallInstructions,
    /// Container holding both video surfaces
    CallContainer,
    /// Portal forms
    Forms,
}

impl UiRegion {
    /// Every region
    pub const ALL: [UiRegion; 3] = [
        UiRegion::CallInstructions,
        UiRegion::CallContainer,
        UiRegion::Forms,
    ];
}

/// Output sink for call media and call UI state
pub trait CallView: Send + Sync {
    /// Bind the local preview to a stream, or clear it
    fn attach_local(&self, stream: Option<&MediaStream>);

    /// Bind the remote video to a stream, or clear it
    fn attach_remote(&self, stream: Option<&MediaStream>);

    /// Show or hide a region
    fn set_region_visible(&self, region: UiRegion, visible: bool);
}

#[derive(Debug, Default)]
struct ViewState {
    local: Option<MediaStream>,
    remote: Option<MediaStream>,
    visible: HashMap<UiRegion, bool>,
    updates: usize,
}

/// View that keeps surface state in memory
///
/// Used when running without a display and to observe the UI in tests.
/// Regions start hidden.
#[derive(Debug, Default)]
pub struct HeadlessCallView {
    state: Mutex<ViewState>,
}

impl HeadlessCallView {
    /// Create new headless view with everything hidden and unbound
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream bound to the local surface
    pub fn local_stream(&self) -> Option<MediaStream> {
        self.state.lock().local.clone()
    }

    /// Stream bound to the remote surface
    pub fn remote_stream(&self) -> Option<MediaStream> {
        self.state.lock().remote.clone()
    }

    /// Whether a region is currently visible
    pub fn is_visible(&self, region: UiRegion) -> bool {
        self.state
            .lock()
            .visible
            .get(&region)
            .copied()
            .unwrap_or(false)
    }

    /// Number of surface or visibility updates received
    pub fn updates(&self) -> usize {
        self.state.lock().updates
    }
}

impl CallView for HeadlessCallView {
    fn attach_local(&self, stream: Option<&MediaStream>) {
        let mut state = self.state.lock();
        state.local = stream.cloned();
        state.updates += 1;
        debug!("Local surface bound to {:?}", stream.map(|s| s.id()));
    }

    fn attach_remote(&self, stream: Option<&MediaStream>) {
        let mut state = self.state.lock();
        state.remote = stream.cloned();
        state.updates += 1;
        debug!("Remote surface bound to {:?}", stream.map(|s| s.id()));
    }

    fn set_region_visible(&self, region: UiRegion, visible: bool) {
        let mut state = self.state.lock();
        state.visible.insert(region, visible);
        state.updates += 1;
    }
}
