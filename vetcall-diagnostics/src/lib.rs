//! # VetCall Diagnostics
//!
//! Structured logging for the VetCall client. All crates log through
//! `tracing`; this crate installs the subscriber.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;

// Re-export main types
pub use debug_logger::{DebugLogger, DEFAULT_FILTER};
