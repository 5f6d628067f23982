//! # SpotRead Reader Daemon Library (spotread-rd)
//!
//! Spotlight playback engine behind an HTTP/SSE control interface.
//!
//! **Purpose:** Open imported books, walk them word by word at the rhythm
//! cadence, and expose playback control plus a word-highlight event stream.

pub mod api;
pub mod error;
pub mod spotlight;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
