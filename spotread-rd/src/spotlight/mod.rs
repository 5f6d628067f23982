//! Spotlight playback
//!
//! The engine walks an open book word by word, pacing each token from the
//! rhythm model and broadcasting highlight events.

pub mod engine;
pub mod timeline;

pub use engine::SpotlightEngine;
pub use timeline::ParagraphTimeline;
