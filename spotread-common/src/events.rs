//! Event types for the SpotRead event system
//!
//! Provides the shared event enum and the EventBus used by the reader
//! daemon to fan events out to SSE clients.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// SpotRead event types
///
/// Events are broadcast via [`EventBus`] and serialized for SSE
/// transmission with the variant name as the SSE event name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpotreadEvent {
    /// Playback state changed (Playing / Paused / Stopped)
    ///
    /// Triggers:
    /// - SSE: Update transport controls
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A book was opened into the reader
    BookOpened {
        book_id: String,
        title: String,
        chapter_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Reading moved to a different chapter
    ChapterChanged {
        chapter_index: usize,
        title: String,
        paragraph_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A paragraph began playing
    ///
    /// Triggers:
    /// - SSE: Scroll the paragraph into view, reset word highlight
    ParagraphStarted {
        chapter_index: usize,
        paragraph_index: usize,
        token_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A paragraph finished playing
    ParagraphCompleted {
        chapter_index: usize,
        paragraph_index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The spotlight moved to a word
    ///
    /// Emitted once per token while playing; `duration_ms` is how long the
    /// word will stay highlighted.
    WordHighlighted {
        chapter_index: usize,
        paragraph_index: usize,
        token_index: usize,
        token: String,
        duration_ms: u64,
        sentence_end: bool,
        paragraph_end: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Position changed by an explicit seek or paragraph/chapter step
    PositionChanged {
        chapter_index: usize,
        paragraph_index: usize,
        token_index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Tempo parameters changed
    TempoChanged {
        wpm: u32,
        speed_factor: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The final paragraph of the final chapter completed
    BookCompleted {
        book_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SpotreadEvent {
    /// SSE event name for this event
    pub fn name(&self) -> &'static str {
        match self {
            SpotreadEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            SpotreadEvent::BookOpened { .. } => "BookOpened",
            SpotreadEvent::ChapterChanged { .. } => "ChapterChanged",
            SpotreadEvent::ParagraphStarted { .. } => "ParagraphStarted",
            SpotreadEvent::ParagraphCompleted { .. } => "ParagraphCompleted",
            SpotreadEvent::WordHighlighted { .. } => "WordHighlighted",
            SpotreadEvent::PositionChanged { .. } => "PositionChanged",
            SpotreadEvent::TempoChanged { .. } => "TempoChanged",
            SpotreadEvent::BookCompleted { .. } => "BookCompleted",
        }
    }
}

/// Event broadcaster shared across the daemon
///
/// Wraps a tokio broadcast channel; publishing with no subscribers is not
/// an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SpotreadEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event to all subscribers
    pub fn publish(&self, event: SpotreadEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<SpotreadEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
