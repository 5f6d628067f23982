//! Shared reading state
//!
//! Thread-safe state for coordination between the spotlight engine and the
//! HTTP handlers. The engine task is the only writer; handlers read.

use spotread_common::events::{EventBus, PlaybackState, SpotreadEvent};
use tokio::sync::RwLock;

/// Position within the open book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub chapter_index: usize,
    pub paragraph_index: usize,
    pub token_index: usize,
}

/// Info about the currently open book
#[derive(Debug, Clone)]
pub struct CurrentBook {
    pub book_id: String,
    pub title: String,
    pub chapter_count: usize,
}

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes.
pub struct SharedState {
    /// Current playback state
    playback_state: RwLock<PlaybackState>,

    /// Currently open book (None until a book is opened)
    current_book: RwLock<Option<CurrentBook>>,

    /// Current reading position
    position: RwLock<Position>,

    /// Event broadcaster for SSE events
    pub events: EventBus,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        Self {
            playback_state: RwLock::new(PlaybackState::Stopped),
            current_book: RwLock::new(None),
            position: RwLock::new(Position::default()),
            events: EventBus::default(),
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: SpotreadEvent) {
        self.events.publish(event);
    }

    /// Get current playback state
    pub async fn get_playback_state(&self) -> PlaybackState {
        *self.playback_state.read().await
    }

    /// Set playback state
    pub async fn set_playback_state(&self, state: PlaybackState) {
        *self.playback_state.write().await = state;
    }

    /// Get the currently open book info
    pub async fn get_current_book(&self) -> Option<CurrentBook> {
        self.current_book.read().await.clone()
    }

    /// Set the currently open book info
    pub async fn set_current_book(&self, book: Option<CurrentBook>) {
        *self.current_book.write().await = book;
    }

    /// Get current reading position
    pub async fn get_position(&self) -> Position {
        *self.position.read().await
    }

    /// Set current reading position
    pub async fn set_position(&self, position: Position) {
        *self.position.write().await = position;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
