//! Spotlight engine
//!
//! The playback state machine. A single task owns the open book and the
//! reading position; control methods send commands over a channel and the
//! task interleaves them with the word-cadence sleeps, so a command never
//! waits for the current word to finish.
//!
//! States: `Stopped` (no book, or playback ran off the end of the book),
//! `Paused` (position held), `Playing` (words advance on the rhythm
//! cadence). Completing the final paragraph returns to `Stopped` with the
//! position rewound to the start, so a later play re-reads the book.

use crate::error::{Error, Result};
use crate::spotlight::timeline::ParagraphTimeline;
use crate::state::{CurrentBook, Position, SharedState};
use spotread_common::events::{PlaybackState, SpotreadEvent};
use spotread_common::model::Book;
use spotread_common::params::PlaybackParams;
use spotread_common::time;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Command channel depth; commands are tiny and handled promptly
const COMMAND_BUFFER: usize = 32;

/// Engine commands with reply channels
enum Command {
    Open {
        book: Box<Book>,
        reply: oneshot::Sender<Result<()>>,
    },
    Play {
        reply: oneshot::Sender<Result<()>>,
    },
    Pause {
        reply: oneshot::Sender<Result<()>>,
    },
    NextParagraph {
        reply: oneshot::Sender<Result<()>>,
    },
    PreviousParagraph {
        reply: oneshot::Sender<Result<()>>,
    },
    NextChapter {
        reply: oneshot::Sender<Result<()>>,
    },
    PreviousChapter {
        reply: oneshot::Sender<Result<()>>,
    },
    Seek {
        chapter_index: usize,
        paragraph_index: usize,
        reply: oneshot::Sender<Result<()>>,
    },
    SetTempo {
        wpm: Option<u32>,
        speed_factor: Option<f64>,
        reply: oneshot::Sender<Result<(u32, f64)>>,
    },
}

/// Outcome of an interruptible sleep
enum SleepOutcome {
    /// The full duration elapsed
    Elapsed,
    /// A command invalidated the current schedule
    Interrupted,
    /// The command channel closed
    Shutdown,
}

/// Handle to the spotlight engine task
pub struct SpotlightEngine {
    cmd_tx: mpsc::Sender<Command>,
}

impl SpotlightEngine {
    /// Spawn the engine task
    pub fn start(state: Arc<SharedState>, params: Arc<PlaybackParams>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let task = EngineTask {
            state,
            params,
            cmd_rx,
            book: None,
            position: Position::default(),
            timeline: ParagraphTimeline::empty(),
            playing: false,
            resume_pending: false,
            lead_in_pending: false,
        };
        tokio::spawn(task.run());
        Self { cmd_tx }
    }

    async fn command(&self, make: impl FnOnce(oneshot::Sender<Result<()>>) -> Command) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| Error::Internal("engine task stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::Internal("engine task dropped reply".to_string()))?
    }

    /// Open a book and hold at its first paragraph, paused
    pub async fn open(&self, book: Book) -> Result<()> {
        self.command(|reply| Command::Open {
            book: Box::new(book),
            reply,
        })
        .await
    }

    /// Start or resume playback
    pub async fn play(&self) -> Result<()> {
        self.command(|reply| Command::Play { reply }).await
    }

    /// Pause playback, holding the current position
    pub async fn pause(&self) -> Result<()> {
        self.command(|reply| Command::Pause { reply }).await
    }

    /// Step to the next paragraph (crosses chapter boundaries, clamps at
    /// the end of the book)
    pub async fn next_paragraph(&self) -> Result<()> {
        self.command(|reply| Command::NextParagraph { reply }).await
    }

    /// Step to the previous paragraph
    pub async fn previous_paragraph(&self) -> Result<()> {
        self.command(|reply| Command::PreviousParagraph { reply }).await
    }

    /// Jump to the start of the next chapter
    pub async fn next_chapter(&self) -> Result<()> {
        self.command(|reply| Command::NextChapter { reply }).await
    }

    /// Jump to the start of the previous chapter
    pub async fn previous_chapter(&self) -> Result<()> {
        self.command(|reply| Command::PreviousChapter { reply }).await
    }

    /// Seek to an explicit (chapter, paragraph) position
    pub async fn seek(&self, chapter_index: usize, paragraph_index: usize) -> Result<()> {
        self.command(|reply| Command::Seek {
            chapter_index,
            paragraph_index,
            reply,
        })
        .await
    }

    /// Update tempo parameters; returns the effective (clamped) values
    pub async fn set_tempo(&self, wpm: Option<u32>, speed_factor: Option<f64>) -> Result<(u32, f64)> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetTempo {
                wpm,
                speed_factor,
                reply: tx,
            })
            .await
            .map_err(|_| Error::Internal("engine task stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::Internal("engine task dropped reply".to_string()))?
    }
}

/// The engine task: sole owner of book, position, and timeline
struct EngineTask {
    state: Arc<SharedState>,
    params: Arc<PlaybackParams>,
    cmd_rx: mpsc::Receiver<Command>,
    book: Option<Arc<Book>>,
    position: Position,
    timeline: ParagraphTimeline,
    playing: bool,
    resume_pending: bool,
    lead_in_pending: bool,
}

impl EngineTask {
    async fn run(mut self) {
        info!("Spotlight engine started");
        loop {
            if !self.playing || self.book.is_none() {
                match self.cmd_rx.recv().await {
                    Some(cmd) => {
                        self.handle(cmd).await;
                    }
                    None => break,
                }
                continue;
            }

            // Breath before the first word of a paragraph
            if self.lead_in_pending {
                self.lead_in_pending = false;
                match self.sleep_or_command(self.timeline.lead_in_ms).await {
                    SleepOutcome::Elapsed => {}
                    SleepOutcome::Interrupted => continue,
                    SleepOutcome::Shutdown => break,
                }
            }

            let resume = self.resume_pending;
            let Some(duration) = self.timeline.token_duration_ms(self.position.token_index, resume)
            else {
                // Timeline exhausted (or empty): fall through to paragraph
                // completion handling
                self.advance().await;
                continue;
            };
            self.resume_pending = false;
            self.emit_word(duration).await;

            match self.sleep_or_command(duration).await {
                SleepOutcome::Elapsed => self.advance().await,
                SleepOutcome::Interrupted => {}
                SleepOutcome::Shutdown => break,
            }
        }
        info!("Spotlight engine stopped");
    }

    /// Sleep for `ms`, servicing commands as they arrive
    async fn sleep_or_command(&mut self, ms: u64) -> SleepOutcome {
        let sleep = tokio::time::sleep(Duration::from_millis(ms));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return SleepOutcome::Elapsed,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle(cmd).await {
                            return SleepOutcome::Interrupted;
                        }
                    }
                    None => return SleepOutcome::Shutdown,
                },
            }
        }
    }

    /// Handle one command; returns true when the current token schedule is
    /// no longer valid
    async fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Open { book, reply } => {
                let result = self.do_open(*book).await;
                let interrupted = result.is_ok();
                let _ = reply.send(result);
                interrupted
            }
            Command::Play { reply } => {
                let (result, interrupted) = self.do_play().await;
                let _ = reply.send(result);
                interrupted
            }
            Command::Pause { reply } => {
                let (result, interrupted) = self.do_pause().await;
                let _ = reply.send(result);
                interrupted
            }
            Command::NextParagraph { reply } => {
                let (result, interrupted) = self.do_step(Step::NextParagraph).await;
                let _ = reply.send(result);
                interrupted
            }
            Command::PreviousParagraph { reply } => {
                let (result, interrupted) = self.do_step(Step::PreviousParagraph).await;
                let _ = reply.send(result);
                interrupted
            }
            Command::NextChapter { reply } => {
                let (result, interrupted) = self.do_step(Step::NextChapter).await;
                let _ = reply.send(result);
                interrupted
            }
            Command::PreviousChapter { reply } => {
                let (result, interrupted) = self.do_step(Step::PreviousChapter).await;
                let _ = reply.send(result);
                interrupted
            }
            Command::Seek {
                chapter_index,
                paragraph_index,
                reply,
            } => {
                let (result, interrupted) = self.do_seek(chapter_index, paragraph_index).await;
                let _ = reply.send(result);
                interrupted
            }
            Command::SetTempo {
                wpm,
                speed_factor,
                reply,
            } => {
                let result = self.do_set_tempo(wpm, speed_factor).await;
                let _ = reply.send(result);
                false
            }
        }
    }

    async fn do_open(&mut self, book: Book) -> Result<()> {
        if book.chapters.is_empty() {
            return Err(Error::BadRequest("book has no chapters".to_string()));
        }
        if book.chapters.iter().any(|c| c.paragraphs.is_empty()) {
            return Err(Error::BadRequest(
                "book has a chapter with no paragraphs".to_string(),
            ));
        }
        let book = Arc::new(book);
        info!(book_id = %book.id, title = %book.title, "opening book");

        self.state
            .set_current_book(Some(CurrentBook {
                book_id: book.id.clone(),
                title: book.title.clone(),
                chapter_count: book.chapters.len(),
            }))
            .await;
        self.state.set_playback_state(PlaybackState::Paused).await;
        self.state.broadcast_event(SpotreadEvent::BookOpened {
            book_id: book.id.clone(),
            title: book.title.clone(),
            chapter_count: book.chapters.len(),
            timestamp: time::now(),
        });

        self.book = Some(book);
        self.position = Position::default();
        self.playing = false;
        self.resume_pending = false;
        self.enter_paragraph(true).await;
        Ok(())
    }

    async fn do_play(&mut self) -> (Result<()>, bool) {
        if self.book.is_none() {
            return (Err(Error::InvalidState("no book open".to_string())), false);
        }
        if self.playing {
            return (Ok(()), false);
        }
        let old_state = self.state.get_playback_state().await;
        if old_state == PlaybackState::Stopped {
            // Playback ran off the end earlier: restart from the top
            self.position = Position::default();
            self.enter_paragraph(true).await;
        }
        self.playing = true;
        self.resume_pending = old_state == PlaybackState::Paused;
        self.state.set_playback_state(PlaybackState::Playing).await;
        self.state.broadcast_event(SpotreadEvent::PlaybackStateChanged {
            old_state,
            new_state: PlaybackState::Playing,
            timestamp: time::now(),
        });
        info!("Playback state changed: {} -> playing", old_state);
        (Ok(()), true)
    }

    async fn do_pause(&mut self) -> (Result<()>, bool) {
        if self.book.is_none() {
            return (Err(Error::InvalidState("no book open".to_string())), false);
        }
        if !self.playing {
            return (Ok(()), false);
        }
        self.playing = false;
        self.state.set_playback_state(PlaybackState::Paused).await;
        self.state.broadcast_event(SpotreadEvent::PlaybackStateChanged {
            old_state: PlaybackState::Playing,
            new_state: PlaybackState::Paused,
            timestamp: time::now(),
        });
        info!("Playback state changed: playing -> paused");
        (Ok(()), true)
    }

    async fn do_step(&mut self, step: Step) -> (Result<()>, bool) {
        let Some(book) = self.book.clone() else {
            return (Err(Error::InvalidState("no book open".to_string())), false);
        };
        let Position {
            chapter_index: c,
            paragraph_index: p,
            ..
        } = self.position;

        let target = match step {
            Step::NextParagraph => {
                if p + 1 < book.chapters[c].paragraphs.len() {
                    Some((c, p + 1))
                } else if c + 1 < book.chapters.len() {
                    Some((c + 1, 0))
                } else {
                    None
                }
            }
            Step::PreviousParagraph => {
                if p > 0 {
                    Some((c, p - 1))
                } else if c > 0 {
                    Some((c - 1, book.chapters[c - 1].paragraphs.len() - 1))
                } else {
                    None
                }
            }
            Step::NextChapter => {
                if c + 1 < book.chapters.len() {
                    Some((c + 1, 0))
                } else {
                    None
                }
            }
            Step::PreviousChapter => {
                if c > 0 {
                    Some((c - 1, 0))
                } else {
                    None
                }
            }
        };

        match target {
            None => (Ok(()), false), // clamped at a book boundary
            Some((chapter, paragraph)) => {
                self.move_to(chapter, paragraph).await;
                (Ok(()), true)
            }
        }
    }

    async fn do_seek(&mut self, chapter_index: usize, paragraph_index: usize) -> (Result<()>, bool) {
        let Some(book) = self.book.clone() else {
            return (Err(Error::InvalidState("no book open".to_string())), false);
        };
        let Some(chapter) = book.chapters.get(chapter_index) else {
            return (
                Err(Error::BadRequest(format!(
                    "chapter {} out of range ({} chapters)",
                    chapter_index,
                    book.chapters.len()
                ))),
                false,
            );
        };
        if paragraph_index >= chapter.paragraphs.len() {
            return (
                Err(Error::BadRequest(format!(
                    "paragraph {} out of range ({} paragraphs)",
                    paragraph_index,
                    chapter.paragraphs.len()
                ))),
                false,
            );
        }
        self.move_to(chapter_index, paragraph_index).await;
        (Ok(()), true)
    }

    async fn do_set_tempo(&mut self, wpm: Option<u32>, speed_factor: Option<f64>) -> Result<(u32, f64)> {
        let effective_wpm = match wpm {
            Some(value) => self.params.set_wpm(value),
            None => self.params.wpm(),
        };
        let effective_speed = match speed_factor {
            Some(value) => self.params.set_speed_factor(value),
            None => self.params.speed_factor(),
        };

        // Recompile the current paragraph so the change lands on the next
        // token, not the next paragraph. Token count is unchanged (same
        // text), so the position stays valid.
        if self.book.is_some() && !self.timeline.is_empty() {
            self.recompile_current();
        }

        self.state.broadcast_event(SpotreadEvent::TempoChanged {
            wpm: effective_wpm,
            speed_factor: effective_speed,
            timestamp: time::now(),
        });
        debug!(wpm = effective_wpm, speed = effective_speed, "tempo changed");
        Ok((effective_wpm, effective_speed))
    }

    /// Move to a paragraph and announce the change
    async fn move_to(&mut self, chapter_index: usize, paragraph_index: usize) {
        let chapter_changed = chapter_index != self.position.chapter_index;
        self.position = Position {
            chapter_index,
            paragraph_index,
            token_index: 0,
        };
        self.enter_paragraph(chapter_changed).await;
        self.state.broadcast_event(SpotreadEvent::PositionChanged {
            chapter_index,
            paragraph_index,
            token_index: 0,
            timestamp: time::now(),
        });
    }

    /// Compile the paragraph at the current position and announce it
    async fn enter_paragraph(&mut self, announce_chapter: bool) {
        let Some(book) = &self.book else {
            return;
        };
        let chapter = &book.chapters[self.position.chapter_index];
        let text = &chapter.paragraphs[self.position.paragraph_index].content;
        self.timeline = ParagraphTimeline::compile(text, &self.params);
        self.lead_in_pending = true;
        self.position.token_index = 0;
        self.state.set_position(self.position).await;

        if announce_chapter {
            self.state.broadcast_event(SpotreadEvent::ChapterChanged {
                chapter_index: self.position.chapter_index,
                title: chapter.title.clone(),
                paragraph_count: chapter.paragraphs.len(),
                timestamp: time::now(),
            });
        }
        self.state.broadcast_event(SpotreadEvent::ParagraphStarted {
            chapter_index: self.position.chapter_index,
            paragraph_index: self.position.paragraph_index,
            token_count: self.timeline.len(),
            timestamp: time::now(),
        });
    }

    /// Recompile the current paragraph without announcements (tempo change,
    /// restart after completion)
    fn recompile_current(&mut self) {
        if let Some(book) = &self.book {
            let text = &book.chapters[self.position.chapter_index].paragraphs
                [self.position.paragraph_index]
                .content;
            self.timeline = ParagraphTimeline::compile(text, &self.params);
        }
    }

    /// Publish the current token's highlight
    async fn emit_word(&mut self, duration_ms: u64) {
        let Some(token) = self.timeline.tokens.get(self.position.token_index) else {
            return;
        };
        let event = SpotreadEvent::WordHighlighted {
            chapter_index: self.position.chapter_index,
            paragraph_index: self.position.paragraph_index,
            token_index: self.position.token_index,
            token: token.text.clone(),
            duration_ms,
            sentence_end: token.is_sentence_end,
            paragraph_end: token.is_paragraph_end,
            timestamp: time::now(),
        };
        self.state.set_position(self.position).await;
        self.state.broadcast_event(event);
    }

    /// Advance past the current token, rolling over paragraph, chapter, and
    /// book boundaries
    async fn advance(&mut self) {
        self.position.token_index += 1;
        if self.position.token_index < self.timeline.len() {
            self.state.set_position(self.position).await;
            return;
        }

        let Some(book) = self.book.clone() else {
            return;
        };
        let c = self.position.chapter_index;
        let p = self.position.paragraph_index;
        self.state.broadcast_event(SpotreadEvent::ParagraphCompleted {
            chapter_index: c,
            paragraph_index: p,
            timestamp: time::now(),
        });

        if p + 1 < book.chapters[c].paragraphs.len() {
            self.position.paragraph_index += 1;
            self.enter_paragraph(false).await;
        } else if c + 1 < book.chapters.len() {
            self.position.chapter_index += 1;
            self.position.paragraph_index = 0;
            self.enter_paragraph(true).await;
        } else {
            // Ran off the end of the book
            info!(book_id = %book.id, "book completed");
            self.playing = false;
            self.state.set_playback_state(PlaybackState::Stopped).await;
            self.state.broadcast_event(SpotreadEvent::BookCompleted {
                book_id: book.id.clone(),
                timestamp: time::now(),
            });
            self.state.broadcast_event(SpotreadEvent::PlaybackStateChanged {
                old_state: PlaybackState::Playing,
                new_state: PlaybackState::Stopped,
                timestamp: time::now(),
            });
            self.position = Position::default();
            self.recompile_current();
            self.lead_in_pending = true;
            self.state.set_position(self.position).await;
        }
    }
}

/// Paragraph/chapter navigation steps
enum Step {
    NextParagraph,
    PreviousParagraph,
    NextChapter,
    PreviousChapter,
}
