//! Word-timing model for spotlight playback
//!
//! This module provides the core timing abstraction for SpotRead: pure
//! functions that turn a words-per-minute target plus the shape of the text
//! (word length, punctuation, CJK vs Latin script) into per-token display
//! durations.
//!
//! # Architecture
//!
//! Three layers of timing:
//!
//! 1. **Base cadence**: milliseconds per word derived from a WPM target
//! 2. **Per-token adjustment**: word length, stop words, syllable count,
//!    trailing punctuation
//! 3. **Pauses**: clause/sentence/paragraph boundaries add fixed delays,
//!    scaled by the user's speed factor
//!
//! All functions here are pure and synchronous; the playback engine consumes
//! their output and owns the actual sleeping.
//!
//! # Conversion Flow
//!
//! ```text
//! WPM target
//!     ↓
//! base_ms_from_wpm() → base cadence (ms/word)
//!     ↓
//! token_durations() → TimedToken timeline (one entry per visible token)
//!     ↓
//! Spotlight engine (sleep + highlight)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use spotread_common::rhythm::*;
//!
//! let base = base_ms_from_wpm(200);
//! assert_eq!(base, 300);
//!
//! let tokens = token_durations("Hello, world!", base, true, 1.0);
//! assert_eq!(tokens.len(), 2);
//! assert!(tokens[0].punctuation_delay_ms > 0); // comma pause
//! assert!(tokens[1].is_sentence_end);
//! assert!(tokens[1].is_paragraph_end);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// Constants
// ============================================================================

/// Minimum per-word base duration in milliseconds
///
/// Even at the fastest WPM setting a word stays highlighted at least this
/// long, so the spotlight remains followable.
pub const MIN_WORD_MS: u64 = 120;

/// Minimum scaled pause duration in milliseconds
pub const MIN_PAUSE_MS: u64 = 60;

/// Extra factor applied to the first word after resuming from pause
pub const RESUME_FACTOR: f64 = 0.40;

/// Words-per-minute bounds accepted by the timing model
pub const WPM_RANGE: (u32, u32) = (40, 300);

/// Speed factor bounds accepted by the timing model
pub const SPEED_RANGE: (f64, f64) = (0.5, 2.5);

/// Common English stop words that read faster than content words
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the",
        "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us",
        "them", "my", "your", "his", "its", "our", "their", "this", "that",
        "these", "those",
        "in", "on", "at", "by", "for", "of", "to", "with", "from", "up",
        "down", "out", "over", "under", "into",
        "and", "but", "or", "nor", "so", "yet", "if", "as", "than", "because",
        "while", "when",
        "be", "is", "am", "are", "was", "were", "been", "have", "has", "had",
        "do", "does", "did", "can", "could", "will", "would", "should",
    ]
    .into_iter()
    .collect()
});

static SYLLABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[aeiouy]+").expect("syllable regex"));

/// Pause and length-factor configuration for the timing model
///
/// Defaults match the tuned values of the reading cadence; they are exposed
/// as a struct so a caller can derive a gentler or snappier profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RhythmConfig {
    /// Pause after clause punctuation (comma, semicolon, colon), ms
    pub comma_delay_ms: u64,
    /// Pause after sentence-final punctuation, ms
    pub sentence_delay_ms: u64,
    /// Pause at a paragraph boundary, ms
    pub paragraph_delay_ms: u64,
    /// Multiplier for stop words
    pub stop_word_factor: f64,
    /// Multiplier for short words (<= 4 chars)
    pub short_word_factor: f64,
    /// Multiplier for long words (8-10 chars)
    pub long_word_factor: f64,
    /// Multiplier for very long words (> 10 chars)
    pub very_long_factor: f64,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            comma_delay_ms: 200,
            sentence_delay_ms: 500,
            paragraph_delay_ms: 600,
            stop_word_factor: 0.75,
            short_word_factor: 0.9,
            long_word_factor: 1.3,
            very_long_factor: 1.5,
        }
    }
}

// ============================================================================
// Character classes
// ============================================================================

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn is_strong_punct(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

fn is_clause_punct(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '，' | '；' | '：')
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '—' | '–')
}

fn is_closer(c: char) -> bool {
    matches!(c, ')' | ']' | '”' | '’' | '"' | '\'')
}

/// Strip a token down to the characters that carry reading weight
/// (ASCII letters and CJK ideographs), lowercased.
fn clean_word(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || is_cjk(*c))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// ============================================================================
// Core timing functions
// ============================================================================

/// Convert a words-per-minute target to a base per-word cadence
///
/// The WPM value is clamped to [40, 300] before conversion and the result
/// is floored at 150 ms so a runaway setting can never make the highlight
/// unreadable.
///
/// # Examples
///
/// ```rust
/// use spotread_common::rhythm::base_ms_from_wpm;
///
/// assert_eq!(base_ms_from_wpm(60), 1000);
/// assert_eq!(base_ms_from_wpm(200), 300);
/// assert_eq!(base_ms_from_wpm(10_000), 200); // clamped to 300 WPM
/// assert_eq!(base_ms_from_wpm(1), 1500);     // clamped to 40 WPM
/// ```
pub fn base_ms_from_wpm(wpm: u32) -> u64 {
    let clamped = wpm.clamp(WPM_RANGE.0, WPM_RANGE.1);
    let ms = (60_000.0 / clamped as f64).round() as u64;
    ms.max(150)
}

/// Pause after a sentence, scaled by how the sentence ends
///
/// Strong terminators (`.!?`) pause longer than clause punctuation, and the
/// last sentence of a paragraph pauses longer than interior ones.
pub fn sentence_end_pause_ms(base_ms: u64, sentence: &str, is_last_sentence: bool) -> u64 {
    let end = sentence.trim().chars().last();
    let strong = end.map(is_strong_punct).unwrap_or(false);
    let medium = end.map(is_clause_punct).unwrap_or(false);
    let factor = if is_last_sentence {
        if strong {
            2.4
        } else if medium {
            2.0
        } else {
            1.8
        }
    } else if strong {
        2.2
    } else if medium {
        1.6
    } else {
        1.4
    };
    (base_ms as f64 * factor).round() as u64
}

/// Per-word delay from the syllable/length model
///
/// This is the fine-grained model: CJK tokens pace by ideograph count,
/// Latin tokens by vowel-run syllable count, with bonuses for trailing
/// punctuation, the last word of a paragraph, and the first word spoken
/// after resuming from pause.
pub fn word_delay_ms(
    base_ms: u64,
    token: &str,
    idx: usize,
    word_count: usize,
    is_resume_first: bool,
) -> u64 {
    let has_cjk = token.chars().any(is_cjk);
    let mut factor = 1.0_f64;

    if has_cjk {
        let cjk_len = token.chars().filter(|c| is_cjk(*c)).count() as f64;
        factor += ((cjk_len - 2.0) * 0.08).clamp(-0.10, 0.40);
    } else {
        let core: String = token.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        let syllables = SYLLABLE_RE.find_iter(&core).count().max(1) as f64;
        factor += ((syllables - 1.0) * 0.12).clamp(-0.12, 0.50);
    }

    if let Some(last) = token.chars().last() {
        if is_strong_punct(last) {
            factor += 0.60;
        } else if is_clause_punct(last) {
            factor += 0.35;
        } else if is_dash(last) {
            factor += 0.25;
        } else if is_closer(last) {
            factor += 0.15;
        }
    }

    if word_count > 0 && idx == word_count - 1 {
        factor += 0.30;
    }
    if is_resume_first {
        factor += RESUME_FACTOR;
    }

    ((base_ms as f64 * factor).round() as u64).max(MIN_WORD_MS)
}

/// Delay inserted before the first word of a new paragraph
///
/// Tracks the base cadence but stays within [220, 600] ms so paragraph
/// transitions feel like a breath, not a stall.
pub fn paragraph_start_delay_ms(base_ms: u64) -> u64 {
    let d = (base_ms as f64 * 1.1).round() as u64;
    d.clamp(220, 600)
}

/// Scale a pause by the user's speed factor
///
/// The factor is clamped to [0.5, 2.5]; non-finite or zero values fall back
/// to 1.0. Scaled pauses never drop below 60 ms.
pub fn scaled_delay(delay_ms: u64, speed_factor: f64) -> u64 {
    let sf = if speed_factor.is_finite() && speed_factor != 0.0 {
        speed_factor.clamp(SPEED_RANGE.0, SPEED_RANGE.1)
    } else {
        1.0
    };
    ((delay_ms as f64 / sf).floor() as u64).max(MIN_PAUSE_MS)
}

// ============================================================================
// Tokenization
// ============================================================================

/// A raw token produced by [`split_into_tokens`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text as it appeared in the source (punctuation attached)
    pub text: String,
    /// True for explicit newline tokens
    pub has_newline: bool,
}

/// Split paragraph text into display tokens
///
/// Whitespace separates tokens; newlines additionally emit an explicit
/// newline token so downstream timing can insert a paragraph-sized pause.
/// Tokens that trim to nothing are never emitted.
pub fn split_into_tokens(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut buff = String::new();

    let mut flush = |buff: &mut String, tokens: &mut Vec<Token>| {
        if !buff.trim().is_empty() {
            tokens.push(Token {
                text: std::mem::take(buff),
                has_newline: false,
            });
        } else {
            buff.clear();
        }
    };

    for ch in text.chars() {
        if ch == '\n' {
            flush(&mut buff, &mut tokens);
            tokens.push(Token {
                text: "\n".to_string(),
                has_newline: true,
            });
        } else if ch.is_whitespace() {
            flush(&mut buff, &mut tokens);
        } else {
            buff.push(ch);
        }
    }
    flush(&mut buff, &mut tokens);
    tokens
}

// ============================================================================
// Token timelines
// ============================================================================

/// A token with its computed display timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedToken {
    /// Token text as displayed (punctuation attached)
    pub text: String,
    /// Lowercased letters-only core used for stop-word/length lookup
    pub clean: String,
    /// Length-adjusted base duration, ms
    pub base_duration_ms: u64,
    /// Additional punctuation/boundary pause, ms (already speed-scaled)
    pub punctuation_delay_ms: u64,
    /// Total highlight duration, ms
    pub total_duration_ms: u64,
    /// Token ends a sentence
    pub is_sentence_end: bool,
    /// Token ends the paragraph
    pub is_paragraph_end: bool,
}

/// Compute the timed-token timeline for a stretch of text
///
/// `paragraph_end` marks the text as the tail of its paragraph, so the final
/// token picks up the paragraph pause. Word durations follow the base
/// cadence; only the punctuation pauses are scaled by `speed_factor`.
pub fn token_durations(
    text: &str,
    base_ms: u64,
    paragraph_end: bool,
    speed_factor: f64,
) -> Vec<TimedToken> {
    token_durations_with(text, base_ms, paragraph_end, speed_factor, &RhythmConfig::default())
}

/// [`token_durations`] with an explicit [`RhythmConfig`]
pub fn token_durations_with(
    text: &str,
    base_ms: u64,
    paragraph_end: bool,
    speed_factor: f64,
    config: &RhythmConfig,
) -> Vec<TimedToken> {
    let tokens = split_into_tokens(text);
    let count = tokens.len();

    tokens
        .into_iter()
        .enumerate()
        .map(|(index, token)| {
            let clean = clean_word(&token.text);
            let len = clean.chars().count();

            let multiplier = if STOP_WORDS.contains(clean.as_str()) {
                config.stop_word_factor
            } else if len <= 4 {
                config.short_word_factor
            } else if len > 10 {
                config.very_long_factor
            } else if len >= 8 {
                config.long_word_factor
            } else {
                1.0
            };

            let mut punct_delay = 0u64;
            let mut is_sentence_end = false;
            let mut is_paragraph_end = false;

            if token.text.chars().any(is_clause_punct) {
                punct_delay += scaled_delay(config.comma_delay_ms, speed_factor);
            }
            if token.text.chars().any(is_strong_punct) {
                punct_delay += scaled_delay(config.sentence_delay_ms, speed_factor);
                is_sentence_end = true;
            }
            if token.has_newline || (index == count - 1 && paragraph_end) {
                punct_delay += scaled_delay(config.paragraph_delay_ms, speed_factor);
                is_paragraph_end = true;
            }

            let base_duration = (base_ms.max(MIN_WORD_MS) as f64 * multiplier).floor() as u64;
            TimedToken {
                text: token.text,
                clean,
                base_duration_ms: base_duration,
                punctuation_delay_ms: punct_delay,
                total_duration_ms: base_duration + punct_delay,
                is_sentence_end,
                is_paragraph_end,
            }
        })
        .collect()
}

// ============================================================================
// Tests Module
// ============================================================================

#[cfg(test)]
#[path = "rhythm_tests.rs"]
mod tests;
