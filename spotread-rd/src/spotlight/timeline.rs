//! Paragraph timelines
//!
//! A timeline is a paragraph compiled against the current tempo: one timed
//! token per visible word, ready for the engine to walk. Timelines are
//! recompiled whenever the paragraph or the tempo changes.

use spotread_common::params::PlaybackParams;
use spotread_common::rhythm::{
    base_ms_from_wpm, paragraph_start_delay_ms, token_durations, TimedToken, RESUME_FACTOR,
};

/// A compiled paragraph ready for playback
#[derive(Debug, Clone)]
pub struct ParagraphTimeline {
    /// Timed tokens in display order
    pub tokens: Vec<TimedToken>,
    /// Base cadence the timeline was compiled at (ms/word)
    pub base_ms: u64,
    /// Delay before the first token of the paragraph
    pub lead_in_ms: u64,
}

impl ParagraphTimeline {
    /// Compile a paragraph against the current parameters
    ///
    /// The paragraph-final flag is always set: a timeline always represents
    /// a whole paragraph, so its last token carries the paragraph pause.
    pub fn compile(text: &str, params: &PlaybackParams) -> Self {
        let (wpm, speed_factor) = params.snapshot();
        let base_ms = base_ms_from_wpm(wpm);
        Self {
            tokens: token_durations(text, base_ms, true, speed_factor),
            base_ms,
            lead_in_ms: paragraph_start_delay_ms(base_ms),
        }
    }

    /// An empty timeline (no book open)
    pub fn empty() -> Self {
        Self {
            tokens: Vec::new(),
            base_ms: 0,
            lead_in_ms: 0,
        }
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the timeline has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Display duration for the token at `index`
    ///
    /// `resume_first` adds the resume bonus used for the first word after a
    /// `Paused -> Playing` transition.
    pub fn token_duration_ms(&self, index: usize, resume_first: bool) -> Option<u64> {
        self.tokens.get(index).map(|token| {
            let mut duration = token.total_duration_ms;
            if resume_first {
                duration += (self.base_ms as f64 * RESUME_FACTOR).round() as u64;
            }
            duration
        })
    }

    /// Total playback duration of the paragraph, lead-in included
    pub fn total_duration_ms(&self) -> u64 {
        self.lead_in_ms + self.tokens.iter().map(|t| t.total_duration_ms).sum::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_uses_params() {
        let params = PlaybackParams::new();
        params.set_wpm(120); // 500 ms base
        let timeline = ParagraphTimeline::compile("hello wonderful world.", &params);

        assert_eq!(timeline.base_ms, 500);
        assert_eq!(timeline.len(), 3);
        // Last token carries sentence + paragraph pauses
        let last = timeline.tokens.last().unwrap();
        assert!(last.is_sentence_end);
        assert!(last.is_paragraph_end);
    }

    #[test]
    fn test_lead_in_tracks_base() {
        let params = PlaybackParams::new();
        params.set_wpm(120);
        let timeline = ParagraphTimeline::compile("word", &params);
        assert_eq!(timeline.lead_in_ms, 550); // 500 * 1.1
    }

    #[test]
    fn test_resume_bonus_added_once() {
        let params = PlaybackParams::new();
        params.set_wpm(120);
        let timeline = ParagraphTimeline::compile("steady words here", &params);

        let plain = timeline.token_duration_ms(1, false).unwrap();
        let resumed = timeline.token_duration_ms(1, true).unwrap();
        assert_eq!(resumed, plain + (timeline.base_ms as f64 * RESUME_FACTOR).round() as u64);
    }

    #[test]
    fn test_out_of_range_token() {
        let params = PlaybackParams::new();
        let timeline = ParagraphTimeline::compile("one two", &params);
        assert!(timeline.token_duration_ms(5, false).is_none());
    }

    #[test]
    fn test_total_duration_sums_tokens_and_lead_in() {
        let params = PlaybackParams::new();
        let timeline = ParagraphTimeline::compile("a b", &params);
        let sum: u64 = timeline.tokens.iter().map(|t| t.total_duration_ms).sum();
        assert_eq!(timeline.total_duration_ms(), timeline.lead_in_ms + sum);
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = ParagraphTimeline::empty();
        assert!(timeline.is_empty());
        assert_eq!(timeline.total_duration_ms(), 0);
    }
}
