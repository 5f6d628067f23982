//! Runtime-tunable playback parameters
//!
//! Thread-safe holder for the two knobs the reader exposes: the
//! words-per-minute target and the pause speed factor. Setters clamp to the
//! ranges the timing model accepts and return the effective value, so a
//! caller always learns what actually took effect.
//!
//! # RwLock Unwrap Justification
//!
//! Setters and getters use `.unwrap()` on the std RwLock. Poisoning only
//! occurs if a thread panicked while holding the lock, which indicates
//! corrupted process state; failing fast is correct there.

use crate::rhythm::{SPEED_RANGE, WPM_RANGE};
use std::sync::RwLock;

/// Default words-per-minute target
pub const DEFAULT_WPM: u32 = 160;

/// Default pause speed factor
pub const DEFAULT_SPEED_FACTOR: f64 = 1.0;

/// Shared playback parameters
#[derive(Debug)]
pub struct PlaybackParams {
    wpm: RwLock<u32>,
    speed_factor: RwLock<f64>,
}

impl PlaybackParams {
    /// Create parameters at their defaults
    pub fn new() -> Self {
        Self {
            wpm: RwLock::new(DEFAULT_WPM),
            speed_factor: RwLock::new(DEFAULT_SPEED_FACTOR),
        }
    }

    /// Current words-per-minute target
    pub fn wpm(&self) -> u32 {
        *self.wpm.read().unwrap()
    }

    /// Update the WPM target; clamped to [40, 300]
    ///
    /// Returns the effective (clamped) value.
    pub fn set_wpm(&self, value: u32) -> u32 {
        let clamped = value.clamp(WPM_RANGE.0, WPM_RANGE.1);
        *self.wpm.write().unwrap() = clamped;
        clamped
    }

    /// Current pause speed factor
    pub fn speed_factor(&self) -> f64 {
        *self.speed_factor.read().unwrap()
    }

    /// Update the speed factor; clamped to [0.5, 2.5]
    ///
    /// Non-finite input falls back to 1.0. Returns the effective value.
    pub fn set_speed_factor(&self, value: f64) -> f64 {
        let clamped = if value.is_finite() {
            value.clamp(SPEED_RANGE.0, SPEED_RANGE.1)
        } else {
            DEFAULT_SPEED_FACTOR
        };
        *self.speed_factor.write().unwrap() = clamped;
        clamped
    }

    /// Snapshot both parameters at once
    pub fn snapshot(&self) -> (u32, f64) {
        (self.wpm(), self.speed_factor())
    }
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PlaybackParams::new();
        assert_eq!(params.wpm(), DEFAULT_WPM);
        assert_eq!(params.speed_factor(), DEFAULT_SPEED_FACTOR);
    }

    #[test]
    fn test_wpm_clamping() {
        let params = PlaybackParams::new();
        assert_eq!(params.set_wpm(200), 200);
        assert_eq!(params.wpm(), 200);

        assert_eq!(params.set_wpm(10), 40);
        assert_eq!(params.wpm(), 40);

        assert_eq!(params.set_wpm(5000), 300);
        assert_eq!(params.wpm(), 300);
    }

    #[test]
    fn test_speed_factor_clamping() {
        let params = PlaybackParams::new();
        assert_eq!(params.set_speed_factor(1.5), 1.5);

        assert_eq!(params.set_speed_factor(0.1), 0.5);
        assert_eq!(params.set_speed_factor(9.0), 2.5);
        assert_eq!(params.set_speed_factor(f64::NAN), 1.0);
    }

    #[test]
    fn test_snapshot() {
        let params = PlaybackParams::new();
        params.set_wpm(120);
        params.set_speed_factor(2.0);
        assert_eq!(params.snapshot(), (120, 2.0));
    }
}
