//! Streaming recitation tracking.
//!
//! A [`TrackingSession`] owns the state of one live connection: the PCM ring
//! buffer, the anchor verse, the target window and the recognized-word
//! history. Each tick is split in two so the slow transcription runs without
//! holding any session state:
//!
//! 1. [`TrackingSession::prepare_tick`] decides whether this tick transcribes
//!    and copies the trailing window out of the buffer.
//! 2. The caller runs the [`Transcriber`](crate::core::asr::Transcriber).
//! 3. [`TrackingSession::apply_transcript`] anchors, aligns, builds the
//!    timeline, runs drift detection and returns a [`TrackingSnapshot`].
//!
//! [`driver::run_tick`] glues the three together for the live socket.

pub mod driver;
mod registry;
mod ring_buffer;
mod session;

use serde::{Deserialize, Serialize};

use crate::core::alignment::DEFAULT_MAX_CELLS;
use crate::core::timeline::TimelineEntry;

pub use driver::{run_tick, spawn_tick_worker};
pub use registry::{SessionGuard, SessionRegistry};
pub use ring_buffer::PcmRingBuffer;
pub use session::{TickPlan, TrackingSession, localize_words};

// =============================================================================
// Session State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    WarmingUp,
    Searching,
    Tracking,
    Uncertain,
    Stopped,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WarmingUp => "warming_up",
            Self::Searching => "searching",
            Self::Tracking => "tracking",
            Self::Uncertain => "uncertain",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Tuning of one live session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub sample_rate: u32,
    /// Length of the trailing window sent to the recognizer
    pub window_sec: f64,
    /// Verses in the target window after the anchor
    pub target_ayahs: usize,
    pub max_buffer_seconds: u32,
    pub warmup_ms: u64,
    /// Recognized words older than this are pruned from the history
    pub history_ms: f64,
    /// New words starting this close to a known word are duplicates
    pub duplicate_tolerance_ms: f64,
    /// Timelines whose best verse is matched below this ratio count as drift
    pub drift_ratio: f64,
    /// Drift only counts when the window transcript has more words than this
    pub drift_min_words: usize,
    /// Consecutive drifting ticks before the anchor is dropped
    pub drift_ticks: u32,
    pub update_interval_ms: u64,
    pub max_alignment_cells: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            window_sec: 14.0,
            target_ayahs: 12,
            max_buffer_seconds: 45,
            warmup_ms: 6_000,
            history_ms: 25_000.0,
            duplicate_tolerance_ms: 50.0,
            drift_ratio: 0.15,
            drift_min_words: 3,
            drift_ticks: 4,
            update_interval_ms: 1_000,
            max_alignment_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl SessionConfig {
    pub fn buffer_capacity(&self) -> usize {
        self.max_buffer_seconds as usize * self.sample_rate as usize
    }

    pub fn window_samples(&self) -> usize {
        (self.window_sec * self.sample_rate as f64) as usize
    }

    /// Apply the optional fields of a client `start` message.
    pub fn with_overrides(
        &self,
        sample_rate: Option<u32>,
        window_sec: Option<f64>,
        target_ayahs: Option<usize>,
    ) -> Result<Self, SessionConfigError> {
        let mut config = self.clone();
        if let Some(rate) = sample_rate {
            config.sample_rate = rate;
        }
        if let Some(window) = window_sec {
            config.window_sec = window;
        }
        if let Some(count) = target_ayahs {
            config.target_ayahs = count;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionConfigError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(SessionConfigError::SampleRate(self.sample_rate));
        }
        if !self.window_sec.is_finite() || self.window_sec <= 0.0 {
            return Err(SessionConfigError::WindowNotPositive(self.window_sec));
        }
        if self.window_sec > self.max_buffer_seconds as f64 {
            return Err(SessionConfigError::WindowExceedsBuffer {
                window_sec: self.window_sec,
                buffer_secs: self.max_buffer_seconds,
            });
        }
        if self.target_ayahs == 0 || self.target_ayahs > MAX_TARGET_AYAHS {
            return Err(SessionConfigError::TargetAyahs(self.target_ayahs));
        }
        if self.update_interval_ms == 0 {
            return Err(SessionConfigError::ZeroUpdateInterval);
        }
        if self.drift_ticks == 0 {
            return Err(SessionConfigError::ZeroDriftTicks);
        }
        Ok(())
    }
}

const MIN_SAMPLE_RATE: u32 = 8_000;
const MAX_SAMPLE_RATE: u32 = 48_000;
const MAX_TARGET_AYAHS: usize = 300;

/// Rejected session parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionConfigError {
    #[error("sample_rate must be between 8000 and 48000, got {0}")]
    SampleRate(u32),

    #[error("window_sec must be positive, got {0}")]
    WindowNotPositive(f64),

    #[error("window_sec ({window_sec}) cannot exceed the buffer length ({buffer_secs}s)")]
    WindowExceedsBuffer { window_sec: f64, buffer_secs: u32 },

    #[error("target_ayahs must be between 1 and 300, got {0}")]
    TargetAyahs(usize),

    #[error("update_interval_ms must be greater than zero")]
    ZeroUpdateInterval,

    #[error("drift_ticks must be greater than zero")]
    ZeroDriftTicks,
}

// =============================================================================
// Snapshots
// =============================================================================

/// The verse recitation was anchored on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorVerse {
    pub surah_no: u16,
    pub ayah_no: u16,
    pub text: String,
    pub score: f64,
}

/// Output of one tick, sent to the client as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingSnapshot {
    Status {
        state: SessionState,
        elapsed_ms: u64,
    },
    Update {
        elapsed_ms: u64,
        best: Option<AnchorVerse>,
        current: Option<TimelineEntry>,
        timeline: Vec<TimelineEntry>,
        transcript_partial: String,
        state: SessionState,
    },
    Error {
        message: String,
    },
}

impl TrackingSnapshot {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionState::WarmingUp).unwrap(),
            "\"warming_up\""
        );
        assert_eq!(SessionState::Uncertain.to_string(), "uncertain");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_capacity(), 45 * 16_000);
        assert_eq!(config.window_samples(), 14 * 16_000);
    }

    #[test]
    fn test_overrides() {
        let config = SessionConfig::default()
            .with_overrides(Some(8_000), Some(8.0), Some(5))
            .unwrap();
        assert_eq!(config.sample_rate, 8_000);
        assert_eq!(config.window_samples(), 64_000);
        assert_eq!(config.target_ayahs, 5);

        let base = SessionConfig::default();
        assert_eq!(
            base.with_overrides(Some(100), None, None),
            Err(SessionConfigError::SampleRate(100))
        );
        assert_eq!(
            base.with_overrides(None, Some(0.0), None),
            Err(SessionConfigError::WindowNotPositive(0.0))
        );
        assert_eq!(
            base.with_overrides(None, Some(60.0), None),
            Err(SessionConfigError::WindowExceedsBuffer {
                window_sec: 60.0,
                buffer_secs: 45,
            })
        );
        assert_eq!(
            base.with_overrides(None, None, Some(301)),
            Err(SessionConfigError::TargetAyahs(301))
        );
    }

    #[test]
    fn test_config_error_messages() {
        let err = SessionConfig::default()
            .with_overrides(None, Some(120.0), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "window_sec (120) cannot exceed the buffer length (45s)"
        );

        let config = SessionConfig {
            drift_ticks: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.validate(), Err(SessionConfigError::ZeroDriftTicks));
    }

    #[test]
    fn test_snapshot_wire_format() {
        let status = TrackingSnapshot::Status {
            state: SessionState::WarmingUp,
            elapsed_ms: 0,
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({"type": "status", "state": "warming_up", "elapsed_ms": 0})
        );

        let error = TrackingSnapshot::error("boom");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"type": "error", "message": "boom"})
        );
    }
}
