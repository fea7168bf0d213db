//! Connection settings for the Whisper transcription endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Timestamp Granularities
// =============================================================================

/// Timestamp granularity for `verbose_json` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampGranularity {
    #[default]
    Word,
    Segment,
}

impl TimestampGranularity {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Segment => "segment",
        }
    }
}

impl std::fmt::Display for TimestampGranularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Base URL up to and including the API version, e.g. `http://host:8000/v1`
    pub base_url: String,
    /// Bearer token, omitted from requests when `None`
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub timestamp_granularities: Vec<TimestampGranularity>,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            timestamp_granularities: vec![TimestampGranularity::Word, TimestampGranularity::Segment],
        }
    }
}

impl WhisperConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Full transcription endpoint URL.
    pub fn api_url(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err("ASR base URL must not be empty".to_string());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("ASR base URL must use http or https: {url}"));
        }
        if self.timeout.is_zero() {
            return Err("ASR timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
